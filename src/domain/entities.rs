//! Domain entities: node payload, kinds, primitives and attributes

use std::fmt;

/// Name given to synthetic text children created by `set_text_content`.
pub const TEXT_NODE_NAME: &str = "#text";

/// Integral numbers below this magnitude render through `i64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Semantic node kind. Not tied to any source format: a `Record` is both a
/// JSON object and an XML element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Collection,
    Record,
    Field,
    Value,
    AttributesContainer,
    Comment,
    Instruction,
    Data,
}

impl NodeKind {
    /// Container kinds start out with an empty children sequence.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Collection | NodeKind::Record | NodeKind::AttributesContainer
        )
    }

    /// Leaf-like kinds carry their content in `value`.
    pub fn is_leaf_like(self) -> bool {
        !self.is_container()
    }

    /// Kinds whose value never contributes to text content.
    pub fn is_textless(self) -> bool {
        matches!(self, NodeKind::Comment | NodeKind::Instruction)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Collection => "Collection",
            NodeKind::Record => "Record",
            NodeKind::Field => "Field",
            NodeKind::Value => "Value",
            NodeKind::AttributesContainer => "AttributesContainer",
            NodeKind::Comment => "Comment",
            NodeKind::Instruction => "Instruction",
            NodeKind::Data => "Data",
        };
        f.write_str(s)
    }
}

/// Primitive scalar carried by leaf-like nodes and attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Primitive {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Primitive::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }
}

/// Text rendering used by text content: `Null` renders empty, integral
/// numbers render without a fraction.
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::String(s) => f.write_str(s),
            Primitive::Number(n) if n.fract() == 0.0 && n.abs() < I64_BOUND => {
                write!(f, "{}", *n as i64)
            }
            Primitive::Number(n) => write!(f, "{}", n),
            Primitive::Boolean(b) => write!(f, "{}", b),
            Primitive::Null => Ok(()),
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Number(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Number(value as f64)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Number(f64::from(value))
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Boolean(value)
    }
}

/// A single attribute. Duplicate names are legal and kept in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Primitive,
    pub namespace: Option<String>,
    /// Namespace prefix as written in the source format
    pub label: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<Primitive>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
            label: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Name match, plus namespace match when one is requested.
    fn matches(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name && namespace.map_or(true, |ns| self.namespace.as_deref() == Some(ns))
    }
}

/// Payload of a tree node. Links to parent and children live in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Tag name, key name, or a synthetic label such as `#text`
    pub name: String,
    pub value: Option<Primitive>,
    pub attributes: Option<Vec<Attribute>>,
    pub namespace: Option<String>,
    pub label: Option<String>,
    pub id: Option<String>,
}

impl NodeData {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: None,
            attributes: None,
            namespace: None,
            label: None,
            id: None,
        }
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Collection, name)
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Record, name)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Field, name)
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Value, name)
    }

    pub fn attributes_container(name: impl Into<String>) -> Self {
        Self::new(NodeKind::AttributesContainer, name)
    }

    pub fn comment(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment, name)
    }

    pub fn instruction(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Instruction, name)
    }

    pub fn data(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Data, name)
    }

    pub fn with_value(mut self, value: impl Into<Primitive>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Scalar fields only: attributes are dropped.
    pub fn shallow_copy(&self) -> Self {
        Self {
            kind: self.kind,
            name: self.name.clone(),
            value: self.value.clone(),
            attributes: None,
            namespace: self.namespace.clone(),
            label: self.label.clone(),
            id: self.id.clone(),
        }
    }

    /// Appends without any uniqueness check.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.get_or_insert_with(Vec::new).push(attribute);
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.attributes.as_deref().unwrap_or(&[])
    }

    /// First attribute matching `name` (and `namespace`, if given).
    pub fn attribute(&self, name: &str, namespace: Option<&str>) -> Option<&Attribute> {
        self.attributes()
            .iter()
            .find(|a| a.matches(name, namespace))
    }

    pub fn attribute_value(&self, name: &str, namespace: Option<&str>) -> Option<&Primitive> {
        self.attribute(name, namespace).map(|a| &a.value)
    }

    pub fn filter_attributes<P>(&self, mut predicate: P) -> Vec<&Attribute>
    where
        P: FnMut(&Attribute) -> bool,
    {
        self.attributes().iter().filter(|a| predicate(a)).collect()
    }

    /// Updates the first match in place. Returns false when nothing matched.
    pub fn update_attribute(
        &mut self,
        name: &str,
        value: impl Into<Primitive>,
        namespace: Option<&str>,
    ) -> bool {
        let found = self
            .attributes
            .as_mut()
            .and_then(|attrs| attrs.iter_mut().find(|a| a.matches(name, namespace)));
        match found {
            Some(attr) => {
                attr.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Removes and returns the first match.
    pub fn remove_attribute(&mut self, name: &str, namespace: Option<&str>) -> Option<Attribute> {
        let attrs = self.attributes.as_mut()?;
        let pos = attrs.iter().position(|a| a.matches(name, namespace))?;
        Some(attrs.remove(pos))
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)?;
        if let Some(value) = &self.value {
            write!(f, " = {:?}", value.to_string())?;
        }
        let attrs = self.attributes();
        if !attrs.is_empty() {
            let rendered: Vec<String> = attrs
                .iter()
                .map(|a| format!("{}={:?}", a.name, a.value.to_string()))
                .collect();
            write!(f, " [{}]", rendered.join(" "))?;
        }
        Ok(())
    }
}
