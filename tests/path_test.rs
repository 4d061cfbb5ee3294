//! Tests for index-path utilities

use rstest::{fixture, rstest};

use semtree::domain::{
    collect_nodes_with_paths, get_node_at_path, remove_node_at_path, replace_node_at_path,
    NodeData, NodePath, Tree, TreeError,
};
use semtree::util::testing::init_test_setup;

// root
// ├── a
// ├── b
// │   ├── c
// │   └── d
// └── e
#[fixture]
fn tree() -> Tree {
    let mut tree = Tree::new(NodeData::collection("root"));
    let root = tree.root_id();
    tree.add_child(root, NodeData::field("a")).unwrap();
    let b = tree.add_child(root, NodeData::record("b")).unwrap();
    tree.add_child(b, NodeData::field("c")).unwrap();
    tree.add_child(b, NodeData::field("d")).unwrap();
    tree.add_child(root, NodeData::field("e")).unwrap();
    tree
}

fn path(segments: &[usize]) -> NodePath {
    NodePath::from(segments)
}

fn names(tree: &Tree) -> Vec<String> {
    tree.iter().map(|n| n.name().to_string()).collect()
}

#[rstest]
#[case(&[], "root")]
#[case(&[0], "a")]
#[case(&[1, 1], "d")]
#[case(&[2], "e")]
fn given_valid_path_when_getting_then_node_returned(
    tree: Tree,
    #[case] segments: &[usize],
    #[case] expected: &str,
) {
    let id = get_node_at_path(&tree, &path(segments)).unwrap();
    assert_eq!(tree.get(id).unwrap().name(), expected);
    assert_eq!(tree.path_of(id).unwrap(), path(segments));
}

#[rstest]
#[case(&[3])]
#[case(&[0, 0])]
#[case(&[1, 2])]
fn given_out_of_range_path_when_getting_then_none(tree: Tree, #[case] segments: &[usize]) {
    assert!(get_node_at_path(&tree, &path(segments)).is_none());
}

#[rstest]
fn given_path_when_replacing_then_node_swapped_in_place(tree: Tree) {
    let mut tree = tree;
    let mut replacement = Tree::new(NodeData::record("x"));
    let x = replacement.root_id();
    replacement.add_child(x, NodeData::field("y")).unwrap();

    replace_node_at_path(&mut tree, replacement, &path(&[1, 0])).unwrap();

    assert_eq!(names(&tree), vec!["root", "a", "b", "x", "y", "d", "e"]);
    let x = get_node_at_path(&tree, &path(&[1, 0])).unwrap();
    let b = get_node_at_path(&tree, &path(&[1])).unwrap();
    assert_eq!(tree.get(x).unwrap().parent().unwrap().id(), b);
}

#[rstest]
fn given_empty_path_when_replacing_or_removing_then_noop(tree: Tree) {
    let mut tree = tree;
    let snapshot = tree.clone();

    let replacement = Tree::new(NodeData::field("z"));
    replace_node_at_path(&mut tree, replacement, &NodePath::root()).unwrap();
    remove_node_at_path(&mut tree, &NodePath::root()).unwrap();

    assert_eq!(tree, snapshot);
}

#[rstest]
fn given_path_when_removing_then_subtree_spliced_out(tree: Tree) {
    let mut tree = tree;

    remove_node_at_path(&mut tree, &path(&[1])).unwrap();

    assert_eq!(names(&tree), vec!["root", "a", "e"]);
    assert_eq!(tree.node_count(), 3);
    let e = get_node_at_path(&tree, &path(&[1])).unwrap();
    assert_eq!(tree.get(e).unwrap().name(), "e");
}

#[rstest]
fn given_out_of_range_path_when_removing_then_error(tree: Tree) {
    let mut tree = tree;
    let err = remove_node_at_path(&mut tree, &path(&[5])).unwrap_err();
    assert!(matches!(
        err,
        TreeError::PathOutOfRange(p) if p == path(&[5])
    ));

    let err = replace_node_at_path(&mut tree, Tree::new(NodeData::field("z")), &path(&[1, 9]))
        .unwrap_err();
    assert!(matches!(err, TreeError::PathOutOfRange(_)));
}

#[rstest]
fn given_predicate_when_collecting_then_parallel_nodes_and_paths(tree: Tree) {
    let (nodes, paths) =
        collect_nodes_with_paths(&tree, |n| Ok(n.name() != "b" && n.name() != "root"));

    let found: Vec<&str> = nodes
        .iter()
        .map(|&id| tree.get(id).unwrap().name())
        .collect();
    assert_eq!(found, vec!["a", "c", "d", "e"]);
    assert_eq!(
        paths,
        vec![path(&[0]), path(&[1, 0]), path(&[1, 1]), path(&[2])]
    );
}

#[rstest]
fn given_failing_predicate_when_collecting_then_node_skipped_and_scan_continues(tree: Tree) {
    init_test_setup();
    let (nodes, paths) = collect_nodes_with_paths(&tree, |n| {
        if n.name() == "c" {
            return Err("unreadable".into());
        }
        Ok(n.kind() == semtree::NodeKind::Field)
    });

    assert_eq!(nodes.len(), 3);
    assert_eq!(paths, vec![path(&[0]), path(&[1, 1]), path(&[2])]);
}
