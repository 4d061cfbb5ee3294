//! Tests for branch/merge, through the pipeline session and the free functions

use rstest::{fixture, rstest};

use semtree::application::{branch, merge, PipelineError, Stage};
use semtree::domain::{NodeData, NodeKind, NodePath, Primitive, Tree};
use semtree::util::testing::init_test_setup;
use semtree::{Pipeline, Settings};

// root
// ├── A = "x"
// └── B
//     └── C = "y"
#[fixture]
fn tree() -> Tree {
    let mut tree = Tree::new(NodeData::record("root"));
    let root = tree.root_id();
    tree.add_child(root, NodeData::field("A").with_value("x"))
        .unwrap();
    let b = tree.add_child(root, NodeData::record("B")).unwrap();
    tree.add_child(b, NodeData::field("C").with_value("y"))
        .unwrap();
    tree
}

fn path(segments: &[usize]) -> NodePath {
    NodePath::from(segments)
}

#[rstest]
fn given_branch_on_leaf_when_mapped_and_merged_then_change_lands_in_place(tree: Tree) {
    init_test_setup();
    let mut pipeline = Pipeline::new(tree);

    pipeline
        .branch(|n| Ok(n.name() == "C"))
        .unwrap()
        .map(|n| {
            let mut data = n.data().clone();
            if n.name() == "C" {
                data.value = Some("Y".into());
            }
            Ok(data.into())
        })
        .unwrap()
        .merge()
        .unwrap();

    assert!(!pipeline.is_branching());
    let result = pipeline.into_tree();
    assert_eq!(result.root().name(), "root");
    assert_eq!(
        result.root().child(0).unwrap().value(),
        Some(&Primitive::from("x"))
    );
    let c = result.root().child(1).unwrap().child(0).unwrap();
    assert_eq!(c.name(), "C");
    assert_eq!(c.value(), Some(&Primitive::from("Y")));
    assert_eq!(c.parent().unwrap().name(), "B");
}

#[rstest]
fn given_untouched_branch_when_merging_then_tree_restored(tree: Tree) {
    let settings = Settings::default();

    let (working, context) =
        branch(tree.clone(), |n| Ok(n.kind() == NodeKind::Field), &settings).unwrap();
    let merged = merge(&working, &context).unwrap();

    assert_eq!(merged, tree);
}

#[rstest]
fn given_match_dropped_in_branch_when_merging_then_node_removed(tree: Tree) {
    let mut pipeline = Pipeline::new(tree);

    pipeline
        .branch(|n| Ok(n.name() == "C"))
        .unwrap()
        .filter(|n| Ok(n.name() == "results"))
        .unwrap()
        .merge()
        .unwrap();

    let result = pipeline.tree();
    let b = result.root().child(1).unwrap();
    assert_eq!(b.name(), "B");
    assert_eq!(b.child_count(), 0);
    assert_eq!(result.node_count(), 3);
}

#[rstest]
fn given_active_branch_when_branching_again_then_rejected(tree: Tree) {
    let mut pipeline = Pipeline::new(tree);
    pipeline.branch(|n| Ok(n.name() == "A")).unwrap();
    let working = pipeline.tree().clone();

    let err = pipeline.branch(|_| Ok(true)).unwrap_err();

    assert!(matches!(err, PipelineError::BranchActive));
    assert!(pipeline.is_branching());
    assert_eq!(pipeline.tree(), &working);
}

#[rstest]
fn given_no_branch_when_merging_then_noop(tree: Tree) {
    let mut pipeline = Pipeline::new(tree.clone());

    pipeline.merge().unwrap();

    assert_eq!(pipeline.tree(), &tree);
    assert!(pipeline.branch_context().is_none());
}

#[rstest]
fn given_failing_branch_predicate_when_branching_then_state_unchanged(tree: Tree) {
    let mut pipeline = Pipeline::new(tree.clone());

    let err = pipeline.branch(|_| Err("broken".into())).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Callback {
            stage: Stage::Branch,
            ..
        }
    ));
    assert!(!pipeline.is_branching());
    assert_eq!(pipeline.tree(), &tree);
}

#[rstest]
fn given_root_branched_when_renamed_and_merged_then_whole_tree_replaced(tree: Tree) {
    let mut pipeline = Pipeline::new(tree);

    pipeline
        .branch(|n| Ok(n.name() == "root"))
        .unwrap()
        .map(|n| {
            let mut data = n.data().clone();
            if n.name() == "root" {
                data.name = "renamed".into();
            }
            Ok(data.into())
        })
        .unwrap()
        .merge()
        .unwrap();

    let result = pipeline.into_tree();
    assert_eq!(result.root().name(), "renamed");
    assert_eq!(result.node_count(), 4);
    assert!(result.root().parent().is_none());
}

#[rstest]
fn given_custom_settings_when_branching_then_container_and_paths_recorded(tree: Tree) {
    let mut pipeline = Pipeline::with_settings(tree, Settings::with_fragment_root_name("picked"));

    pipeline
        .branch(|n| Ok(n.kind() == NodeKind::Field))
        .unwrap();

    let working = pipeline.tree();
    assert_eq!(working.root().name(), "picked");
    assert_eq!(working.root().kind(), NodeKind::Collection);
    let names: Vec<&str> = working.root().children().map(|c| c.name()).collect();
    assert_eq!(names, vec!["A", "C"]);

    let context = pipeline.branch_context().unwrap();
    assert_eq!(context.original_paths(), &[path(&[0]), path(&[1, 0])]);
    assert_eq!(context.selected_nodes().len(), 2);
    assert_eq!(context.parent().root().name(), "root");
}

#[rstest]
fn given_fewer_results_than_matches_when_merging_then_pairing_is_positional(tree: Tree) {
    let mut pipeline = Pipeline::new(tree);

    pipeline
        .branch(|n| Ok(n.kind() == NodeKind::Field))
        .unwrap()
        .filter(|n| Ok(n.name() == "C"))
        .unwrap()
        .merge()
        .unwrap();

    let result = pipeline.tree();
    let first = result.root().child(0).unwrap();
    assert_eq!(first.name(), "C");
    assert_eq!(first.value(), Some(&Primitive::from("y")));
    let b = result.root().child(1).unwrap();
    assert_eq!(b.name(), "B");
    assert_eq!(b.child_count(), 0);
}

#[rstest]
fn given_extra_results_when_merging_then_extras_ignored(tree: Tree) {
    init_test_setup();
    let settings = Settings::default();
    let (mut working, context) = branch(tree.clone(), |n| Ok(n.name() == "A"), &settings).unwrap();
    let root = working.root_id();
    working.add_child(root, NodeData::field("extra")).unwrap();

    let merged = merge(&working, &context).unwrap();

    assert_eq!(merged, tree);
}

#[rstest]
fn given_branch_when_merging_then_context_parent_untouched(tree: Tree) {
    let settings = Settings::default();
    let (working, context) = branch(tree.clone(), |n| Ok(n.name() == "B"), &settings).unwrap();
    let emptied = Tree::new(NodeData::collection("results"));

    let merged = merge(&emptied, &context).unwrap();

    assert_eq!(merged.node_count(), 2);
    assert_eq!(context.parent(), &tree);
    assert_eq!(working.root().child_count(), 1);
}

#[rstest]
fn given_pipeline_when_reducing_then_folds_working_tree(tree: Tree) {
    let mut pipeline = Pipeline::new(tree);
    pipeline
        .select(|n| Ok(n.kind() == NodeKind::Field))
        .unwrap();

    let total = pipeline
        .reduce(String::new(), |mut acc, n| {
            acc.push_str(&n.text_content());
            Ok(acc)
        })
        .unwrap();

    // container text plus each field's own text
    assert_eq!(total, "xyxy");
}
