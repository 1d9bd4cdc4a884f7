use crate::{
    SNAPSHOT_SCHEMA_VERSION, TreeError, TreeSnapshot, VariationTree,
    tree::tests::{PathEngine, game},
};

fn sample_tree() -> VariationTree {
    let mut tree = VariationTree::new(3);
    let _ = tree.extend(
        &[
            game("g1", "e2e4 e7e5 g1f3"),
            game("g2", "e2e4 c7c5"),
            game("g3", "d2d4"),
        ],
        &PathEngine,
    );
    tree
}

#[test]
fn snapshot_restores_an_equal_tree() {
    let tree = sample_tree();
    let snapshot = tree.snapshot();

    assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);
    assert_eq!(snapshot.node_count, tree.node_count());

    let restored = VariationTree::from_snapshot(&snapshot).expect("valid snapshot");
    assert_eq!(restored, tree);
    assert_eq!(restored.snapshot(), snapshot);
}

#[test]
fn snapshot_survives_json() {
    let tree = sample_tree().pruned(2);
    let json = serde_json::to_string(&tree.snapshot()).expect("serializes");
    let parsed: TreeSnapshot = serde_json::from_str(&json).expect("parses");

    assert!(json.contains("\"moveKey\":\"e2e4\""));
    assert_eq!(VariationTree::from_snapshot(&parsed).expect("valid"), tree);
}

#[test]
fn wrong_frequency_is_rejected() {
    let mut snapshot = sample_tree().snapshot();
    snapshot.nodes[1].frequency += 1;

    let err = VariationTree::from_snapshot(&snapshot).expect_err("must fail");
    assert!(matches!(err, TreeError::InvalidSnapshot { node_id: 1, .. }));
}

#[test]
fn duplicate_sibling_moves_are_rejected() {
    let mut snapshot = sample_tree().snapshot();
    let mut duplicate = snapshot
        .nodes
        .iter()
        .find(|node| node.parent_node_id == Some(0))
        .cloned()
        .expect("root has children");
    duplicate.node_id = snapshot.nodes.len();
    snapshot.nodes.push(duplicate);
    snapshot.node_count += 1;

    let err = VariationTree::from_snapshot(&snapshot).expect_err("must fail");
    assert!(matches!(err, TreeError::InvalidSnapshot { .. }));
}

#[test]
fn game_missing_on_parent_is_rejected() {
    let mut snapshot = sample_tree().snapshot();
    let f3 = snapshot
        .nodes
        .iter()
        .position(|node| node.san == "f3")
        .expect("f3 listed");
    let g2 = snapshot
        .games
        .iter()
        .position(|summary| summary.id == "g2")
        .expect("g2 listed");
    snapshot.nodes[f3].games.push(g2);
    snapshot.nodes[f3].frequency += 1;

    let err = VariationTree::from_snapshot(&snapshot).expect_err("must fail");
    assert!(matches!(err, TreeError::InvalidSnapshot { .. }));
}

#[test]
fn unknown_schema_is_rejected() {
    let mut snapshot = sample_tree().snapshot();
    snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;

    let err = VariationTree::from_snapshot(&snapshot).expect_err("must fail");
    assert_eq!(
        err,
        TreeError::UnsupportedSchema {
            found: SNAPSHOT_SCHEMA_VERSION + 1,
            expected: SNAPSHOT_SCHEMA_VERSION,
        }
    );
}
