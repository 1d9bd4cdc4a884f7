use crate::{
    VariationTree,
    tree::tests::{PathEngine, game, key},
};

fn sicilian_and_open() -> VariationTree {
    let mut tree = VariationTree::new(2);
    let _ = tree.extend(
        &[game("g1", "e2e4 e7e5"), game("g2", "e2e4 c7c5")],
        &PathEngine,
    );
    tree
}

#[test]
fn threshold_two_keeps_only_the_shared_move() {
    let tree = sicilian_and_open();
    let pruned = tree.pruned(2);

    assert_eq!(pruned.node_count(), 2);
    let e4 = pruned.find_by_san(&["e4"]).expect("e4 survives");
    let e4 = pruned.node(e4).expect("e4 node");
    assert_eq!(e4.frequency(), 2);
    assert!(e4.is_leaf());
    assert!(pruned.find_by_san(&["e4", "e5"]).is_none());
    assert!(pruned.find_by_san(&["e4", "c5"]).is_none());
}

#[test]
fn pruning_leaves_the_source_intact() {
    let tree = sicilian_and_open();
    let before = tree.clone();

    let _ = tree.pruned(2);

    assert_eq!(tree, before);
    assert_eq!(tree.pruned(1), before);
}

#[test]
fn root_survives_any_threshold() {
    let tree = sicilian_and_open();
    let pruned = tree.pruned(10);

    assert_eq!(pruned.node_count(), 1);
    assert_eq!(pruned.game_count(), 2);
}

#[test]
fn decisions_are_local_to_each_node() {
    let mut tree = VariationTree::new(3);
    let _ = tree.extend(
        &[
            game("g1", "e2e4 e7e5 g1f3"),
            game("g2", "e2e4 e7e5 g1f3"),
            game("g3", "d2d4"),
        ],
        &PathEngine,
    );

    let pruned = tree.pruned(2);

    assert!(pruned.find(&[key("d2d4")]).is_none());
    assert!(pruned.find(&[key("e2e4"), key("e7e5"), key("g1f3")]).is_some());
}

#[test]
fn truncation_drops_deep_plies_and_lowers_depth() {
    let tree = sicilian_and_open();
    let truncated = tree.truncated(1);

    assert_eq!(truncated.max_depth(), 1);
    assert_eq!(truncated.node_count(), 2);

    let grown = tree.truncated(5);
    assert_eq!(grown.max_depth(), 2);
    assert_eq!(grown, tree);
}

#[test]
fn every_copied_node_hangs_off_its_parent_edge() {
    let mut tree = VariationTree::new(3);
    let _ = tree.extend(
        &[
            game("g1", "e2e4 e7e5 g1f3"),
            game("g2", "e2e4 e7e5 b1c3"),
            game("g3", "e2e4 c7c5 g1f3"),
            game("g4", "d2d4 d7d5"),
        ],
        &PathEngine,
    );

    for copy in [tree.pruned(1), tree.pruned(2), tree.truncated(2)] {
        let mut linked = 1;
        for (node_id, node) in copy.iter_nodes() {
            let Some((parent_id, move_key)) = node.parent() else {
                continue;
            };
            assert_eq!(copy.child(parent_id, move_key), Ok(Some(node_id)));
            linked += 1;
        }
        let edges: usize = copy.iter_nodes().map(|(_, node)| node.child_count()).sum();
        assert_eq!(edges + 1, copy.node_count());
        assert_eq!(linked, copy.node_count());
    }
}
