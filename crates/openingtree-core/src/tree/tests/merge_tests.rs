use crate::{
    TreeError, VariationTree, merge,
    tree::tests::{PathEngine, game, key},
};

fn build(games: &[crate::GameRecord], max_depth: usize) -> VariationTree {
    let mut tree = VariationTree::new(max_depth);
    let _ = tree.extend(games, &PathEngine);
    tree
}

#[test]
fn overlapping_inputs_merge_to_the_direct_build() {
    let a = game("a", "e2e4 e7e5");
    let b = game("b", "e2e4 c7c5 g1f3");

    let base = build(&[a.clone()], 3);
    let delta = build(&[a.clone(), b.clone()], 3);
    let direct = build(&[a, b], 3);

    let merged = merge(&base, &delta).expect("same depth merges");

    assert_eq!(merged.pruned(1), direct.pruned(1));
    assert_eq!(merged.pruned(2), direct.pruned(2));
    assert_eq!(merged.game_count(), 2);
}

#[test]
fn delta_only_branches_are_copied() {
    let base = build(&[game("a", "e2e4 e7e5")], 2);
    let delta = build(&[game("b", "d2d4 d7d5")], 2);

    let merged = merge(&base, &delta).expect("same depth merges");

    let d5 = merged
        .find(&[key("d2d4"), key("d7d5")])
        .expect("delta branch copied");
    let node = merged.node(d5).expect("d5 node");
    assert_eq!(node.frequency(), 1);
    assert_eq!(node.position_key(), "start d2d4 d7d5");
    assert_eq!(merged.node(merged.root_id()).expect("root").frequency(), 2);
}

#[test]
fn ties_favor_the_base_summary() {
    let original = game("a", "e2e4");
    let mut renamed = original.clone();
    renamed.white = "someone else".to_string();

    let base = build(&[original], 1);
    let delta = build(&[renamed], 1);
    let merged = merge(&base, &delta).expect("same depth merges");

    assert_eq!(merged.game_count(), 1);
    assert_eq!(merged.game("a").expect("game kept").white, "white");
}

#[test]
fn different_depths_are_rejected() {
    let base = build(&[game("a", "e2e4")], 2);
    let delta = build(&[game("b", "d2d4")], 3);

    let err = merge(&base, &delta).expect_err("depth mismatch must fail");

    assert_eq!(
        err,
        TreeError::ParameterConflict {
            base_max_depth: 2,
            delta_max_depth: 3,
        }
    );
}
