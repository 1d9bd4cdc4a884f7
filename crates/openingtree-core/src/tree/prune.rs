use tracing::debug;

use crate::tree::{
    arena::Arena,
    ids::NodeId,
    node::Node,
    variation_tree::VariationTree,
};

impl VariationTree {
    /// Copy of the tree without the children whose frequency is below `min_games`.
    ///
    /// A child survives on its own frequency only; a dropped child takes its whole
    /// subtree with it. The root is always kept and `self` is left untouched, so
    /// the same source can be re-pruned at another threshold.
    pub fn pruned(&self, min_games: usize) -> VariationTree {
        let pruned = self.copy_retaining(self.max_depth, |node| node.frequency() >= min_games);
        debug!(
            min_games,
            before = self.node_count(),
            after = pruned.node_count(),
            "pruned variation tree"
        );
        pruned
    }

    /// Copy of the tree cut down to `max_depth` plies.
    /// The recorded depth limit shrinks with it; it never grows.
    pub fn truncated(&self, max_depth: usize) -> VariationTree {
        let max_depth = max_depth.min(self.max_depth);
        self.copy_retaining(max_depth, |node| node.depth() <= max_depth)
    }

    /// Rebuild a fresh arena from the root, descending only into children accepted by `keep`.
    fn copy_retaining<F>(&self, max_depth: usize, keep: F) -> VariationTree
    where
        F: Fn(&Node) -> bool,
    {
        let mut arena = Arena::new();
        let mut stack: Vec<(NodeId, NodeId)> = Vec::new();

        if let Ok(source_root) = self.node(self.root_id()) {
            let mut root = Node::root(source_root.position_key().to_string());
            for game_ref in source_root.games().iter() {
                root.record_game(game_ref);
            }
            stack.push((self.root_id(), arena.allocate(root)));
        }

        while let Some((source_id, copy_id)) = stack.pop() {
            let Some(source) = self.arena.get(source_id) else {
                continue;
            };

            for (key, source_child_id) in source.children().iter() {
                let Some(source_child) = self.arena.get(source_child_id) else {
                    continue;
                };
                if !keep(source_child) {
                    continue;
                }

                let Some(parent_copy) = arena.get(copy_id) else {
                    continue;
                };
                let mut child = Node::child_of(
                    copy_id,
                    parent_copy,
                    key,
                    source_child.position_key().to_string(),
                    source_child.san().to_string(),
                );
                for game_ref in source_child.games().iter() {
                    child.record_game(game_ref);
                }

                let child_copy_id = arena.allocate(child);
                if let Some(parent_copy) = arena.get_mut(copy_id) {
                    let inserted = parent_copy.children_mut().insert(key, child_copy_id);
                    debug_assert!(
                        inserted.is_some(),
                        "source children are keyed uniquely, {key} was copied twice"
                    );
                }
                stack.push((source_child_id, child_copy_id));
            }
        }

        VariationTree {
            arena,
            games: self.games.clone(),
            max_depth,
        }
    }
}
