use std::collections::HashMap;

use tracing::{debug, warn};

use crate::tree::{
    engine::Ply,
    error::TreeError,
    ids::{GameRef, NodeId},
    variation_tree::VariationTree,
};

/// Combine two independently built trees over the union of their games.
///
/// Games are matched by id and ties favor `base`: a delta game whose id is
/// already in `base` contributes nothing. Edges known to both trees are merged
/// recursively and edges only `delta` knows are copied over, restricted to the
/// games it contributes. Both trees must share `max_depth`.
pub fn merge(base: &VariationTree, delta: &VariationTree) -> Result<VariationTree, TreeError> {
    if base.max_depth() != delta.max_depth() {
        let err = TreeError::ParameterConflict {
            base_max_depth: base.max_depth(),
            delta_max_depth: delta.max_depth(),
        };
        warn!(
            base_max_depth = base.max_depth(),
            delta_max_depth = delta.max_depth(),
            "refusing to merge trees of different depth"
        );
        return Err(err);
    }

    let mut merged = base.clone();

    // Delta games that are new to base, remapped into the merged game table.
    let mut contributed: HashMap<GameRef, GameRef> = HashMap::new();
    for (idx, summary) in delta.games.iter().enumerate() {
        if merged.game_ref_of(&summary.id).is_none() {
            let merged_ref = merged.games.intern(summary.clone());
            contributed.insert(GameRef::from(idx), merged_ref);
        }
    }

    let mut stack: Vec<(NodeId, NodeId)> = vec![(delta.root_id(), merged.root_id())];
    while let Some((delta_id, merged_id)) = stack.pop() {
        let delta_node = delta.node(delta_id)?;

        let incoming: Vec<GameRef> = delta_node
            .games()
            .iter()
            .filter_map(|game_ref| contributed.get(&game_ref).copied())
            .collect();
        let merged_node = merged.node_mut(merged_id)?;
        for game_ref in incoming {
            merged_node.record_game(game_ref);
        }

        for (key, delta_child_id) in delta_node.children().iter() {
            let delta_child = delta.node(delta_child_id)?;
            // Subtree games are a subset of the child's, so nothing below contributes either.
            if !delta_child
                .games()
                .iter()
                .any(|game_ref| contributed.contains_key(&game_ref))
            {
                continue;
            }

            let merged_child_id = match merged.child(merged_id, key)? {
                Some(existing) => existing,
                None => {
                    let ply = Ply {
                        move_key: key,
                        san: delta_child.san().to_string(),
                        position_key: delta_child.position_key().to_string(),
                    };
                    merged.allocate_child(merged_id, &ply)?
                }
            };
            stack.push((delta_child_id, merged_child_id));
        }
    }

    debug!(
        base_games = base.game_count(),
        delta_games = delta.game_count(),
        merged_games = merged.game_count(),
        "merged variation trees"
    );
    Ok(merged)
}
