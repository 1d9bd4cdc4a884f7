use serde::{Deserialize, Serialize};

use crate::tree::{
    error::TreeError,
    games::GameSummary,
    ids::{GameRef, MoveKey, NodeId},
    node::Node,
    variation_tree::VariationTree,
};

/// Version of the flat snapshot layout below.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Flat, versioned wire form of a `VariationTree`.
/// Nodes are listed parents first; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub schema_version: u32,
    pub max_depth: usize,
    pub root_node_id: usize,
    pub node_count: usize,
    pub games: Vec<GameSummary>,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub node_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_key: Option<MoveKey>,
    pub position_key: String,
    pub san: String,
    pub frequency: usize,
    /// Indices into `TreeSnapshot::games`.
    pub games: Vec<usize>,
}

impl VariationTree {
    /// Capture the tree in its wire form.
    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .iter_nodes()
            .map(|(node_id, node)| NodeSnapshot {
                node_id: node_id.index(),
                parent_node_id: node.parent().map(|(parent, _)| parent.index()),
                move_key: node.move_key(),
                position_key: node.position_key().to_string(),
                san: node.san().to_string(),
                frequency: node.frequency(),
                games: node.games().iter().map(|game_ref| game_ref.index()).collect(),
            })
            .collect();

        TreeSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            max_depth: self.max_depth,
            root_node_id: self.root_id().index(),
            node_count: self.node_count(),
            games: self.games.iter().cloned().collect(),
            nodes,
        }
    }

    /// Restore a tree from its wire form, rejecting anything that breaks a tree invariant.
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Result<VariationTree, TreeError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(TreeError::UnsupportedSchema {
                found: snapshot.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if snapshot.node_count != snapshot.nodes.len() {
            return Err(invalid(
                snapshot.root_node_id,
                format!(
                    "node count {} does not match {} listed nodes",
                    snapshot.node_count,
                    snapshot.nodes.len()
                ),
            ));
        }

        let root = match snapshot.nodes.first() {
            Some(root)
                if snapshot.root_node_id == 0
                    && root.node_id == 0
                    && root.parent_node_id.is_none()
                    && root.move_key.is_none() =>
            {
                root
            }
            _ => return Err(invalid(snapshot.root_node_id, "root must be the first node".into())),
        };

        let mut tree = VariationTree::with_root(root.position_key.clone(), snapshot.max_depth);
        for (idx, summary) in snapshot.games.iter().enumerate() {
            if tree.games.intern(summary.clone()).index() != idx {
                return Err(invalid(0, format!("game {} is listed twice", summary.id)));
            }
        }

        for node_snapshot in &snapshot.nodes {
            let node_id = node_snapshot.node_id;
            let expected = if node_id == 0 {
                tree.root_id()
            } else {
                attach_child(&mut tree, node_snapshot)?
            };
            if expected.index() != node_id {
                return Err(invalid(node_id, "nodes are not listed in arena order".into()));
            }

            let parent_id = tree.node(expected)?.parent().map(|(parent, _)| parent);
            for &game_idx in &node_snapshot.games {
                if game_idx >= snapshot.games.len() {
                    return Err(invalid(node_id, format!("unknown game index {game_idx}")));
                }
                let game_ref = GameRef::from(game_idx);
                if let Some(parent_id) = parent_id {
                    if !tree.node(parent_id)?.games().contains(game_ref) {
                        return Err(invalid(
                            node_id,
                            format!("game {game_idx} is missing on the parent"),
                        ));
                    }
                }
                if !tree.node_mut(expected)?.record_game(game_ref) {
                    return Err(invalid(node_id, format!("game {game_idx} is listed twice")));
                }
            }

            if tree.node(expected)?.frequency() != node_snapshot.frequency {
                return Err(invalid(
                    node_id,
                    format!(
                        "frequency {} does not match {} distinct games",
                        node_snapshot.frequency,
                        node_snapshot.games.len()
                    ),
                ));
            }
        }

        if tree.node(tree.root_id())?.frequency() != snapshot.games.len() {
            return Err(invalid(0, "root must hold every game".into()));
        }

        Ok(tree)
    }
}

/// Allocate the node described by `node_snapshot` under its already restored parent.
fn attach_child(tree: &mut VariationTree, node_snapshot: &NodeSnapshot) -> Result<NodeId, TreeError> {
    let node_id = node_snapshot.node_id;
    let parent_idx = node_snapshot
        .parent_node_id
        .filter(|parent| *parent < node_id)
        .ok_or_else(|| invalid(node_id, "parent must be listed before the node".into()))?;
    let key = node_snapshot
        .move_key
        .ok_or_else(|| invalid(node_id, "non-root node without a move".into()))?;

    let parent_id = NodeId::from(parent_idx);
    let parent = tree.node(parent_id)?;
    if parent.depth() >= tree.max_depth {
        return Err(invalid(
            node_id,
            format!("node is deeper than max depth {}", tree.max_depth),
        ));
    }
    if parent.children().get(key).is_some() {
        return Err(invalid(node_id, format!("duplicate sibling move {key}")));
    }

    let child = Node::child_of(
        parent_id,
        parent,
        key,
        node_snapshot.position_key.clone(),
        node_snapshot.san.clone(),
    );
    let child_id = tree.arena.allocate(child);
    tree.node_mut(parent_id)?
        .children_mut()
        .insert(key, child_id)
        .ok_or(TreeError::DuplicateEdge {
            node_id: parent_id,
            move_key: key,
        })?;
    Ok(child_id)
}

fn invalid(node_id: usize, reason: String) -> TreeError {
    TreeError::InvalidSnapshot { node_id, reason }
}
