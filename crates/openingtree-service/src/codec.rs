use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use openingtree_core::{
    GameSummary, MoveKey, NodeSnapshot, SNAPSHOT_SCHEMA_VERSION, TreeSnapshot,
    VariationTree,
};
use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Version of the metadata block written next to the tree.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Build parameters recorded with a persisted tree.
/// Absent parameters mean the tree cannot be trusted and must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMetadata {
    #[serde(default)]
    pub game_count: Option<usize>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub min_games: Option<usize>,
    #[serde(default)]
    pub build_timestamp: Option<DateTime<Utc>>,
    pub schema_version: u32,
    #[serde(default)]
    pub is_legacy_format: bool,
}

impl TreeMetadata {
    /// Metadata for a tree built now.
    pub fn new(game_count: usize, max_depth: usize, min_games: usize) -> Self {
        TreeMetadata {
            game_count: Some(game_count),
            max_depth: Some(max_depth),
            min_games: Some(min_games),
            build_timestamp: Some(Utc::now()),
            schema_version: METADATA_SCHEMA_VERSION,
            is_legacy_format: false,
        }
    }

    /// Stand-in for payloads written before metadata existed.
    pub fn legacy() -> Self {
        TreeMetadata {
            game_count: None,
            max_depth: None,
            min_games: None,
            build_timestamp: None,
            schema_version: METADATA_SCHEMA_VERSION,
            is_legacy_format: true,
        }
    }

    /// Same build, re-pruned to new parameters. The build timestamp is kept.
    pub fn with_parameters(&self, max_depth: usize, min_games: usize) -> Self {
        TreeMetadata {
            max_depth: Some(max_depth),
            min_games: Some(min_games),
            ..self.clone()
        }
    }
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    tree: TreeSnapshot,
    metadata: &'a TreeMetadata,
}

#[derive(Deserialize)]
struct Payload {
    tree: WireTree,
    #[serde(default)]
    metadata: Option<TreeMetadata>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTree {
    Flat(TreeSnapshot),
    Nested(LegacyNode),
}

/// Old layout: the node graph written out as nested objects keyed by move.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyNode {
    #[serde(alias = "fen")]
    position_key: String,
    #[serde(default)]
    san: String,
    #[serde(default)]
    games: Vec<GameSummary>,
    #[serde(default)]
    children: BTreeMap<MoveKey, LegacyNode>,
}

/// Serialize a tree and its metadata into one payload.
pub fn encode(tree: &VariationTree, metadata: &TreeMetadata) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&PayloadRef {
        tree: tree.snapshot(),
        metadata,
    })
}

/// Parse a payload written by `encode`, or by the older layouts.
///
/// A payload without metadata is accepted and comes back with
/// `TreeMetadata::legacy()`, which the invalidation policy always rebuilds.
pub fn decode(bytes: &[u8]) -> Result<(VariationTree, TreeMetadata), DecodeError> {
    let payload: Payload = serde_json::from_slice(bytes)?;

    let metadata = match payload.metadata {
        Some(metadata) if metadata.schema_version != METADATA_SCHEMA_VERSION => {
            return Err(DecodeError::UnsupportedSchema {
                found: metadata.schema_version,
                expected: METADATA_SCHEMA_VERSION,
            });
        }
        Some(metadata) => metadata,
        None => TreeMetadata::legacy(),
    };

    let snapshot = match payload.tree {
        WireTree::Flat(snapshot) => snapshot,
        WireTree::Nested(root) => flatten_legacy(root),
    };
    let tree = VariationTree::from_snapshot(&snapshot)?;
    check_metadata(&tree, &metadata)?;

    Ok((tree, metadata))
}

/// The recorded depth must be the tree's own, and every game in the tree must be counted.
fn check_metadata(tree: &VariationTree, metadata: &TreeMetadata) -> Result<(), DecodeError> {
    if let Some(recorded) = metadata.max_depth {
        if recorded != tree.max_depth() {
            return Err(DecodeError::MetadataMismatch {
                field: "maxDepth",
                recorded,
                actual: tree.max_depth(),
            });
        }
    }
    if let Some(recorded) = metadata.game_count {
        if recorded < tree.game_count() {
            return Err(DecodeError::MetadataMismatch {
                field: "gameCount",
                recorded,
                actual: tree.game_count(),
            });
        }
    }
    Ok(())
}

/// Lay a nested legacy tree out as a flat snapshot, parents first.
/// Depth is not recorded in the old layout, so the deepest node sets it.
fn flatten_legacy(root: LegacyNode) -> TreeSnapshot {
    let mut games: Vec<GameSummary> = Vec::new();
    let mut game_index: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<NodeSnapshot> = Vec::new();
    let mut max_depth = 0;

    let mut queue: VecDeque<(LegacyNode, Option<usize>, Option<MoveKey>, usize)> =
        VecDeque::from([(root, None, None, 0)]);

    while let Some((node, parent_node_id, move_key, depth)) = queue.pop_front() {
        let node_id = nodes.len();
        max_depth = max_depth.max(depth);

        let mut indices: Vec<usize> = Vec::with_capacity(node.games.len());
        for summary in node.games {
            let idx = match game_index.get(&summary.id) {
                Some(idx) => *idx,
                None => {
                    let idx = games.len();
                    game_index.insert(summary.id.clone(), idx);
                    games.push(summary);
                    idx
                }
            };
            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }

        nodes.push(NodeSnapshot {
            node_id,
            parent_node_id,
            move_key,
            position_key: node.position_key,
            san: node.san,
            frequency: indices.len(),
            games: indices,
        });

        for (key, child) in node.children {
            queue.push_back((child, Some(node_id), Some(key), depth + 1));
        }
    }

    TreeSnapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        max_depth,
        root_node_id: 0,
        node_count: nodes.len(),
        games,
        nodes,
    }
}
