use std::collections::BTreeMap;

use crate::tree::{
    arena::Arena,
    engine::INITIAL_POSITION_KEY,
    error::TreeError,
    games::{GameSummary, GameTable},
    ids::{GameRef, MoveKey, NodeId},
    node::Node,
};

#[derive(Debug, Clone)]
/// owns the arena (root is always at index 0) and the game table.
/// `max_depth` is fixed when the tree is created and bounds every variation.
pub struct VariationTree {
    pub(crate) arena: Arena<Node>,
    pub(crate) games: GameTable,
    pub(crate) max_depth: usize,
}

impl VariationTree {
    /// Create a tree holding only the root for the standard initial position.
    pub fn new(max_depth: usize) -> Self {
        Self::with_root(INITIAL_POSITION_KEY.to_string(), max_depth)
    }

    /// Create a tree whose root is an arbitrary position.
    pub fn with_root(root_position_key: String, max_depth: usize) -> Self {
        let mut arena = Arena::new();
        let _ = arena.allocate(Node::root(root_position_key));
        VariationTree {
            arena,
            games: GameTable::new(),
            max_depth,
        }
    }

    /// Return the root node id.
    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Depth limit the tree was built with.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return how many nodes exist in the tree arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Number of distinct games the tree represents.
    /// Every interned game sits on the root, so this equals the root frequency.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Return an immutable node handle.
    pub fn node(&self, node_id: NodeId) -> Result<&Node, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Return a mutable node handle.
    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Follow one edge.
    pub fn child(&self, node_id: NodeId, key: MoveKey) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(node_id)?.children().get(key))
    }

    /// Edges leaving `node_id`, in move key order.
    pub fn children(&self, node_id: NodeId) -> Result<Vec<(MoveKey, NodeId)>, TreeError> {
        Ok(self.node(node_id)?.children().iter().collect())
    }

    /// Games that passed through `node_id`, in the order they were added.
    pub fn games_at(&self, node_id: NodeId) -> Result<Vec<&GameSummary>, TreeError> {
        let node = self.node(node_id)?;
        Ok(node
            .games()
            .iter()
            .filter_map(|game_ref| self.games.get(game_ref))
            .collect())
    }

    /// Look up a game summary by id.
    pub fn game(&self, id: &str) -> Option<&GameSummary> {
        self.games.ref_of(id).and_then(|game_ref| self.games.get(game_ref))
    }

    /// Resolve a variation given as a move key path from the root.
    pub fn find(&self, path: &[MoveKey]) -> Option<NodeId> {
        let mut current = self.root_id();
        for key in path {
            current = self.node(current).ok()?.children().get(*key)?;
        }
        Some(current)
    }

    /// Resolve a variation given as display labels, e.g. `["e4", "c5"]`.
    pub fn find_by_san<S: AsRef<str>>(&self, labels: &[S]) -> Option<NodeId> {
        let mut current = self.root_id();
        for label in labels {
            let node = self.node(current).ok()?;
            current = node.children().iter().find_map(|(_, child_id)| {
                let child = self.arena.get(child_id)?;
                (child.san() == label.as_ref()).then_some(child_id)
            })?;
        }
        Some(current)
    }

    /// Iterate over every node with its id, root first.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId::from(idx), node))
    }

    pub(crate) fn game_ref_of(&self, id: &str) -> Option<GameRef> {
        self.games.ref_of(id)
    }

    /// Games of a node keyed by id, for order independent comparison.
    fn game_set(&self, node: &Node) -> BTreeMap<&str, &GameSummary> {
        node.games()
            .iter()
            .filter_map(|game_ref| self.games.get(game_ref))
            .map(|summary| (summary.id.as_str(), summary))
            .collect()
    }

    fn same_subtree(&self, node_id: NodeId, other: &VariationTree, other_id: NodeId) -> bool {
        let (Some(left), Some(right)) = (self.arena.get(node_id), other.arena.get(other_id)) else {
            return false;
        };

        if left.position_key() != right.position_key()
            || left.san() != right.san()
            || left.child_count() != right.child_count()
            || self.game_set(left) != other.game_set(right)
        {
            return false;
        }

        left.children().iter().all(|(key, child_id)| {
            right
                .children()
                .get(key)
                .is_some_and(|other_child| self.same_subtree(child_id, other, other_child))
        })
    }
}

/// Structural equality: positions, labels, edges and game sets.
/// Arena layout and the order games were appended in do not matter.
impl PartialEq for VariationTree {
    fn eq(&self, other: &Self) -> bool {
        self.max_depth == other.max_depth
            && self.node_count() == other.node_count()
            && self.same_subtree(self.root_id(), other, other.root_id())
    }
}

impl Eq for VariationTree {}
