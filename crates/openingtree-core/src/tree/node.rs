use crate::tree::{
    children::Children,
    games::GameList,
    ids::{GameRef, MoveKey, NodeId, VariationId},
};

#[derive(Debug, Clone)]
/// represents one position reached by a variation.
/// Holds the edges to its continuations and the games that passed through it.
pub struct Node {
    position_key: String,
    san: String,
    depth: usize,
    parent: Option<(NodeId, MoveKey)>,
    variation_id: VariationId,
    children: Children,
    games: GameList,
}

impl Node {
    /// Create the synthetic root for `position_key`.
    pub(crate) fn root(position_key: String) -> Self {
        Node {
            position_key,
            san: String::new(),
            depth: 0,
            parent: None,
            variation_id: VariationId::root(),
            children: Children::new(),
            games: GameList::new(),
        }
    }

    /// Create a node reached from `parent` by playing `key`.
    pub(crate) fn child_of(
        parent_id: NodeId,
        parent: &Node,
        key: MoveKey,
        position_key: String,
        san: String,
    ) -> Self {
        Node {
            position_key,
            san,
            depth: parent.depth + 1,
            parent: Some((parent_id, key)),
            variation_id: parent.variation_id.child(key),
            children: Children::new(),
            games: GameList::new(),
        }
    }

    /// Canonical board state after the variation, e.g. a FEN string.
    pub fn position_key(&self) -> &str {
        &self.position_key
    }

    /// Display label of the last move; empty on the root.
    pub fn san(&self) -> &str {
        &self.san
    }

    /// Number of distinct games through this node.
    pub fn frequency(&self) -> usize {
        self.games.len()
    }

    /// Plies from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Parent node and the move leading here, `None` for the root.
    pub fn parent(&self) -> Option<(NodeId, MoveKey)> {
        self.parent
    }

    /// Move that leads into this node.
    pub fn move_key(&self) -> Option<MoveKey> {
        self.parent.map(|(_, key)| key)
    }

    pub fn variation_id(&self) -> &VariationId {
        &self.variation_id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub(crate) fn games(&self) -> &GameList {
        &self.games
    }

    /// Attach a game. Re-adding a game already present is a no-op.
    pub(crate) fn record_game(&mut self, game_ref: GameRef) -> bool {
        self.games.insert(game_ref)
    }
}
