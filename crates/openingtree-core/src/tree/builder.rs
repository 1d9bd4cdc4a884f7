use tracing::{debug, warn};

use crate::tree::{
    engine::{MoveEngine, Ply},
    error::{SourceDataError, TreeError},
    games::GameRecord,
    ids::NodeId,
    node::Node,
    variation_tree::VariationTree,
};

/// Outcome of one `extend` batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendReport {
    /// Games newly added to the tree.
    pub added: usize,
    /// Games whose id was already in the tree.
    pub duplicates: usize,
    /// Games skipped because their notation could not be replayed.
    pub skipped: Vec<SourceDataError>,
}

impl ExtendReport {
    /// Fold another batch report into this one.
    pub fn absorb(&mut self, other: ExtendReport) {
        self.added += other.added;
        self.duplicates += other.duplicates;
        self.skipped.extend(other.skipped);
    }
}

impl VariationTree {
    /// Add a batch of games, in input order.
    ///
    /// Each game is replayed for at most `max_depth` plies and attached to the
    /// root and to every node along its variation. A game id that is already in
    /// the tree is a no-op, which makes extending with the same batch twice
    /// idempotent. Unreadable notation skips only that game.
    pub fn extend<E>(&mut self, games: &[GameRecord], engine: &E) -> ExtendReport
    where
        E: MoveEngine + ?Sized,
    {
        let mut report = ExtendReport::default();

        for record in games {
            if self.game_ref_of(&record.id).is_some() {
                debug!(game_id = %record.id, "game already in tree, skipping");
                report.duplicates += 1;
                continue;
            }

            let plies = if self.max_depth == 0 {
                Vec::new()
            } else {
                match engine.replay(&record.moves, self.max_depth) {
                    Ok(plies) => plies,
                    Err(err) => {
                        let err = SourceDataError {
                            game_id: record.id.clone(),
                            reason: err.to_string(),
                        };
                        warn!(game_id = %record.id, error = %err, "skipping game with unreadable notation");
                        report.skipped.push(err);
                        continue;
                    }
                }
            };

            match self.insert_game(record, &plies) {
                Ok(()) => report.added += 1,
                Err(err) => {
                    warn!(game_id = %record.id, error = %err, "failed to attach game");
                    report.skipped.push(SourceDataError {
                        game_id: record.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Walk `plies` from the root, creating missing edges, and attach the game on the way.
    fn insert_game(&mut self, record: &GameRecord, plies: &[Ply]) -> Result<(), TreeError> {
        let game_ref = self.games.intern(record.summary());
        let mut current = self.root_id();
        self.node_mut(current)?.record_game(game_ref);

        for ply in plies.iter().take(self.max_depth) {
            let existing = self.node(current)?.children().get(ply.move_key);
            let next = match existing {
                Some(child_id) => child_id,
                None => self.allocate_child(current, ply)?,
            };
            self.node_mut(next)?.record_game(game_ref);
            current = next;
        }

        Ok(())
    }

    /// Allocate a child under `parent_id` for `ply` and register the edge.
    pub(crate) fn allocate_child(&mut self, parent_id: NodeId, ply: &Ply) -> Result<NodeId, TreeError> {
        let child = Node::child_of(
            parent_id,
            self.node(parent_id)?,
            ply.move_key,
            ply.position_key.clone(),
            ply.san.clone(),
        );
        let child_id = self.arena.allocate(child);
        self.node_mut(parent_id)?
            .children_mut()
            .insert(ply.move_key, child_id)
            .ok_or(TreeError::DuplicateEdge {
                node_id: parent_id,
                move_key: ply.move_key,
            })?;
        Ok(child_id)
    }
}
