use std::{fmt, sync::Arc};

use openingtree_core::{ExtendReport, GameRecord, MoveEngine, VariationTree};
use tracing::{debug, info};

use crate::{BuildConfig, codec::TreeMetadata};

/// Monotonic build token. A build whose generation is no longer current is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn next(&self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-side reference to a build in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildHandle {
    generation: Generation,
    total: usize,
}

impl BuildHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of input games.
    pub fn total(&self) -> usize {
        self.total
    }
}

/// Progress published after each chunk.
#[derive(Debug, Clone)]
pub struct BuildProgress {
    pub generation: Generation,
    /// Input games consumed so far, including skipped ones. Never decreases.
    pub processed: usize,
    pub total: usize,
    pub skipped: usize,
    /// In-progress tree, present every `snapshot_every` chunks.
    /// Not pruned and not final.
    pub snapshot: Option<Arc<VariationTree>>,
}

/// A build that consumed its whole input: pruned once and ready to publish.
#[derive(Debug, Clone)]
pub struct FinishedBuild {
    pub generation: Generation,
    pub tree: VariationTree,
    pub metadata: TreeMetadata,
    pub report: ExtendReport,
}

/// Result of one scheduler tick.
#[derive(Debug, Clone)]
pub enum BuildStep {
    Progress(BuildProgress),
    Finished(FinishedBuild),
    /// The job already returned `Finished`.
    Idle,
}

/// A tree build split into chunks.
///
/// Each `tick` folds one chunk of games into the job's private tree and
/// returns, handing control back to the host. The tick after the input runs
/// out prunes the tree and finishes the job.
#[derive(Debug)]
pub struct BuildJob {
    generation: Generation,
    games: Vec<GameRecord>,
    cursor: usize,
    chunk_size: usize,
    snapshot_every: usize,
    chunks_done: usize,
    min_games: usize,
    tree: Option<VariationTree>,
    report: ExtendReport,
}

impl BuildJob {
    pub(crate) fn new(
        generation: Generation,
        games: Vec<GameRecord>,
        max_depth: usize,
        min_games: usize,
        config: &BuildConfig,
    ) -> Self {
        BuildJob {
            generation,
            games,
            cursor: 0,
            chunk_size: config.chunk_size.max(1),
            snapshot_every: config.snapshot_every.max(1),
            chunks_done: 0,
            min_games,
            tree: Some(VariationTree::new(max_depth)),
            report: ExtendReport::default(),
        }
    }

    pub fn handle(&self) -> BuildHandle {
        BuildHandle {
            generation: self.generation,
            total: self.games.len(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn processed(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.games.len()
    }

    pub fn is_finished(&self) -> bool {
        self.tree.is_none()
    }

    /// The tree as built so far. Unpruned, with frequencies still growing.
    pub fn partial_tree(&self) -> Option<&VariationTree> {
        self.tree.as_ref()
    }

    /// Advance the build by one chunk, or finish it once the input is consumed.
    pub fn tick<E>(&mut self, engine: &E) -> BuildStep
    where
        E: MoveEngine + ?Sized,
    {
        if self.cursor >= self.games.len() {
            return self.finish();
        }
        let Some(tree) = self.tree.as_mut() else {
            return BuildStep::Idle;
        };

        let end = (self.cursor + self.chunk_size).min(self.games.len());
        let chunk_report = tree.extend(&self.games[self.cursor..end], engine);
        self.report.absorb(chunk_report);
        self.cursor = end;
        self.chunks_done += 1;

        let snapshot = (self.chunks_done % self.snapshot_every == 0).then(|| Arc::new(tree.clone()));

        debug!(
            generation = %self.generation,
            processed = self.cursor,
            total = self.games.len(),
            "processed chunk"
        );

        BuildStep::Progress(BuildProgress {
            generation: self.generation,
            processed: self.cursor,
            total: self.games.len(),
            skipped: self.report.skipped.len(),
            snapshot,
        })
    }

    fn finish(&mut self) -> BuildStep {
        let Some(tree) = self.tree.take() else {
            return BuildStep::Idle;
        };

        let pruned = tree.pruned(self.min_games);
        let metadata = TreeMetadata::new(self.games.len(), tree.max_depth(), self.min_games);
        info!(
            generation = %self.generation,
            games = pruned.game_count(),
            skipped = self.report.skipped.len(),
            nodes = pruned.node_count(),
            max_depth = tree.max_depth(),
            min_games = self.min_games,
            "finished tree build"
        );

        BuildStep::Finished(FinishedBuild {
            generation: self.generation,
            tree: pruned,
            metadata,
            report: std::mem::take(&mut self.report),
        })
    }
}
