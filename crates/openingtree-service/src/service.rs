use std::sync::Arc;

use openingtree_core::{GameRecord, MoveEngine, VariationTree};
use tracing::{debug, info, warn};

use crate::{
    BuildConfig, ServiceError, StaleBuild,
    codec::{TreeMetadata, decode, encode},
    invalidation::{ReusePlan, plan_reuse},
    scheduler::{BuildJob, BuildProgress, BuildStep, FinishedBuild, Generation},
    store::{ByteSlot, GameStore},
};

/// What `complete` did with a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    Published { generation: Generation },
    /// A newer build or parameter change superseded this one.
    Discarded {
        generation: Generation,
        current: Generation,
    },
}

/// Result of `apply_parameters`.
#[derive(Debug)]
pub enum ParameterChange {
    Unchanged,
    Repruned,
    Rebuild(BuildJob),
}

/// Result of `load`.
#[derive(Debug)]
pub enum LoadOutcome {
    Reused,
    Repruned,
    Rebuild(BuildJob),
}

#[derive(Debug, Clone)]
struct PublishedTree {
    tree: Arc<VariationTree>,
    metadata: TreeMetadata,
}

/// Owns the published opening tree and coordinates builds, re-prunes and persistence.
///
/// There is a single writer: builds run as `BuildJob`s driven by the host, and
/// only `complete` publishes their result. The published tree is never mutated;
/// every change replaces it.
#[derive(Debug)]
pub struct OpeningTreeService<S, B> {
    store: S,
    slot: B,
    config: BuildConfig,
    generation: Generation,
    published: Option<PublishedTree>,
}

impl<S, B> OpeningTreeService<S, B>
where
    S: GameStore,
    B: ByteSlot,
{
    pub fn new(store: S, slot: B, config: BuildConfig) -> Self {
        OpeningTreeService {
            store,
            slot,
            config,
            generation: Generation::default(),
            published: None,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn slot(&self) -> &B {
        &self.slot
    }

    /// Generation of the latest build or parameter change.
    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    pub fn current_tree(&self) -> Option<Arc<VariationTree>> {
        self.published.as_ref().map(|published| Arc::clone(&published.tree))
    }

    pub fn current_metadata(&self) -> Option<TreeMetadata> {
        self.published.as_ref().map(|published| published.metadata.clone())
    }

    /// Start a build over `games`. Any build still in flight becomes stale.
    pub fn build(&mut self, games: Vec<GameRecord>, max_depth: usize, min_games: usize) -> BuildJob {
        self.generation = self.generation.next();
        info!(
            generation = %self.generation,
            games = games.len(),
            max_depth,
            min_games,
            "starting tree build"
        );
        BuildJob::new(self.generation, games, max_depth, min_games, &self.config)
    }

    /// Start a build over everything the game store holds.
    pub fn rebuild(&mut self, max_depth: usize, min_games: usize) -> Result<BuildJob, ServiceError> {
        let games = self.store.list()?;
        Ok(self.build(games, max_depth, min_games))
    }

    /// Start a build over the game store with the configured depth and threshold.
    pub fn rebuild_default(&mut self) -> Result<BuildJob, ServiceError> {
        self.rebuild(self.config.max_depth, self.config.min_games)
    }

    /// Publish and persist a finished build, unless it has been superseded.
    pub fn complete(&mut self, finished: FinishedBuild) -> Result<Publication, ServiceError> {
        if finished.generation != self.generation {
            let race = StaleBuild {
                stale: finished.generation.value(),
                current: self.generation.value(),
            };
            debug!(%race, "discarding superseded build");
            return Ok(Publication::Discarded {
                generation: finished.generation,
                current: self.generation,
            });
        }

        self.publish(finished.tree, finished.metadata, true)?;
        Ok(Publication::Published {
            generation: finished.generation,
        })
    }

    /// Drive `job` to the end, calling `on_progress` after every chunk, then complete it.
    pub fn run<E, F>(
        &mut self,
        mut job: BuildJob,
        engine: &E,
        mut on_progress: F,
    ) -> Result<Publication, ServiceError>
    where
        E: MoveEngine + ?Sized,
        F: FnMut(&BuildProgress),
    {
        loop {
            match job.tick(engine) {
                BuildStep::Progress(progress) => on_progress(&progress),
                BuildStep::Finished(finished) => return self.complete(finished),
                BuildStep::Idle => {
                    return Err(ServiceError::JobExhausted {
                        generation: job.generation().value(),
                    });
                }
            }
        }
    }

    /// Switch to new parameters, re-pruning the published tree when it allows it.
    pub fn apply_parameters(
        &mut self,
        max_depth: usize,
        min_games: usize,
    ) -> Result<ParameterChange, ServiceError> {
        let games = self.store.list()?;
        let plan = plan_reuse(
            self.published.as_ref().map(|published| &published.metadata),
            &games,
            max_depth,
            min_games,
        );

        match plan {
            ReusePlan::Reuse => {
                self.generation = self.generation.next();
                Ok(ParameterChange::Unchanged)
            }
            ReusePlan::Reprune {
                max_depth,
                min_games,
            } => {
                let Some(published) = self.published.clone() else {
                    return Ok(ParameterChange::Rebuild(self.build(games, max_depth, min_games)));
                };
                self.generation = self.generation.next();
                self.reprune(&published.tree, &published.metadata, max_depth, min_games)?;
                Ok(ParameterChange::Repruned)
            }
            ReusePlan::Rebuild(_) => Ok(ParameterChange::Rebuild(self.build(
                games, max_depth, min_games,
            ))),
        }
    }

    /// Restore the persisted tree if it can serve the parameters, otherwise start a rebuild.
    /// An unreadable payload is discarded.
    pub fn load(&mut self, max_depth: usize, min_games: usize) -> Result<LoadOutcome, ServiceError> {
        let games = self.store.list()?;

        let decoded = match self.slot.load()? {
            None => None,
            Some(bytes) => match decode(&bytes) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable persisted tree");
                    self.slot.clear()?;
                    None
                }
            },
        };

        let plan = plan_reuse(
            decoded.as_ref().map(|(_, metadata)| metadata),
            &games,
            max_depth,
            min_games,
        );

        match (plan, decoded) {
            (ReusePlan::Reuse, Some((tree, metadata))) => {
                self.generation = self.generation.next();
                self.publish(tree, metadata, false)?;
                Ok(LoadOutcome::Reused)
            }
            (
                ReusePlan::Reprune {
                    max_depth,
                    min_games,
                },
                Some((tree, metadata)),
            ) => {
                self.generation = self.generation.next();
                self.reprune(&tree, &metadata, max_depth, min_games)?;
                Ok(LoadOutcome::Repruned)
            }
            _ => Ok(LoadOutcome::Rebuild(self.build(games, max_depth, min_games))),
        }
    }

    /// `load` with the configured depth and threshold.
    pub fn load_default(&mut self) -> Result<LoadOutcome, ServiceError> {
        self.load(self.config.max_depth, self.config.min_games)
    }

    /// Persist the published tree into the slot.
    pub fn save(&mut self) -> Result<(), ServiceError> {
        let Some(published) = &self.published else {
            return Ok(());
        };
        let bytes = encode(&published.tree, &published.metadata).map_err(ServiceError::Encode)?;
        self.slot.save(&bytes)?;
        Ok(())
    }

    fn reprune(
        &mut self,
        tree: &VariationTree,
        metadata: &TreeMetadata,
        max_depth: usize,
        min_games: usize,
    ) -> Result<(), ServiceError> {
        let repruned = tree.truncated(max_depth).pruned(min_games);
        info!(
            max_depth,
            min_games,
            nodes = repruned.node_count(),
            "re-pruned published tree"
        );
        self.publish(repruned, metadata.with_parameters(max_depth, min_games), true)
    }

    fn publish(
        &mut self,
        tree: VariationTree,
        metadata: TreeMetadata,
        persist: bool,
    ) -> Result<(), ServiceError> {
        self.published = Some(PublishedTree {
            tree: Arc::new(tree),
            metadata,
        });
        if persist {
            self.save()?;
        }
        Ok(())
    }
}
