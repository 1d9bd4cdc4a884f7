use std::fmt;

use openingtree_core::GameRecord;
use tracing::info;

use crate::codec::TreeMetadata;

/// Why a stored tree cannot serve the requested parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    MissingMetadata,
    LegacyFormat,
    GameCountChanged { recorded: usize, current: usize },
    /// Depth cannot be grown from a shallower tree.
    DepthTooShallow { recorded: usize, requested: usize },
    /// Pruned branches cannot be recovered.
    ThresholdTooHigh { recorded: usize, requested: usize },
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildReason::MissingMetadata => write!(f, "metadata is missing"),
            RebuildReason::LegacyFormat => write!(f, "payload uses the legacy format"),
            RebuildReason::GameCountChanged { recorded, current } => {
                write!(f, "game count changed from {recorded} to {current}")
            }
            RebuildReason::DepthTooShallow {
                recorded,
                requested,
            } => write!(f, "tree depth {recorded} is below requested {requested}"),
            RebuildReason::ThresholdTooHigh {
                recorded,
                requested,
            } => write!(
                f,
                "tree was pruned at {recorded} games, requested {requested}"
            ),
        }
    }
}

/// What to do with a stored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReusePlan {
    /// Parameters match exactly.
    Reuse,
    /// Deeper or less pruned than requested: cut it down locally.
    Reprune { max_depth: usize, min_games: usize },
    Rebuild(RebuildReason),
}

/// Decide between reusing, re-pruning and rebuilding a stored tree.
pub fn plan_reuse(
    metadata: Option<&TreeMetadata>,
    current_games: &[GameRecord],
    max_depth: usize,
    min_games: usize,
) -> ReusePlan {
    let plan = decide(metadata, current_games.len(), max_depth, min_games);
    if let ReusePlan::Rebuild(reason) = plan {
        info!(%reason, max_depth, min_games, "stored tree needs a rebuild");
    }
    plan
}

/// True when the stored tree cannot be reused, even by re-pruning.
pub fn should_rebuild(
    metadata: Option<&TreeMetadata>,
    current_games: &[GameRecord],
    max_depth: usize,
    min_games: usize,
) -> bool {
    matches!(
        plan_reuse(metadata, current_games, max_depth, min_games),
        ReusePlan::Rebuild(_)
    )
}

fn decide(
    metadata: Option<&TreeMetadata>,
    current: usize,
    max_depth: usize,
    min_games: usize,
) -> ReusePlan {
    let Some(metadata) = metadata else {
        return ReusePlan::Rebuild(RebuildReason::MissingMetadata);
    };
    if metadata.is_legacy_format {
        return ReusePlan::Rebuild(RebuildReason::LegacyFormat);
    }
    let (Some(recorded_games), Some(recorded_depth), Some(recorded_min)) =
        (metadata.game_count, metadata.max_depth, metadata.min_games)
    else {
        return ReusePlan::Rebuild(RebuildReason::MissingMetadata);
    };

    if recorded_games != current {
        return ReusePlan::Rebuild(RebuildReason::GameCountChanged {
            recorded: recorded_games,
            current,
        });
    }
    if recorded_depth < max_depth {
        return ReusePlan::Rebuild(RebuildReason::DepthTooShallow {
            recorded: recorded_depth,
            requested: max_depth,
        });
    }
    if recorded_min > min_games {
        return ReusePlan::Rebuild(RebuildReason::ThresholdTooHigh {
            recorded: recorded_min,
            requested: min_games,
        });
    }

    if recorded_depth == max_depth && recorded_min == min_games {
        ReusePlan::Reuse
    } else {
        ReusePlan::Reprune {
            max_depth,
            min_games,
        }
    }
}
