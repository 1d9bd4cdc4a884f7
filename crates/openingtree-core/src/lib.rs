mod tree;

pub use tree::builder::ExtendReport;
pub use tree::engine::{EngineError, INITIAL_POSITION_KEY, MoveEngine, Ply};
pub use tree::error::{SourceDataError, TreeError};
pub use tree::games::{GameRecord, GameResult, GameSummary};
pub use tree::ids::{GameRef, MoveKey, MoveKeyParseError, NodeId, Promotion, Square, VariationId};
pub use tree::merge::merge;
pub use tree::node::Node;
pub use tree::snapshot::{NodeSnapshot, SNAPSHOT_SCHEMA_VERSION, TreeSnapshot};
pub use tree::variation_tree::VariationTree;
