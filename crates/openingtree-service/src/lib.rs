mod codec;
mod config;
mod error;
mod invalidation;
mod replay;
mod scheduler;
mod service;
mod store;

pub use codec::{METADATA_SCHEMA_VERSION, TreeMetadata, decode, encode};
pub use config::BuildConfig;
pub use error::{ConfigError, DecodeError, ServiceError, StaleBuild, StoreError};
pub use invalidation::{RebuildReason, ReusePlan, plan_reuse, should_rebuild};
pub use replay::CoordinateEngine;
pub use scheduler::{BuildHandle, BuildJob, BuildProgress, BuildStep, FinishedBuild, Generation};
pub use service::{LoadOutcome, OpeningTreeService, ParameterChange, Publication};
pub use store::{ByteSlot, FileSlot, GameFile, GameStore, MemorySlot};
