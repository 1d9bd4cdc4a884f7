use openingtree_core::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Stored payload could not be turned back into a tree.
pub enum DecodeError {
    #[error("payload is not a valid tree document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported metadata schema version {found}, expected {expected}")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("stored tree is inconsistent: {0}")]
    Tree(#[from] TreeError),

    #[error("metadata records {field} {recorded} but the stored tree has {actual}")]
    MetadataMismatch {
        field: &'static str,
        recorded: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
/// Error type for game stores and byte slots.
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse stored games: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
/// Error type for loading and validating `BuildConfig`.
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid build config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("build {stale} finished after build {current} superseded it")]
/// A superseded build completed. Logged and dropped, never returned to callers.
pub struct StaleBuild {
    pub stale: u64,
    pub current: u64,
}

#[derive(Debug, Error)]
/// Error type for the tree service.
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode tree: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("build {generation} has already been completed")]
    JobExhausted { generation: u64 },
}
