use thiserror::Error;

use crate::store::AnyStorageError;

#[derive(Debug, Error)]
pub enum HydError {
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] AnyStorageError),

    #[error(transparent)]
    Store(#[from] hydrant_core::FixtureStoreError),

    #[error(transparent)]
    Usage(#[from] hydrant_core::UsageError),

    #[error("Dataset {0} has no rows")]
    EmptyDataset(hydrant_core::DatasetKind),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}
