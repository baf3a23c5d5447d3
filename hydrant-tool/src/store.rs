use std::path::{Path, PathBuf};

use hydrant_core::{DirStorage, FixtureStore, Storage};
use hydrant_rocks::RocksStorage;
use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnyStorageError {
    #[error("directory storage error: {0}")]
    Dir(#[from] hydrant_core::DirStorageError),
    #[error("rocks error: {0}")]
    Rocks(#[from] hydrant_rocks::RocksError),
}

/// Which backend holds the fixture collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// One JSON file per key under a directory
    #[default]
    #[serde(alias = "json")]
    #[value(alias = "json")]
    Dir,
    /// A RocksDB database
    #[serde(alias = "rocksdb")]
    #[value(alias = "rocksdb")]
    Rocks,
}

pub enum AnyStorage {
    Dir(DirStorage),
    Rocks(RocksStorage),
}

impl AnyStorage {
    pub fn open(storage_type: StorageType, path: impl AsRef<Path>) -> Result<Self, AnyStorageError> {
        match storage_type {
            StorageType::Dir => Ok(Self::Dir(DirStorage::open(path)?)),
            StorageType::Rocks => Ok(Self::Rocks(RocksStorage::open(path)?)),
        }
    }
}

impl Storage for AnyStorage {
    type Error = AnyStorageError;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            AnyStorage::Dir(s) => s.read(key).map_err(Into::into),
            AnyStorage::Rocks(s) => s.read(key).map_err(Into::into),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        match self {
            AnyStorage::Dir(s) => s.write(key, value).map_err(Into::into),
            AnyStorage::Rocks(s) => s.write(key, value).map_err(Into::into),
        }
    }
}

pub fn open_fixture_store(
    storage_type: StorageType,
    path: &Path,
) -> Result<FixtureStore<AnyStorage>, crate::error::HydError> {
    tracing::debug!(?storage_type, path = %path.display(), "opening fixture storage");
    let storage = AnyStorage::open(storage_type, path)?;
    Ok(FixtureStore::open(storage)?)
}

pub fn default_storage_path(storage_type: StorageType) -> PathBuf {
    let leaf = match storage_type {
        StorageType::Dir => "fixtures",
        StorageType::Rocks => "rocks",
    };
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hydrant")
        .join(leaf)
}
