//! RocksDB-backed storage for Hydrant.

use std::path::Path;

use hydrant_core::Storage;
use rocksdb::{DB, Options, WriteOptions};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("RocksDB error: {0}")]
pub struct RocksError(#[from] rocksdb::Error);

/// A persistent storage backed by RocksDB.
pub struct RocksStorage {
    db: DB,
}

impl RocksStorage {
    /// Opens a RocksDB storage at the given path.
    ///
    /// Creates the database if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RocksError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }
}

impl Storage for RocksStorage {
    type Error = RocksError;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.db.get(key.as_bytes())?)
    }

    /// Writes are synced to the WAL before returning.
    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        self.db.put_opt(key.as_bytes(), value, &opts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydrant_core::{FixtureFields, FixtureStore, FixtureType};
    use tempfile::TempDir;

    fn temp_storage() -> (RocksStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = RocksStorage::open(dir.path()).unwrap();
        (storage, dir)
    }

    #[test]
    fn write_read() {
        let (storage, _dir) = temp_storage();

        storage.write("fixtures", b"[]").unwrap();

        assert_eq!(storage.read("fixtures").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn read_missing() {
        let (storage, _dir) = temp_storage();

        assert_eq!(storage.read("nonexistent").unwrap(), None);
    }

    #[test]
    fn persistence() {
        let dir = TempDir::new().unwrap();
        let value = b"data survives restart";

        {
            let storage = RocksStorage::open(dir.path()).unwrap();
            storage.write("fixtures", value).unwrap();
        }

        {
            let storage = RocksStorage::open(dir.path()).unwrap();
            assert_eq!(storage.read("fixtures").unwrap(), Some(value.to_vec()));
        }
    }

    #[test]
    fn fixture_store_session() {
        let dir = TempDir::new().unwrap();

        let added = {
            let mut store = FixtureStore::open(RocksStorage::open(dir.path()).unwrap()).unwrap();
            store
                .add(FixtureFields::new("Garden Tap Washer", FixtureType::WashingMachine, "Garage"))
                .unwrap()
        };

        let store = FixtureStore::open(RocksStorage::open(dir.path()).unwrap()).unwrap();
        assert_eq!(store.list(), [added]);
    }
}
