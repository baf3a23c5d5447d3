use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A key-value store for durable bytes.
///
/// Storages know nothing about fixtures or JSON; encoding is handled by
/// [`FixtureStore`](crate::FixtureStore). A value is always replaced
/// wholesale, there are no partial writes.
///
/// All methods take `&self` to support storages with internal locking (e.g., RocksDB).
pub trait Storage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the bytes stored under `key`, or None if nothing was written yet.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Replaces the bytes stored under `key`.
    ///
    /// Returns only after the value is durable as far as the backend can tell.
    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;
}

impl<S: Storage + ?Sized> Storage for &S {
    type Error = S::Error;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        (**self).write(key, value)
    }
}

/// An in-memory storage backed by a HashMap.
///
/// Useful for testing and as a reference implementation.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that already holds `value` under `key`.
    pub fn with_value(key: &str, value: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage
            .data
            .write()
            .unwrap()
            .insert(key.to_string(), value.into());
        storage
    }
}

impl Storage for MemoryStorage {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirStorageError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A storage that keeps each key in its own `<key>.json` file under a directory.
///
/// Writes go to a temp file in the same directory which is synced and then
/// renamed over the target, so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Opens a directory storage at the given path.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirStorageError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| DirStorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DirStorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DirStorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Storage for DirStorage {
    type Error = DirStorageError;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DirStorageError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        let io_err = |source| DirStorageError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(value).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_storage_write_read() {
        let storage = MemoryStorage::new();

        storage.write("fixtures", b"[]").unwrap();
        let retrieved = storage.read("fixtures").unwrap();

        assert_eq!(retrieved, Some(b"[]".to_vec()));
    }

    #[test]
    fn memory_storage_read_missing() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.read("nonexistent").unwrap(), None);
    }

    #[test]
    fn memory_storage_overwrite() {
        let storage = MemoryStorage::with_value("fixtures", "first");

        storage.write("fixtures", b"second").unwrap();

        assert_eq!(storage.read("fixtures").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn dir_storage_persistence() {
        let dir = TempDir::new().unwrap();

        {
            let storage = DirStorage::open(dir.path()).unwrap();
            assert_eq!(storage.read("fixtures").unwrap(), None);
            storage.write("fixtures", b"[1,2]").unwrap();
        }

        let storage = DirStorage::open(dir.path()).unwrap();
        assert_eq!(storage.read("fixtures").unwrap(), Some(b"[1,2]".to_vec()));
        assert!(dir.path().join("fixtures.json").exists());
    }

    #[test]
    fn dir_storage_overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        storage.write("fixtures", b"[1]").unwrap();
        storage.write("fixtures", b"[1,2,3]").unwrap();

        assert_eq!(storage.read("fixtures").unwrap(), Some(b"[1,2,3]".to_vec()));
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["fixtures.json"]);
    }

    #[test]
    fn dir_storage_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let storage = DirStorage::open(&nested).unwrap();
        storage.write("fixtures", b"[]").unwrap();

        assert!(nested.join("fixtures.json").exists());
    }

    #[test]
    fn dir_storage_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        let err = storage.write("../escape", b"x").unwrap_err();
        assert!(matches!(err, DirStorageError::InvalidKey(_)));
        assert!(storage.read("").is_err());
    }
}
