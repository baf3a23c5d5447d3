use std::collections::HashSet;

use tracing::{debug, warn};

use crate::fixture::{Fixture, FixtureFields, FixtureId, ValidationError};
use crate::storage::Storage;

/// Storage key holding the JSON array of fixtures.
pub const FIXTURES_KEY: &str = "fixtures";

/// Error type for fixture store operations.
#[derive(Debug, thiserror::Error)]
pub enum FixtureStoreError {
    #[error("invalid fixture: {0}")]
    Validation(#[from] ValidationError),
    #[error("fixture not found: {0}")]
    NotFound(FixtureId),
    #[error("failed to encode fixtures: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("storage error: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Problem with the persisted collection found while opening the store.
///
/// Never fatal: the store falls back to what it could recover.
#[derive(Debug, thiserror::Error)]
pub enum DeserializationError {
    #[error("persisted fixtures are malformed, starting empty: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("persisted fixtures repeat ids, kept first occurrence of: {0:?}")]
    DuplicateIds(Vec<FixtureId>),
}

/// The authoritative list of fixtures for one session, mirrored to a [`Storage`].
///
/// The collection is read once in [`FixtureStore::open`] and written back in
/// full after every successful mutation. A mutation whose write fails leaves
/// the in-memory collection untouched.
pub struct FixtureStore<S> {
    storage: S,
    fixtures: Vec<Fixture>,
    load_warning: Option<DeserializationError>,
}

impl<S: Storage> FixtureStore<S> {
    /// Loads the persisted collection from `storage`.
    ///
    /// A missing value yields an empty store. Malformed data also yields an
    /// empty store, with the reason available from [`FixtureStore::load_warning`].
    /// Only a failing storage read is an error.
    pub fn open(storage: S) -> Result<Self, FixtureStoreError> {
        let raw = storage
            .read(FIXTURES_KEY)
            .map_err(|e| FixtureStoreError::Persistence(Box::new(e)))?;

        let (fixtures, load_warning) = match raw {
            None => (Vec::new(), None),
            Some(bytes) => decode(&bytes),
        };
        if let Some(warning) = &load_warning {
            warn!(%warning, "recovered from bad persisted fixtures");
        }
        debug!(count = fixtures.len(), "loaded fixtures");

        Ok(FixtureStore {
            storage,
            fixtures,
            load_warning,
        })
    }

    /// The problem found in persisted data at open time, if any.
    pub fn load_warning(&self) -> Option<&DeserializationError> {
        self.load_warning.as_ref()
    }

    /// All fixtures in insertion order.
    pub fn list(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn get(&self, id: &FixtureId) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id() == id)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Creates a fixture with a fresh id, appends it and persists.
    pub fn add(&mut self, fields: FixtureFields) -> Result<Fixture, FixtureStoreError> {
        fields.validate()?;

        let id = loop {
            let candidate = FixtureId::generate();
            if self.get(&candidate).is_none() {
                break candidate;
            }
        };
        let fixture = Fixture::new(id, fields);

        let mut next = self.fixtures.clone();
        next.push(fixture.clone());
        self.commit(next)?;

        debug!(id = %fixture.id(), "added fixture");
        Ok(fixture)
    }

    /// Replaces the editable fields of the fixture `id` in place and persists.
    pub fn update(
        &mut self,
        id: &FixtureId,
        fields: FixtureFields,
    ) -> Result<Fixture, FixtureStoreError> {
        fields.validate()?;

        let index = self
            .position(id)
            .ok_or_else(|| FixtureStoreError::NotFound(id.clone()))?;

        let mut next = self.fixtures.clone();
        next[index].apply(fields);
        let updated = next[index].clone();
        self.commit(next)?;

        debug!(%id, "updated fixture");
        Ok(updated)
    }

    /// Removes the fixture `id` and persists.
    ///
    /// Returns false without writing anything if there was no such fixture.
    pub fn delete(&mut self, id: &FixtureId) -> Result<bool, FixtureStoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.fixtures.clone();
        next.remove(index);
        self.commit(next)?;

        debug!(%id, "deleted fixture");
        Ok(true)
    }

    fn position(&self, id: &FixtureId) -> Option<usize> {
        self.fixtures.iter().position(|f| f.id() == id)
    }

    /// Writes `next` to storage, and only then makes it the visible collection.
    fn commit(&mut self, next: Vec<Fixture>) -> Result<(), FixtureStoreError> {
        let bytes = serde_json::to_vec(&next).map_err(FixtureStoreError::Serialize)?;
        if let Err(e) = self.storage.write(FIXTURES_KEY, &bytes) {
            warn!(error = %e, "failed to persist fixtures");
            return Err(FixtureStoreError::Persistence(Box::new(e)));
        }
        self.fixtures = next;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> (Vec<Fixture>, Option<DeserializationError>) {
    let parsed: Vec<Fixture> = match serde_json::from_slice(bytes) {
        Ok(parsed) => parsed,
        Err(e) => return (Vec::new(), Some(DeserializationError::Malformed(e))),
    };

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut fixtures = Vec::with_capacity(parsed.len());
    for fixture in parsed {
        if seen.insert(fixture.id().clone()) {
            fixtures.push(fixture);
        } else {
            duplicates.push(fixture.id().clone());
        }
    }

    let warning = (!duplicates.is_empty()).then(|| DeserializationError::DuplicateIds(duplicates));
    (fixtures, warning)
}
