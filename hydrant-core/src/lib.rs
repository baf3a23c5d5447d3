//! Hydrant keeps a household's registry of water fixtures and reads the
//! simulated usage datasets they are charted against.
//!
//! Core concepts:
//! - **Fixture**: a user-declared sink, toilet, shower or appliance with a name and location
//! - **Storage**: a durable key-value backend holding raw bytes
//! - **FixtureStore**: the ordered fixture collection, mirrored in full to a storage on every change
//! - **Dataset**: rows of a current, forecast or anomaly usage CSV
//! - **Window**: the span of time a usage query covers
//! - **DemoLog**: recorded water events plus simulated toilet flushes
//!
//! # Example
//!
//! ```
//! use hydrant_core::{FixtureFields, FixtureStore, FixtureType, MemoryStorage};
//!
//! let mut store = FixtureStore::open(MemoryStorage::new()).unwrap();
//!
//! let sink = store
//!     .add(FixtureFields::new("Kitchen Sink", FixtureType::KitchenSink, "Kitchen"))
//!     .unwrap();
//! assert_eq!(store.list().len(), 1);
//!
//! store.delete(sink.id()).unwrap();
//! assert!(store.is_empty());
//! ```

mod anomaly;
mod demo;
mod fixture;
mod fixture_store;
mod storage;
mod usage;
mod window;

pub use anomaly::{AnomalyDay, AnomalyEntry, anomalous_total, group_anomalies};
pub use demo::{DemoEvent, DemoLog, simulate_toilet_event};
pub use fixture::{Fixture, FixtureFields, FixtureId, FixtureType, ValidationError};
pub use fixture_store::{DeserializationError, FIXTURES_KEY, FixtureStore, FixtureStoreError};
pub use storage::{DirStorage, DirStorageError, MemoryStorage, Storage};
pub use usage::{
    DailyUsage, Dataset, DatasetKind, DeviceFilter, KNOWN_DEVICES, UsageError, UsageRecord,
    aggregate_by_day, display_device_name, total_litres,
};
pub use window::{ForecastHorizon, TrailingRange, UnknownRange, Window};
