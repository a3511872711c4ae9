//! Keyed persistence for plans and progress records.
//!
//! The accountant only sees [`RecordStore`]; the JSON-file backend reproduces
//! the on-disk layout of the field deployment, the in-memory one is for tests
//! and embedding.

pub mod file;
pub mod locks;
pub mod memory;

use std::sync::Arc;

pub use crate::error::StoreError;
pub use file::{JsonFileStore, PLAN_FILE_PREFIX, PROGRESS_FILE_PREFIX};
pub use locks::AreaLocks;
pub use memory::MemoryStore;

/// `get` / `put` by area id. A `put` fully replaces the stored record.
pub trait RecordStore<R>: Send + Sync {
    fn get(&self, area_id: &str) -> Result<Option<R>, StoreError>;

    fn put(&self, area_id: &str, record: &R) -> Result<(), StoreError>;

    /// Area ids with a stored record, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<R, T> RecordStore<R> for Arc<T>
where
    T: RecordStore<R> + ?Sized,
{
    fn get(&self, area_id: &str) -> Result<Option<R>, StoreError> {
        (**self).get(area_id)
    }

    fn put(&self, area_id: &str, record: &R) -> Result<(), StoreError> {
        (**self).put(area_id, record)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
