use dashmap::DashMap;

use super::RecordStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct MemoryStore<R> {
    records: DashMap<String, R>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl<R> MemoryStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R> RecordStore<R> for MemoryStore<R>
where
    R: Clone + Send + Sync,
{
    fn get(&self, area_id: &str) -> Result<Option<R>, StoreError> {
        Ok(self.records.get(area_id).map(|r| r.value().clone()))
    }

    fn put(&self, area_id: &str, record: &R) -> Result<(), StoreError> {
        self.records.insert(area_id.to_string(), record.clone());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.records.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}
