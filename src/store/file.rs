use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::RecordStore;
use crate::error::StoreError;
use crate::model::{is_valid_area_id, BasePlan, ProgressRecord};

pub const PLAN_FILE_PREFIX: &str = "plano_base_";
pub const PROGRESS_FILE_PREFIX: &str = "progresso_";

/// One pretty-printed JSON document per area: `{dir}/{prefix}{area_id}.json`.
#[derive(Debug)]
pub struct JsonFileStore<R> {
    dir: PathBuf,
    prefix: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for JsonFileStore<R> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            prefix: self.prefix,
            _record: PhantomData,
        }
    }
}

impl JsonFileStore<BasePlan> {
    #[must_use]
    pub fn plans<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir, PLAN_FILE_PREFIX)
    }
}

impl JsonFileStore<ProgressRecord> {
    #[must_use]
    pub fn progress<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir, PROGRESS_FILE_PREFIX)
    }
}

impl<R> JsonFileStore<R> {
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &'static str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix,
            _record: PhantomData,
        }
    }

    pub fn path_for(&self, area_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_area_id(area_id) {
            return Err(StoreError::InvalidKey {
                key: area_id.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}{area_id}.json", self.prefix)))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl<R> RecordStore<R> for JsonFileStore<R>
where
    R: Serialize + DeserializeOwned,
{
    fn get(&self, area_id: &str) -> Result<Option<R>, StoreError> {
        let path = self.path_for(area_id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: area_id.to_string(),
                source,
            })
    }

    fn put(&self, area_id: &str, record: &R) -> Result<(), StoreError> {
        let path = self.path_for(area_id)?;
        let json = serde_json::to_string_pretty(record)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        // Write beside the target and rename so readers never see half a file.
        let tmp = self.dir.join(format!(".{}{area_id}.json.tmp", self.prefix));
        std::fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "record written");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let key = name.strip_prefix(self.prefix)?.strip_suffix(".json")?;
                Some(key.to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountingUnit;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::plans(dir.path());

        assert!(store.get("plataforma").unwrap().is_none());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn writes_reference_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::plans(dir.path());
        let plan = BasePlan::new("plataforma", Some(CountingUnit::Instances), [("metal", 2)]);

        store.put("plataforma", &plan).unwrap();

        assert!(dir.path().join("plano_base_plataforma.json").exists());
        assert_eq!(store.keys().unwrap(), ["plataforma"]);

        let loaded = store.get("plataforma").unwrap().unwrap();
        assert_eq!(loaded.expected, plan.expected);
        assert_eq!(loaded.expected_total, 2);
    }

    #[test]
    fn plan_and_progress_files_share_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let plans = JsonFileStore::plans(dir.path());
        let progress = JsonFileStore::progress(dir.path());
        let plan = BasePlan::new("mezanino", None, [("metal", 2)]);

        plans.put("mezanino", &plan).unwrap();
        progress
            .put("acesso", &ProgressRecord::for_plan(&plan))
            .unwrap();

        assert_eq!(plans.keys().unwrap(), ["mezanino"]);
        assert_eq!(progress.keys().unwrap(), ["acesso"]);
    }

    #[test]
    fn unparsable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("progresso_a.json"), "{ not json").unwrap();
        let store = JsonFileStore::progress(dir.path());

        let err = store.get("a").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "a"));
    }

    #[test]
    fn keys_outside_the_directory_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let store = JsonFileStore::plans(&data);
        let plan = BasePlan::new("x", None, [("metal", 1)]);

        for key in ["x/../../escape", "..", "a\\b"] {
            assert!(matches!(
                store.put(key, &plan),
                Err(StoreError::InvalidKey { .. })
            ));
            assert!(matches!(store.get(key), Err(StoreError::InvalidKey { .. })));
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!data.exists());
    }
}
