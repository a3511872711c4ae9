//! TOML configuration.
//!
//! Every section has a default, so an empty file (or no file) reproduces the
//! metro deployment: three material classes, high-score merging, plans and
//! progress under `./data`.
//!
//! ```toml
//! data_dir = "/srv/metro/data"
//! policy = "additive"
//! on_corrupt_progress = "reset"
//! counting_unit = "pixels"
//!
//! [classes]
//! concreto = ["IfcWall", "IfcSlab", "IfcStair"]
//!
//! [[labels]]
//! id = 1
//! class = "concreto"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::accountant::{CorruptProgressPolicy, Policy};
use crate::error::ConfigError;
use crate::extract::ClassMapping;
use crate::model::CountingUnit;
use crate::segmentation::LabelMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `plano_base_*.json` and `progresso_*.json`.
    pub data_dir: PathBuf,
    pub policy: Policy,
    pub on_corrupt_progress: CorruptProgressPolicy,
    /// Unit used when counting segmentation masks.
    pub counting_unit: CountingUnit,
    /// Material class → IFC entity types counted for it.
    pub classes: BTreeMap<String, Vec<String>>,
    /// Segmentation label id → material class.
    pub labels: Vec<LabelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    pub id: u8,
    pub class: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            policy: Policy::default(),
            on_corrupt_progress: CorruptProgressPolicy::default(),
            counting_unit: CountingUnit::Instances,
            classes: ClassMapping::default().into_inner(),
            labels: LabelMap::default()
                .iter()
                .map(|(id, class)| LabelEntry {
                    id,
                    class: class.to_string(),
                })
                .collect(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn class_mapping(&self) -> ClassMapping {
        ClassMapping::new(self.classes.clone())
    }

    #[must_use]
    pub fn label_map(&self) -> LabelMap {
        LabelMap::new(self.labels.iter().map(|e| (e.id, e.class.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.policy, Policy::HighScore);
        assert_eq!(config.on_corrupt_progress, CorruptProgressPolicy::Fail);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.classes.len(), 3);
        assert_eq!(config.label_map().class_of(1), Some("concreto"));
    }

    #[test]
    fn overrides_policy_and_mapping() {
        let config = Config::from_toml(
            r#"
            policy = "additive"
            on_corrupt_progress = "reset"
            counting_unit = "pixels"

            [classes]
            madeira = ["IfcMember"]

            [[labels]]
            id = 4
            class = "madeira"
            "#,
        )
        .unwrap();

        assert_eq!(config.policy, Policy::Additive);
        assert_eq!(config.on_corrupt_progress, CorruptProgressPolicy::Reset);
        assert_eq!(config.counting_unit, CountingUnit::Pixels);
        assert_eq!(config.class_mapping().classes().collect::<Vec<_>>(), ["madeira"]);
        assert_eq!(config.label_map().class_of(4), Some("madeira"));
        assert_eq!(config.label_map().class_of(1), None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml("polcy = \"additive\"").is_err());
    }
}
