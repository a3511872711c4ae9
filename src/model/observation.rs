use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::class_key;

/// Unit a quantity is measured in. Plans and observations must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountingUnit {
    /// Discrete elements: BIM element counts or connected components in a mask.
    #[default]
    #[serde(rename = "elementos", alias = "instances")]
    Instances,
    /// Raw per-pixel area.
    #[serde(rename = "pixels")]
    Pixels,
}

impl fmt::Display for CountingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instances => f.write_str("elements"),
            Self::Pixels => f.write_str("pixels"),
        }
    }
}

/// Quantities detected in a single photo, before merging into history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub unit: CountingUnit,
    pub counts: BTreeMap<String, u64>,
}

impl Observation {
    #[must_use]
    pub fn new(unit: CountingUnit) -> Self {
        Self {
            unit,
            counts: BTreeMap::new(),
        }
    }

    /// Builds an observation from raw `(class, count)` pairs. Class names are
    /// canonicalized and repeated classes are summed.
    #[must_use]
    pub fn from_counts<I, K>(unit: CountingUnit, counts: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut observation = Self::new(unit);
        for (class, count) in counts {
            observation.add(class.as_ref(), count);
        }
        observation
    }

    pub fn add(&mut self, class: &str, count: u64) {
        let entry = self.counts.entry(class_key(class)).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    #[must_use]
    pub fn with(mut self, class: &str, count: u64) -> Self {
        self.add(class, count);
        self
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().copied().fold(0, u64::saturating_add)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|&c| c == 0)
    }
}
