use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{class_key, BasePlan};

/// Key holding the achieved total in `progresso_{area}.json`.
pub const PROGRESS_TOTAL_KEY: &str = "elementos_executados_geral";

/// Cumulative, plan-bounded achieved quantities for one area.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ProgressDocument", into = "ProgressDocument")]
pub struct ProgressRecord {
    pub area_id: String,
    pub achieved: BTreeMap<String, u64>,
    pub achieved_total: u64,
}

impl ProgressRecord {
    /// Fresh record: every class of the plan at zero.
    #[must_use]
    pub fn for_plan(plan: &BasePlan) -> Self {
        Self {
            area_id: plan.area_id.clone(),
            achieved: plan.classes().map(|c| (c.to_string(), 0)).collect(),
            achieved_total: 0,
        }
    }

    #[must_use]
    pub fn achieved(&self, class: &str) -> u64 {
        self.achieved.get(class).copied().unwrap_or(0)
    }

    /// Brings a record written against an older plan in line with `plan`:
    /// new classes start at zero and values above a lowered ceiling are clamped.
    pub fn align_with(&mut self, plan: &BasePlan) {
        for class in plan.classes() {
            self.achieved.entry(class.to_string()).or_insert(0);
        }
        for (class, value) in &mut self.achieved {
            *value = (*value).min(plan.ceiling(class));
        }
        self.recompute_total();
    }

    /// Sums every known class, not only those touched by the last update.
    pub fn recompute_total(&mut self) {
        self.achieved_total = self.achieved.values().sum();
    }
}

#[derive(Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(flatten)]
    classes: BTreeMap<String, u64>,
    #[serde(rename = "elementos_executados_geral", default)]
    total: u64,
}

impl From<ProgressDocument> for ProgressRecord {
    fn from(doc: ProgressDocument) -> Self {
        Self {
            area_id: String::new(),
            achieved: doc
                .classes
                .into_iter()
                .map(|(key, value)| (class_key(&key), value))
                .collect(),
            achieved_total: doc.total,
        }
    }
}

impl From<ProgressRecord> for ProgressDocument {
    fn from(record: ProgressRecord) -> Self {
        Self {
            classes: record.achieved,
            total: record.achieved_total,
        }
    }
}
