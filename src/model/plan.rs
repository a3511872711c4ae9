use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{class_key, CountingUnit, PLAN_KEY_PREFIX};

/// Key holding the plan-wide ceiling in `plano_base_{area}.json`.
pub const PLAN_TOTAL_KEY: &str = "total_elementos_geral";

/// Expected quantity ceiling per material class for one area.
///
/// Persisted as a flat object keyed by `total_<class>` plus
/// [`PLAN_TOTAL_KEY`]; the area id is the store key, not part of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlanDocument", into = "PlanDocument")]
pub struct BasePlan {
    pub area_id: String,
    pub expected: BTreeMap<String, u64>,
    pub expected_total: u64,
    /// `None` for plans written before units were recorded.
    pub unit: Option<CountingUnit>,
}

impl BasePlan {
    /// Builds a plan whose total is the sum of its class ceilings.
    #[must_use]
    pub fn new<I, K>(area_id: impl Into<String>, unit: Option<CountingUnit>, expected: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let expected: BTreeMap<String, u64> = expected
            .into_iter()
            .map(|(class, ceiling)| (class_key(class.as_ref()), ceiling))
            .collect();
        let expected_total = expected.values().sum();
        Self {
            area_id: area_id.into(),
            expected,
            expected_total,
            unit,
        }
    }

    /// Ceiling for a class; classes absent from the plan have ceiling 0.
    #[must_use]
    pub fn ceiling(&self, class: &str) -> u64 {
        self.expected.get(class).copied().unwrap_or(0)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.expected.keys().map(String::as_str)
    }
}

#[derive(Serialize, Deserialize)]
struct PlanDocument {
    #[serde(flatten)]
    classes: BTreeMap<String, u64>,
    #[serde(rename = "total_elementos_geral", default)]
    total: u64,
    #[serde(rename = "unidade", default, skip_serializing_if = "Option::is_none")]
    unit: Option<CountingUnit>,
}

impl From<PlanDocument> for BasePlan {
    fn from(doc: PlanDocument) -> Self {
        Self {
            area_id: String::new(),
            expected: doc
                .classes
                .into_iter()
                .map(|(key, ceiling)| (class_key(&key), ceiling))
                .collect(),
            expected_total: doc.total,
            unit: doc.unit,
        }
    }
}

impl From<BasePlan> for PlanDocument {
    fn from(plan: BasePlan) -> Self {
        Self {
            classes: plan
                .expected
                .into_iter()
                .map(|(class, ceiling)| (format!("{PLAN_KEY_PREFIX}{class}"), ceiling))
                .collect(),
            total: plan.expected_total,
            unit: plan.unit,
        }
    }
}
