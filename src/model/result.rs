use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one accountant update, returned to the web tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    pub area_id: String,
    /// Merged progress against the plan total, 0-100.
    pub percentage_overall: f64,
    /// Raw detections of this photo alone against the plan total; not
    /// clamped per class and not merged with history.
    pub percentage_this_photo: f64,
    pub achieved_total: u64,
    pub expected_total: u64,
    pub achieved: BTreeMap<String, u64>,
    pub expected: BTreeMap<String, u64>,
}

/// `part / total * 100` rounded to two decimals; an empty plan counts as 1.
#[must_use]
pub fn percentage(part: u64, total: u64) -> f64 {
    let total = total.max(1) as f64;
    let raw = part as f64 / total * 100.0;
    (raw * 100.0).round() / 100.0
}
