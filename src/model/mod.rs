pub mod observation;
pub mod plan;
pub mod progress;
pub mod result;

pub use observation::{CountingUnit, Observation};
pub use plan::BasePlan;
pub use progress::ProgressRecord;
pub use result::ProgressResult;

/// Prefix the extractor puts on plan keys (`total_concreto`).
pub const PLAN_KEY_PREFIX: &str = "total_";

/// Canonical material-class name: trimmed, without the plan key prefix.
#[must_use]
pub fn class_key(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix(PLAN_KEY_PREFIX).unwrap_or(name).to_string()
}

/// Canonical area id: folder names arrive with arbitrary case and padding.
#[must_use]
pub fn normalize_area_id(area_id: &str) -> String {
    area_id.trim().to_lowercase()
}

/// Area ids become file names, so they must be a single path component.
#[must_use]
pub fn is_valid_area_id(area_id: &str) -> bool {
    !area_id.is_empty()
        && area_id != "."
        && area_id != ".."
        && !area_id
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
}
