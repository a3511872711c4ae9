pub mod csv;
pub mod json;

use crate::accountant::Accountant;
use crate::model::{BasePlan, ProgressRecord, ProgressResult};
use crate::store::RecordStore;

pub use crate::error::ExportError;
pub use csv::export_csv;
pub use json::export_json;

/// Current progress of every area that has a plan, sorted by area id.
pub fn collect_report<P, S>(accountant: &Accountant<P, S>) -> Result<Vec<ProgressResult>, ExportError>
where
    P: RecordStore<BasePlan>,
    S: RecordStore<ProgressRecord>,
{
    accountant
        .plans()
        .keys()?
        .iter()
        .map(|area_id| accountant.snapshot(area_id).map_err(ExportError::from))
        .collect()
}
