use crate::error::ExportError;
use crate::model::result::percentage;
use crate::model::ProgressResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn export_csv<P: AsRef<Path>>(report: &[ProgressResult], path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    write_csv(report, file)
}

/// One row per area and class, then a `total` row per area.
pub fn write_csv<W: Write>(report: &[ProgressResult], out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(["Area", "Class", "Achieved", "Expected", "Percentage"])?;

    for area in report {
        for (class, expected) in &area.expected {
            let achieved = area.achieved.get(class).copied().unwrap_or(0);
            writer.write_record(&[
                area.area_id.clone(),
                class.clone(),
                achieved.to_string(),
                expected.to_string(),
                format!("{:.2}", percentage(achieved, *expected)),
            ])?;
        }
        writer.write_record(&[
            area.area_id.clone(),
            "total".to_string(),
            area.achieved_total.to_string(),
            area.expected_total.to_string(),
            format!("{:.2}", area.percentage_overall),
        ])?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
