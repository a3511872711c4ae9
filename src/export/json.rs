use crate::error::ExportError;
use crate::model::result::percentage;
use crate::model::ProgressResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Site-wide roll-up written by [`export_json`].
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub achieved_total: u64,
    pub expected_total: u64,
    pub percentage_overall: f64,
    pub areas: &'a [ProgressResult],
}

impl<'a> ReportDocument<'a> {
    #[must_use]
    pub fn new(areas: &'a [ProgressResult]) -> Self {
        let achieved_total = areas.iter().map(|a| a.achieved_total).sum();
        let expected_total = areas.iter().map(|a| a.expected_total).sum();
        Self {
            achieved_total,
            expected_total,
            percentage_overall: percentage(achieved_total, expected_total),
            areas,
        }
    }
}

pub fn export_json<P: AsRef<Path>>(report: &[ProgressResult], path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &ReportDocument::new(report))?;
    out.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn area(id: &str, achieved: u64, expected: u64) -> ProgressResult {
        ProgressResult {
            area_id: id.into(),
            percentage_overall: percentage(achieved, expected),
            percentage_this_photo: 0.0,
            achieved_total: achieved,
            expected_total: expected,
            achieved: BTreeMap::new(),
            expected: BTreeMap::new(),
        }
    }

    #[test]
    fn rolls_up_every_area() {
        let areas = [area("plataforma", 4, 15), area("mezanino", 6, 5)];
        let doc = ReportDocument::new(&areas);

        assert_eq!(doc.achieved_total, 10);
        assert_eq!(doc.expected_total, 20);
        assert!((doc.percentage_overall - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn writes_document_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        export_json(&[area("plataforma", 1, 2)], &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["areas"][0]["area_id"], "plataforma");
        assert_eq!(value["percentage_overall"], 50.0);
    }
}
