//! Boundary used by the web tier: one uploaded label image for one area in,
//! a [`ProgressResult`] or an `{ "error": ... }` body out.

use serde::Serialize;
use tracing::info_span;

use crate::accountant::Accountant;
use crate::error::ServiceError;
use crate::model::{BasePlan, CountingUnit, ProgressRecord, ProgressResult};
use crate::segmentation::{self, ClassMap, LabelMap};
use crate::store::RecordStore;

/// Error object returned to callers instead of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

pub struct ProgressService<P, S> {
    accountant: Accountant<P, S>,
    labels: LabelMap,
    unit: CountingUnit,
}

impl<P, S> ProgressService<P, S>
where
    P: RecordStore<BasePlan>,
    S: RecordStore<ProgressRecord>,
{
    #[must_use]
    pub fn new(accountant: Accountant<P, S>, labels: LabelMap, unit: CountingUnit) -> Self {
        Self {
            accountant,
            labels,
            unit,
        }
    }

    #[must_use]
    pub fn accountant(&self) -> &Accountant<P, S> {
        &self.accountant
    }

    /// Decodes `image` as a label map, counts it and records the result.
    pub fn analyze(&self, area_id: &str, image: &[u8]) -> Result<ProgressResult, ServiceError> {
        let _span = info_span!("analyze", area = %area_id, bytes = image.len()).entered();
        let map = ClassMap::decode(image)?;
        self.analyze_map(area_id, &map)
    }

    pub fn analyze_map(&self, area_id: &str, map: &ClassMap) -> Result<ProgressResult, ServiceError> {
        let observation = segmentation::count(map, &self.labels, self.unit);
        Ok(self.accountant.update(area_id, &observation)?)
    }

    /// [`Self::analyze`] with the error folded into the JSON body.
    #[must_use]
    pub fn analyze_json(&self, area_id: &str, image: &[u8]) -> serde_json::Value {
        let outcome = self.analyze(area_id, image);
        let body = match &outcome {
            Ok(result) => serde_json::to_value(result),
            Err(err) => serde_json::to_value(ErrorBody::from(err)),
        };
        body.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accountant::Policy;
    use crate::store::MemoryStore;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;

    fn service() -> ProgressService<MemoryStore<BasePlan>, MemoryStore<ProgressRecord>> {
        let plans = MemoryStore::new();
        plans
            .put(
                "plataforma",
                &BasePlan::new(
                    "plataforma",
                    Some(CountingUnit::Instances),
                    [("concreto", 4), ("metal", 2)],
                ),
            )
            .unwrap();
        let accountant = Accountant::new(plans, MemoryStore::new(), Policy::HighScore);
        ProgressService::new(accountant, LabelMap::default(), CountingUnit::Instances)
    }

    fn png(pixels: &[(u32, u32, u8)]) -> Vec<u8> {
        let mut image = GrayImage::new(8, 8);
        for &(x, y, label) in pixels {
            image.put_pixel(x, y, Luma([label]));
        }
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[test]
    fn counts_components_from_upload() {
        let image = png(&[(0, 0, 1), (5, 5, 1), (7, 0, 2)]);

        let result = service().analyze("Plataforma", &image).unwrap();

        assert_eq!(result.achieved.get("concreto"), Some(&2));
        assert_eq!(result.achieved.get("metal"), Some(&1));
        assert!((result.percentage_overall - 50.0).abs() < 1e-9);
    }

    #[test]
    fn errors_become_error_body() {
        let body = service().analyze_json("tunel", &png(&[]));

        assert_eq!(
            body,
            serde_json::json!({ "error": "base plan for area 'tunel' not found" })
        );
    }

    #[test]
    fn garbage_upload_is_a_decode_error() {
        let err = service().analyze("plataforma", b"not an image").unwrap_err();
        assert!(matches!(err, ServiceError::Segmentation(_)));
    }

    #[test]
    fn traversal_area_id_is_refused() {
        let body = service().analyze_json("../plataforma", &png(&[(0, 0, 1)]));

        assert_eq!(
            body,
            serde_json::json!({ "error": "invalid area id '../plataforma'" })
        );
    }
}
