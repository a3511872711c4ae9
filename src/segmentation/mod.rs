//! Turns a per-pixel class prediction into per-class quantities.
//!
//! The segmentation model itself runs elsewhere; this module consumes its
//! output, a label image where each pixel holds a class id (0 = background).

pub mod components;
pub mod labels;

use image::GrayImage;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SegmentationError;
use crate::model::{CountingUnit, Observation};

pub use components::count_components;
pub use labels::LabelMap;

/// Row-major class id per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    width: u32,
    height: u32,
    labels: Vec<u8>,
}

impl ClassMap {
    pub fn new(width: u32, height: u32, labels: Vec<u8>) -> Result<Self, SegmentationError> {
        if labels.len() != width as usize * height as usize {
            return Err(SegmentationError::Dimensions {
                width,
                height,
                actual: labels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    /// Decodes an encoded label image (PNG, JPEG). Colour images are reduced
    /// to luma, so labels must be written as gray levels.
    pub fn decode(bytes: &[u8]) -> Result<Self, SegmentationError> {
        let image = image::load_from_memory(bytes)?.into_luma8();
        Ok(Self::from(image))
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, SegmentationError> {
        let image = image::open(path)?.into_luma8();
        Ok(Self::from(image))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Class id at `(x, y)`, `None` outside the map.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.labels.get(idx).copied()
    }
}

impl From<GrayImage> for ClassMap {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            labels: image.into_raw(),
        }
    }
}

/// Counts each mapped class in `map`, measured in `unit`.
///
/// Classes with no pixels (or no components) are left out; ids without a
/// mapping are ignored.
#[must_use]
pub fn count(map: &ClassMap, labels: &LabelMap, unit: CountingUnit) -> Observation {
    let per_id: BTreeMap<u8, u64> = match unit {
        CountingUnit::Pixels => {
            let mut histogram = BTreeMap::new();
            for &id in map.labels() {
                *histogram.entry(id).or_insert(0) += 1;
            }
            histogram
        }
        CountingUnit::Instances => count_components(map),
    };

    let mut observation = Observation::new(unit);
    for (id, n) in per_id {
        match labels.class_of(id) {
            Some(class) if n > 0 => observation.add(class, n),
            Some(_) => {}
            None => debug!(label = id, count = n, "unmapped label ignored"),
        }
    }
    observation
}
