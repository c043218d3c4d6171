use serde::{Deserialize, Serialize};

use crate::types::RegionDescriptor;

/// Number of entries in a [`VocabularyVector`]
pub const VOCABULARY_LEN: usize = 10;

/// Field order of a [`VocabularyVector`]. Downstream labeling models depend on it.
pub const VOCABULARY_FIELDS: [&str; VOCABULARY_LEN] = [
    "area",
    "eccentricity",
    "equivalent_diameter",
    "extent",
    "major_axis_length",
    "minor_axis_length",
    "perimeter",
    "max_intensity",
    "mean_intensity",
    "min_intensity",
];

/// Fixed-order numeric encoding of a target region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocabularyVector(pub [f64; VOCABULARY_LEN]);

impl VocabularyVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of a named field, `None` for names outside [`VOCABULARY_FIELDS`]
    pub fn get(&self, field: &str) -> Option<f64> {
        VOCABULARY_FIELDS
            .iter()
            .position(|&name| name == field)
            .map(|i| self.0[i])
    }
}

pub fn encode(region: &RegionDescriptor) -> VocabularyVector {
    VocabularyVector([
        region.area,
        region.eccentricity,
        region.equivalent_diameter,
        region.extent,
        region.major_axis_length,
        region.minor_axis_length,
        region.perimeter,
        region.max_intensity,
        region.mean_intensity,
        region.min_intensity,
    ])
}
