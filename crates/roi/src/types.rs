use image::{GrayImage, ImageBuffer, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use crate::error::StageError;

/// Real-valued grayscale input image
pub type IntensityImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Thresholded foreground mask, 255 = foreground, 0 = background
pub type BinaryMask = GrayImage;

/// Blob labels, 0 = background
pub type LabelMap = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Pixel value written into a [`BinaryMask`] for foreground pixels
pub const FOREGROUND: u8 = 255;

/// Axis-aligned bounding box in pixel coordinates. `max_row`/`max_col` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl BoundingBox {
    pub fn height(&self) -> u32 {
        self.max_row - self.min_row
    }

    pub fn width(&self) -> u32 {
        self.max_col - self.min_col
    }

    pub fn area(&self) -> u32 {
        self.height() * self.width()
    }
}

/// Geometric and intensity measurements of one labeled blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Blob id in the label map this region was measured from
    pub label: u32,
    pub area: f64,
    /// 0 for a circle, approaching 1 for a line
    pub eccentricity: f64,
    /// (row, col)
    pub centroid: (f64, f64),
    pub bbox: BoundingBox,
    pub equivalent_diameter: f64,
    pub extent: f64,
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    pub perimeter: f64,
    pub max_intensity: f64,
    pub mean_intensity: f64,
    pub min_intensity: f64,
}

impl RegionDescriptor {
    pub fn centroid_row(&self) -> f64 {
        self.centroid.0
    }

    pub fn centroid_col(&self) -> f64 {
        self.centroid.1
    }

    /// Euclidean distance from the centroid to a (row, col) point
    pub fn distance_to(&self, point: (f64, f64)) -> f64 {
        let dr = self.centroid.0 - point.0;
        let dc = self.centroid.1 - point.1;
        (dr * dr + dc * dc).sqrt()
    }
}

/// Tunable thresholds of the target region heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SelectionThresholds {
    /// Regions with a smaller pixel area are discarded as noise
    pub area_threshold: f64,
    /// Regions at or above this eccentricity are discarded as line artifacts
    #[schemars(range(min = 0.0, max = 1.0))]
    pub eccentricity_threshold: f64,
    /// Maximum column-centroid distance for two regions to count as one structure
    pub width_delta_threshold: f64,
    /// Maximum row-centroid distance for two regions to count as one structure
    pub height_delta_threshold: f64,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            area_threshold: 30.0,
            eccentricity_threshold: 0.98,
            width_delta_threshold: 25.0,
            height_delta_threshold: 15.0,
        }
    }
}

/// Pipeline stage a per-image failure is recorded against
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureStage {
    /// Thresholding, labeling and measuring the blobs
    ExtractRegionLabel,
    /// Picking the target region among the measured blobs
    FindTargetRegion,
}

/// One image that could not be turned into a vocabulary vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub image_index: usize,
    pub stage: FailureStage,
    pub error: StageError,
}

impl FailureRecord {
    pub fn new(image_index: usize, error: StageError) -> Self {
        Self {
            image_index,
            stage: error.stage(),
            error,
        }
    }
}
