use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FailureStage;

/// The image's intensity distribution is degenerate, so no global threshold exists.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Cannot compute a global threshold for a single-valued image (max intensity {})", format_max(.max_intensity))]
pub struct ThresholdError {
    /// Largest finite intensity, `None` when the image has no finite pixel
    pub max_intensity: Option<f32>,
}

fn format_max(max_intensity: &Option<f32>) -> String {
    match max_intensity {
        Some(value) => value.to_string(),
        None => "none".to_string(),
    }
}

/// Area and eccentricity of a raw candidate, kept for threshold re-tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub area: f64,
    pub eccentricity: f64,
}

/// No region survived the area/eccentricity filter.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("No target region among {} candidates (area, eccentricity): {}", .candidates.len(), format_candidates(.candidates))]
pub struct NoCandidateError {
    pub candidates: Vec<CandidateSummary>,
}

fn format_candidates(candidates: &[CandidateSummary]) -> String {
    let pairs: Vec<String> = candidates
        .iter()
        .map(|c| format!("({}, {:.3})", c.area, c.eccentricity))
        .collect();
    format!("[{}]", pairs.join(", "))
}

/// Per-image failure of one pipeline stage.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error(transparent)]
    NoCandidate(#[from] NoCandidateError),
}

impl StageError {
    /// The pipeline stage this failure is recorded against
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Threshold(_) => FailureStage::ExtractRegionLabel,
            Self::NoCandidate(_) => FailureStage::FindTargetRegion,
        }
    }
}

#[derive(Error, Debug)]
pub enum RoiError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to decode {path}: {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image {index} has shape {found:?}, expected {expected:?} (height, width)")]
    ShapeMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Invalid vocabulary file: {0}")]
    InvalidVocabulary(String),

    #[error("No images found in {0}")]
    NoImagesFound(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RoiError>;
