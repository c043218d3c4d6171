use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    batch::BatchResult,
    error::{Result, RoiError},
    types::FailureRecord,
    vocabulary::{VOCABULARY_FIELDS, VOCABULARY_LEN},
};

/// Vocabulary matrix, one row per field
pub const VOCABULARY_FILE: &str = "vocabulary.json";
/// Indices of failed images, in discovery order
pub const FAILURES_FILE: &str = "failures.json";
/// Failed images with stage and diagnostics
pub const FAILURE_REPORT_FILE: &str = "failure_report.json";

/// On-disk form of the vocabulary matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyFile {
    pub fields: Vec<String>,
    /// `fields.len()` rows of N values each
    pub rows: Vec<Vec<f64>>,
}

impl VocabularyFile {
    pub fn from_matrix(matrix: &Array2<f64>) -> Self {
        Self {
            fields: VOCABULARY_FIELDS.iter().map(|f| f.to_string()).collect(),
            rows: matrix.rows().into_iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Rebuild the matrix. Fails unless the fields match [`VOCABULARY_FIELDS`]
    /// and every row holds the same number of images.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        if self.fields.len() != VOCABULARY_LEN
            || self.fields.iter().zip(VOCABULARY_FIELDS).any(|(found, expected)| found != expected)
        {
            return Err(RoiError::InvalidVocabulary(format!(
                "fields {:?}, expected {:?}",
                self.fields, VOCABULARY_FIELDS
            )));
        }
        if self.rows.len() != VOCABULARY_LEN {
            return Err(RoiError::InvalidVocabulary(format!(
                "{} rows, expected {}",
                self.rows.len(),
                VOCABULARY_LEN
            )));
        }

        let columns = self.rows[0].len();
        if let Some((field, row)) = self.rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
            return Err(RoiError::InvalidVocabulary(format!(
                "row {} ({}) has {} values, expected {}",
                field,
                VOCABULARY_FIELDS[field],
                row.len(),
                columns
            )));
        }

        let values: Vec<f64> = self.rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((VOCABULARY_LEN, columns), values)
            .map_err(|e| RoiError::InvalidVocabulary(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl BatchResult {
    /// Write the vocabulary matrix, failure indices and failure report into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let vocabulary = VocabularyFile::from_matrix(&self.matrix);
        fs::write(dir.join(VOCABULARY_FILE), serde_json::to_string_pretty(&vocabulary)?)?;
        fs::write(dir.join(FAILURES_FILE), serde_json::to_string_pretty(&self.failure_indices())?)?;
        fs::write(dir.join(FAILURE_REPORT_FILE), serde_json::to_string_pretty(&self.failures)?)?;

        info!(dir = %dir.display(), images = self.len(), failed = self.failures.len(), "saved batch result");
        Ok(())
    }
}

/// Read back a failure report written by [`BatchResult::save`]
pub fn load_failure_report<P: AsRef<Path>>(path: P) -> Result<Vec<FailureRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
