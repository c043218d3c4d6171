use roi::{
    io::{load_image_dir, save_overlay},
    BatchDriver, BatchResult, Pipeline, RoiError, SelectionThresholds,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Directory under the output directory that receives overlay images
pub const OVERLAY_DIR: &str = "overlays";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    RoiError(#[from] RoiError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Settings of one extraction run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    /// Directory of preprocessed grayscale images, processed in file name order
    pub input_path: String,
    /// Directory receiving the vocabulary matrix and failure lists
    pub output_dir: String,
    /// Write an overlay image of the selected region for every image
    #[serde(default)]
    pub visualize: bool,
    /// Process images on all cores
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub thresholds: SelectionThresholds,
}

fn default_parallel() -> bool {
    true
}

impl RunConfig {
    pub fn new(input_path: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            visualize: false,
            parallel: default_parallel(),
            thresholds: SelectionThresholds::default(),
        }
    }

    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RunConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RunConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert RunConfig to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert RunConfig to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RunConfig)
    }
}

/// Load, process and save one batch as described by `config`
pub fn run_extraction(config: &RunConfig) -> Result<BatchResult, CliError> {
    let (paths, images): (Vec<PathBuf>, Vec<_>) = load_image_dir(&config.input_path)?
        .into_iter()
        .unzip();

    let pipeline = Pipeline::builder()
        .with_thresholds(config.thresholds)
        .build();
    let result = BatchDriver::new(pipeline)
        .with_parallel(config.parallel)
        .run(&images)?;

    let output_dir = Path::new(&config.output_dir);
    result.save(output_dir)?;

    if config.visualize {
        let overlay_dir = output_dir.join(OVERLAY_DIR);
        fs::create_dir_all(&overlay_dir)?;
        for (index, (path, image)) in paths.iter().zip(&images).enumerate() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("image_{index:04}"));
            save_overlay(
                overlay_dir.join(format!("{stem}.png")),
                image,
                result.regions[index].as_ref(),
            )?;
        }
        info!(dir = %overlay_dir.display(), "wrote overlays");
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use roi::io::{FAILURES_FILE, VOCABULARY_FILE};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vocab-cli-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_toml_config_defaults() {
        let config = RunConfig::from_toml(
            r#"
            input_path = "scans"
            output_dir = "out"

            [thresholds]
            area_threshold = 40.0
            "#,
        )
        .expect("Should parse TOML");

        assert_eq!(config.input_path, "scans");
        assert!(!config.visualize);
        assert!(config.parallel);
        assert_eq!(config.thresholds.area_threshold, 40.0);
        assert_eq!(config.thresholds.eccentricity_threshold, 0.98);
    }

    #[test]
    fn test_json_and_toml_agree() {
        let mut config = RunConfig::new("scans", "out");
        config.visualize = true;
        let from_json = RunConfig::from_json(&config.to_json().unwrap()).unwrap();
        let from_toml = RunConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(from_json, config);
        assert_eq!(from_toml, config);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            RunConfig::from_file("run.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_schema_lists_thresholds() {
        let schema = serde_json::to_value(RunConfig::schema()).unwrap();
        assert!(schema["properties"]["thresholds"].is_object());
        assert!(schema["properties"]["input_path"].is_object());
    }

    #[test]
    fn test_run_extraction_end_to_end() {
        let input = scratch_dir("input");
        let output = scratch_dir("output");
        fs::create_dir_all(&input).unwrap();

        let blob = GrayImage::from_fn(48, 48, |x, y| {
            let dx = x as f32 - 24.0;
            let dy = y as f32 - 30.0;
            if dx * dx + dy * dy <= 49.0 { Luma([230u8]) } else { Luma([20u8]) }
        });
        blob.save(input.join("0_blob.png")).unwrap();
        GrayImage::from_pixel(48, 48, Luma([128u8])).save(input.join("1_flat.png")).unwrap();

        let mut config = RunConfig::new(input.to_string_lossy(), output.to_string_lossy());
        config.visualize = true;
        let result = run_extraction(&config).expect("Run should succeed");

        assert_eq!(result.len(), 2);
        assert_eq!(result.failure_indices(), vec![1]);
        assert!(output.join(VOCABULARY_FILE).exists());
        assert!(output.join(FAILURES_FILE).exists());
        assert!(output.join(OVERLAY_DIR).join("0_blob.png").exists());
        assert!(output.join(OVERLAY_DIR).join("1_flat.png").exists());

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }
}
