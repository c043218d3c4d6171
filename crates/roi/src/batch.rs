//! Batch processing: one vocabulary column per image, failures recorded per image.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    error::{Result, RoiError, StageError},
    pipeline::{ImageFeatures, Pipeline},
    types::{FailureRecord, IntensityImage, RegionDescriptor},
    vocabulary::{VOCABULARY_LEN, VocabularyVector},
};

/// Vocabulary matrix and failure list of a batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// `VOCABULARY_LEN` x N, column i belongs to image i. Failed columns stay zero.
    pub matrix: Array2<f64>,
    /// In image order
    pub failures: Vec<FailureRecord>,
    /// Selected region per image, `None` where the image failed
    pub regions: Vec<Option<RegionDescriptor>>,
}

impl BatchResult {
    /// Number of images in the batch
    pub fn len(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failure_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.image_index).collect()
    }

    /// Indices of images that produced a vocabulary vector
    pub fn valid_indices(&self) -> Vec<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(i, region)| region.as_ref().map(|_| i))
            .collect()
    }

    /// Vocabulary vector of image `index`, `None` if it failed
    pub fn column(&self, index: usize) -> Option<VocabularyVector> {
        self.regions.get(index)?.as_ref()?;
        let mut values = [0.0; VOCABULARY_LEN];
        for (value, &entry) in values.iter_mut().zip(self.matrix.column(index).iter()) {
            *value = entry;
        }
        Some(VocabularyVector(values))
    }
}

/// Runs a [`Pipeline`] over every image of a batch
pub struct BatchDriver {
    pipeline: Pipeline,
    parallel: bool,
}

impl BatchDriver {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline, parallel: true }
    }

    /// Process images on the rayon thread pool (default) or one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Process every image. Per-image failures are recorded, never propagated;
    /// only a shape mismatch across the batch is an error.
    pub fn run(&self, images: &[IntensityImage]) -> Result<BatchResult> {
        check_shapes(images)?;
        let total = images.len();

        let process = |(index, image): (usize, &IntensityImage)| {
            info!(index, total, "processing image");
            let outcome = self.pipeline.process(image);
            if let Err(error) = &outcome {
                warn!(index, stage = %error.stage(), %error, "image failed");
            }
            outcome
        };

        let outcomes: Vec<std::result::Result<ImageFeatures, StageError>> = if self.parallel {
            images.par_iter().enumerate().map(process).collect()
        } else {
            images.iter().enumerate().map(process).collect()
        };

        let result = merge(outcomes);
        info!(
            images = result.len(),
            succeeded = result.len() - result.failures.len(),
            failed = result.failures.len(),
            "batch complete"
        );
        if !result.failures.is_empty() {
            warn!(
                count = result.failures.len(),
                indices = ?result.failure_indices(),
                "failed images: {:?}",
                result.failures
            );
        }
        Ok(result)
    }
}

impl Default for BatchDriver {
    fn default() -> Self {
        Self::new(Pipeline::default())
    }
}

/// All images of a batch must share one (height, width)
fn check_shapes(images: &[IntensityImage]) -> Result<()> {
    let Some(first) = images.first() else {
        return Ok(());
    };
    let expected = (first.height(), first.width());
    for (index, image) in images.iter().enumerate().skip(1) {
        let found = (image.height(), image.width());
        if found != expected {
            return Err(RoiError::ShapeMismatch { index, expected, found });
        }
    }
    Ok(())
}

/// Index-ordered merge of independent per-image outcomes
fn merge(outcomes: Vec<std::result::Result<ImageFeatures, StageError>>) -> BatchResult {
    let total = outcomes.len();
    let mut matrix = Array2::zeros((VOCABULARY_LEN, total));
    let mut failures = Vec::new();
    let mut regions = Vec::with_capacity(total);

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(features) => {
                matrix
                    .column_mut(index)
                    .assign(&ArrayView1::from(features.vector.as_slice()));
                regions.push(Some(features.region));
            }
            Err(error) => {
                failures.push(FailureRecord::new(index, error));
                regions.push(None);
            }
        }
    }

    BatchResult { matrix, failures, regions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureStage;
    use image::Luma;

    fn disk_image(center: (f32, f32), radius: f32, level: f32) -> IntensityImage {
        IntensityImage::from_fn(64, 64, |x, y| {
            let dx = x as f32 - center.0;
            let dy = y as f32 - center.1;
            if dx * dx + dy * dy <= radius * radius { Luma([level]) } else { Luma([0.05]) }
        })
    }

    fn noise_image() -> IntensityImage {
        let mut image = IntensityImage::from_pixel(64, 64, Luma([0.05]));
        for &(x, y) in &[(4, 4), (20, 50), (40, 10), (60, 60)] {
            image.put_pixel(x, y, Luma([0.95]));
        }
        image
    }

    fn scenario_batch() -> Vec<IntensityImage> {
        vec![
            disk_image((20.0, 40.0), 8.0, 0.9),
            disk_image((40.0, 20.0), 6.0, 0.8),
            IntensityImage::from_pixel(64, 64, Luma([0.5])),
            disk_image((32.0, 32.0), 10.0, 0.7),
            noise_image(),
        ]
    }

    #[test]
    fn test_batch_records_failures_in_order() {
        for parallel in [true, false] {
            let result = BatchDriver::default()
                .with_parallel(parallel)
                .run(&scenario_batch())
                .expect("Batch should run");

            assert_eq!(result.len(), 5);
            assert_eq!(result.matrix.dim(), (VOCABULARY_LEN, 5));
            assert_eq!(result.failure_indices(), vec![2, 4]);
            assert_eq!(result.valid_indices(), vec![0, 1, 3]);
            assert_eq!(result.failures[0].stage, FailureStage::ExtractRegionLabel);
            assert_eq!(result.failures[1].stage, FailureStage::FindTargetRegion);

            for index in [2, 4] {
                assert!(result.matrix.column(index).iter().all(|&v| v == 0.0));
                assert!(result.column(index).is_none());
            }
            for index in [0, 1, 3] {
                let vector = result.column(index).expect("Valid column");
                assert!(vector.get("area").unwrap() > 30.0);
            }
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let images = scenario_batch();
        let parallel = BatchDriver::default().run(&images).expect("Batch should run");
        let sequential = BatchDriver::default()
            .with_parallel(false)
            .run(&images)
            .expect("Batch should run");
        assert_eq!(parallel.matrix, sequential.matrix);
        assert_eq!(parallel.failures, sequential.failures);
    }

    #[test]
    fn test_column_matches_selected_region() {
        let result = BatchDriver::default()
            .run(&scenario_batch())
            .expect("Batch should run");
        let region = result.regions[3].as_ref().expect("Image 3 succeeded");
        let vector = result.column(3).expect("Valid column");
        assert_eq!(vector, crate::vocabulary::encode(region));
    }

    #[test]
    fn test_empty_batch() {
        let result = BatchDriver::default().run(&[]).expect("Empty batch should run");
        assert!(result.is_empty());
        assert_eq!(result.matrix.dim(), (VOCABULARY_LEN, 0));
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_shape_mismatch_aborts_batch() {
        let images = vec![
            IntensityImage::new(64, 64),
            IntensityImage::new(64, 64),
            IntensityImage::new(32, 64),
        ];
        match BatchDriver::default().run(&images) {
            Err(RoiError::ShapeMismatch { index, expected, found }) => {
                assert_eq!(index, 2);
                assert_eq!(expected, (64, 64));
                assert_eq!(found, (64, 32));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
