pub mod builder;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::StageError,
    traits::{Binarizer, ComponentLabeler, RegionDescriber, RegionSelector},
    types::{IntensityImage, RegionDescriptor},
    vocabulary::{self, VocabularyVector},
};

/// Target region of one image and its encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    pub region: RegionDescriptor,
    pub vector: VocabularyVector,
}

/// Threshold → label → describe → select → encode, for a single image
pub struct Pipeline {
    binarizer: Box<dyn Binarizer>,
    labeler: Box<dyn ComponentLabeler>,
    describer: Box<dyn RegionDescriber>,
    selector: Box<dyn RegionSelector>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        binarizer: Box<dyn Binarizer>,
        labeler: Box<dyn ComponentLabeler>,
        describer: Box<dyn RegionDescriber>,
        selector: Box<dyn RegionSelector>,
    ) -> Self {
        Self {
            binarizer,
            labeler,
            describer,
            selector,
        }
    }

    /// Threshold, label and measure every candidate blob
    pub fn extract_regions(&self, image: &IntensityImage) -> Result<Vec<RegionDescriptor>, StageError> {
        let mask = self.binarizer.binarize(image)?;
        let labels = self.labeler.label(&mask);
        let regions = self.describer.describe(&labels, image);
        debug!(candidates = regions.len(), "extracted candidate regions");
        Ok(regions)
    }

    /// Pick the target region among the candidates of an image of `shape` (height, width)
    pub fn find_target_region(
        &self,
        regions: &[RegionDescriptor],
        shape: (u32, u32),
    ) -> Result<RegionDescriptor, StageError> {
        Ok(self.selector.select(regions, shape)?)
    }

    /// Process an image through the entire pipeline
    pub fn process(&self, image: &IntensityImage) -> Result<ImageFeatures, StageError> {
        let regions = self.extract_regions(image)?;
        let region = self.find_target_region(&regions, (image.height(), image.width()))?;
        let vector = vocabulary::encode(&region);
        Ok(ImageFeatures { region, vector })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::new().build()
    }
}
