use crate::{
    error::{NoCandidateError, ThresholdError},
    types::{BinaryMask, IntensityImage, LabelMap, RegionDescriptor},
};

/// Trait for foreground/background separation
pub trait Binarizer: Send + Sync {
    /// Produce the foreground mask of an intensity image
    fn binarize(&self, image: &IntensityImage) -> Result<BinaryMask, ThresholdError>;
}

/// Trait for connected component labeling
pub trait ComponentLabeler: Send + Sync {
    /// Assign a unique positive id to every foreground blob
    fn label(&self, mask: &BinaryMask) -> LabelMap;
}

/// Trait for per-blob measurement
pub trait RegionDescriber: Send + Sync {
    /// Measure every labeled blob against the original intensities
    fn describe(&self, labels: &LabelMap, image: &IntensityImage) -> Vec<RegionDescriptor>;
}

/// Trait for picking the target region among candidates
pub trait RegionSelector: Send + Sync {
    /// Pick exactly one region. `shape` is (height, width) of the source image.
    fn select(
        &self,
        regions: &[RegionDescriptor],
        shape: (u32, u32),
    ) -> Result<RegionDescriptor, NoCandidateError>;
}
