use crate::{
    algorithms::{
        BrightestRegionSelector, EightConnectedLabeler, MomentRegionDescriber, OtsuBinarizer,
    },
    pipeline::Pipeline,
    traits::{Binarizer, ComponentLabeler, RegionDescriber, RegionSelector},
    types::SelectionThresholds,
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    binarizer: Option<Box<dyn Binarizer>>,
    labeler: Option<Box<dyn ComponentLabeler>>,
    describer: Option<Box<dyn RegionDescriber>>,
    selector: Option<Box<dyn RegionSelector>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            binarizer: None,
            labeler: None,
            describer: None,
            selector: None,
        }
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the component labeler (replaces any existing one)
    pub fn set_labeler<L>(mut self, labeler: L) -> Self
    where
        L: ComponentLabeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Set the region describer (replaces any existing one)
    pub fn set_describer<D>(mut self, describer: D) -> Self
    where
        D: RegionDescriber + 'static,
    {
        self.describer = Some(Box::new(describer));
        self
    }

    /// Set the region selector (replaces any existing one)
    pub fn set_selector<S>(mut self, selector: S) -> Self
    where
        S: RegionSelector + 'static,
    {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Use the default Otsu binarizer with a custom closing size
    pub fn with_closing_size(self, closing_size: u32) -> Self {
        self.set_binarizer(OtsuBinarizer { closing_size })
    }

    /// Use the brightest-region heuristic with custom thresholds
    pub fn with_thresholds(self, thresholds: SelectionThresholds) -> Self {
        self.set_selector(BrightestRegionSelector::new(thresholds))
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let binarizer = self.binarizer
            .unwrap_or_else(|| Box::new(OtsuBinarizer::default()));

        let labeler = self.labeler
            .unwrap_or_else(|| Box::new(EightConnectedLabeler));

        let describer = self.describer
            .unwrap_or_else(|| Box::new(MomentRegionDescriber));

        let selector = self.selector
            .unwrap_or_else(|| Box::new(BrightestRegionSelector::default()));

        Pipeline::new(binarizer, labeler, describer, selector)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntensityImage;
    use image::Luma;

    /// 4 x 4 bright square, too small for the default area threshold
    fn small_square() -> IntensityImage {
        IntensityImage::from_fn(32, 32, |x, y| {
            if (10..14).contains(&x) && (10..14).contains(&y) { Luma([1.0]) } else { Luma([0.0]) }
        })
    }

    #[test]
    fn test_default_thresholds_reject_small_square() {
        let pipeline = PipelineBuilder::new().build();
        assert!(pipeline.process(&small_square()).is_err());
    }

    #[test]
    fn test_custom_thresholds_accept_small_square() {
        let pipeline = PipelineBuilder::new()
            .with_thresholds(SelectionThresholds { area_threshold: 10.0, ..Default::default() })
            .build();
        let features = pipeline.process(&small_square()).expect("Should process successfully");
        assert_eq!(features.region.area, 16.0);
    }

    #[test]
    fn test_closing_can_be_disabled() {
        let image = IntensityImage::from_fn(40, 10, |x, y| {
            // Two 6 x 6 squares separated by a one-pixel gap
            if (2..8).contains(&y) && ((5..11).contains(&x) || (12..18).contains(&x)) {
                Luma([1.0])
            } else {
                Luma([0.0])
            }
        });

        let merged = PipelineBuilder::new().build();
        let regions = merged.extract_regions(&image).expect("Should extract");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 78.0);

        let split = PipelineBuilder::new().with_closing_size(0).build();
        let regions = split.extract_regions(&image).expect("Should extract");
        assert_eq!(regions.len(), 2);
    }
}
