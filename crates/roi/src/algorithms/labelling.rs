use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::debug;

use crate::{
    traits::ComponentLabeler,
    types::{BinaryMask, LabelMap},
};

/// Imageproc-based labeler, diagonal neighbours belong to the same blob
#[derive(Debug, Clone, Default)]
pub struct EightConnectedLabeler;

impl ComponentLabeler for EightConnectedLabeler {
    fn label(&self, mask: &BinaryMask) -> LabelMap {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
        debug!(blobs = label_count(&labels), "labeled connected components");
        labels
    }
}

/// Number of distinct blobs in a label map
pub fn label_count(labels: &LabelMap) -> usize {
    let mut seen: Vec<u32> = labels.pixels().map(|p| p[0]).filter(|&l| l > 0).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
