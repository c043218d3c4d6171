//! Target region heuristic.
//!
//! The target structure is the brightest blob that is large enough and not
//! line-like. When two comparably bright blobs survive, blobs close to each
//! other are read as two lobes of one structure (take the rightmost), while
//! separated blobs are resolved by a bottom-left positional prior.

use std::cmp::Ordering;

use tracing::debug;

use crate::{
    error::{CandidateSummary, NoCandidateError},
    traits::RegionSelector,
    types::{RegionDescriptor, SelectionThresholds},
};

/// Selects the brightest plausible region, resolving pairs by position
#[derive(Debug, Clone, Default)]
pub struct BrightestRegionSelector {
    pub thresholds: SelectionThresholds,
}

impl BrightestRegionSelector {
    pub fn new(thresholds: SelectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Regions that pass the area and eccentricity filter, in input order
    pub fn plausible<'a>(&self, regions: &'a [RegionDescriptor]) -> Vec<&'a RegionDescriptor> {
        regions
            .iter()
            .filter(|r| {
                r.area >= self.thresholds.area_threshold
                    && r.eccentricity < self.thresholds.eccentricity_threshold
            })
            .collect()
    }

    /// Whether two regions are close enough to be lobes of the same structure
    pub fn are_close(&self, a: &RegionDescriptor, b: &RegionDescriptor) -> bool {
        let width_delta = (a.centroid_col() - b.centroid_col()).abs();
        let height_delta = (a.centroid_row() - b.centroid_row()).abs();
        width_delta < self.thresholds.width_delta_threshold
            && height_delta < self.thresholds.height_delta_threshold
    }
}

impl RegionSelector for BrightestRegionSelector {
    fn select(
        &self,
        regions: &[RegionDescriptor],
        shape: (u32, u32),
    ) -> Result<RegionDescriptor, NoCandidateError> {
        let mut candidates = self.plausible(regions);
        if candidates.is_empty() {
            return Err(NoCandidateError {
                candidates: regions
                    .iter()
                    .map(|r| CandidateSummary { area: r.area, eccentricity: r.eccentricity })
                    .collect(),
            });
        }

        // Stable, so equally bright regions keep their label order
        candidates.sort_by(|a, b| {
            b.mean_intensity
                .partial_cmp(&a.mean_intensity)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(2);

        let chosen = match candidates.as_slice() {
            [only] => {
                debug!(label = only.label, "single plausible region");
                *only
            }
            [first, second] if self.are_close(first, second) => {
                let rightmost = if second.centroid_col() > first.centroid_col() {
                    *second
                } else {
                    *first
                };
                debug!(label = rightmost.label, "close pair, taking rightmost region");
                rightmost
            }
            [first, second] => {
                let bottom_left = (shape.0 as f64, 0.0);
                let nearest = if second.distance_to(bottom_left) < first.distance_to(bottom_left) {
                    *second
                } else {
                    *first
                };
                debug!(label = nearest.label, "separated pair, taking region nearest bottom-left");
                nearest
            }
            _ => unreachable!("candidates holds one or two regions"),
        };

        Ok(chosen.clone())
    }
}
