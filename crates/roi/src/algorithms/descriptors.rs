//! Per-blob geometric and intensity measurements.

use std::collections::BTreeMap;
use std::f64::consts::{PI, SQRT_2};

use crate::{
    traits::RegionDescriber,
    types::{BoundingBox, IntensityImage, LabelMap, RegionDescriptor},
};

/// Moment-based region measurement
#[derive(Debug, Clone, Default)]
pub struct MomentRegionDescriber;

impl RegionDescriber for MomentRegionDescriber {
    fn describe(&self, labels: &LabelMap, image: &IntensityImage) -> Vec<RegionDescriptor> {
        let mut accumulators: BTreeMap<u32, RegionAccumulator> = BTreeMap::new();

        for (x, y, pixel) in labels.enumerate_pixels() {
            let label = pixel[0];
            if label == 0 {
                continue;
            }
            let intensity = image.get_pixel(x, y)[0] as f64;
            accumulators
                .entry(label)
                .or_insert_with(|| RegionAccumulator::new(y, x, intensity))
                .add(y, x, intensity);
        }

        accumulators
            .into_iter()
            .map(|(label, acc)| acc.finish(label, labels))
            .collect()
    }
}

/// Running sums for one blob
#[derive(Debug, Clone)]
struct RegionAccumulator {
    count: u64,
    sum_row: f64,
    sum_col: f64,
    sum_row_row: f64,
    sum_col_col: f64,
    sum_row_col: f64,
    min_row: u32,
    min_col: u32,
    max_row: u32,
    max_col: u32,
    min_intensity: f64,
    max_intensity: f64,
    sum_intensity: f64,
}

impl RegionAccumulator {
    fn new(row: u32, col: u32, intensity: f64) -> Self {
        Self {
            count: 0,
            sum_row: 0.0,
            sum_col: 0.0,
            sum_row_row: 0.0,
            sum_col_col: 0.0,
            sum_row_col: 0.0,
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
            min_intensity: intensity,
            max_intensity: intensity,
            sum_intensity: 0.0,
        }
    }

    fn add(&mut self, row: u32, col: u32, intensity: f64) {
        let (r, c) = (row as f64, col as f64);
        self.count += 1;
        self.sum_row += r;
        self.sum_col += c;
        self.sum_row_row += r * r;
        self.sum_col_col += c * c;
        self.sum_row_col += r * c;
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self.min_intensity = self.min_intensity.min(intensity);
        self.max_intensity = self.max_intensity.max(intensity);
        self.sum_intensity += intensity;
    }

    fn finish(self, label: u32, labels: &LabelMap) -> RegionDescriptor {
        let area = self.count as f64;
        let mean_row = self.sum_row / area;
        let mean_col = self.sum_col / area;

        // Population covariance of pixel coordinates
        let var_row = (self.sum_row_row / area - mean_row * mean_row).max(0.0);
        let var_col = (self.sum_col_col / area - mean_col * mean_col).max(0.0);
        let cov = self.sum_row_col / area - mean_row * mean_col;

        let half_sum = (var_row + var_col) / 2.0;
        let spread = (((var_row - var_col) / 2.0).powi(2) + cov * cov).sqrt();
        let major_eigen = half_sum + spread;
        let minor_eigen = (half_sum - spread).max(0.0);

        let eccentricity = if major_eigen > 0.0 {
            (1.0 - minor_eigen / major_eigen).max(0.0).sqrt()
        } else {
            0.0
        };

        let bbox = BoundingBox {
            min_row: self.min_row,
            min_col: self.min_col,
            max_row: self.max_row + 1,
            max_col: self.max_col + 1,
        };

        RegionDescriptor {
            label,
            area,
            eccentricity,
            centroid: (mean_row, mean_col),
            bbox,
            equivalent_diameter: (4.0 * area / PI).sqrt(),
            extent: area / bbox.area() as f64,
            major_axis_length: 4.0 * major_eigen.sqrt(),
            minor_axis_length: 4.0 * minor_eigen.sqrt(),
            perimeter: perimeter(labels, label, &bbox),
            max_intensity: self.max_intensity,
            mean_intensity: self.sum_intensity / area,
            min_intensity: self.min_intensity,
        }
    }
}

/// Perimeter of one blob, estimated from its 4-connected border pixels.
///
/// Each border pixel is weighted by the arrangement of its border neighbours:
/// straight runs count 1, diagonal steps sqrt(2) and corners (1 + sqrt(2)) / 2.
pub fn perimeter(labels: &LabelMap, label: u32, bbox: &BoundingBox) -> f64 {
    // Crop padded by one background pixel on every side
    let height = bbox.height() as usize + 2;
    let width = bbox.width() as usize + 2;
    let mut inside = vec![false; width * height];
    for row in 0..bbox.height() {
        for col in 0..bbox.width() {
            let pixel = labels.get_pixel(bbox.min_col + col, bbox.min_row + row);
            inside[(row as usize + 1) * width + col as usize + 1] = pixel[0] == label;
        }
    }

    let mut border = vec![false; width * height];
    for row in 1..height - 1 {
        for col in 1..width - 1 {
            let idx = row * width + col;
            border[idx] = inside[idx]
                && !(inside[idx - width] && inside[idx + width] && inside[idx - 1] && inside[idx + 1]);
        }
    }

    let at = |row: usize, col: usize| border[row * width + col] as u32;
    let mut total = 0.0;
    for row in 1..height - 1 {
        for col in 1..width - 1 {
            if !border[row * width + col] {
                continue;
            }
            let edges = at(row - 1, col) + at(row + 1, col) + at(row, col - 1) + at(row, col + 1);
            let corners = at(row - 1, col - 1)
                + at(row - 1, col + 1)
                + at(row + 1, col - 1)
                + at(row + 1, col + 1);
            total += border_weight(1 + 2 * edges + 10 * corners);
        }
    }
    total
}

fn border_weight(code: u32) -> f64 {
    match code {
        5 | 7 | 15 | 17 | 25 | 27 => 1.0,
        21 | 33 => SQRT_2,
        13 | 23 => (1.0 + SQRT_2) / 2.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    /// 5 x 10 rectangle at rows 2..7, cols 3..13
    fn rectangle() -> (LabelMap, IntensityImage) {
        let labels = LabelMap::from_fn(20, 12, |x, y| {
            if (3..13).contains(&x) && (2..7).contains(&y) {
                Luma([1])
            } else {
                Luma([0])
            }
        });
        let mut image = IntensityImage::from_pixel(20, 12, Luma([0.5]));
        image.put_pixel(4, 3, Luma([0.75]));
        image.put_pixel(5, 3, Luma([0.25]));
        (labels, image)
    }

    #[test]
    fn test_rectangle_measurements() {
        let (labels, image) = rectangle();
        let regions = MomentRegionDescriber.describe(&labels, &image);
        assert_eq!(regions.len(), 1);

        let region = &regions[0];
        assert_eq!(region.label, 1);
        assert_eq!(region.area, 50.0);
        assert_eq!(region.bbox, BoundingBox { min_row: 2, min_col: 3, max_row: 7, max_col: 13 });
        assert_relative_eq!(region.centroid.0, 4.0, epsilon = 1e-9);
        assert_relative_eq!(region.centroid.1, 7.5, epsilon = 1e-9);
        assert_relative_eq!(region.extent, 1.0, epsilon = 1e-9);
        assert_relative_eq!(region.equivalent_diameter, (200.0 / PI).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(region.major_axis_length, 4.0 * 8.25f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(region.minor_axis_length, 4.0 * 2.0f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(region.eccentricity, (1.0 - 2.0 / 8.25f64).sqrt(), epsilon = 1e-6);
        assert_relative_eq!(region.perimeter, 26.0, epsilon = 1e-9);
        assert_relative_eq!(region.max_intensity, 0.75, epsilon = 1e-9);
        assert_relative_eq!(region.min_intensity, 0.25, epsilon = 1e-9);
        assert_relative_eq!(region.mean_intensity, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_single_pixel_region() {
        let mut labels = LabelMap::new(5, 5);
        labels.put_pixel(2, 2, Luma([7]));
        let image = IntensityImage::from_pixel(5, 5, Luma([1.0]));

        let regions = MomentRegionDescriber.describe(&labels, &image);
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.label, 7);
        assert_eq!(region.area, 1.0);
        assert_eq!(region.eccentricity, 0.0);
        assert_eq!(region.major_axis_length, 0.0);
        assert_eq!(region.perimeter, 0.0);
    }

    #[test]
    fn test_horizontal_line_is_fully_eccentric() {
        let labels = LabelMap::from_fn(12, 3, |x, y| {
            if y == 1 && (1..11).contains(&x) { Luma([1]) } else { Luma([0]) }
        });
        let image = IntensityImage::from_pixel(12, 3, Luma([1.0]));

        let regions = MomentRegionDescriber.describe(&labels, &image);
        assert_relative_eq!(regions[0].eccentricity, 1.0, epsilon = 1e-9);
        assert_eq!(regions[0].minor_axis_length, 0.0);
    }

    #[test]
    fn test_regions_are_ordered_by_label() {
        let mut labels = LabelMap::new(10, 10);
        labels.put_pixel(8, 8, Luma([2]));
        labels.put_pixel(1, 1, Luma([1]));
        labels.put_pixel(4, 4, Luma([3]));
        let image = IntensityImage::from_pixel(10, 10, Luma([0.5]));

        let regions = MomentRegionDescriber.describe(&labels, &image);
        let ids: Vec<u32> = regions.iter().map(|r| r.label).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(regions[1].centroid, (8.0, 8.0));
    }

    #[test]
    fn test_empty_label_map_yields_no_regions() {
        let labels = LabelMap::new(6, 6);
        let image = IntensityImage::new(6, 6);
        assert!(MomentRegionDescriber.describe(&labels, &image).is_empty());
    }
}
