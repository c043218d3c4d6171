//! Global thresholding and binary morphology.
//!
//! Foreground is everything strictly above an Otsu threshold, followed by a
//! square closing that merges near-adjacent foreground pixels into one blob.

use image::Luma;
use tracing::debug;

use crate::{
    error::ThresholdError,
    traits::Binarizer,
    types::{BinaryMask, FOREGROUND, IntensityImage},
};

/// Number of histogram bins used by [`otsu_threshold`]
pub const HISTOGRAM_BINS: usize = 256;

/// Otsu thresholding followed by a square morphological closing
#[derive(Debug, Clone)]
pub struct OtsuBinarizer {
    /// Side length of the square structuring element, 0 disables the closing
    pub closing_size: u32,
}

impl Default for OtsuBinarizer {
    fn default() -> Self {
        Self { closing_size: 2 }
    }
}

impl Binarizer for OtsuBinarizer {
    fn binarize(&self, image: &IntensityImage) -> Result<BinaryMask, ThresholdError> {
        let threshold = otsu_threshold(image)?;
        let mask = apply_threshold(image, threshold);
        debug!(threshold, closing_size = self.closing_size, "binarized image");

        if self.closing_size == 0 {
            return Ok(mask);
        }
        Ok(close_square(&mask, self.closing_size))
    }
}

/// Computes Otsu's threshold over a histogram spanning the image's finite range.
///
/// The threshold is the center of the bin that maximizes the between-class
/// variance. Fails when the image holds fewer than two distinct values.
pub fn otsu_threshold(image: &IntensityImage) -> Result<f32, ThresholdError> {
    let (min, max) = image
        .pixels()
        .map(|p| p[0])
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return Err(ThresholdError { max_intensity: None });
    }
    if max <= min {
        return Err(ThresholdError { max_intensity: Some(max) });
    }

    let min = min as f64;
    let range = max as f64 - min;
    let bin_width = range / HISTOGRAM_BINS as f64;

    let mut histogram = [0u64; HISTOGRAM_BINS];
    for pixel in image.pixels() {
        let value = pixel[0];
        if !value.is_finite() {
            continue;
        }
        let bin = ((value as f64 - min) / range * HISTOGRAM_BINS as f64) as usize;
        histogram[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }

    let centers: Vec<f64> = (0..HISTOGRAM_BINS)
        .map(|i| min + (i as f64 + 0.5) * bin_width)
        .collect();

    // Class weights and intensity sums for "at or below bin i" and "at or above bin i"
    let mut weight_low = [0f64; HISTOGRAM_BINS];
    let mut sum_low = [0f64; HISTOGRAM_BINS];
    let (mut w, mut s) = (0.0, 0.0);
    for i in 0..HISTOGRAM_BINS {
        w += histogram[i] as f64;
        s += histogram[i] as f64 * centers[i];
        weight_low[i] = w;
        sum_low[i] = s;
    }

    let mut weight_high = [0f64; HISTOGRAM_BINS];
    let mut sum_high = [0f64; HISTOGRAM_BINS];
    let (mut w, mut s) = (0.0, 0.0);
    for i in (0..HISTOGRAM_BINS).rev() {
        w += histogram[i] as f64;
        s += histogram[i] as f64 * centers[i];
        weight_high[i] = w;
        sum_high[i] = s;
    }

    let mut best_variance = f64::NEG_INFINITY;
    let mut best_bin = 0;
    for i in 0..HISTOGRAM_BINS - 1 {
        let w_low = weight_low[i];
        let w_high = weight_high[i + 1];
        if w_low == 0.0 || w_high == 0.0 {
            continue;
        }
        let mean_low = sum_low[i] / w_low;
        let mean_high = sum_high[i + 1] / w_high;
        let variance = w_low * w_high * (mean_low - mean_high).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    Ok(centers[best_bin] as f32)
}

/// Foreground = pixels strictly above `threshold`
pub fn apply_threshold(image: &IntensityImage, threshold: f32) -> BinaryMask {
    BinaryMask::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > threshold {
            Luma([FOREGROUND])
        } else {
            Luma([0u8])
        }
    })
}

/// Binary closing (dilation then erosion) with a `size` x `size` square.
///
/// Pixels outside the image count as foreground during the erosion, so the
/// result always contains the input mask.
pub fn close_square(mask: &BinaryMask, size: u32) -> BinaryMask {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let k = size.max(1) as usize;

    let bits: Vec<bool> = mask.pixels().map(|p| p[0] > 0).collect();
    let dilated = dilate_square(&bits, width, height, k);
    let closed = erode_square(&dilated, width, height, k);

    BinaryMask::from_fn(mask.width(), mask.height(), |x, y| {
        if closed[y as usize * width + x as usize] {
            Luma([FOREGROUND])
        } else {
            Luma([0u8])
        }
    })
}

fn dilate_square(bits: &[bool], width: usize, height: usize, k: usize) -> Vec<bool> {
    let mut horizontal = vec![false; bits.len()];
    for row in 0..height {
        for col in 0..width {
            horizontal[row * width + col] = (0..k).any(|d| col >= d && bits[row * width + col - d]);
        }
    }

    let mut out = vec![false; bits.len()];
    for row in 0..height {
        for col in 0..width {
            out[row * width + col] = (0..k).any(|d| row >= d && horizontal[(row - d) * width + col]);
        }
    }
    out
}

fn erode_square(bits: &[bool], width: usize, height: usize, k: usize) -> Vec<bool> {
    let mut horizontal = vec![false; bits.len()];
    for row in 0..height {
        for col in 0..width {
            horizontal[row * width + col] =
                (0..k).all(|d| col + d >= width || bits[row * width + col + d]);
        }
    }

    let mut out = vec![false; bits.len()];
    for row in 0..height {
        for col in 0..width {
            out[row * width + col] =
                (0..k).all(|d| row + d >= height || horizontal[(row + d) * width + col]);
        }
    }
    out
}
