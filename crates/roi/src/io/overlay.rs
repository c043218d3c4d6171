//! Visual check of the selected region: the image in gray with the region's
//! bounding box and centroid drawn on top.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::{
    error::Result,
    types::{IntensityImage, RegionDescriptor},
};

const BBOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const CENTROID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Render `image` stretched to the full 8-bit range, with `region` marked if given
pub fn render_overlay(image: &IntensityImage, region: Option<&RegionDescriptor>) -> RgbImage {
    let (min, max) = image
        .pixels()
        .map(|p| p[0])
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = if max > min { max - min } else { 1.0 };

    let mut canvas = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0];
        let level = if value.is_finite() {
            (((value - min) / range).clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            0
        };
        Rgb([level, level, level])
    });

    if let Some(region) = region {
        let bbox = region.bbox;
        if bbox.width() > 0 && bbox.height() > 0 {
            let rect = Rect::at(bbox.min_col as i32, bbox.min_row as i32)
                .of_size(bbox.width(), bbox.height());
            draw_hollow_rect_mut(&mut canvas, rect, BBOX_COLOR);
        }
        let (row, col) = region.centroid;
        draw_cross_mut(&mut canvas, CENTROID_COLOR, col.round() as i32, row.round() as i32);
    }

    canvas
}

/// Render and write an overlay, format chosen from the file extension
pub fn save_overlay<P: AsRef<Path>>(
    path: P,
    image: &IntensityImage,
    region: Option<&RegionDescriptor>,
) -> Result<()> {
    render_overlay(image, region).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline::Pipeline, types::IntensityImage};
    use image::Luma;

    fn square_image() -> IntensityImage {
        IntensityImage::from_fn(40, 40, |x, y| {
            if (10..20).contains(&x) && (15..25).contains(&y) { Luma([0.8]) } else { Luma([0.2]) }
        })
    }

    #[test]
    fn test_overlay_marks_region() {
        let image = square_image();
        let features = Pipeline::default().process(&image).expect("Should process successfully");
        let overlay = render_overlay(&image, Some(&features.region));

        assert_eq!(overlay.dimensions(), (40, 40));
        // Bounding box corner (col 10, row 15)
        assert_eq!(*overlay.get_pixel(10, 15), BBOX_COLOR);
        // Centroid (row 19.5, col 14.5) rounds to (20, 15)
        assert_eq!(*overlay.get_pixel(15, 20), CENTROID_COLOR);
        // Background stays gray
        assert_eq!(*overlay.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_overlay_without_region_is_grayscale() {
        let overlay = render_overlay(&square_image(), None);
        assert_eq!(*overlay.get_pixel(12, 17), Rgb([255, 255, 255]));
        assert!(overlay.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    }
}
