use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    error::{Result, RoiError},
    types::IntensityImage,
};

/// File extensions picked up by [`load_image_dir`]
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Decode a raster file into intensities normalized to [0, 1]
pub fn load_intensity_image<P: AsRef<Path>>(path: P) -> Result<IntensityImage> {
    let image = image::open(path.as_ref()).map_err(|source| RoiError::ImageDecode {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    debug!(path = %path.as_ref().display(), width = image.width(), height = image.height(), "loaded image");
    Ok(image.to_luma32f())
}

/// Load every image of a directory, sorted by file name.
///
/// The position in the returned vector is the image index used by the batch.
pub fn load_image_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<(PathBuf, IntensityImage)>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(RoiError::NoImagesFound(dir.display().to_string()));
    }
    info!(count = paths.len(), dir = %dir.display(), "loading images");

    paths
        .into_iter()
        .map(|path| {
            let image = load_intensity_image(&path)?;
            Ok((path, image))
        })
        .collect()
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
