pub mod images;
pub mod output;
pub mod overlay;

pub use images::{load_image_dir, load_intensity_image, IMAGE_EXTENSIONS};
pub use output::{
    load_failure_report, VocabularyFile, FAILURES_FILE, FAILURE_REPORT_FILE, VOCABULARY_FILE,
};
pub use overlay::{render_overlay, save_overlay};
