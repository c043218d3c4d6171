//! # ROI Vocabulary Extraction Library
//!
//! Turns batches of preprocessed grayscale images into fixed-size feature
//! vectors for weak-supervision labeling models. Each image is thresholded,
//! its blobs labeled and measured, a single region of interest picked by a
//! tunable heuristic, and that region encoded into a 10-element vector.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: every stage sits behind a trait and can be swapped
//! - **Pipeline System**: stages composed through a fluent builder with sensible defaults
//! - **Explicit Failures**: per-image failures are values tagged with their stage
//! - **Parallel Batches**: images are processed independently on the rayon pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roi::{BatchDriver, Pipeline, io::load_image_dir};
//!
//! let images: Vec<_> = load_image_dir("scans/")?
//!     .into_iter()
//!     .map(|(_, image)| image)
//!     .collect();
//!
//! let result = BatchDriver::new(Pipeline::default()).run(&images)?;
//! println!("failed images: {:?}", result.failure_indices());
//! result.save("out/")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Thresholds
//!
//! ```rust
//! use roi::{Pipeline, SelectionThresholds};
//!
//! let pipeline = Pipeline::builder()
//!     .with_thresholds(SelectionThresholds { area_threshold: 50.0, ..Default::default() })
//!     .build();
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod vocabulary;
pub mod pipeline;
pub mod batch;
pub mod io;

// Re-exports for convenience
pub use error::{CandidateSummary, NoCandidateError, Result, RoiError, StageError, ThresholdError};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use vocabulary::{encode, VocabularyVector, VOCABULARY_FIELDS, VOCABULARY_LEN};
pub use pipeline::{ImageFeatures, Pipeline, builder::PipelineBuilder};
pub use batch::{BatchDriver, BatchResult};
