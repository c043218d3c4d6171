pub mod thresholding;
pub mod labelling;
pub mod descriptors;
pub mod selection;

pub use thresholding::*;
pub use labelling::*;
pub use descriptors::*;
pub use selection::*;
