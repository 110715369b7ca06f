//! Page input interpretation: crop range, text styles and item placement.

mod crop;
mod items;
mod style;

pub use crop::CropRangeDetector;
pub use items::{normalize_content, AssignStats, ItemClassifier};
pub use style::{strip_subset_prefix, FontNameClassifier, StyleClassifier};
