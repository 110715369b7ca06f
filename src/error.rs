//! Error types for relayout library.

use std::io;
use thiserror::Error;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during page reconstruction.
///
/// Detection misses (no crop marks, no footer gap, too few table rulings,
/// no page numeral) are never errors; every heuristic has a fallback.
/// The variants below are hard failures that reject a page or a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON (page manifest, options file, cache entry).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error decoding or handling a page bitmap.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The page source could not render the page bitmap.
    #[error("Render failed for page {page}: {message}")]
    Render {
        /// Zero-based page index
        page: usize,
        /// Failure description
        message: String,
    },

    /// The image analysis backend failed on a page.
    #[error("Segmentation failed for page {page}: {message}")]
    Segmentation {
        /// Zero-based page index
        page: usize,
        /// Failure description
        message: String,
    },

    /// The segmentation worker thread is gone.
    #[error("Segmentation worker disconnected")]
    WorkerDisconnected,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// An option value is outside its accepted range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A page-keyed cache entry is missing or corrupt.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Page index the error is attached to, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            Error::Render { page, .. } | Error::Segmentation { page, .. } => Some(*page),
            Error::PageOutOfRange(page, _) => Some(*page),
            _ => None,
        }
    }
}
