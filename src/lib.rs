//! # relayout
//!
//! Page layout reconstruction for digitized print-layout documents.
//!
//! Given per-page geometry, positioned text runs, a vector drawing stream
//! and a rendered bitmap, the library rebuilds one HTML-like fragment per
//! page with headings, paragraphs, figures, tables and footnotes in
//! reading order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relayout::convert_file;
//!
//! fn main() -> relayout::Result<()> {
//!     // A manifest of pages with their rendered PNGs
//!     let document = convert_file("pages.json")?;
//!     println!("{}", document.to_html());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Crop range**: printable area from crop marks
//! - **Segmentation**: header, footer, figures, tables and text blocks from
//!   the binarized bitmap, with reading order
//! - **Tables**: ruled tables split into caption, header, body and notes cells
//! - **Classification**: text runs to zones and lines, with style flags
//! - **Assembly**: paragraphs, headings and captions with dehyphenation
//! - **Footnotes**: superscript references resolved against the footer

pub mod convert;
pub mod error;
pub mod imaging;
pub mod model;
pub mod options;
pub mod parser;
pub mod render;
pub mod segment;

// Re-export commonly used types
pub use convert::{JsonPageSource, MemoryPageSource, Orchestrator, PageSource};
pub use error::{Error, Result};
pub use imaging::{ImageAnalysis, ImageprocBackend};
pub use model::{
    AssembledDocument, ColumnClass, DrawOp, PageFragment, Rect, SourcePage, TextRun, Viewport,
    Zone, ZoneKind,
};
pub use options::{ErrorMode, FootnoteNumbering, LayoutOptions};
pub use render::AssemblyStats;

use std::path::Path;

/// Reconstruct a document from a JSON page manifest.
///
/// # Example
///
/// ```no_run
/// use relayout::convert_file;
///
/// let doc = convert_file("pages.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<AssembledDocument> {
    convert_file_with_options(path, LayoutOptions::default())
}

/// Reconstruct a document from a JSON page manifest with custom options.
///
/// # Example
///
/// ```no_run
/// use relayout::{convert_file_with_options, LayoutOptions};
///
/// let options = LayoutOptions::new().lenient().sequential();
/// let doc = convert_file_with_options("pages.json", options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>>(
    path: P,
    options: LayoutOptions,
) -> Result<AssembledDocument> {
    let source = JsonPageSource::open(path)?;
    convert_source(&source, options)
}

/// Reconstruct a document from any page source.
pub fn convert_source(source: &dyn PageSource, options: LayoutOptions) -> Result<AssembledDocument> {
    Orchestrator::new(options)?.run(source)
}

/// Convert a JSON page manifest straight to the concatenated HTML.
///
/// # Example
///
/// ```no_run
/// use relayout::to_html;
///
/// let html = to_html("pages.json").unwrap();
/// std::fs::write("out.html", html).unwrap();
/// ```
pub fn to_html<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(convert_file(path)?.to_html())
}

/// Builder for reconstructing documents.
///
/// # Example
///
/// ```no_run
/// use relayout::{FootnoteNumbering, Relayout};
///
/// let html = Relayout::new()
///     .lenient()
///     .with_footnote_numbering(FootnoteNumbering::Continuous)
///     .convert("pages.json")?
///     .to_html();
/// # Ok::<(), relayout::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Relayout {
    options: LayoutOptions,
}

impl Relayout {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options.
    pub fn with_options(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Apply option overrides from a JSON file on top of the current
    /// options.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.options = self.options.merge_json_file(path)?;
        Ok(self)
    }

    /// Skip failing pages instead of aborting.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set footnote numbering policy.
    pub fn with_footnote_numbering(mut self, numbering: FootnoteNumbering) -> Self {
        self.options = self.options.with_footnote_numbering(numbering);
        self
    }

    /// Set render scale.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.options = self.options.with_render_scale(scale);
        self
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Convert a JSON page manifest.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<AssembledDocument> {
        convert_file_with_options(path, self.options)
    }

    /// Convert pages from any source.
    pub fn convert_source(self, source: &dyn PageSource) -> Result<AssembledDocument> {
        convert_source(source, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relayout_builder() {
        let builder = Relayout::new()
            .lenient()
            .sequential()
            .with_footnote_numbering(FootnoteNumbering::Continuous)
            .with_render_scale(2.0);

        assert_eq!(builder.options().error_mode, ErrorMode::Lenient);
        assert!(!builder.options().parallel);
        assert_eq!(
            builder.options().footnote_numbering,
            FootnoteNumbering::Continuous
        );
        assert_eq!(builder.options().render_scale, 2.0);
    }

    #[test]
    fn test_relayout_builder_default() {
        let builder = Relayout::default();
        assert_eq!(builder.options(), &LayoutOptions::default());
    }

    #[test]
    fn test_convert_missing_manifest() {
        let result = convert_file("does-not-exist.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"parallel": false, "segment": {"line_tolerance": 12}}"#).unwrap();

        let builder = Relayout::new().with_config_file(&path).unwrap();
        assert!(!builder.options().parallel);
        assert_eq!(builder.options().segment.line_tolerance, 12);
        assert_eq!(builder.options().segment.header_fraction, 0.20);
    }

    #[test]
    fn test_config_file_keeps_builder_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"segment": {"line_tolerance": 12}}"#).unwrap();

        let builder = Relayout::new().sequential().lenient().with_config_file(&path).unwrap();
        assert!(!builder.options().parallel);
        assert_eq!(builder.options().error_mode, ErrorMode::Lenient);
        assert_eq!(builder.options().segment.line_tolerance, 12);
    }

    #[test]
    fn test_config_file_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"paralel": false}"#).unwrap();
        assert!(matches!(
            Relayout::new().with_config_file(&path),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_convert_empty_source() {
        let doc = convert_source(&MemoryPageSource::new(), LayoutOptions::default()).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.to_html(), "");
    }
}
