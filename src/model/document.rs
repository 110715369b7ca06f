//! Document-level output types.

use crate::render::AssemblyStats;
use serde::{Deserialize, Serialize};

/// The assembled fragment of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFragment {
    /// Zero-based page index in the source
    pub index: usize,

    /// Printed page numeral (detected or carried forward)
    pub numeral: u32,

    /// Page body, without the page-break marker
    pub html: String,
}

impl PageFragment {
    /// The page-break marker that precedes this page in the document.
    pub fn page_break(&self) -> String {
        format!("<hr class=\"page-break\" data-start=\"{}\"/>", self.numeral)
    }
}

/// A reconstructed document: one fragment per successfully processed page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssembledDocument {
    /// Page fragments in page order
    pub pages: Vec<PageFragment>,

    /// Pages rejected in lenient mode
    pub skipped_pages: Vec<usize>,

    /// Assembly statistics
    pub stats: AssemblyStats,
}

impl AssembledDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assembled pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Get a fragment by source page index.
    pub fn get_page(&self, index: usize) -> Option<&PageFragment> {
        self.pages.iter().find(|p| p.index == index)
    }

    /// Concatenate all pages, each prefixed by its page-break marker.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&page.page_break());
            out.push('\n');
            out.push_str(&page.html);
            if !page.html.is_empty() && !page.html.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
