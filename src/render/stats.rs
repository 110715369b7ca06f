//! Assembly statistics.

use serde::{Deserialize, Serialize};

/// Statistics collected while assembling pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyStats {
    /// Pages assembled into the document
    pub page_count: u32,

    /// Zones produced by segmentation
    pub zone_count: u32,

    /// Paragraphs emitted
    pub paragraph_count: u32,

    /// Heading blocks emitted
    pub heading_count: u32,

    /// Figure captions emitted
    pub caption_count: u32,

    /// Tables assembled from cells
    pub table_count: u32,

    /// References resolved to a footnote body
    pub footnotes_resolved: u32,

    /// References left as plain numbers
    pub footnotes_unresolved: u32,

    /// Footnote entries nothing referenced
    pub footnotes_unreferenced: u32,

    /// Text items dropped (outside the crop area or under an image)
    pub items_dropped: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,
}

impl AssemblyStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    pub fn add_paragraph(&mut self) {
        self.paragraph_count += 1;
    }

    pub fn add_heading(&mut self) {
        self.heading_count += 1;
    }

    pub fn add_caption(&mut self) {
        self.caption_count += 1;
    }

    pub fn add_table(&mut self) {
        self.table_count += 1;
    }

    /// Add word counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &AssemblyStats) {
        self.page_count += other.page_count;
        self.zone_count += other.zone_count;
        self.paragraph_count += other.paragraph_count;
        self.heading_count += other.heading_count;
        self.caption_count += other.caption_count;
        self.table_count += other.table_count;
        self.footnotes_resolved += other.footnotes_resolved;
        self.footnotes_unresolved += other.footnotes_unresolved;
        self.footnotes_unreferenced += other.footnotes_unreferenced;
        self.items_dropped += other.items_dropped;
        self.word_count += other.word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_stats_merge() {
        let mut stats1 = AssemblyStats::new();
        stats1.paragraph_count = 5;
        stats1.table_count = 2;

        let stats2 = AssemblyStats {
            paragraph_count: 3,
            table_count: 1,
            footnotes_resolved: 4,
            ..Default::default()
        };

        stats1.merge(&stats2);

        assert_eq!(stats1.paragraph_count, 8);
        assert_eq!(stats1.table_count, 3);
        assert_eq!(stats1.footnotes_resolved, 4);
    }

    #[test]
    fn test_count_text() {
        let mut stats = AssemblyStats::new();
        stats.count_text("Hello, world! This is a test.");
        assert_eq!(stats.word_count, 6);
    }
}
