//! Typed page regions produced by segmentation.

use super::{Rect, TextLine};
use serde::{Deserialize, Serialize};

/// Zone type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Header,
    Footer,
    Figure,
    Image,
    Table,
    Heading,
    Body,
}

impl ZoneKind {
    /// Running header and footer zones take no reading-order index.
    pub fn is_marginal(self) -> bool {
        matches!(self, ZoneKind::Header | ZoneKind::Footer)
    }

    /// Precedence when two overlapping blocks are merged.
    pub(crate) fn merge_rank(self) -> u8 {
        match self {
            ZoneKind::Figure => 5,
            ZoneKind::Image => 4,
            ZoneKind::Table => 3,
            ZoneKind::Heading => 2,
            ZoneKind::Body => 1,
            ZoneKind::Header | ZoneKind::Footer => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Header => "header",
            ZoneKind::Footer => "footer",
            ZoneKind::Figure => "figure",
            ZoneKind::Image => "image",
            ZoneKind::Table => "table",
            ZoneKind::Heading => "heading",
            ZoneKind::Body => "body",
        }
    }
}

/// Column placement relative to the page centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    Left,
    Right,
    #[default]
    Span,
}

/// Section of a table a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSection {
    Caption,
    Header,
    Body,
    Notes,
}

/// Cell coordinates of a zone that is part of a parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTag {
    /// Table identifier, unique within the page
    pub table_id: u32,
    pub section: TableSection,
    /// Zero-based row (body cells only)
    pub row: u32,
    /// Zero-based column (header and body cells)
    pub column: u32,
    /// Ink coverage exceeded the content threshold
    pub has_content: bool,
}

/// A typed rectangular region of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Identifier, unique within the page
    pub id: usize,

    pub kind: ZoneKind,

    /// Bounding box in top-down page units
    pub rect: Rect,

    pub column: ColumnClass,

    /// Reading-order index (1-based); `None` for header and footer zones
    pub order: Option<u32>,

    /// Cell coordinates for parsed table zones
    pub table: Option<TableTag>,

    /// Text lines assigned during classification
    #[serde(default)]
    pub lines: Vec<TextLine>,

    /// Rendered fragment
    #[serde(default)]
    pub html: String,

    /// Skip during final page concatenation
    #[serde(default)]
    pub skip: bool,
}

impl Zone {
    /// Create a zone without order or lines.
    pub fn new(id: usize, kind: ZoneKind, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            column: ColumnClass::Span,
            order: None,
            table: None,
            lines: Vec::new(),
            html: String::new(),
            skip: false,
        }
    }

    /// Whether this zone is a cell of a parsed table.
    pub fn is_table_cell(&self) -> bool {
        self.table.is_some()
    }

    /// Number of text items across all lines.
    pub fn item_count(&self) -> usize {
        self.lines.iter().map(|l| l.items.len()).sum()
    }
}
