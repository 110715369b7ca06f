//! Data model for page layout reconstruction.
//!
//! Input types ([`SourcePage`], [`TextRun`], [`DrawOp`]) describe a page as
//! a page source delivers it. Intermediate types ([`Zone`], [`TextItem`],
//! [`TextLine`]) are created fresh per page and discarded once the page
//! fragment is rendered. Output types ([`PageFragment`],
//! [`AssembledDocument`]) are what callers keep.

mod document;
mod geometry;
mod item;
mod page;
mod zone;

pub use document::{AssembledDocument, PageFragment};
pub use geometry::{PixelRect, Point, Rect};
pub use item::{
    is_spaceless_script_char, parse_bare_integer, FontSignature, StyleFlags, TextItem, TextLine,
};
pub use page::{DrawOp, PathOp, SourcePage, TextRun, Viewport};
pub use zone::{ColumnClass, TableSection, TableTag, Zone, ZoneKind};
