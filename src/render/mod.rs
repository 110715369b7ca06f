//! Rendering of classified zones into HTML fragments.

mod dehyphen;
pub mod footnotes;
pub mod markup;
mod reading;
mod stats;
mod tables;

pub use dehyphen::{Dehyphenator, Join};
pub use footnotes::{FootnoteEntry, FootnoteResolver, FootnoteTable, ResolveReport};
pub use reading::{dominant_signature, footnote_placeholder, InlineBuilder, ReadingOrderAssembler};
pub use stats::AssemblyStats;
pub use tables::TableAssembler;
