//! Document conversion: page sources, the page cache and the orchestrator.
//!
//! # Example
//!
//! ```no_run
//! use relayout::convert::{JsonPageSource, Orchestrator};
//! use relayout::LayoutOptions;
//!
//! fn main() -> relayout::Result<()> {
//!     let source = JsonPageSource::open("pages.json")?;
//!     let orchestrator = Orchestrator::new(LayoutOptions::default())?;
//!     let document = orchestrator.run(&source)?;
//!     println!("{}", document.to_html());
//!     Ok(())
//! }
//! ```

mod cache;
mod orchestrator;
mod source;

pub use cache::PageCache;
pub use orchestrator::{Orchestrator, ProgressFn};
pub use source::{JsonPageSource, ManifestPage, MemoryPageSource, PageManifest, PageSource};
