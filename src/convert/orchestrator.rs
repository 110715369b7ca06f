//! Per-page pipeline and cross-page assembly.
//!
//! Pages go through three phases:
//!
//! 1. **Prepare** (sequential): crop range, render, segmentation through the
//!    single segmentation worker. The result is spilled to the page cache.
//! 2. **Assemble** (page-local, parallel with rayon when enabled): item
//!    classification, reading-order assembly, footnotes and tables.
//! 3. **Fold** (sequential): footnote offsets, page numerals and
//!    concatenation into the document.

use super::cache::PageCache;
use super::source::PageSource;
use crate::error::{Error, Result};
use crate::imaging::{ImageAnalysis, ImageprocBackend};
use crate::model::{AssembledDocument, PageFragment, Rect, SourcePage, Zone, ZoneKind};
use crate::options::{ErrorMode, FootnoteNumbering, LayoutOptions};
use crate::parser::{CropRangeDetector, ItemClassifier, StyleClassifier};
use crate::render::{
    dominant_signature, AssemblyStats, FootnoteResolver, FootnoteTable, ReadingOrderAssembler,
    TableAssembler,
};
use crate::segment::{SegmentRequest, Segmentation, SegmentationService, ZoneSegmenter};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Progress callback: pages prepared so far and the page total.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

fn footnote_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<footnote data-index="(\d+)">"#).unwrap())
}

/// What survives between the prepare and assemble phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreparedPage {
    page: SourcePage,
    crop: Rect,
    segmentation: Segmentation,
}

/// A page after the page-local phase.
#[derive(Debug, Clone)]
struct AssembledPage {
    index: usize,
    zones: Vec<Zone>,
    /// Numeral printed on the page, if detected
    numeral: Option<u32>,
    /// Largest footnote index seen on the page
    footnote_max: u32,
    stats: AssemblyStats,
}

/// Runs the layout pipeline over a page source.
#[derive(Clone)]
pub struct Orchestrator {
    options: LayoutOptions,
    crop: CropRangeDetector,
    segmenter: ZoneSegmenter,
    classifier: ItemClassifier,
    assembler: ReadingOrderAssembler,
    footnotes: FootnoteResolver,
    tables: TableAssembler,
    progress: Option<Arc<ProgressFn>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator. Fails if the options are out of range.
    pub fn new(options: LayoutOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            crop: CropRangeDetector::new(options.crop.clone()),
            segmenter: ZoneSegmenter::from_options(&options),
            classifier: ItemClassifier::new(options.classify.clone()),
            assembler: ReadingOrderAssembler::new(options.assembly.clone()),
            footnotes: FootnoteResolver::new(options.footnote.clone(), &options.classify),
            tables: TableAssembler::new(),
            progress: None,
            options,
        })
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Use a different font-name style classifier.
    pub fn with_style_classifier(mut self, style: Arc<dyn StyleClassifier>) -> Self {
        self.classifier = self.classifier.with_style_classifier(style);
        self
    }

    /// Report progress after each prepared page.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Reconstruct every page of `source` with the default image backend.
    pub fn run(&self, source: &dyn PageSource) -> Result<AssembledDocument> {
        self.run_with_backend(source, Box::new(ImageprocBackend::new()))
    }

    /// Reconstruct every page of `source`, segmenting with `backend`.
    pub fn run_with_backend(
        &self,
        source: &dyn PageSource,
        backend: Box<dyn ImageAnalysis>,
    ) -> Result<AssembledDocument> {
        let total = source.page_count();
        let mut service = SegmentationService::spawn(self.segmenter.clone(), backend)?;
        let cache = PageCache::new();
        let mut skipped = Vec::new();
        let mut prepared = Vec::with_capacity(total);

        for index in 0..total {
            let outcome = self
                .prepare_page(&mut service, source, index)
                .and_then(|page| cache.put(index, &page));
            match outcome {
                Ok(size) => {
                    log::debug!("Page {} prepared ({} bytes cached)", index, size);
                    prepared.push(index);
                }
                Err(e) => self.reject(index, e, &mut skipped)?,
            }
            if let Some(progress) = &self.progress {
                progress(index + 1, total);
            }
        }
        drop(service);

        let assemble = |&index: &usize| -> (usize, Result<AssembledPage>) {
            let page = cache
                .take::<PreparedPage>(index)
                .map(|prepared| self.assemble_page(prepared));
            (index, page)
        };
        let results: Vec<(usize, Result<AssembledPage>)> = if self.options.parallel {
            prepared.par_iter().map(assemble).collect()
        } else {
            prepared.iter().map(assemble).collect()
        };

        let mut pages = Vec::with_capacity(results.len());
        for (index, result) in results {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => self.reject(index, e, &mut skipped)?,
            }
        }
        skipped.sort_unstable();

        let mut document = self.fold(pages);
        document.skipped_pages = skipped;
        log::debug!(
            "Assembled {} pages ({} skipped), {} footnotes resolved",
            document.page_count(),
            document.skipped_pages.len(),
            document.stats.footnotes_resolved
        );
        Ok(document)
    }

    /// Zones of one page after assembly, with their lines and fragments.
    ///
    /// Footnote indices are page-local.
    pub fn page_zones(&self, source: &dyn PageSource, index: usize) -> Result<Vec<Zone>> {
        let total = source.page_count();
        if index >= total {
            return Err(Error::PageOutOfRange(index, total));
        }
        let mut service = SegmentationService::with_default_backend(self.segmenter.clone())?;
        let prepared = self.prepare_page(&mut service, source, index)?;
        Ok(self.assemble_page(prepared).zones)
    }

    fn reject(&self, index: usize, err: Error, skipped: &mut Vec<usize>) -> Result<()> {
        match self.options.error_mode {
            ErrorMode::Strict => Err(err),
            ErrorMode::Lenient => {
                log::warn!("Skipping page {}: {}", index, err);
                skipped.push(index);
                Ok(())
            }
        }
    }

    fn prepare_page(
        &self,
        service: &mut SegmentationService,
        source: &dyn PageSource,
        index: usize,
    ) -> Result<PreparedPage> {
        let page = source.load_page(index)?;
        let crop = self.crop.detect(&page.operators, &page.viewport);
        let viewport = page.viewport.with_scale(self.options.render_scale);
        let bitmap = source.render(index, &viewport)?;

        let segmentation = service.segment(SegmentRequest {
            page_index: index,
            bitmap,
            viewport,
            crop,
            anchors: page.figure_anchors.clone(),
            first_page: index == 0,
        })?;
        Ok(PreparedPage {
            page,
            crop,
            segmentation,
        })
    }

    fn assemble_page(&self, prepared: PreparedPage) -> AssembledPage {
        let PreparedPage {
            page,
            crop,
            segmentation,
        } = prepared;
        let mut stats = AssemblyStats::new();
        let mut zones = segmentation.zones;

        let items = self.classifier.items_from_runs(&page.runs, &page.viewport);
        let assigned = self.classifier.assign(items, &crop, &mut zones);
        stats.items_dropped +=
            (assigned.outside_crop + assigned.under_image + assigned.unzoned) as u32;

        let referenced = self.footnotes.mark_references(&mut zones);
        let page_dominant = dominant_signature(
            zones
                .iter()
                .filter(|z| !z.kind.is_marginal())
                .flat_map(|z| z.lines.iter())
                .flat_map(|l| l.items.iter()),
        );
        for zone in zones.iter_mut().filter(|z| !z.is_table_cell()) {
            self.assembler
                .assemble_zone(zone, page_dominant.as_ref(), &mut stats);
        }

        let start = match self.options.footnote_numbering {
            FootnoteNumbering::PageLocal => Some(1),
            FootnoteNumbering::Continuous => None,
        };
        let table = match zones.iter().find(|z| z.kind == ZoneKind::Footer) {
            Some(footer) => self.footnotes.parse_footer(footer, start, &self.assembler),
            None => FootnoteTable::default(),
        };
        let report = self.footnotes.resolve(page.index, &mut zones, &table);
        stats.footnotes_resolved += report.resolved;
        stats.footnotes_unresolved += report.unresolved.len() as u32;
        stats.footnotes_unreferenced += report.unreferenced.len() as u32;

        for _ in 0..self.tables.assemble(&mut zones, &self.assembler) {
            stats.add_table();
        }

        let numeral = header_numeral(&zones).or(table.folio);
        let footnote_max = table
            .entries
            .keys()
            .chain(referenced.iter())
            .copied()
            .max()
            .unwrap_or(0);

        stats.add_page();
        stats.zone_count += zones.len() as u32;
        log::debug!(
            "Page {}: {} zones, numeral {:?}, {} footnotes",
            page.index,
            zones.len(),
            numeral,
            table.entries.len()
        );

        AssembledPage {
            index: page.index,
            zones,
            numeral,
            footnote_max,
            stats,
        }
    }

    /// Apply cross-page counters and concatenate zone fragments.
    fn fold(&self, pages: Vec<AssembledPage>) -> AssembledDocument {
        let mut document = AssembledDocument::new();
        let mut offset = 0u32;
        let mut last_numeral: Option<u32> = None;

        for page in pages {
            let numeral = page
                .numeral
                .unwrap_or_else(|| last_numeral.map_or(page.index as u32 + 1, |n| n + 1));
            last_numeral = Some(numeral);

            let mut html = page
                .zones
                .iter()
                .filter(|z| !z.skip && !z.html.is_empty())
                .map(|z| z.html.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            if self.options.footnote_numbering == FootnoteNumbering::PageLocal {
                if offset > 0 {
                    html = shift_footnotes(&html, offset);
                }
                offset += page.footnote_max;
            }

            document.stats.merge(&page.stats);
            document.pages.push(PageFragment {
                index: page.index,
                numeral,
                html,
            });
        }
        document
    }
}

/// First bare integer in a running header.
fn header_numeral(zones: &[Zone]) -> Option<u32> {
    zones
        .iter()
        .filter(|z| z.kind == ZoneKind::Header)
        .flat_map(|z| z.lines.iter())
        .flat_map(|l| l.items.iter())
        .find_map(|item| item.as_integer())
}

/// Add `offset` to every footnote index in `html`.
fn shift_footnotes(html: &str, offset: u32) -> String {
    footnote_open_regex()
        .replace_all(html, |caps: &regex::Captures| {
            let index: u32 = caps[1].parse().unwrap_or(0);
            format!("<footnote data-index=\"{}\">", index + offset)
        })
        .into_owned()
}
