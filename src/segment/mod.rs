//! Zone segmentation of rendered pages.
//!
//! The [`ZoneSegmenter`] partitions a binarized page bitmap into typed
//! regions and assigns them a reading order:
//!
//! 1. header (or first-page title) band
//! 2. footer separator and the footnote region below it
//! 3. framed and anchored figures
//! 4. tables grown from horizontal rules
//! 5. remaining text and image blocks
//! 6. centre-straddling heading merge, consolidation, reading order
//! 7. table zones split into cells
//!
//! Every detection miss has a fallback; only a broken bitmap or a failing
//! backend produces an error.

pub mod bands;
pub mod blocks;
pub mod figures;
pub mod order;
pub mod table_grid;
pub mod tables;
pub mod worker;

pub use blocks::Block;
pub use table_grid::TableStructureParser;
pub use worker::SegmentationService;

use crate::error::{Error, Result};
use crate::imaging::ImageAnalysis;
use crate::model::{PixelRect, Point, Rect, Viewport, Zone, ZoneKind};
use crate::options::{LayoutOptions, SegmentParams, TableParams};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One page submitted for segmentation.
#[derive(Debug, Clone)]
pub struct SegmentRequest {
    pub page_index: usize,
    /// Rendered page
    pub bitmap: RgbaImage,
    pub viewport: Viewport,
    /// Printable area in page units
    pub crop: Rect,
    /// Figure label anchors in page units
    pub anchors: Vec<Point>,
    /// The first page carries the title band
    pub first_page: bool,
}

/// Zones of one page in page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub page_index: usize,

    /// Header zones first, then zones in reading order, footer last
    pub zones: Vec<Zone>,

    /// Bitmap pixels per page unit
    pub scale: f32,

    /// Top of the footnote region in page units
    pub footer_split: Option<f32>,
}

impl Segmentation {
    /// The footer zone, if a separator was found.
    pub fn footer(&self) -> Option<&Zone> {
        self.zones.iter().find(|z| z.kind == ZoneKind::Footer)
    }

    /// Zones that take part in reading order.
    pub fn ordered(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.order.is_some())
    }
}

/// Partitions a page bitmap into typed, ordered zones.
#[derive(Debug, Clone)]
pub struct ZoneSegmenter {
    segment: SegmentParams,
    tables: TableStructureParser,
    table_dedupe: u32,
}

impl Default for ZoneSegmenter {
    fn default() -> Self {
        Self::new(SegmentParams::default(), TableParams::default())
    }
}

impl ZoneSegmenter {
    pub fn new(segment: SegmentParams, table: TableParams) -> Self {
        Self {
            segment,
            table_dedupe: table.zone_dedupe,
            tables: TableStructureParser::new(table),
        }
    }

    pub fn from_options(options: &LayoutOptions) -> Self {
        Self::new(options.segment.clone(), options.table.clone())
    }

    /// Segment one page.
    pub fn segment(&self, backend: &dyn ImageAnalysis, req: &SegmentRequest) -> Result<Segmentation> {
        let p = &self.segment;
        let (width, height) = req.bitmap.dimensions();
        if width == 0 || height == 0 || req.viewport.width <= 0.0 {
            return Err(Error::Segmentation {
                page: req.page_index,
                message: format!(
                    "empty bitmap {}x{} for viewport {}x{}",
                    width, height, req.viewport.width, req.viewport.height
                ),
            });
        }
        let scale = width as f32 / req.viewport.width;

        let gray = backend.grayscale(&req.bitmap);
        let mut ink = backend.binarize(&gray, p.binarize_threshold);
        let area = req.crop.to_pixels(scale, width, height);
        ink.clear_outside(area);
        let original = ink.clone();
        let centre_x2 = area.centre_x2();

        let anchors: Vec<(u32, u32)> = req
            .anchors
            .iter()
            .map(|a| ((a.x * scale).max(0.0) as u32, (a.y * scale).max(0.0) as u32))
            .collect();

        let mut found: Vec<Block> = Vec::new();

        if let Some(band) = bands::find_header_band(&ink, area, req.first_page, p) {
            let kind = if req.first_page {
                ZoneKind::Heading
            } else {
                ZoneKind::Header
            };
            found.push(Block::new(band, kind));
            ink.mask(band);
        }

        let footer_split = bands::find_footer_split(&ink, area, p);
        if let Some(split) = footer_split {
            let region = PixelRect::new(area.left, split, area.right, area.bottom);
            let rect = ink.ink_bounds(region).unwrap_or(region);
            found.push(Block::new(rect, ZoneKind::Footer));
            ink.mask(region);
        }

        for rect in figures::detect_figures(backend, &ink, &anchors, p) {
            ink.mask(rect);
            found.push(Block::new(rect, ZoneKind::Figure));
        }

        let mut table_rects = tables::detect_tables(backend, &ink, area, p);
        table_grid::dedupe_tables(&mut table_rects, self.table_dedupe);
        for &rect in &table_rects {
            ink.mask(rect);
            found.push(Block::new(rect, ZoneKind::Table));
        }

        let mut regions = blocks::detect_blocks(backend, &ink, &anchors, p);
        blocks::merge_headings(&mut regions, centre_x2, p);

        let (marginal, others): (Vec<Block>, Vec<Block>) =
            found.into_iter().partition(|b| b.kind.is_marginal());
        regions.extend(others);
        blocks::consolidate(&mut regions, centre_x2, p);
        regions.extend(marginal);

        order::classify_columns(&mut regions, centre_x2, p.centre_tolerance);
        order::assign_order(&mut regions, p.line_tolerance);

        let mut cells_added = false;
        let mut table_id = 0u32;
        let mut expanded: Vec<Block> = Vec::with_capacity(regions.len());
        for block in regions {
            if block.kind != ZoneKind::Table {
                expanded.push(block);
                continue;
            }
            match self.tables.parse(backend, &original, block.rect, table_id) {
                Some(cells) => {
                    expanded.extend(cells.into_iter().map(|mut cell| {
                        cell.column = block.column;
                        cell.order = block.order;
                        cell
                    }));
                    cells_added = true;
                }
                None => expanded.push(block),
            }
            table_id += 1;
        }
        if cells_added {
            order::renumber(&mut expanded);
        }

        let zones = into_zones(expanded, scale);
        log::debug!(
            "Page {}: {} zones ({} ordered), footer split {:?}",
            req.page_index,
            zones.len(),
            zones.iter().filter(|z| z.order.is_some()).count(),
            footer_split
        );

        Ok(Segmentation {
            page_index: req.page_index,
            zones,
            scale,
            footer_split: footer_split.map(|y| y as f32 / scale),
        })
    }
}

fn into_zones(mut blocks: Vec<Block>, scale: f32) -> Vec<Zone> {
    // Header first, ordered zones next, footer last.
    blocks.sort_by_key(|b| match (b.kind, b.order) {
        (ZoneKind::Header, _) => (0, 0),
        (_, Some(order)) => (1, order),
        _ => (2, 0),
    });
    blocks
        .into_iter()
        .enumerate()
        .map(|(id, b)| {
            let mut zone = Zone::new(id, b.kind, b.rect.to_units(scale));
            zone.column = b.column;
            zone.order = b.order;
            zone.table = b.table;
            zone
        })
        .collect()
}
