//! Decomposition of table zones into a cell grid.

use super::blocks::Block;
use crate::imaging::{ImageAnalysis, InkMap};
use crate::model::{PixelRect, TableSection, TableTag, ZoneKind};
use crate::options::TableParams;

/// A vertical span `[start, end)` in table-local pixels.
type Span = (u32, u32);

/// Parses a TABLE region into caption, header, body and notes cells.
#[derive(Debug, Clone, Default)]
pub struct TableStructureParser {
    params: TableParams,
}

impl TableStructureParser {
    pub fn new(params: TableParams) -> Self {
        Self { params }
    }

    /// Split the table at `rect` into cells.
    ///
    /// `ink` is the page ink before any region was masked. Returns `None`
    /// when fewer than `min_rulings` horizontal rulings are found, in which
    /// case the table stays a single opaque zone.
    pub fn parse(
        &self,
        backend: &dyn ImageAnalysis,
        ink: &InkMap,
        rect: PixelRect,
        table_id: u32,
    ) -> Option<Vec<Block>> {
        let p = &self.params;
        let local = ink.crop(rect);
        let (w, h) = (local.width(), local.height());
        if w == 0 || h == 0 {
            return None;
        }

        let kernel = ((w as f32 * p.rule_min_fraction).round() as u32).max(1);
        // A ruling row holds at least one kernel of ink after the opening
        let counts: Vec<u32> = backend
            .open(&local, kernel, 1)
            .row_counts(local.bounds())
            .into_iter()
            .map(|n| if n >= kernel { n } else { 0 })
            .collect();
        let rulings = ink_runs(&counts);
        if rulings.len() < p.min_rulings {
            log::debug!(
                "Table {}: {} rulings, kept as one zone",
                table_id,
                rulings.len()
            );
            return None;
        }

        let first = rulings[0];
        let second = rulings[1];
        let last = rulings[rulings.len() - 1];
        let header_band: Span = (first.1, second.0);
        let body_band: Span = (second.1, last.0);

        let dividers = self.column_dividers(&local, header_band);
        let mut bounds = vec![0];
        bounds.extend(dividers.iter().copied());
        bounds.push(w);
        let columns: Vec<Span> = bounds.windows(2).map(|b| (b[0], b[1])).collect();

        let inner = &rulings[2..rulings.len() - 1];
        let rows = if inner.is_empty() {
            self.river_rows(&local, body_band)
        } else {
            let mut edges = vec![body_band.0];
            for r in inner {
                edges.push(r.0);
                edges.push(r.1);
            }
            edges.push(body_band.1);
            edges
                .chunks(2)
                .map(|e| (e[0], e[1]))
                .filter(|(s, e)| e > s)
                .collect()
        };

        let tag = |section, row, column, has_content| TableTag {
            table_id,
            section,
            row,
            column,
            has_content,
        };
        let absolute = |r: PixelRect| {
            PixelRect::new(
                r.left + rect.left,
                r.top + rect.top,
                r.right + rect.left,
                r.bottom + rect.top,
            )
        };
        let mut cells = Vec::new();
        let mut push = |r: PixelRect, t: TableTag| {
            let mut block = Block::new(absolute(r), ZoneKind::Table);
            block.table = Some(t);
            cells.push(block);
        };

        if let Some(caption) = local.ink_bounds(PixelRect::new(0, 0, w, first.0)) {
            push(caption, tag(TableSection::Caption, 0, 0, true));
        }
        if header_band.1 > header_band.0 {
            for (c, &(x0, x1)) in columns.iter().enumerate() {
                let cell = PixelRect::new(x0, header_band.0, x1, header_band.1);
                let has_content = local.density(cell) > p.content_density;
                push(cell, tag(TableSection::Header, 0, c as u32, has_content));
            }
        }
        for (r, &(y0, y1)) in rows.iter().enumerate() {
            for (c, &(x0, x1)) in columns.iter().enumerate() {
                let cell = PixelRect::new(x0, y0, x1, y1);
                let has_content = local.density(cell) > p.content_density;
                push(cell, tag(TableSection::Body, r as u32, c as u32, has_content));
            }
        }
        if let Some(notes) = local.ink_bounds(PixelRect::new(0, last.1, w, h)) {
            push(notes, tag(TableSection::Notes, 0, 0, true));
        }

        log::debug!(
            "Table {}: {} rulings, {} columns, {} body rows, {} cells",
            table_id,
            rulings.len(),
            columns.len(),
            rows.len(),
            cells.len()
        );
        Some(cells)
    }

    /// Divider x positions from vertical rivers in the header band.
    fn column_dividers(&self, local: &InkMap, band: Span) -> Vec<u32> {
        let p = &self.params;
        if band.1 <= band.0 {
            return Vec::new();
        }
        let height = (band.1 - band.0) as f32;
        let region = PixelRect::new(0, band.0, local.width(), band.1);
        let blank: Vec<bool> = local
            .column_counts(region)
            .iter()
            .map(|&n| (n as f32 / height) < p.column_river_density)
            .collect();
        rivers(&blank, p.column_river_min_width)
            .into_iter()
            .map(|(s, e)| (s + e) / 2)
            .collect()
    }

    /// Body rows separated by horizontal rivers.
    fn river_rows(&self, local: &InkMap, band: Span) -> Vec<Span> {
        let p = &self.params;
        if band.1 <= band.0 {
            return Vec::new();
        }
        let width = local.width() as f32;
        let region = PixelRect::new(0, band.0, local.width(), band.1);
        let blank: Vec<bool> = local
            .row_counts(region)
            .iter()
            .map(|&n| (n as f32 / width) < p.row_river_density)
            .collect();

        let mut dividers: Vec<u32> = Vec::new();
        for (s, e) in rivers(&blank, p.row_river_min_height) {
            let y = band.0 + (s + e) / 2;
            match dividers.last() {
                Some(&prev) if y - prev < p.divider_dedupe => {}
                _ => dividers.push(y),
            }
        }

        let mut edges = vec![band.0];
        edges.extend(dividers);
        edges.push(band.1);
        edges.windows(2).map(|e| (e[0], e[1])).collect()
    }
}

/// Maximal runs of rows with any ink, as `(start, end)`.
fn ink_runs(counts: &[u32]) -> Vec<Span> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &n) in counts.iter().enumerate() {
        match (n > 0, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s as u32, i as u32));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s as u32, counts.len() as u32));
    }
    runs
}

/// Runs of `true` at least `min_len` long that touch neither end.
fn rivers(blank: &[bool], min_len: u32) -> Vec<Span> {
    let inverted: Vec<u32> = blank.iter().map(|&b| b as u32).collect();
    ink_runs(&inverted)
        .into_iter()
        .filter(|&(s, e)| s > 0 && (e as usize) < blank.len() && e - s >= min_len)
        .collect()
}

/// Drop table regions whose sides all lie within `tolerance` of an earlier
/// one.
pub fn dedupe_tables(tables: &mut Vec<PixelRect>, tolerance: u32) {
    let mut kept: Vec<PixelRect> = Vec::with_capacity(tables.len());
    for t in tables.drain(..) {
        if !kept.iter().any(|k| k.approx_eq(&t, tolerance)) {
            kept.push(t);
        }
    }
    *tables = kept;
}
