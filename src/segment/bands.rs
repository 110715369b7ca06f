//! Header band and footer separator detection from row ink profiles.

use crate::imaging::InkMap;
use crate::model::PixelRect;
use crate::options::SegmentParams;

/// Find the first ink band at the top of `area`.
///
/// Only the top fraction of the area is scanned (a larger one on the first
/// page). A band ends after `band_blank_rows` blank rows; a band still
/// running at the end of the scan window is body text, not a header. On the
/// first page, following bands separated by a small gap and of similar
/// height are merged in, so multi-line titles form one band.
pub fn find_header_band(
    ink: &InkMap,
    area: PixelRect,
    first_page: bool,
    p: &SegmentParams,
) -> Option<PixelRect> {
    let rows = ink.row_counts(area);
    let fraction = if first_page {
        p.first_page_header_fraction
    } else {
        p.header_fraction
    };
    let limit = ((area.height() as f32 * fraction).round() as usize).min(rows.len());

    let (start, mut end) = next_band(&rows, 0, limit, p.band_blank_rows)?;
    let first_height = (end - start) as f32;

    if first_page {
        while let Some((s, e)) = next_band(&rows, end, limit, p.band_blank_rows) {
            let gap = s - end;
            let height = (e - s) as f32;
            let similar = (height - first_height).abs() <= first_height * p.title_band_height_tolerance;
            if gap >= p.title_band_max_gap as usize || !similar {
                break;
            }
            end = e;
        }
    }

    let band = PixelRect::new(
        area.left,
        area.top + start as u32,
        area.right,
        area.top + end as u32,
    );
    let bounds = ink.ink_bounds(band);
    log::debug!("Header band rows {}..{} -> {:?}", start, end, bounds);
    bounds
}

/// Next band `(start, end)` starting at or after `from` and before `limit`.
/// `end` is one past the band's last ink row.
fn next_band(rows: &[u32], from: usize, limit: usize, blank_rows: u32) -> Option<(usize, usize)> {
    let start = (from..limit).find(|&y| rows[y] > 0)?;
    let mut last_ink = start;
    let mut blank = 0u32;
    for (y, &count) in rows.iter().enumerate().skip(start) {
        if count > 0 {
            if y >= limit {
                return None;
            }
            last_ink = y;
            blank = 0;
        } else {
            blank += 1;
            if blank >= blank_rows {
                return Some((start, last_ink + 1));
            }
        }
    }
    None
}

/// A run of blank rows, relative to the scanned area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankRun {
    /// First blank row
    pub top: u32,
    /// Number of blank rows
    pub len: u32,
}

/// Blank-row runs from the bottom of `area` upwards.
///
/// The first entry is the bottom margin and may be empty when the last row
/// carries ink. A run reaching the top of the area (no ink above) is not
/// reported.
pub fn blank_runs_bottom_up(ink: &InkMap, area: PixelRect) -> Vec<BlankRun> {
    let rows = ink.row_counts(area);
    let mut runs = Vec::new();
    let mut len = 0u32;
    let mut margin_done = false;

    for y in (0..rows.len()).rev() {
        if rows[y] == 0 {
            len += 1;
            continue;
        }
        if len > 0 || !margin_done {
            runs.push(BlankRun {
                top: y as u32 + 1,
                len,
            });
        }
        margin_done = true;
        len = 0;
    }
    runs
}

/// Pick the separator among bottom-up blank runs.
///
/// `runs[0]` is the bottom margin and never qualifies. A later run qualifies
/// when it is at least `min_gap` long, or at least `ratio` times the largest
/// run between it and the margin.
pub fn select_footer_gap(runs: &[u32], min_gap: u32, ratio: f32) -> Option<usize> {
    let mut max_prior = 0u32;
    for (i, &len) in runs.iter().enumerate().skip(1) {
        if len >= min_gap || (i > 1 && len as f32 >= ratio * max_prior as f32) {
            return Some(i);
        }
        max_prior = max_prior.max(len);
    }
    None
}

/// Row (absolute) where the footnote region begins, if a separator exists.
pub fn find_footer_split(ink: &InkMap, area: PixelRect, p: &SegmentParams) -> Option<u32> {
    let runs = blank_runs_bottom_up(ink, area);
    let lens: Vec<u32> = runs.iter().map(|r| r.len).collect();
    let i = select_footer_gap(&lens, p.footer_min_gap, p.footer_gap_ratio)?;
    let split = area.top + runs[i].top + runs[i].len;
    log::debug!("Footer separator: run {} of {:?}, split at row {}", i, lens, split);
    Some(split)
}
