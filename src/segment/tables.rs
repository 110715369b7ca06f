//! Table region detection from horizontal rules.

use crate::imaging::{ImageAnalysis, InkMap};
use crate::model::PixelRect;
use crate::options::SegmentParams;

/// Horizontal rule segments: thin ink runs at least `rule_min_width` wide,
/// sorted top to bottom.
pub fn detect_rules(backend: &dyn ImageAnalysis, ink: &InkMap, p: &SegmentParams) -> Vec<PixelRect> {
    let opened = backend.open(ink, p.rule_min_width, 1);
    let mut rules: Vec<PixelRect> = backend
        .outer_contours(&opened)
        .into_iter()
        .map(|c| c.rect)
        .filter(|r| r.height() <= p.rule_max_thickness)
        .collect();
    rules.sort_by_key(|r| (r.top, r.left));
    rules
}

/// Group rules into table cores. Consecutive rules closer than
/// `table_core_max_gap` join one core; a core needs `table_min_rules`.
pub fn group_cores(rules: &[PixelRect], p: &SegmentParams) -> Vec<PixelRect> {
    let mut cores = Vec::new();
    let mut current: Option<(PixelRect, usize)> = None;

    for rule in rules {
        current = match current {
            Some((core, n)) if rule.top.saturating_sub(core.bottom) < p.table_core_max_gap => {
                Some((core.union(rule), n + 1))
            }
            Some((core, n)) => {
                if n >= p.table_min_rules {
                    cores.push(core);
                }
                Some((*rule, 1))
            }
            None => Some((*rule, 1)),
        };
    }
    if let Some((core, n)) = current {
        if n >= p.table_min_rules {
            cores.push(core);
        }
    }
    cores
}

/// Grow a core upwards and downwards until `table_expand_blank_rows` blank
/// rows (within the core's columns) are met, then trim to the ink.
pub fn expand_core(ink: &InkMap, core: PixelRect, area: PixelRect, p: &SegmentParams) -> PixelRect {
    let blank_row = |y: u32| ink.count(PixelRect::new(core.left, y, core.right, y + 1)) == 0;

    let mut top = core.top;
    let mut run = 0;
    let mut y = core.top;
    while y > area.top {
        y -= 1;
        if blank_row(y) {
            run += 1;
            if run >= p.table_expand_blank_rows {
                break;
            }
        } else {
            run = 0;
            top = y;
        }
    }

    let mut bottom = core.bottom;
    run = 0;
    y = core.bottom;
    while y < area.bottom {
        if blank_row(y) {
            run += 1;
            if run >= p.table_expand_blank_rows {
                break;
            }
        } else {
            run = 0;
            bottom = y + 1;
        }
        y += 1;
    }

    let region = PixelRect::new(core.left, top, core.right, bottom);
    ink.ink_bounds(region).unwrap_or(region)
}

/// Detect table regions: rule cores expanded to their captions and notes.
pub fn detect_tables(
    backend: &dyn ImageAnalysis,
    ink: &InkMap,
    area: PixelRect,
    p: &SegmentParams,
) -> Vec<PixelRect> {
    let rules = detect_rules(backend, ink, p);
    let tables: Vec<PixelRect> = group_cores(&rules, p)
        .into_iter()
        .map(|core| expand_core(ink, core, area, p))
        .collect();
    log::debug!("Detected {} rules, {} tables", rules.len(), tables.len());
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageprocBackend;

    fn rule(ink: &mut InkMap, y: u32) {
        ink.fill(PixelRect::new(50, y, 350, y + 2), true);
    }

    #[test]
    fn test_group_cores() {
        let p = SegmentParams::default();
        let r = |y: u32| PixelRect::new(50, y, 350, y + 2);
        let cores = group_cores(&[r(100), r(130), r(180), r(400), r(600), r(620)], &p);
        assert_eq!(
            cores,
            vec![PixelRect::new(50, 100, 350, 182), PixelRect::new(50, 600, 350, 622)]
        );
    }

    #[test]
    fn test_detect_table_with_caption_and_notes() {
        let mut ink = InkMap::new(400, 600);
        // Caption, three rules with text between, a note, then body text far below
        ink.fill(PixelRect::new(50, 80, 200, 90), true);
        rule(&mut ink, 100);
        ink.fill(PixelRect::new(60, 108, 100, 116), true);
        rule(&mut ink, 125);
        ink.fill(PixelRect::new(60, 132, 100, 140), true);
        rule(&mut ink, 150);
        ink.fill(PixelRect::new(50, 160, 150, 168), true);
        ink.fill(PixelRect::new(50, 300, 350, 310), true);

        let tables = detect_tables(&ImageprocBackend, &ink, ink.bounds(), &SegmentParams::default());
        assert_eq!(tables, vec![PixelRect::new(50, 80, 350, 168)]);
    }

    #[test]
    fn test_single_rule_is_not_a_table() {
        let mut ink = InkMap::new(400, 300);
        rule(&mut ink, 100);
        ink.fill(PixelRect::new(50, 110, 300, 120), true);
        assert!(detect_tables(&ImageprocBackend, &ink, ink.bounds(), &SegmentParams::default()).is_empty());
    }
}
