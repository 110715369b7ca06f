//! Text and image blocks: detection, heading merge and consolidation.

use crate::imaging::{ImageAnalysis, InkMap};
use crate::model::{ColumnClass, PixelRect, TableTag, ZoneKind};
use crate::options::SegmentParams;

/// A segmented region in bitmap pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub rect: PixelRect,
    pub kind: ZoneKind,
    pub column: ColumnClass,
    pub order: Option<u32>,
    pub table: Option<TableTag>,
}

impl Block {
    pub fn new(rect: PixelRect, kind: ZoneKind) -> Self {
        Self {
            rect,
            kind,
            column: ColumnClass::Span,
            order: None,
            table: None,
        }
    }
}

/// Position of a block relative to the page centre, in doubled pixel units
/// (`centre_x2 = left + right` of the content area).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
    Spanning,
}

pub(crate) fn side(rect: &PixelRect, centre_x2: u32) -> Side {
    if rect.left * 2 < centre_x2 && rect.right * 2 > centre_x2 {
        Side::Spanning
    } else if rect.centre_x2() < centre_x2 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Detect the remaining blocks: close horizontally then vertically, take
/// outer contours and type each by ink density and label anchors.
pub fn detect_blocks(
    backend: &dyn ImageAnalysis,
    ink: &InkMap,
    anchors: &[(u32, u32)],
    p: &SegmentParams,
) -> Vec<Block> {
    let merged = backend.close(
        &backend.close(ink, p.block_close_width, 1),
        1,
        p.block_close_height,
    );

    backend
        .outer_contours(&merged)
        .into_iter()
        .map(|c| c.rect)
        .filter(|r| r.area() >= p.min_block_area)
        .map(|rect| {
            let kind = if ink.density(rect) > p.image_density {
                ZoneKind::Image
            } else if anchors.iter().any(|&(x, y)| rect.contains_point(x, y)) {
                ZoneKind::Figure
            } else {
                ZoneKind::Body
            };
            Block::new(rect, kind)
        })
        .collect()
}

/// Merge body blocks that straddle the content centre into headings.
///
/// Applies to two-column pages only (a body block wholly on each side of
/// the centre). Blocks that vertically overlap are linked when at least one
/// of them touches the centre; every linked group containing a
/// centre-crossing block becomes one HEADING block, and blocks wholly
/// inside it are removed. Crossing blocks taller than
/// `heading_max_height` are full-width text and do not seed a heading.
pub fn merge_headings(blocks: &mut Vec<Block>, centre_x2: u32, p: &SegmentParams) -> usize {
    let is_body = |b: &Block| b.kind == ZoneKind::Body;
    let has_left = blocks
        .iter()
        .any(|b| is_body(b) && b.rect.right * 2 <= centre_x2);
    let has_right = blocks
        .iter()
        .any(|b| is_body(b) && b.rect.left * 2 >= centre_x2);
    if !(has_left && has_right) {
        return 0;
    }

    let tol2 = p.centre_tolerance * 2;
    let touches = |r: &PixelRect| r.left * 2 <= centre_x2 + tol2 && r.right * 2 + tol2 >= centre_x2;
    let crosses =
        |r: &PixelRect| side(r, centre_x2) == Side::Spanning && r.height() <= p.heading_max_height;

    let candidates: Vec<usize> = (0..blocks.len()).filter(|&i| is_body(&blocks[i])).collect();
    let mut parent: Vec<usize> = (0..blocks.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (a, &i) in candidates.iter().enumerate() {
        for &j in &candidates[a + 1..] {
            let (ri, rj) = (&blocks[i].rect, &blocks[j].rect);
            if ri.vertical_overlap(rj) > 0 && (touches(ri) || touches(rj)) {
                let (pi, pj) = (find(&mut parent, i), find(&mut parent, j));
                if pi != pj {
                    parent[pj] = pi;
                }
            }
        }
    }

    let mut headings: Vec<PixelRect> = Vec::new();
    let mut roots: Vec<usize> = candidates.iter().map(|&i| find(&mut parent, i)).collect();
    roots.sort_unstable();
    roots.dedup();
    for root in roots {
        let members: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| find(&mut parent, i) == root)
            .collect();
        if !members.iter().any(|&i| crosses(&blocks[i].rect)) {
            continue;
        }
        let rect = members
            .iter()
            .map(|&i| blocks[i].rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        headings.push(rect);
    }

    if headings.is_empty() {
        return 0;
    }
    blocks.retain(|b| !headings.iter().any(|h| h.contains(&b.rect)));
    let count = headings.len();
    blocks.extend(headings.into_iter().map(|r| Block::new(r, ZoneKind::Heading)));
    log::debug!("Merged {} centre headings", count);
    count
}

fn should_merge(a: &Block, b: &Block, centre_x2: u32, p: &SegmentParams) -> bool {
    let smaller = a.rect.area().min(b.rect.area());
    let overlap = a.rect.intersection_area(&b.rect);
    if smaller > 0 && overlap as f64 > p.contained_overlap as f64 * smaller as f64 {
        return true;
    }

    a.kind == b.kind
        && a.rect.top.abs_diff(b.rect.top) <= p.same_line_tolerance
        && a.rect.bottom.abs_diff(b.rect.bottom) <= p.same_line_tolerance
        && side(&a.rect, centre_x2) == side(&b.rect, centre_x2)
}

/// Merge near-duplicate and same-line blocks until nothing changes.
///
/// Two blocks merge when their overlap exceeds `contained_overlap` of the
/// smaller one, or when they share a horizontal line (tops and bottoms
/// within `same_line_tolerance`) on the same side of the centre. A
/// spanning block never merges with a one-sided block on the line rule,
/// nor a left block with a right one. The pass runs to a fixpoint, so
/// running it again changes nothing.
pub fn consolidate(blocks: &mut Vec<Block>, centre_x2: u32, p: &SegmentParams) -> usize {
    let mut merges = 0;
    'scan: loop {
        for i in 0..blocks.len() {
            for j in i + 1..blocks.len() {
                if should_merge(&blocks[i], &blocks[j], centre_x2, p) {
                    let other = blocks.remove(j);
                    let keep = &mut blocks[i];
                    keep.rect = keep.rect.union(&other.rect);
                    if other.kind.merge_rank() > keep.kind.merge_rank() {
                        keep.kind = other.kind;
                    }
                    merges += 1;
                    continue 'scan;
                }
            }
        }
        break;
    }
    if merges > 0 {
        log::debug!("Consolidated {} block merges", merges);
    }
    merges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageprocBackend;

    fn body(l: u32, t: u32, r: u32, b: u32) -> Block {
        Block::new(PixelRect::new(l, t, r, b), ZoneKind::Body)
    }

    #[test]
    fn test_detect_blocks_types() {
        let mut ink = InkMap::new(400, 400);
        // Two text lines forming one paragraph: words with small gaps
        for y in [20u32, 33] {
            for x in [20u32, 50, 80] {
                ink.fill(PixelRect::new(x, y, x + 25, y + 8), true);
            }
        }
        // Solid photo
        ink.fill(PixelRect::new(200, 200, 300, 300), true);
        // Chart label pieces around an anchor
        ink.fill(PixelRect::new(20, 300, 26, 306), true);
        ink.fill(PixelRect::new(30, 300, 40, 306), true);

        let anchors = [(30, 303)];
        let mut blocks = detect_blocks(&ImageprocBackend, &ink, &anchors, &SegmentParams::default());
        blocks.sort_by_key(|b| (b.rect.top, b.rect.left));

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].rect, PixelRect::new(20, 20, 105, 41));
        assert_eq!(blocks[0].kind, ZoneKind::Body);
        assert_eq!(blocks[1].kind, ZoneKind::Image);
        assert_eq!(blocks[2].kind, ZoneKind::Figure);
    }

    #[test]
    fn test_consolidate_contained_and_same_line() {
        let p = SegmentParams::default();
        let mut blocks = vec![
            body(10, 10, 100, 50),
            body(12, 12, 98, 48),   // inside the first
            body(110, 14, 180, 52), // same line, left side
            body(260, 10, 380, 50), // same line, right side
        ];
        let merges = consolidate(&mut blocks, 400, &p);
        assert_eq!(merges, 2);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rect, PixelRect::new(10, 10, 180, 52));
        assert_eq!(blocks[1].rect, PixelRect::new(260, 10, 380, 50));
    }

    #[test]
    fn test_consolidate_never_mixes_spanning_and_side() {
        let p = SegmentParams::default();
        let mut blocks = vec![body(10, 10, 150, 40), body(160, 12, 300, 42)];
        // The second block crosses the centre at x = 200
        assert_eq!(consolidate(&mut blocks, 400, &p), 0);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_consolidate_is_idempotent() {
        let p = SegmentParams::default();
        let mut blocks = vec![
            body(10, 10, 100, 50),
            body(11, 11, 99, 49),
            body(105, 12, 190, 48),
            body(10, 100, 190, 300),
            body(210, 100, 390, 300),
            Block::new(PixelRect::new(20, 120, 180, 200), ZoneKind::Image),
        ];
        consolidate(&mut blocks, 400, &p);
        let once = blocks.clone();
        assert_eq!(consolidate(&mut blocks, 400, &p), 0);
        assert_eq!(blocks, once);
    }

    #[test]
    fn test_merge_headings_two_columns() {
        let p = SegmentParams::default();
        let mut blocks = vec![
            body(20, 20, 190, 400),  // left column
            body(210, 20, 380, 400), // right column
            body(120, 420, 205, 440), // heading fragments around the centre
            body(195, 421, 280, 441),
            body(150, 425, 160, 435), // wholly inside the heading
            body(20, 460, 190, 700),
            body(210, 460, 380, 700),
        ];
        let merged = merge_headings(&mut blocks, 400, &p);
        assert_eq!(merged, 1);
        let headings: Vec<&Block> = blocks.iter().filter(|b| b.kind == ZoneKind::Heading).collect();
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].rect, PixelRect::new(120, 420, 280, 441));
        assert_eq!(blocks.len(), 5);
    }

    #[test]
    fn test_merge_headings_single_column_page_untouched() {
        let p = SegmentParams::default();
        let mut blocks = vec![body(20, 20, 380, 60), body(20, 80, 380, 400)];
        assert_eq!(merge_headings(&mut blocks, 400, &p), 0);
        assert!(blocks.iter().all(|b| b.kind == ZoneKind::Body));
    }
}
