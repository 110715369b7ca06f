//! Column classification and reading order.

use super::blocks::Block;
use crate::model::{ColumnClass, ZoneKind};

/// Classify each block as LEFT, RIGHT or SPAN relative to the content
/// centre. Header, footer and heading blocks always span; other blocks span
/// when they cross the centre by more than `tolerance` on both sides.
pub fn classify_columns(blocks: &mut [Block], centre_x2: u32, tolerance: u32) {
    let tol2 = tolerance * 2;
    for block in blocks.iter_mut() {
        block.column = match block.kind {
            ZoneKind::Header | ZoneKind::Footer | ZoneKind::Heading => ColumnClass::Span,
            _ if block.rect.left * 2 + tol2 < centre_x2 && block.rect.right * 2 > centre_x2 + tol2 => {
                ColumnClass::Span
            }
            _ if block.rect.centre_x2() < centre_x2 => ColumnClass::Left,
            _ => ColumnClass::Right,
        };
    }
}

fn column_rank(column: ColumnClass) -> u8 {
    match column {
        ColumnClass::Left => 0,
        ColumnClass::Right => 1,
        ColumnClass::Span => 2,
    }
}

/// Assign reading-order indices 1..=n to every non-header/footer block.
///
/// Blocks are clustered into horizontal lines (vertical overlap greater
/// than `line_tolerance`), lines are taken top to bottom, and within a line
/// LEFT blocks come first, then RIGHT, then SPAN, each by top edge.
pub fn assign_order(blocks: &mut [Block], line_tolerance: u32) {
    let mut orderable: Vec<usize> = Vec::new();
    for (i, block) in blocks.iter_mut().enumerate() {
        if block.kind.is_marginal() {
            block.order = None;
        } else {
            orderable.push(i);
        }
    }
    orderable.sort_by_key(|&i| (blocks[i].rect.top, blocks[i].rect.left));

    let mut lines: Vec<(u32, Vec<usize>)> = Vec::new();
    for i in orderable {
        let rect = blocks[i].rect;
        match lines.last_mut() {
            Some((bottom, members)) if rect.top + line_tolerance < *bottom => {
                *bottom = (*bottom).max(rect.bottom);
                members.push(i);
            }
            _ => lines.push((rect.bottom, vec![i])),
        }
    }

    let mut next = 1u32;
    for (_, mut members) in lines {
        members.sort_by_key(|&i| {
            let b = &blocks[i];
            (column_rank(b.column), b.rect.top, b.rect.left)
        });
        for i in members {
            blocks[i].order = Some(next);
            next += 1;
        }
    }
}

/// Close gaps in the order after blocks were replaced by several others
/// sharing one index. Ties keep their position in `blocks`.
pub fn renumber(blocks: &mut [Block]) {
    let mut ordered: Vec<usize> = (0..blocks.len()).filter(|&i| blocks[i].order.is_some()).collect();
    ordered.sort_by_key(|&i| blocks[i].order);
    for (n, i) in ordered.into_iter().enumerate() {
        blocks[i].order = Some(n as u32 + 1);
    }
}
