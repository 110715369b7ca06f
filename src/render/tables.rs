//! Assembly of table cells into one `table` fragment.

use super::footnotes::split_numbered;
use super::reading::ReadingOrderAssembler;
use crate::model::{TableSection, Zone};
use std::fmt::Write;

/// Merges the cells of each parsed table into a single table fragment.
///
/// The markup is attached to the first cell of the table in zone order;
/// every other cell of that table is marked to be skipped.
#[derive(Debug, Clone, Default)]
pub struct TableAssembler;

impl TableAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble all tables among `zones`. Returns the number of tables.
    pub fn assemble(&self, zones: &mut [Zone], assembler: &ReadingOrderAssembler) -> usize {
        let mut ids: Vec<u32> = Vec::new();
        for tag in zones.iter().filter_map(|z| z.table) {
            if !ids.contains(&tag.table_id) {
                ids.push(tag.table_id);
            }
        }

        for &id in &ids {
            let cells: Vec<usize> = (0..zones.len())
                .filter(|&i| zones[i].table.map(|t| t.table_id) == Some(id))
                .collect();
            let html = self.render(zones, &cells, assembler);
            for (n, &i) in cells.iter().enumerate() {
                let zone = &mut zones[i];
                if n == 0 {
                    zone.html = html.clone();
                    zone.skip = false;
                } else {
                    zone.html.clear();
                    zone.skip = true;
                }
            }
            log::debug!("Table {}: {} cells", id, cells.len());
        }
        ids.len()
    }

    fn render(&self, zones: &[Zone], cells: &[usize], assembler: &ReadingOrderAssembler) -> String {
        let mut caption = String::new();
        let mut notes = Vec::new();
        let mut header: Vec<(u32, String)> = Vec::new();
        let mut body: Vec<(u32, u32, String)> = Vec::new();
        let mut columns = 0u32;
        let mut rows = 0u32;

        for &i in cells {
            let zone = &zones[i];
            let Some(tag) = zone.table else { continue };
            match tag.section {
                TableSection::Caption => {
                    if !caption.is_empty() {
                        caption.push(' ');
                    }
                    caption.push_str(&assembler.inline_html(&zone.lines));
                }
                TableSection::Notes => notes.extend(zone.lines.iter().cloned()),
                TableSection::Header => {
                    columns = columns.max(tag.column + 1);
                    header.push((tag.column, assembler.inline_html(&zone.lines)));
                }
                TableSection::Body => {
                    columns = columns.max(tag.column + 1);
                    rows = rows.max(tag.row + 1);
                    body.push((tag.row, tag.column, assembler.inline_html(&zone.lines)));
                }
            }
        }

        let mut html = String::from("<table>");
        if !caption.trim().is_empty() {
            let _ = write!(html, "<caption>{}</caption>", caption.trim());
        }
        if !header.is_empty() {
            html.push_str("<thead><tr>");
            for c in 0..columns {
                let cell = header.iter().find(|(col, _)| *col == c).map_or("", |(_, h)| h.as_str());
                let _ = write!(html, "<th>{}</th>", cell);
            }
            html.push_str("</tr></thead>");
        }
        html.push_str("<tbody>");
        for r in 0..rows {
            html.push_str("<tr>");
            for c in 0..columns {
                let cell = body
                    .iter()
                    .find(|(row, col, _)| *row == r && *col == c)
                    .map_or("", |(_, _, h)| h.as_str());
                let _ = write!(html, "<td>{}</td>", cell);
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");

        let notes_html = render_notes(&notes, assembler);
        if !notes_html.is_empty() {
            let _ = write!(
                html,
                "<tfoot><tr><td colspan=\"{}\">{}</td></tr></tfoot>",
                columns.max(1),
                notes_html
            );
        }
        html.push_str("</table>");
        html
    }
}

/// Notes as an optional leading paragraph and an ordered list.
fn render_notes(lines: &[crate::model::TextLine], assembler: &ReadingOrderAssembler) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let block = split_numbered(lines, 1);
    let mut html = String::new();
    let preamble = assembler.inline_html(&block.preamble);
    if !preamble.is_empty() {
        let _ = write!(html, "<p>{}</p>", preamble);
    }
    if !block.entries.is_empty() {
        html.push_str("<ol>");
        for (_, body) in &block.entries {
            let _ = write!(html, "<li>{}</li>", assembler.inline_html(body));
        }
        html.push_str("</ol>");
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rect, TableTag, TextItem, TextLine, ZoneKind};

    fn cell(id: usize, section: TableSection, row: u32, column: u32, text: &[&str]) -> Zone {
        let mut zone = Zone::new(id, ZoneKind::Table, Rect::new(0.0, 0.0, 100.0, 20.0));
        zone.table = Some(TableTag {
            table_id: 0,
            section,
            row,
            column,
            has_content: !text.is_empty(),
        });
        zone.lines = text
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let top = 10.0 * i as f32;
                TextLine::new(vec![TextItem::new(*t, Rect::new(0.0, top, 5.0 * t.len() as f32, top + 8.0))])
            })
            .collect();
        zone
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_two_by_one_table() {
        let mut zones = vec![
            cell(0, TableSection::Header, 0, 0, &["Country"]),
            cell(1, TableSection::Header, 0, 1, &["GDP"]),
            cell(2, TableSection::Body, 0, 0, &["France"]),
            cell(3, TableSection::Body, 0, 1, &["2.1"]),
        ];
        let n = TableAssembler::new().assemble(&mut zones, &ReadingOrderAssembler::default());
        assert_eq!(n, 1);

        let html = &zones[0].html;
        assert_eq!(count(html, "<table>"), 1);
        assert_eq!(count(html, "<thead><tr>"), 1);
        assert_eq!(count(html, "<th>"), 2);
        assert_eq!(count(html, "<tbody><tr>"), 1);
        assert_eq!(count(html, "<td>"), 2);
        assert!(!html.contains("<tfoot>"));
        assert_eq!(
            html,
            "<table><thead><tr><th>Country</th><th>GDP</th></tr></thead>\
             <tbody><tr><td>France</td><td>2.1</td></tr></tbody></table>"
        );
        assert!(!zones[0].skip);
        assert!(zones[1..].iter().all(|z| z.skip && z.html.is_empty()));
    }

    #[test]
    fn test_missing_cells_are_blank() {
        let mut zones = vec![
            cell(0, TableSection::Caption, 0, 0, &["Table 1 Trade"]),
            cell(1, TableSection::Header, 0, 1, &["B"]),
            cell(2, TableSection::Body, 0, 0, &["x"]),
            cell(3, TableSection::Body, 1, 1, &["y"]),
        ];
        TableAssembler::new().assemble(&mut zones, &ReadingOrderAssembler::default());
        assert_eq!(
            zones[0].html,
            "<table><caption>Table 1 Trade</caption><thead><tr><th></th><th>B</th></tr></thead>\
             <tbody><tr><td>x</td><td></td></tr><tr><td></td><td>y</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_notes_list_with_preamble() {
        let mut zones = vec![
            cell(0, TableSection::Body, 0, 0, &["a"]),
            cell(1, TableSection::Notes, 0, 0, &["Source: OECD.", "1 Estimate.", "2 Provisional,", "5 years."]),
        ];
        TableAssembler::new().assemble(&mut zones, &ReadingOrderAssembler::default());
        assert!(zones[0].html.ends_with(
            "<tfoot><tr><td colspan=\"1\"><p>Source: OECD.</p>\
             <ol><li>Estimate.</li><li>Provisional, 5 years.</li></ol></td></tr></tfoot></table>"
        ));
    }
}
