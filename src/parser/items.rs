//! Text run classification: geometry, style, zone membership and lines.

use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

use crate::model::{Rect, TextItem, TextLine, TextRun, Viewport, Zone, ZoneKind};
use crate::options::ClassifyParams;

use super::style::{FontNameClassifier, StyleClassifier};

/// Counts of items dropped during zone assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignStats {
    /// Items kept in a zone
    pub assigned: usize,
    /// Items whose centre lies outside the crop rectangle
    pub outside_crop: usize,
    /// Items under an image zone
    pub under_image: usize,
    /// Items inside the crop rectangle but in no zone
    pub unzoned: usize,
}

/// Maps text runs to zones and lines.
#[derive(Clone)]
pub struct ItemClassifier {
    params: ClassifyParams,
    style: Arc<dyn StyleClassifier>,
}

impl std::fmt::Debug for ItemClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemClassifier")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Default for ItemClassifier {
    fn default() -> Self {
        Self::new(ClassifyParams::default())
    }
}

impl ItemClassifier {
    /// Create a classifier with the default font-name style classifier.
    pub fn new(params: ClassifyParams) -> Self {
        Self {
            params,
            style: Arc::new(FontNameClassifier::new()),
        }
    }

    /// Use a different style classifier.
    pub fn with_style_classifier(mut self, style: Arc<dyn StyleClassifier>) -> Self {
        self.style = style;
        self
    }

    pub fn params(&self) -> &ClassifyParams {
        &self.params
    }

    /// Build items from runs. Whitespace-only runs are skipped.
    pub fn items_from_runs(&self, runs: &[TextRun], viewport: &Viewport) -> Vec<TextItem> {
        runs.iter()
            .filter_map(|run| {
                let content = normalize_content(&run.text);
                if content.trim().is_empty() {
                    return None;
                }
                let rect = run.rect(viewport.height);
                let mut item = TextItem::new(content, rect)
                    .with_font(self.style.base_name(&run.font), run.font_size())
                    .with_style(self.style.classify(&run.font));
                item.heading_candidate = rect.height() >= self.params.heading_min_height;
                Some(item)
            })
            .collect()
    }

    /// Assign items to zones by their centre and group each zone's items
    /// into lines. Items outside `crop`, under an image zone, or in no zone
    /// are dropped.
    pub fn assign(&self, items: Vec<TextItem>, crop: &Rect, zones: &mut [Zone]) -> AssignStats {
        let mut stats = AssignStats::default();
        let mut buckets: Vec<Vec<TextItem>> = vec![Vec::new(); zones.len()];

        for mut item in items {
            let centre = item.centre();
            if !crop.contains(centre) {
                stats.outside_crop += 1;
                continue;
            }
            let Some(slot) = zones.iter().position(|z| z.rect.contains(centre)) else {
                log::trace!("Unzoned item {:?} at {:?}", item.content, centre);
                stats.unzoned += 1;
                continue;
            };
            if zones[slot].kind == ZoneKind::Image {
                stats.under_image += 1;
                continue;
            }
            item.zone = Some(zones[slot].id);
            buckets[slot].push(item);
            stats.assigned += 1;
        }

        for (zone, items) in zones.iter_mut().zip(buckets) {
            zone.lines = self.group_lines(items);
        }

        log::debug!(
            "Assigned {} items ({} outside crop, {} under images, {} unzoned)",
            stats.assigned,
            stats.outside_crop,
            stats.under_image,
            stats.unzoned
        );
        stats
    }

    /// Cluster items into lines by vertical-centre proximity, sort each line
    /// left to right and fold lone trailing hyphens into the previous run.
    pub fn group_lines(&self, mut items: Vec<TextItem>) -> Vec<TextLine> {
        items.sort_by(|a, b| {
            a.centre()
                .y
                .total_cmp(&b.centre().y)
                .then(a.rect.left.total_cmp(&b.rect.left))
        });

        let mut lines: Vec<(f32, Vec<TextItem>)> = Vec::new();
        for item in items {
            let cy = item.centre().y;
            match lines.last_mut() {
                Some((line_cy, line)) if (cy - *line_cy).abs() <= self.params.line_tolerance => {
                    line.push(item)
                }
                _ => lines.push((cy, vec![item])),
            }
        }

        let mut result: Vec<TextLine> = lines
            .into_iter()
            .map(|(_, mut line)| {
                line.sort_by(|a, b| a.rect.left.total_cmp(&b.rect.left));
                TextLine::new(merge_hyphen_runs(line))
            })
            .collect();
        result.sort_by(|a, b| a.rect().top.total_cmp(&b.rect().top));

        for (li, line) in result.iter_mut().enumerate() {
            for (ci, item) in line.items.iter_mut().enumerate() {
                item.line = Some(li);
                item.column = Some(ci);
            }
        }
        result
    }
}

fn is_hyphen_only(text: &str) -> bool {
    matches!(text.trim(), "-" | "\u{2010}" | "\u{2011}" | "\u{00AD}")
}

fn merge_hyphen_runs(line: Vec<TextItem>) -> Vec<TextItem> {
    let mut merged: Vec<TextItem> = Vec::with_capacity(line.len());
    for item in line {
        match merged.last_mut() {
            Some(prev) if is_hyphen_only(&item.content) => {
                prev.content.push('-');
                prev.rect = prev.rect.union(&item.rect);
            }
            _ => merged.push(item),
        }
    }
    merged
}

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// NFC-normalize run text, expand ligatures and drop private-use
/// characters.
pub fn normalize_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        if let Some((_, rep)) = LIGATURES.iter().find(|(l, _)| *l == c) {
            out.push_str(rep);
            continue;
        }
        let code = c as u32;
        if (0xE000..=0xF8FF).contains(&code)
            || (0xF0000..=0xFFFFD).contains(&code)
            || (0x100000..=0x10FFFD).contains(&code)
            || c == '\u{FFFD}'
        {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, baseline: f32, width: f32) -> TextRun {
        TextRun::new(text, x, baseline, width, 10.0).with_font("ABCDEF+Minion-Regular")
    }

    #[test]
    fn test_items_from_runs() {
        let classifier = ItemClassifier::default();
        let runs = vec![
            run("Hello", 100.0, 700.0, 25.0),
            run("  ", 130.0, 700.0, 5.0),
            TextRun::new("Title", 100.0, 750.0, 60.0, 20.0).with_font("Minion-Bold"),
        ];
        let items = classifier.items_from_runs(&runs, &Viewport::new(600.0, 800.0));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].rect, Rect::new(100.0, 90.0, 125.0, 100.0));
        assert_eq!(items[0].font, "Minion-Regular");
        assert!(!items[0].heading_candidate);
        assert!(items[1].style.bold);
        assert!(items[1].heading_candidate);
    }

    #[test]
    fn test_assign_each_item_to_one_zone() {
        let classifier = ItemClassifier::default();
        let mut zones = vec![
            Zone::new(0, ZoneKind::Body, Rect::new(50.0, 50.0, 300.0, 200.0)),
            Zone::new(1, ZoneKind::Image, Rect::new(50.0, 250.0, 300.0, 400.0)),
            Zone::new(2, ZoneKind::Body, Rect::new(40.0, 40.0, 310.0, 210.0)),
        ];
        let items = vec![
            TextItem::new("in", Rect::new(60.0, 60.0, 80.0, 70.0)),
            TextItem::new("image", Rect::new(60.0, 300.0, 90.0, 310.0)),
            TextItem::new("outside", Rect::new(560.0, 60.0, 590.0, 70.0)),
            TextItem::new("nowhere", Rect::new(400.0, 60.0, 420.0, 70.0)),
        ];
        let crop = Rect::new(20.0, 20.0, 550.0, 780.0);
        let stats = classifier.assign(items, &crop, &mut zones);

        assert_eq!(stats.assigned, 1);
        assert_eq!(stats.under_image, 1);
        assert_eq!(stats.outside_crop, 1);
        assert_eq!(stats.unzoned, 1);
        assert_eq!(zones[0].item_count(), 1);
        assert_eq!(zones[2].item_count(), 0);
        assert_eq!(zones[0].lines[0].items[0].zone, Some(0));
    }

    #[test]
    fn test_group_lines_and_hyphen_merge() {
        let classifier = ItemClassifier::default();
        let items = vec![
            TextItem::new("second", Rect::new(10.0, 22.0, 40.0, 32.0)),
            TextItem::new("-", Rect::new(62.0, 9.0, 65.0, 19.0)),
            TextItem::new("first", Rect::new(10.0, 10.0, 35.0, 20.0)),
            TextItem::new("exam", Rect::new(38.0, 11.0, 62.0, 21.0)),
        ];
        let lines = classifier.group_lines(items);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].items.len(), 2);
        assert_eq!(lines[0].items[1].content, "exam-");
        assert_eq!(lines[0].items[1].rect.right, 65.0);
        assert_eq!(lines[1].items[0].content, "second");
        assert_eq!(lines[1].items[0].line, Some(1));
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("\u{FB01}nal"), "final");
        assert_eq!(normalize_content("e\u{0301}"), "\u{00E9}");
        assert_eq!(normalize_content("a\u{E000}b"), "ab");
    }
}
