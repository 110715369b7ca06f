//! Paragraph, heading and caption assembly for one zone.
//!
//! Lines are classified one by one and fed through a small state machine
//! (`None`, `InParagraph`, `InHeading`, `InCaption`). Buffered runs are
//! flushed into `p`, `heading` or `figure > figcaption` fragments.

use super::dehyphen::{Dehyphenator, Join};
use super::markup::{escape_with_links, merge_adjacent_tags, title_case, wrap_style};
use super::stats::AssemblyStats;
use crate::model::{FontSignature, StyleFlags, TextItem, TextLine, Zone, ZoneKind};
use crate::options::AssemblyParams;
use std::collections::BTreeMap;

/// Placeholder for a footnote reference, filled by the footnote resolver.
pub fn footnote_placeholder(index: u32) -> String {
    format!("<footnote data-index=\"{}\"></footnote>", index)
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text { text: String, style: StyleFlags },
    Marker(u32),
}

/// Accumulates consecutive lines into one inline fragment, joining lines
/// with dehyphenation and items with gap-based spacing.
#[derive(Debug, Clone)]
pub struct InlineBuilder<'a> {
    dehyphen: &'a Dehyphenator,
    gap_ratio: f32,
    pieces: Vec<Piece>,
}

impl<'a> InlineBuilder<'a> {
    pub fn new(dehyphen: &'a Dehyphenator, gap_ratio: f32) -> Self {
        Self {
            dehyphen,
            gap_ratio,
            pieces: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
    }

    /// Append a line, joined to what is already buffered.
    pub fn push_line(&mut self, line: &TextLine) {
        for (j, item) in line.items.iter().enumerate() {
            let space = if j > 0 {
                line.needs_space_before(j, self.gap_ratio)
            } else if self.is_empty() {
                false
            } else {
                match self.dehyphen.join(self.tail(), &item.content) {
                    Join::Space => true,
                    Join::KeepHyphen => {
                        self.trim_tail();
                        false
                    }
                    Join::DropHyphen => {
                        self.trim_tail();
                        if let Some(Piece::Text { text, .. }) = self.pieces.last_mut() {
                            text.pop();
                        }
                        false
                    }
                }
            };
            self.push_item(item, space);
        }
    }

    fn push_item(&mut self, item: &TextItem, space: bool) {
        if let Some(index) = item.foot_index {
            self.trim_tail();
            self.pieces.push(Piece::Marker(index));
            return;
        }
        let mut text = String::with_capacity(item.content.len() + 1);
        if space {
            text.push(' ');
        }
        text.push_str(&item.content);
        match self.pieces.last_mut() {
            Some(Piece::Text { text: last, style }) if *style == item.style => last.push_str(&text),
            _ => self.pieces.push(Piece::Text {
                text,
                style: item.style,
            }),
        }
    }

    fn tail(&self) -> &str {
        match self.pieces.last() {
            Some(Piece::Text { text, .. }) => text,
            _ => "",
        }
    }

    fn trim_tail(&mut self) {
        if let Some(Piece::Text { text, .. }) = self.pieces.last_mut() {
            let len = text.trim_end().len();
            text.truncate(len);
        }
    }

    /// Buffered text without markup or markers.
    pub fn plain_text(&self) -> String {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Text { text, .. } => Some(text.as_str()),
                Piece::Marker(_) => None,
            })
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Render the buffer: escaped text with links, style tags and footnote
    /// placeholders.
    pub fn to_html(&self) -> String {
        let last = self.pieces.len().saturating_sub(1);
        let mut html = String::new();
        for (i, piece) in self.pieces.iter().enumerate() {
            match piece {
                Piece::Text { text, style } => {
                    let mut t = text.as_str();
                    if i == 0 {
                        t = t.trim_start();
                    }
                    if i == last {
                        t = t.trim_end();
                    }
                    if t.is_empty() {
                        continue;
                    }
                    html.push_str(&wrap_style(&escape_with_links(t), *style));
                }
                Piece::Marker(index) => html.push_str(&footnote_placeholder(*index)),
            }
        }
        merge_adjacent_tags(&html)
    }
}

/// The signature carrying the most characters among `items`, ignoring
/// footnote markers.
pub fn dominant_signature<'a>(items: impl IntoIterator<Item = &'a TextItem>) -> Option<FontSignature> {
    let mut weights: BTreeMap<FontSignature, usize> = BTreeMap::new();
    for item in items.into_iter().filter(|i| i.foot_index.is_none()) {
        *weights.entry(item.signature()).or_default() += item.content.chars().count();
    }
    weights
        .into_iter()
        .fold(None, |best: Option<(FontSignature, usize)>, (sig, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((sig, n)),
        })
        .map(|(sig, _)| sig)
}

fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    None,
    InParagraph,
    InHeading(FontSignature),
    InCaption(u32),
}

struct ZoneWriter<'a> {
    title_case: bool,
    figure_only: bool,
    state: State,
    buffer: InlineBuilder<'a>,
    last_line: Option<usize>,
    html: String,
    paragraph_ends: Vec<usize>,
    stats: AssemblyStats,
}

impl ZoneWriter<'_> {
    fn push_line(&mut self, index: usize, line: &TextLine) {
        self.buffer.push_line(line);
        self.last_line = Some(index);
    }

    fn flush(&mut self) {
        let state = std::mem::replace(&mut self.state, State::None);
        let content = self.buffer.to_html();
        let text = self.buffer.plain_text();
        self.buffer.clear();

        match state {
            State::None => return,
            State::InCaption(number) => {
                self.html.push_str(&format!(
                    "<figure><figcaption data-start=\"{}\">{}</figcaption></figure>",
                    number, content
                ));
                self.stats.add_caption();
            }
            _ if content.is_empty() || self.figure_only => return,
            State::InParagraph => {
                self.html.push_str(&format!("<p>{}</p>", content));
                self.stats.add_paragraph();
                self.paragraph_ends.extend(self.last_line);
            }
            State::InHeading(signature) => {
                let content = if self.title_case {
                    title_case(&content)
                } else {
                    content
                };
                self.html.push_str(&format!(
                    "<heading data-font=\"{}\">{}</heading>",
                    html_escape::encode_double_quoted_attribute(&signature.to_string()),
                    content
                ));
                self.stats.add_heading();
            }
        }
        self.stats.count_text(&text);
    }
}

/// Turns the classified lines of a zone into an HTML fragment.
#[derive(Debug, Clone)]
pub struct ReadingOrderAssembler {
    params: AssemblyParams,
    dehyphen: Dehyphenator,
}

impl Default for ReadingOrderAssembler {
    fn default() -> Self {
        Self::new(AssemblyParams::default())
    }
}

impl ReadingOrderAssembler {
    pub fn new(params: AssemblyParams) -> Self {
        let dehyphen = Dehyphenator::new(&params);
        Self { params, dehyphen }
    }

    pub fn params(&self) -> &AssemblyParams {
        &self.params
    }

    /// A builder sharing this assembler's dehyphenation and spacing rules.
    pub fn builder(&self) -> InlineBuilder<'_> {
        InlineBuilder::new(&self.dehyphen, self.params.space_gap_ratio)
    }

    /// All lines rendered as one inline fragment without a block element.
    pub fn inline_html(&self, lines: &[TextLine]) -> String {
        let mut builder = self.builder();
        for line in lines {
            builder.push_line(line);
        }
        builder.to_html()
    }

    /// Opening integer of a caption line: an unitalicized bare integer run
    /// followed by an italic run.
    fn caption_number(line: &TextLine) -> Option<u32> {
        let first = line.items.first()?;
        let second = line.items.get(1)?;
        if first.style.italic || !second.style.italic || first.foot_index.is_some() {
            return None;
        }
        first.as_integer()
    }

    /// Signature of a heading line, or `None` for body text.
    ///
    /// Every run in a HEADING zone is heading text. Elsewhere all runs must
    /// share one signature that either marks every run as a heading
    /// candidate or differs from the dominant one while being larger (or
    /// the same size and bold).
    fn heading_signature(
        line: &TextLine,
        kind: ZoneKind,
        dominant: Option<&FontSignature>,
    ) -> Option<FontSignature> {
        let items: Vec<&TextItem> = line.items.iter().filter(|i| i.foot_index.is_none()).collect();
        let signature = items.first()?.signature();
        if kind == ZoneKind::Heading {
            return Some(signature);
        }
        if !items.iter().all(|i| i.signature() == signature) {
            return None;
        }
        if items.iter().all(|i| i.heading_candidate) {
            return Some(signature);
        }
        match dominant {
            Some(d) if *d != signature => {
                let bold = items.iter().all(|i| i.style.bold);
                (signature.size > d.size || (signature.size == d.size && bold)).then_some(signature)
            }
            _ => None,
        }
    }

    /// Assemble `zone.html` from its lines.
    ///
    /// Header, footer and image zones produce nothing here. Figure zones
    /// only emit captions (or an empty `figure`). Items are updated in
    /// place: caption numbers and paragraph ends are recorded.
    pub fn assemble_zone(
        &self,
        zone: &mut Zone,
        page_dominant: Option<&FontSignature>,
        stats: &mut AssemblyStats,
    ) {
        zone.html.clear();
        if matches!(zone.kind, ZoneKind::Header | ZoneKind::Footer | ZoneKind::Image) {
            return;
        }

        let lines = &zone.lines;
        let zone_dominant = dominant_signature(lines.iter().flat_map(|l| l.items.iter()));
        let distinct = {
            let mut sigs: Vec<FontSignature> = lines
                .iter()
                .flat_map(|l| l.items.iter())
                .filter(|i| i.foot_index.is_none())
                .map(|i| i.signature())
                .collect();
            sigs.sort();
            sigs.dedup();
            sigs.len()
        };
        let dominant = if distinct <= 1 && page_dominant.is_some() {
            page_dominant.cloned()
        } else {
            zone_dominant
        };

        let margin = lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.left())
            .fold(f32::INFINITY, f32::min);
        let rects: Vec<_> = lines.iter().map(|l| l.rect()).collect();
        let gaps: Vec<f32> = rects.windows(2).map(|w| (w[1].top - w[0].bottom).max(0.0)).collect();
        let break_gap = median(&gaps).max(1.0) * self.params.caption_gap_ratio;

        let mut writer = ZoneWriter {
            title_case: self.params.title_case_headings,
            figure_only: zone.kind == ZoneKind::Figure,
            state: State::None,
            buffer: self.builder(),
            last_line: None,
            html: String::new(),
            paragraph_ends: Vec::new(),
            stats: AssemblyStats::default(),
        };
        let mut captions: Vec<(usize, u32)> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let ends_block = gaps.get(i).map_or(true, |&g| g > break_gap);
            let after_gap = i > 0 && gaps[i - 1] > break_gap;

            if let State::InCaption(_) = writer.state {
                writer.push_line(i, line);
                if ends_block {
                    writer.flush();
                }
                continue;
            }

            if let Some(number) = Self::caption_number(line) {
                writer.flush();
                writer.state = State::InCaption(number);
                captions.push((i, number));
                writer.push_line(i, &TextLine::new(line.items[1..].to_vec()));
                if ends_block {
                    writer.flush();
                }
                continue;
            }

            if let Some(signature) = Self::heading_signature(line, zone.kind, dominant.as_ref()) {
                if writer.state != State::InHeading(signature.clone()) {
                    writer.flush();
                    writer.state = State::InHeading(signature);
                }
                writer.push_line(i, line);
                continue;
            }

            let indented = line.left() > margin + self.params.indent_threshold;
            if writer.state != State::InParagraph || indented || after_gap {
                writer.flush();
                writer.state = State::InParagraph;
            }
            writer.push_line(i, line);
        }
        writer.flush();

        if writer.figure_only && writer.html.is_empty() {
            writer.html.push_str("<figure></figure>");
        }
        log::trace!(
            "Zone {} ({}): {} paragraphs, {} headings, {} captions",
            zone.id,
            zone.kind.as_str(),
            writer.stats.paragraph_count,
            writer.stats.heading_count,
            writer.stats.caption_count
        );

        let ZoneWriter {
            html,
            paragraph_ends,
            stats: zone_stats,
            ..
        } = writer;
        for i in paragraph_ends {
            if let Some(item) = zone.lines[i].items.last_mut() {
                item.is_paragraph_end = true;
            }
        }
        for (i, number) in captions {
            if let Some(item) = zone.lines[i].items.first_mut() {
                item.drawing_number = Some(number);
            }
        }
        zone.html = html;
        stats.merge(&zone_stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn run(text: &str, left: f32, top: f32, width: f32) -> TextItem {
        TextItem::new(text, Rect::new(left, top, left + width, top + 10.0)).with_font("Times", 10.0)
    }

    fn zone(kind: ZoneKind, lines: Vec<Vec<TextItem>>) -> Zone {
        let mut zone = Zone::new(1, kind, Rect::new(0.0, 0.0, 300.0, 300.0));
        zone.lines = lines.into_iter().map(TextLine::new).collect();
        zone
    }

    fn assemble(zone: &mut Zone) -> AssemblyStats {
        let mut stats = AssemblyStats::default();
        ReadingOrderAssembler::default().assemble_zone(zone, None, &mut stats);
        stats
    }

    #[test]
    fn test_dehyphenation_round_trip() {
        let mut z = zone(
            ZoneKind::Body,
            vec![
                vec![run("typi-", 10.0, 10.0, 25.0)],
                vec![run("cal government", 10.0, 22.0, 70.0)],
            ],
        );
        assemble(&mut z);
        assert_eq!(z.html, "<p>typical government</p>");
    }

    #[test]
    fn test_dehyphenation_keeps_listed_prefix() {
        let mut z = zone(
            ZoneKind::Body,
            vec![
                vec![run("cross-", 10.0, 10.0, 30.0)],
                vec![run("border trade", 10.0, 22.0, 60.0)],
            ],
        );
        assemble(&mut z);
        assert!(z.html.contains("cross-border trade"));
    }

    #[test]
    fn test_caption_in_figure_zone() {
        let italic = StyleFlags {
            italic: true,
            ..Default::default()
        };
        let mut z = zone(
            ZoneKind::Figure,
            vec![
                vec![run("Exports", 50.0, 10.0, 35.0)],
                vec![
                    run("3", 10.0, 200.0, 5.0),
                    run("Growth of trade", 20.0, 200.0, 75.0).with_style(italic),
                ],
            ],
        );
        let stats = assemble(&mut z);
        assert_eq!(
            z.html,
            "<figure><figcaption data-start=\"3\"><i>Growth of trade</i></figcaption></figure>"
        );
        assert_eq!(stats.caption_count, 1);
        assert_eq!(z.lines[1].items[0].drawing_number, Some(3));
    }

    #[test]
    fn test_figure_without_caption() {
        let mut z = zone(ZoneKind::Figure, vec![vec![run("Exports", 50.0, 10.0, 35.0)]]);
        assemble(&mut z);
        assert_eq!(z.html, "<figure></figure>");

        let mut image = zone(ZoneKind::Image, vec![vec![run("x", 0.0, 0.0, 5.0)]]);
        assemble(&mut image);
        assert!(image.html.is_empty());
    }

    #[test]
    fn test_heading_then_paragraph() {
        let heading = TextItem::new("INTRODUCTION", Rect::new(10.0, 10.0, 110.0, 24.0))
            .with_font("Times-Bold", 14.0);
        let mut z = zone(
            ZoneKind::Body,
            vec![
                vec![heading],
                vec![run("The economy grew strongly over", 10.0, 30.0, 150.0)],
                vec![run("the past year.", 10.0, 42.0, 70.0)],
            ],
        );
        let stats = assemble(&mut z);
        assert_eq!(
            z.html,
            "<heading data-font=\"Times-Bold|14\">Introduction</heading>\
             <p>The economy grew strongly over the past year.</p>"
        );
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.paragraph_count, 1);
    }

    #[test]
    fn test_indent_starts_paragraph() {
        let mut z = zone(
            ZoneKind::Body,
            vec![
                vec![run("First paragraph text", 10.0, 10.0, 100.0)],
                vec![run("ends here.", 10.0, 22.0, 50.0)],
                vec![run("Second one.", 20.0, 34.0, 55.0)],
            ],
        );
        assemble(&mut z);
        assert_eq!(
            z.html,
            "<p>First paragraph text ends here.</p><p>Second one.</p>"
        );
        assert!(z.lines[1].items[0].is_paragraph_end);
        assert!(z.lines[2].items[0].is_paragraph_end);
        assert!(!z.lines[0].items[0].is_paragraph_end);
    }

    #[test]
    fn test_footnote_marker_placeholder() {
        let mut marker = TextItem::new("2", Rect::new(61.0, 8.0, 65.0, 14.0)).with_font("Times", 6.0);
        marker.foot_index = Some(2);
        let mut z = zone(
            ZoneKind::Body,
            vec![vec![
                run("The claim", 10.0, 10.0, 50.0),
                marker,
                run("holds.", 68.0, 10.0, 30.0),
            ]],
        );
        assemble(&mut z);
        assert_eq!(
            z.html,
            "<p>The claim<footnote data-index=\"2\"></footnote> holds.</p>"
        );
    }

    #[test]
    fn test_heading_zone_lines_join() {
        let title = |text: &str, top: f32| {
            TextItem::new(text, Rect::new(10.0, top, 200.0, top + 20.0)).with_font("Helvetica", 20.0)
        };
        let mut z = zone(
            ZoneKind::Heading,
            vec![vec![title("TRADE AND", 10.0)], vec![title("GROWTH", 32.0)]],
        );
        assemble(&mut z);
        assert_eq!(
            z.html,
            "<heading data-font=\"Helvetica|20\">Trade and Growth</heading>"
        );
    }

    #[test]
    fn test_urls_and_styles() {
        let bold = StyleFlags {
            bold: true,
            ..Default::default()
        };
        let mut z = zone(
            ZoneKind::Body,
            vec![vec![
                run("See", 10.0, 10.0, 15.0).with_style(bold),
                run("www.example.org & more", 30.0, 10.0, 110.0),
            ]],
        );
        assemble(&mut z);
        assert_eq!(
            z.html,
            "<p><b>See</b> <a href=\"http://www.example.org\">www.example.org</a> &amp; more</p>"
        );
    }

    fn body_around(line: TextItem) -> Zone {
        zone(
            ZoneKind::Body,
            vec![
                vec![run("The economy grew strongly over the", 10.0, 10.0, 170.0)],
                vec![line],
                vec![run("and exports rose in every quarter.", 10.0, 34.0, 170.0)],
            ],
        )
    }

    #[test]
    fn test_same_size_italic_line_is_not_heading() {
        let italic = StyleFlags {
            italic: true,
            ..Default::default()
        };
        let line = run("past year", 10.0, 22.0, 45.0).with_font("Times-Italic", 10.0).with_style(italic);
        let mut z = body_around(line);
        let stats = assemble(&mut z);
        assert_eq!(stats.heading_count, 0);
        assert!(!z.html.contains("<heading"));
    }

    #[test]
    fn test_same_size_small_caps_line_is_not_heading() {
        let caps = StyleFlags {
            small_caps: true,
            ..Default::default()
        };
        let line = run("past year", 10.0, 22.0, 45.0).with_font("Times-SC", 10.0).with_style(caps);
        let mut z = body_around(line);
        let stats = assemble(&mut z);
        assert_eq!(stats.heading_count, 0);
        assert!(!z.html.contains("<heading"));
    }

    #[test]
    fn test_larger_line_is_heading() {
        let line = TextItem::new("Outlook", Rect::new(10.0, 20.0, 60.0, 34.0)).with_font("Times", 14.0);
        let mut z = zone(
            ZoneKind::Body,
            vec![
                vec![line],
                vec![run("The economy grew strongly over the", 10.0, 40.0, 170.0)],
                vec![run("past year in every quarter.", 10.0, 52.0, 140.0)],
            ],
        );
        let stats = assemble(&mut z);
        assert_eq!(stats.heading_count, 1);
        assert!(z.html.starts_with("<heading data-font=\"Times|14\">"));
    }

    #[test]
    fn test_default_matches_new() {
        let lines = || {
            zone(
                ZoneKind::Body,
                vec![
                    vec![run("cross-", 10.0, 10.0, 30.0)],
                    vec![run("border trade", 10.0, 22.0, 60.0)],
                ],
            )
        };
        let (mut a, mut b) = (lines(), lines());
        let mut stats = AssemblyStats::default();
        ReadingOrderAssembler::default().assemble_zone(&mut a, None, &mut stats);
        ReadingOrderAssembler::new(AssemblyParams::default()).assemble_zone(&mut b, None, &mut stats);
        assert_eq!(a.html, b.html);
        assert_eq!(a.html, "<p>cross-border trade</p>");
    }

    #[test]
    fn test_dominant_signature() {
        let items = vec![
            run("short", 0.0, 0.0, 10.0).with_font("A", 10.0),
            run("much longer text", 0.0, 0.0, 10.0).with_font("B", 10.0),
        ];
        assert_eq!(dominant_signature(&items).map(|s| s.font), Some("B".to_string()));
        assert_eq!(dominant_signature(&Vec::<TextItem>::new()), None);
    }
}
