//! Footnote reference marking, footer parsing and resolution.

use super::reading::ReadingOrderAssembler;
use crate::model::{parse_bare_integer, TextLine, Zone, ZoneKind};
use crate::options::{ClassifyParams, FootnoteParams};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<footnote data-index="(\d+)"></footnote>"#).unwrap())
}

/// One parsed footnote: its printed index and rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteEntry {
    pub index: u32,
    pub html: String,
}

/// Footnotes parsed from one page's footer zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootnoteTable {
    pub entries: BTreeMap<u32, FootnoteEntry>,
    /// Unnumbered text before the first footnote, as paragraphs
    pub preamble: String,
    /// Page numeral printed at the foot of the page
    pub folio: Option<u32>,
}

/// Outcome of resolving one page's references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub resolved: u32,
    pub unresolved: Vec<u32>,
    pub unreferenced: Vec<u32>,
}

/// Lines grouped by sequential leading numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberedBlock {
    /// Lines before the first numbered line
    pub preamble: Vec<TextLine>,
    /// Entries in order, each with its lines (number removed)
    pub entries: Vec<(u32, Vec<TextLine>)>,
}

/// Leading integer of a line, with the line minus that integer.
///
/// The integer is either a run of its own or the first token of the first
/// run (`"3 See also"`).
pub fn leading_number(line: &TextLine) -> Option<(u32, TextLine)> {
    let first = line.items.first()?;
    if let Some(n) = first.as_integer() {
        return Some((n, TextLine::new(line.items[1..].to_vec())));
    }

    let content = first.content.trim_start();
    let digits = content.bytes().take_while(u8::is_ascii_digit).count();
    let rest = &content[digits..];
    if digits == 0 || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let n = parse_bare_integer(&content[..digits])?;
    let mut head = first.clone();
    head.content = rest.trim_start().to_string();
    let mut items = vec![head];
    items.extend(line.items[1..].iter().cloned());
    Some((n, TextLine::new(items)))
}

/// Split lines into numbered entries starting at `start`.
///
/// A line opens an entry only when its leading integer is the next
/// expected number; any other integer, or none, continues the open entry.
pub fn split_numbered(lines: &[TextLine], start: u32) -> NumberedBlock {
    let mut block = NumberedBlock::default();
    let mut expected = start;
    for line in lines {
        match leading_number(line) {
            Some((n, rest)) if n == expected => {
                let body = if rest.is_empty() { Vec::new() } else { vec![rest] };
                block.entries.push((n, body));
                expected += 1;
            }
            _ => match block.entries.last_mut() {
                Some((_, body)) => body.push(line.clone()),
                None => block.preamble.push(line.clone()),
            },
        }
    }
    block
}

/// Split lines starting at the leading integer that yields the most
/// entries. Ties go to the earliest line; with no integer, start at 1.
fn continued_numbering(lines: &[TextLine]) -> (u32, NumberedBlock) {
    let mut best: Option<(u32, NumberedBlock)> = None;
    for n in lines.iter().filter_map(|l| leading_number(l).map(|(n, _)| n)) {
        let block = split_numbered(lines, n);
        if best.as_ref().map_or(true, |(_, b)| block.entries.len() > b.entries.len()) {
            best = Some((n, block));
        }
    }
    best.unwrap_or_else(|| (1, split_numbered(lines, 1)))
}

/// Matches superscript reference markers to footer footnotes.
#[derive(Debug, Clone)]
pub struct FootnoteResolver {
    params: FootnoteParams,
    min_raise: f32,
}

impl Default for FootnoteResolver {
    fn default() -> Self {
        Self::new(FootnoteParams::default(), &ClassifyParams::default())
    }
}

impl FootnoteResolver {
    pub fn new(params: FootnoteParams, classify: &ClassifyParams) -> Self {
        Self {
            params,
            min_raise: classify.superscript_min_raise,
        }
    }

    /// Mark bare-integer runs raised above the preceding run's baseline (the
    /// following run's for the first run of a line) as references, in every
    /// zone but footer, table and figure zones.
    /// Returns the referenced indices.
    pub fn mark_references(&self, zones: &mut [Zone]) -> BTreeSet<u32> {
        let mut referenced = BTreeSet::new();
        for zone in zones
            .iter_mut()
            .filter(|z| !matches!(z.kind, ZoneKind::Footer | ZoneKind::Table | ZoneKind::Figure))
        {
            for line in &mut zone.lines {
                for j in 0..line.items.len() {
                    // Compare with the run before, or after for a leading marker
                    let neighbour = if j > 0 { j - 1 } else { j + 1 };
                    let Some(baseline) = line.items.get(neighbour).map(|i| i.rect.bottom) else {
                        continue;
                    };
                    let item = &mut line.items[j];
                    let Some(n) = item.as_integer() else {
                        continue;
                    };
                    if n > 0 && item.rect.bottom < baseline - self.min_raise {
                        item.foot_index = Some(n);
                        referenced.insert(n);
                        log::trace!("Footnote reference {} in zone {}", n, zone.id);
                    }
                }
            }
        }
        referenced
    }

    /// A lone bare integer on the last footer line is the page folio.
    pub fn folio(&self, footer: &Zone) -> Option<u32> {
        if !self.params.folio_in_footer {
            return None;
        }
        match footer.lines.last()?.items.as_slice() {
            [only] => only.as_integer(),
            _ => None,
        }
    }

    /// Parse a footer zone into footnote entries.
    ///
    /// Numbering starts at `start`. With `None` it starts at whichever
    /// leading integer in the footer opens the longest run of entries.
    pub fn parse_footer(
        &self,
        footer: &Zone,
        start: Option<u32>,
        assembler: &ReadingOrderAssembler,
    ) -> FootnoteTable {
        let folio = self.folio(footer);
        let lines = match folio {
            Some(_) => &footer.lines[..footer.lines.len() - 1],
            None => &footer.lines[..],
        };
        let (start, block) = match start {
            Some(start) => (start, split_numbered(lines, start)),
            None => continued_numbering(lines),
        };
        let preamble = if block.preamble.is_empty() {
            String::new()
        } else {
            let html = assembler.inline_html(&block.preamble);
            if html.is_empty() {
                html
            } else {
                format!("<p>{}</p>", html)
            }
        };
        let entries = block
            .entries
            .into_iter()
            .map(|(index, body)| {
                let html = assembler.inline_html(&body);
                (index, FootnoteEntry { index, html })
            })
            .collect::<BTreeMap<_, _>>();

        log::debug!(
            "Footer zone {}: {} footnotes from {}, folio {:?}",
            footer.id,
            entries.len(),
            start,
            folio
        );
        FootnoteTable {
            entries,
            preamble,
            folio,
        }
    }

    /// Replace reference placeholders with their footnote bodies.
    ///
    /// Unresolved references become their plain number. The footer zone's
    /// fragment receives the preamble and any footnote nothing referenced.
    pub fn resolve(&self, page: usize, zones: &mut [Zone], table: &FootnoteTable) -> ResolveReport {
        let mut report = ResolveReport::default();
        let mut used: BTreeSet<u32> = BTreeSet::new();

        for zone in zones.iter_mut().filter(|z| z.kind != ZoneKind::Footer) {
            if !zone.html.contains("<footnote") {
                continue;
            }
            let replaced = placeholder_regex().replace_all(&zone.html, |caps: &regex::Captures| {
                let index: u32 = caps[1].parse().unwrap_or(0);
                match table.entries.get(&index) {
                    Some(entry) => {
                        used.insert(index);
                        report.resolved += 1;
                        format!("<footnote data-index=\"{}\">{}</footnote>", index, entry.html)
                    }
                    None => {
                        report.unresolved.push(index);
                        index.to_string()
                    }
                }
            });
            zone.html = replaced.into_owned();
        }

        let mut footer_html = table.preamble.clone();
        for (index, entry) in &table.entries {
            if !used.contains(index) {
                report.unreferenced.push(*index);
                footer_html.push_str(&format!(
                    "<footnote data-index=\"{}\">{}</footnote>",
                    index, entry.html
                ));
            }
        }
        if let Some(footer) = zones.iter_mut().find(|z| z.kind == ZoneKind::Footer) {
            footer.html = footer_html;
        }

        if self.params.warn_on_mismatch {
            if !report.unresolved.is_empty() {
                log::warn!(
                    "Page {}: footnote references without an entry: {:?}",
                    page,
                    report.unresolved
                );
            }
            if !report.unreferenced.is_empty() {
                log::warn!(
                    "Page {}: footnotes never referenced: {:?}",
                    page,
                    report.unreferenced
                );
            }
        }
        report
    }
}
