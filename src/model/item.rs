//! Classified text items and the lines they form.

use super::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typographic style flags derived from the font name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub small_caps: bool,
    pub underline: bool,
}

impl StyleFlags {
    /// Whether no style applies.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.small_caps || self.underline)
    }
}

/// A (font identifier, rounded size) pair used to group same-style runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontSignature {
    pub font: String,
    pub size: u32,
}

impl FontSignature {
    pub fn new(font: impl Into<String>, size: f32) -> Self {
        Self {
            font: font.into(),
            size: size.round().max(0.0) as u32,
        }
    }
}

impl fmt::Display for FontSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.font, self.size)
    }
}

/// A text run after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Text content (NFC normalized)
    pub content: String,

    /// Geometry in top-down page units
    pub rect: Rect,

    /// Font identifier with any subset prefix removed
    pub font: String,

    /// Font size in page units
    pub font_size: f32,

    /// Style flags
    pub style: StyleFlags,

    /// Zone the item was assigned to
    pub zone: Option<usize>,

    /// Line index within the zone
    pub line: Option<usize>,

    /// Position within the line
    pub column: Option<usize>,

    /// Footnote reference index when the item is a superscript marker
    pub foot_index: Option<u32>,

    /// Caption number when the item opens a figure caption
    pub drawing_number: Option<u32>,

    /// Set on the last item of a paragraph
    pub is_paragraph_end: bool,

    /// Large enough to be a heading on its own
    pub heading_candidate: bool,
}

impl TextItem {
    /// Create an unclassified item.
    pub fn new(content: impl Into<String>, rect: Rect) -> Self {
        let font_size = rect.height();
        Self {
            content: content.into(),
            rect,
            font: String::new(),
            font_size,
            style: StyleFlags::default(),
            zone: None,
            line: None,
            column: None,
            foot_index: None,
            drawing_number: None,
            is_paragraph_end: false,
            heading_candidate: false,
        }
    }

    /// Set the font name and size.
    pub fn with_font(mut self, font: impl Into<String>, size: f32) -> Self {
        self.font = font.into();
        self.font_size = size;
        self
    }

    /// Set style flags.
    pub fn with_style(mut self, style: StyleFlags) -> Self {
        self.style = style;
        self
    }

    pub fn centre(&self) -> Point {
        self.rect.centre()
    }

    /// Font signature of this item.
    pub fn signature(&self) -> FontSignature {
        FontSignature::new(self.font.clone(), self.rect.height())
    }

    /// The content parsed as a bare integer, if it is one.
    pub fn as_integer(&self) -> Option<u32> {
        parse_bare_integer(&self.content)
    }
}

/// Parse a string consisting only of ASCII digits (surrounding whitespace
/// ignored).
pub fn parse_bare_integer(text: &str) -> Option<u32> {
    let t = text.trim();
    if t.is_empty() || t.len() > 6 || !t.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    t.parse().ok()
}

/// One line of runs inside a zone, ordered left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub items: Vec<TextItem>,
}

impl TextLine {
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bounding box of all items.
    pub fn rect(&self) -> Rect {
        let mut iter = self.items.iter();
        match iter.next() {
            Some(first) => iter.fold(first.rect, |acc, i| acc.union(&i.rect)),
            None => Rect::default(),
        }
    }

    pub fn left(&self) -> f32 {
        self.items
            .iter()
            .map(|i| i.rect.left)
            .fold(f32::INFINITY, f32::min)
    }

    /// Whether a space belongs between item `i - 1` and item `i`.
    ///
    /// A space is inserted when the horizontal gap exceeds a fraction of the
    /// average character width, except between two spaceless-script
    /// characters or when either side already carries whitespace.
    pub fn needs_space_before(&self, i: usize, gap_ratio: f32) -> bool {
        if i == 0 || i >= self.items.len() {
            return false;
        }
        let prev = &self.items[i - 1];
        let item = &self.items[i];

        let gap = item.rect.left - prev.rect.right;
        let char_count = item.content.chars().count();
        let avg_char_width = if char_count > 0 && item.rect.width() > 0.0 {
            item.rect.width() / char_count as f32
        } else {
            item.font_size * 0.5
        };
        if gap <= avg_char_width * gap_ratio {
            return false;
        }

        let prev_last = prev.content.chars().last();
        let curr_first = item.content.chars().next();
        if prev_last.map(char::is_whitespace).unwrap_or(true)
            || curr_first.map(char::is_whitespace).unwrap_or(true)
        {
            return false;
        }
        !(is_spaceless_script_char(prev_last.unwrap_or(' '))
            && is_spaceless_script_char(curr_first.unwrap_or(' ')))
    }

    /// Plain text of the line with gap-based space insertion.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if self.needs_space_before(i, 0.2) {
                result.push(' ');
            }
            result.push_str(&item.content);
        }
        result
    }
}

/// Characters of scripts written without word spaces (CJK ideographs,
/// kana, CJK punctuation). Hangul uses word spaces and is excluded.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, left: f32, width: f32) -> TextItem {
        TextItem::new(text, Rect::new(left, 0.0, left + width, 10.0))
    }

    #[test]
    fn test_line_text_spacing() {
        let line = TextLine::new(vec![item("Hello", 0.0, 25.0), item("world", 28.0, 25.0)]);
        assert_eq!(line.text(), "Hello world");

        let tight = TextLine::new(vec![item("Hel", 0.0, 15.0), item("lo", 15.2, 10.0)]);
        assert_eq!(tight.text(), "Hello");
    }

    #[test]
    fn test_line_text_cjk() {
        let line = TextLine::new(vec![item("日本", 0.0, 20.0), item("語", 25.0, 10.0)]);
        assert_eq!(line.text(), "日本語");
    }

    #[test]
    fn test_parse_bare_integer() {
        assert_eq!(parse_bare_integer(" 12 "), Some(12));
        assert_eq!(parse_bare_integer("12a"), None);
        assert_eq!(parse_bare_integer(""), None);
        assert_eq!(parse_bare_integer("-3"), None);
    }

    #[test]
    fn test_signature_display() {
        let sig = FontSignature::new("Minion-Bold", 11.6);
        assert_eq!(sig.to_string(), "Minion-Bold|12");
    }
}
