//! Style classification from font names.

use crate::model::StyleFlags;

/// Derives style flags from a font identifier.
///
/// Typesetting conventions differ between producers, so the mapping is a
/// pluggable capability. [`FontNameClassifier`] is the default.
pub trait StyleClassifier: Send + Sync {
    /// Style flags implied by the font name.
    fn classify(&self, font: &str) -> StyleFlags;

    /// Font name with producer-specific decorations removed.
    fn base_name<'a>(&self, font: &'a str) -> &'a str {
        font
    }
}

/// Classifies fonts by the style part of their name.
///
/// A subset prefix (`ABCDEF+`) is stripped first. The style part is the
/// text after the last `-` or `,` (the whole name when there is none).
///
/// - small caps: style ends with `SC`, `SmallCaps`, `Caps` or `Smcp`
/// - italic: style is `Italic`, `It`, `Ital`, `Oblique` or `I`, possibly
///   after a weight (`BoldIt`), or the name ends with `Italic`/`Oblique`
/// - bold: name contains `bold`, or style is `B`/`Bd...`, `Black` or `Heavy`
///
/// A trailing `MT` or `PS` qualifier is ignored.
#[derive(Debug, Clone, Default)]
pub struct FontNameClassifier;

impl FontNameClassifier {
    pub fn new() -> Self {
        Self
    }
}

const SMALL_CAPS_SUFFIXES: &[&str] = &["smallcaps", "caps", "smcp", "sc"];
const ITALIC_TOKENS: &[&str] = &["italic", "ital", "it", "oblique", "i"];
const WEIGHTS: &[&str] = &[
    "extrabold", "semibold", "demibold", "bold", "black", "heavy", "medium", "regular", "roman",
    "light", "book", "semi", "demi", "bd",
];

fn strip_small_caps(style: &str) -> Option<&str> {
    SMALL_CAPS_SUFFIXES.iter().find_map(|s| style.strip_suffix(s))
}

fn strip_qualifier(style: &str) -> &str {
    style
        .strip_suffix("mt")
        .or_else(|| style.strip_suffix("ps"))
        .unwrap_or(style)
}

impl StyleClassifier for FontNameClassifier {
    fn classify(&self, font: &str) -> StyleFlags {
        let name = self.base_name(font).to_lowercase();
        let style = name.rsplit(['-', ',']).next().unwrap_or(&name);

        let (small_caps, stem) = match strip_small_caps(style) {
            Some(stem) => (true, stem),
            None => {
                let unqualified = strip_qualifier(style);
                match strip_small_caps(unqualified) {
                    Some(stem) => (true, stem),
                    None => (false, unqualified),
                }
            }
        };

        let after_weight = WEIGHTS
            .iter()
            .find_map(|w| stem.strip_prefix(w))
            .unwrap_or(stem);
        let italic = ITALIC_TOKENS.contains(&after_weight)
            || stem.ends_with("italic")
            || stem.ends_with("oblique");

        StyleFlags {
            bold: name.contains("bold")
                || stem == "b"
                || stem.starts_with("bd")
                || stem.contains("black")
                || stem.contains("heavy"),
            italic,
            small_caps,
            underline: false,
        }
    }

    fn base_name<'a>(&self, font: &'a str) -> &'a str {
        strip_subset_prefix(font)
    }
}

/// Strip a six-uppercase-letter subset tag (`ABCDEF+Minion`).
pub fn strip_subset_prefix(font: &str) -> &str {
    match font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => font,
    }
}
