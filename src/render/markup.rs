//! Inline markup helpers: escaping with link protection, style tags,
//! title casing and merging of adjacent identical tags.

use crate::model::StyleFlags;
use regex::Regex;
use std::sync::OnceLock;

const LINK_OPEN: char = '\u{E000}';
const LINK_CLOSE: char = '\u{E001}';
const MARK_OPEN: char = '\u{E002}';
const MARK_CLOSE: char = '\u{E003}';

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:https?://|www\.)[^\s<>"]+"#).unwrap())
}

fn link_placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap())
}

fn mark_placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{E002}(\\d+)\u{E003}").unwrap())
}

fn markup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>|&#?\w+;").unwrap())
}

/// Escape text for HTML, turning literal URLs into anchors.
///
/// URLs are swapped for placeholders before escaping and restored after,
/// so escaping never touches the link target.
pub fn escape_with_links(text: &str) -> String {
    let mut urls: Vec<&str> = Vec::new();
    let mut protected = String::with_capacity(text.len());
    let mut last = 0;
    for m in url_regex().find_iter(text) {
        let url = m
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '\''));
        protected.push_str(&text[last..m.start()]);
        protected.push(LINK_OPEN);
        protected.push_str(&urls.len().to_string());
        protected.push(LINK_CLOSE);
        urls.push(url);
        last = m.start() + url.len();
    }
    protected.push_str(&text[last..]);

    let escaped = html_escape::encode_text(&protected);
    if urls.is_empty() {
        return escaped.into_owned();
    }

    link_placeholder_regex()
        .replace_all(&escaped, |caps: &regex::Captures| {
            let url = caps[1].parse::<usize>().ok().and_then(|i| urls.get(i)).copied().unwrap_or("");
            let href = if url.starts_with("www.") {
                format!("http://{}", url)
            } else {
                url.to_string()
            };
            format!(
                "<a href=\"{}\">{}</a>",
                html_escape::encode_double_quoted_attribute(&href),
                html_escape::encode_text(url)
            )
        })
        .into_owned()
}

/// Wrap an escaped fragment in the inline tags for `style`.
///
/// Nesting is always `b > i > u > span.sc` so adjacent runs with the same
/// style produce mergeable tag sequences.
pub fn wrap_style(html: &str, style: StyleFlags) -> String {
    let mut out = html.to_string();
    if style.small_caps {
        out = format!("<span class=\"sc\">{}</span>", out);
    }
    if style.underline {
        out = format!("<u>{}</u>", out);
    }
    if style.italic {
        out = format!("<i>{}</i>", out);
    }
    if style.bold {
        out = format!("<b>{}</b>", out);
    }
    out
}

fn adjacent_tag_regexes() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"</b>(\s*)<b>").unwrap(),
            Regex::new(r"</i>(\s*)<i>").unwrap(),
            Regex::new(r"</u>(\s*)<u>").unwrap(),
            Regex::new(r#"</span>(\s*)<span class="sc">"#).unwrap(),
        ]
    })
}

/// Merge a closing tag directly followed by the same opening tag, e.g.
/// `<i>a</i> <i>b</i>` becomes `<i>a b</i>`.
pub fn merge_adjacent_tags(html: &str) -> String {
    let mut out = html.to_string();
    loop {
        let mut changed = false;
        for re in adjacent_tag_regexes() {
            let next = re.replace_all(&out, "$1");
            if next != out {
                out = next.into_owned();
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor", "of", "on",
    "or", "per", "the", "to", "via", "vs", "with",
];

/// Title-case a heading fragment, leaving tags and entities untouched.
pub fn title_case(html: &str) -> String {
    let mut saved: Vec<String> = Vec::new();
    let protected = markup_regex().replace_all(html, |caps: &regex::Captures| {
        saved.push(caps[0].to_string());
        format!("{}{}{}", MARK_OPEN, saved.len() - 1, MARK_CLOSE)
    });

    let mut out = String::with_capacity(protected.len());
    let mut word = String::new();
    let mut first = true;
    let mut in_mark = false;
    for c in protected.chars().chain(std::iter::once(' ')) {
        if c == MARK_OPEN {
            in_mark = true;
        }
        if !in_mark && (c.is_alphanumeric() || c == '\'' || c == '\u{2019}') {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            out.push_str(&title_case_word(&word, first));
            first &= !word.chars().any(char::is_alphabetic);
            word.clear();
        }
        if c == MARK_CLOSE {
            in_mark = false;
        }
        out.push(c);
    }
    out.pop();

    mark_placeholder_regex()
        .replace_all(&out, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| saved.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

fn title_case_word(word: &str, first: bool) -> String {
    if word.chars().any(|c| c.is_ascii_digit()) {
        return word.to_string();
    }
    let lower = word.to_lowercase();
    if !first && SMALL_WORDS.contains(&lower.as_str()) {
        return lower;
    }
    let mixed = word.chars().skip(1).any(char::is_uppercase) && word.chars().any(char::is_lowercase);
    if mixed {
        return word.to_string();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text() {
        assert_eq!(escape_with_links("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_escape_keeps_urls_intact() {
        let html = escape_with_links("See https://example.org/a?b=1&c=2. Then <x>");
        assert_eq!(
            html,
            "See <a href=\"https://example.org/a?b=1&amp;c=2\">https://example.org/a?b=1&amp;c=2</a>. Then &lt;x&gt;"
        );
    }

    #[test]
    fn test_escape_www_link() {
        let html = escape_with_links("(www.europa.eu)");
        assert_eq!(html, "(<a href=\"http://www.europa.eu\">www.europa.eu</a>)");
    }

    #[test]
    fn test_wrap_style_nesting() {
        let style = StyleFlags {
            bold: true,
            italic: true,
            ..Default::default()
        };
        assert_eq!(wrap_style("x", style), "<b><i>x</i></b>");
        assert_eq!(wrap_style("x", StyleFlags::default()), "x");
    }

    #[test]
    fn test_merge_adjacent_tags() {
        assert_eq!(merge_adjacent_tags("<i>a</i> <i>b</i>"), "<i>a b</i>");
        assert_eq!(
            merge_adjacent_tags("<b><i>a</i></b><b><i>b</i></b>"),
            "<b><i>ab</i></b>"
        );
        assert_eq!(merge_adjacent_tags("<i>a</i> <b>b</b>"), "<i>a</i> <b>b</b>");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("THE STATE OF THE ECONOMY"), "The State of the Economy");
        assert_eq!(title_case("growth in 2019"), "Growth in 2019");
        assert_eq!(title_case("<i>the</i> ROLE OF iPhone"), "<i>The</i> Role of iPhone");
        assert_eq!(title_case("R&amp;D SPENDING"), "R&amp;D Spending");
    }
}
