//! Rejoining words hyphenated across a line break.

use crate::options::AssemblyParams;
use std::collections::HashSet;

/// How two consecutive lines are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// Ordinary line break: insert one space
    Space,
    /// Compound hyphen: keep it, no space
    KeepHyphen,
    /// Line-break hyphen: remove it, no space
    DropHyphen,
}

/// Decides whether a line-final hyphen belongs to the word.
///
/// The hyphen is kept only when the fragment before it is a listed prefix,
/// the fragment after it is not a bound suffix, and the joined word is not
/// a listed solid compound. Everything else is joined solid.
#[derive(Debug, Clone)]
pub struct Dehyphenator {
    kept_prefixes: HashSet<String>,
    bound_suffixes: HashSet<String>,
    solid_compounds: HashSet<String>,
}

fn lowered(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

impl Default for Dehyphenator {
    fn default() -> Self {
        Self::new(&AssemblyParams::default())
    }
}

impl Dehyphenator {
    pub fn new(params: &AssemblyParams) -> Self {
        Self {
            kept_prefixes: lowered(&params.kept_prefixes),
            bound_suffixes: lowered(&params.bound_suffixes),
            solid_compounds: lowered(&params.solid_compounds),
        }
    }

    /// Whether the hyphen between `prefix` and `suffix` is kept.
    pub fn keep_hyphen(&self, prefix: &str, suffix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        let suffix = suffix.to_lowercase();
        self.kept_prefixes.contains(&prefix)
            && !self.bound_suffixes.contains(&suffix)
            && !self.solid_compounds.contains(&format!("{}{}", prefix, suffix))
    }

    /// Decide how the text so far (`before`) continues with the next line.
    pub fn join(&self, before: &str, after: &str) -> Join {
        let before = before.trim_end();
        let Some(last) = before.chars().last() else {
            return Join::Space;
        };
        if last == '\u{00AD}' {
            return Join::DropHyphen;
        }
        if last != '-' && last != '\u{2010}' {
            return Join::Space;
        }

        let head = &before[..before.len() - last.len_utf8()];
        let prefix: String = {
            let mut rev: Vec<char> = head.chars().rev().take_while(|c| c.is_alphabetic()).collect();
            rev.reverse();
            rev.into_iter().collect()
        };
        match head.chars().last() {
            None => return Join::Space,
            Some(c) if c.is_whitespace() => return Join::Space,
            _ => {}
        }

        let suffix: String = after
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphabetic())
            .collect();
        let starts_upper = suffix.chars().next().map_or(false, char::is_uppercase);
        if prefix.is_empty() || suffix.is_empty() || starts_upper {
            return Join::KeepHyphen;
        }

        if self.keep_hyphen(&prefix, &suffix) {
            log::trace!("Kept hyphen in {}-{}", prefix, suffix);
            Join::KeepHyphen
        } else {
            Join::DropHyphen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dehyphenator() -> Dehyphenator {
        Dehyphenator::new(&AssemblyParams::default())
    }

    #[test]
    fn test_default_keeps_listed_prefixes() {
        assert_eq!(Dehyphenator::default().join("cross-", "border"), Join::KeepHyphen);
        assert_eq!(
            Dehyphenator::default().join("typi-", "cal"),
            dehyphenator().join("typi-", "cal")
        );
    }

    #[test]
    fn test_line_break_hyphen_dropped() {
        assert_eq!(dehyphenator().join("typi-", "cal government"), Join::DropHyphen);
        assert_eq!(dehyphenator().join("the econ-", "omy"), Join::DropHyphen);
    }

    #[test]
    fn test_kept_prefix() {
        assert_eq!(dehyphenator().join("cross-", "border"), Join::KeepHyphen);
        assert_eq!(dehyphenator().join("a Self-", "assessment"), Join::KeepHyphen);
    }

    #[test]
    fn test_bound_suffix_and_solid_compound() {
        let d = dehyphenator();
        // "inter" is a kept prefix, but "est" never stands alone
        assert_eq!(d.join("inter-", "est rates"), Join::DropHyphen);
        assert_eq!(d.join("co-", "operation"), Join::DropHyphen);
        assert_eq!(d.join("co-", "author"), Join::KeepHyphen);
    }

    #[test]
    fn test_non_word_hyphens() {
        let d = dehyphenator();
        assert_eq!(d.join("plain text", "next"), Join::Space);
        assert_eq!(d.join("1990-", "2000"), Join::KeepHyphen);
        assert_eq!(d.join("Anglo-", "Saxon"), Join::KeepHyphen);
        assert_eq!(d.join("a dash -", "then"), Join::Space);
        assert_eq!(d.join("soft\u{00AD}", "ware"), Join::DropHyphen);
        assert_eq!(d.join("", "x"), Join::Space);
    }
}
