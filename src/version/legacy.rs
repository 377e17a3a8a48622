//! Loose ("legacy") version ordering
//!
//! Requirements files in the wild pin versions that are not valid PEP 440
//! (`2004d`, `1.0-1`, `0.9.8-beta`), so versions are ordered with the
//! permissive legacy scheme instead of a strict parser. Every string is a
//! valid version and any two versions are comparable.
//!
//! # Comparison rules
//!
//! The lower-cased string is split into runs of ASCII letters, runs of
//! ASCII digits, `.` and `-`; anything else becomes its own token.
//!
//! - `pre`, `preview` and `rc` become `c`, `dev` becomes `@`, `-` becomes
//!   `final-`, and `.` separators are dropped.
//! - A `final` marker is appended at the end.
//! - Before an alphabetic token that sorts below `final`, pending `final-`
//!   tokens are dropped. Before any alphabetic token, trailing zero numbers
//!   are dropped, so `1.0` and `1.0.0` are equal.
//! - Numbers compare numerically (any length), alphabetic tokens compare
//!   lexicographically, and every alphabetic token sorts before every number.
//!
//! This gives `1.0.dev1 < 1.0a1 < 1.0b1 < 1.0rc1 < 1.0 < 1.0-1 < 1.0.1`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A comparable version that keeps its original spelling
#[derive(Debug, Clone)]
pub struct LegacyVersion {
    raw: String,
    key: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    /// Alphabetic token, stored after replacement (e.g. "a", "c", "@", "final-")
    Tag(String),
    /// Numeric token without leading zeros ("0" for zero)
    Number(String),
}

impl Ord for Part {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Part::Tag(a), Part::Tag(b)) => a.cmp(b),
            (Part::Tag(_), Part::Number(_)) => Ordering::Less,
            (Part::Number(_), Part::Tag(_)) => Ordering::Greater,
            (Part::Number(a), Part::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        }
    }
}

impl PartialOrd for Part {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const FINAL: &str = "final";

impl LegacyVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            raw: version.to_string(),
            key: legacy_key(version),
        }
    }

    /// The version as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Compare two version strings using legacy ordering
pub fn compare(a: &str, b: &str) -> Ordering {
    LegacyVersion::parse(a).cmp(&LegacyVersion::parse(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Letters,
    Digits,
    Separator,
    Other,
}

fn token_kind(c: char) -> TokenKind {
    if c.is_ascii_alphabetic() {
        TokenKind::Letters
    } else if c.is_ascii_digit() {
        TokenKind::Digits
    } else if c == '.' || c == '-' {
        TokenKind::Separator
    } else {
        TokenKind::Other
    }
}

/// Split into letter runs, digit runs, single separators and runs of anything else
fn tokenize(version: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_kind: Option<TokenKind> = None;

    for c in version.chars() {
        let kind = token_kind(c);
        let extends = current_kind == Some(kind) && kind != TokenKind::Separator;
        if !extends && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_kind = Some(kind);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn raw_parts(version: &str) -> Vec<Part> {
    let lowered = version.to_lowercase();
    let mut parts = Vec::new();

    for token in tokenize(&lowered) {
        let replaced = match token.as_str() {
            "pre" | "preview" | "rc" => "c",
            "-" => "final-",
            "dev" => "@",
            "." => continue,
            other => other,
        };

        if replaced.starts_with(|c: char| c.is_ascii_digit()) {
            let trimmed = replaced.trim_start_matches('0');
            let number = if trimmed.is_empty() { "0" } else { trimmed };
            parts.push(Part::Number(number.to_string()));
        } else {
            parts.push(Part::Tag(replaced.to_string()));
        }
    }
    parts.push(Part::Tag(FINAL.to_string()));

    parts
}

fn legacy_key(version: &str) -> Vec<Part> {
    let zero = Part::Number("0".to_string());
    let pending_final = Part::Tag("final-".to_string());
    let mut key: Vec<Part> = Vec::new();

    for part in raw_parts(version) {
        if let Part::Tag(tag) = &part {
            if tag.as_str() < FINAL {
                while key.last() == Some(&pending_final) {
                    key.pop();
                }
            }
            while key.last() == Some(&zero) {
                key.pop();
            }
        }
        key.push(part);
    }

    key
}

impl PartialEq for LegacyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for LegacyVersion {}

impl Hash for LegacyVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for LegacyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for LegacyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LegacyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", "1.0.1")]
    #[case("1.0.1", "1.1")]
    #[case("1.9", "1.10")]
    #[case("1.2", "2.0")]
    #[case("1.0.dev1", "1.0a1")]
    #[case("1.0a1", "1.0b1")]
    #[case("1.0b1", "1.0rc1")]
    #[case("1.0rc1", "1.0")]
    #[case("1.0", "1.0-1")]
    #[case("1.0-1", "1.0.1")]
    #[case("1.0pre1", "1.0")]
    #[case("2004d", "2005")]
    #[case("0.9.8-beta", "0.9.8")]
    #[case("1.0.0.0.1", "1.0.1")]
    #[case("1.99999999999999999999", "1.100000000000000000000")]
    fn compare_orders_lower_before_higher(#[case] lower: &str, #[case] higher: &str) {
        assert_eq!(compare(lower, higher), Ordering::Less);
        assert_eq!(compare(higher, lower), Ordering::Greater);
    }

    #[rstest]
    #[case("1.0", "1.0")]
    #[case("1.0", "1.0.0")]
    #[case("1.0", "1.00")]
    #[case("1.0rc1", "1.0c1")]
    #[case("1.0rc1", "1.0preview1")]
    #[case("1.0A1", "1.0a1")]
    fn compare_treats_equivalent_spellings_as_equal(#[case] a: &str, #[case] b: &str) {
        assert_eq!(compare(a, b), Ordering::Equal);
    }

    #[test]
    fn sorting_uses_legacy_ordering() {
        let mut versions: Vec<LegacyVersion> = ["1.10", "1.2", "1.9", "1.2rc1", "1.0"]
            .into_iter()
            .map(LegacyVersion::parse)
            .collect();
        versions.sort();

        let sorted: Vec<&str> = versions.iter().map(LegacyVersion::as_str).collect();
        assert_eq!(sorted, vec!["1.0", "1.2rc1", "1.2", "1.9", "1.10"]);
    }

    #[test]
    fn display_keeps_original_spelling() {
        assert_eq!(LegacyVersion::parse("1.0RC1").to_string(), "1.0RC1");
    }

    fn version_string() -> impl Strategy<Value = String> {
        "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}((a|b|rc|\\.dev|\\.post|-)[0-9]{1,2})?"
    }

    proptest! {
        #[test]
        fn compare_is_reflexive(a in version_string()) {
            prop_assert_eq!(compare(&a, &a), Ordering::Equal);
        }

        #[test]
        fn compare_is_antisymmetric(a in version_string(), b in version_string()) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }

        #[test]
        fn compare_is_transitive(
            a in version_string(),
            b in version_string(),
            c in version_string(),
        ) {
            if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(compare(&a, &c), Ordering::Greater);
            }
        }
    }
}
