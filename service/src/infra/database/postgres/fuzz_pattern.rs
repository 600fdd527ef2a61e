//! [`FuzzPattern`] definition.

use derive_more::{AsRef, Display};
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern matching any of the words of a search query.
#[derive(AsRef, Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[as_ref(str)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Characters having a special meaning in a `SIMILAR TO` pattern.
    const SPECIAL: &'static [char] = &[
        '\\', '%', '_', '|', '*', '+', '?', '{', '}', '(', ')', '[', ']',
    ];

    /// Creates a new [`FuzzPattern`] out of the provided search `query`.
    ///
    /// Returns [`None`] if the `query` has no words.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let mut words = query.split_whitespace().peekable();
        words.peek()?;

        Some(Self(format!(
            "%({})%",
            words.format_with("|", |word, f| f(&Self::escape(word))),
        )))
    }

    /// Escapes special characters of the provided `word`.
    fn escape(word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        for c in word.chars() {
            if Self::SPECIAL.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        let p = FuzzPattern::new("  tower  renovation ").unwrap();

        assert_eq!(p.as_ref(), "%(tower|renovation)%");
    }

    #[test]
    fn escapes_special_chars() {
        let p = FuzzPattern::new("ELX/SPK/2024_01 100%").unwrap();

        assert_eq!(p.as_ref(), r"%(ELX/SPK/2024\_01|100\%)%");
    }

    #[test]
    fn rejects_blank_query() {
        assert!(FuzzPattern::new(" \t").is_none());
    }
}
