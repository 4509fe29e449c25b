//! Discipline slug
//!
//! URL-safe identifier: lowercase ASCII letters, digits and single hyphens,
//! no leading or trailing hyphen.

use derive_more::Display;
use serde::Serialize;

pub const SLUG_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct Slug(String);

impl Slug {
    pub fn parse(input: &str) -> Option<Self> {
        is_valid(input).then(|| Self(input.to_string()))
    }

    #[inline]
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= SLUG_MAX_LEN
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(Slug::parse("30-giorni-corsa").is_some());
        assert!(Slug::parse("yoga-base").is_some());
        assert!(Slug::parse("x").is_some());
    }

    #[test]
    fn test_invalid_slugs() {
        for bad in ["", "-yoga", "yoga-", "yo--ga", "Yoga", "yoga base", "yoga/../x"] {
            assert!(Slug::parse(bad).is_none(), "{bad}");
        }
        assert!(Slug::parse(&"a".repeat(SLUG_MAX_LEN + 1)).is_none());
    }
}
