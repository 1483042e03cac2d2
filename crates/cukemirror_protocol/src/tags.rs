//! Tag filter parsing and matching.
//!
//! A filter is a `"key:value"` string. A scenario matches a filter list when
//! every well-formed filter is satisfied by at least one of its tags, using
//! exact, case-sensitive comparison of both key and value. Filters that do not
//! split into exactly two parts around `:` are skipped.

use crate::types::Tag;
use std::fmt;

/// A parsed `"key:value"` filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a raw filter. Returns `None` for anything other than exactly one
    /// `:` separator (`"env"`, `"a:b:c"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let key = parts.next()?;
        let value = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(key, value))
    }

    /// True when any tag carries exactly this key and value.
    pub fn is_satisfied_by(&self, tags: &[Tag]) -> bool {
        tags.iter()
            .any(|tag| tag.key == self.key && tag.value == self.value)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Parse every well-formed filter, dropping malformed ones.
pub fn parse_tag_filters<S: AsRef<str>>(raw: &[S]) -> Vec<TagFilter> {
    raw.iter()
        .filter_map(|filter| {
            let parsed = TagFilter::parse(filter.as_ref());
            if parsed.is_none() {
                tracing::debug!(filter = filter.as_ref(), "Skipping malformed tag filter");
            }
            parsed
        })
        .collect()
}

/// Conjunctive tag predicate over raw `"key:value"` filters.
///
/// An empty or all-malformed filter list is vacuously true here; callers that
/// query "by tags" short-circuit the empty list themselves.
pub fn matches_all_tags<S: AsRef<str>>(tags: &[Tag], filters: &[S]) -> bool {
    filters
        .iter()
        .filter_map(|raw| TagFilter::parse(raw.as_ref()))
        .all(|filter| filter.is_satisfied_by(tags))
}
