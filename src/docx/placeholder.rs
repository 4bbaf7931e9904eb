//! Jinja-style placeholders in template text.
//!
//! Two forms are recognized:
//! - `{{ name }}` is replaced inline by the context value
//! - `{{ name|nl2para }}` replaces its whole paragraph with generated ones
//!
//! The `{{p name|nl2para }}` paragraph tag form is accepted as well.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Context;
use crate::constants::PARAGRAPH_FILTER;

/// Regex matching `{{ name }}`, `{{ name|filter }}` and `{{p name|filter }}`.
#[allow(clippy::expect_used)]
static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?:p\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|\s*([A-Za-z_][A-Za-z0-9_]*)\s*)?\}\}")
        .expect("valid regex: RE_PLACEHOLDER")
});

/// A placeholder found in paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Context key
    pub key: &'a str,
    /// Filter name after `|`, if any
    pub filter: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        Some(Self {
            key: caps.get(1)?.as_str(),
            filter: caps.get(2).map(|m| m.as_str()),
        })
    }

    /// Whether this placeholder expands to whole paragraphs.
    pub fn is_block(&self) -> bool {
        self.filter == Some(PARAGRAPH_FILTER)
    }
}

/// All placeholders in `text`, in order.
pub fn placeholders(text: &str) -> impl Iterator<Item = Placeholder<'_>> {
    RE_PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| Placeholder::from_captures(&caps))
}

/// Whether `text` contains any placeholder.
pub fn contains_placeholder(text: &str) -> bool {
    RE_PLACEHOLDER.is_match(text)
}

/// Key of the first paragraph placeholder in `text`.
pub fn find_block(text: &str) -> Option<&str> {
    placeholders(text).find(Placeholder::is_block).map(|p| p.key)
}

/// Replace every placeholder in `text` with its inline context value.
///
/// Unknown filters are ignored; missing keys render as empty text.
pub fn substitute(text: &str, context: &Context) -> String {
    RE_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            Placeholder::from_captures(caps)
                .map(|p| {
                    if p.filter.is_some_and(|f| f != PARAGRAPH_FILTER) {
                        tracing::warn!("Ignoring unknown filter {:?} on {:?}", p.filter, p.key);
                    }
                    context.text(p.key)
                })
                .unwrap_or_default()
        })
        .into_owned()
}
