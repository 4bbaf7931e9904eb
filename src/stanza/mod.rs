//! Stanza to paragraph conversion.
//!
//! Turns a rhyme typed as plain text into the ordered paragraphs a document
//! needs: one paragraph per non-empty line, and one blank paragraph between
//! stanzas.
//!
//! Content format:
//! - A double line break (`\n\n`) separates stanzas
//! - A single line break (`\n`) separates lines within a stanza
//! - Lines are trimmed; lines that end up empty are dropped

use std::fmt;

use serde_json::Value;

/// Stanza delimiter.
const STANZA_BREAK: &str = "\n\n";

/// Line delimiter within a stanza.
const LINE_BREAK: char = '\n';

/// Opaque paragraph style identifier, passed through to document assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleTag(String);

impl StyleTag {
    /// Wrap a style name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The style name as written in the document.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a paragraph carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphKind {
    /// A single trimmed, non-empty line of text.
    Content(String),
    /// An empty paragraph separating two stanzas.
    Blank,
}

/// One paragraph to be rendered, decoupled from any document format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphDescriptor {
    /// Content or separator
    pub kind: ParagraphKind,
    /// Style applied by document assembly, if any
    pub style: Option<StyleTag>,
}

impl ParagraphDescriptor {
    /// A content paragraph.
    pub fn content(text: impl Into<String>, style: Option<StyleTag>) -> Self {
        Self { kind: ParagraphKind::Content(text.into()), style }
    }

    /// A blank separator paragraph.
    pub const fn blank(style: Option<StyleTag>) -> Self {
        Self { kind: ParagraphKind::Blank, style }
    }

    /// Paragraph text; empty for separators.
    pub fn text(&self) -> &str {
        match &self.kind {
            ParagraphKind::Content(text) => text,
            ParagraphKind::Blank => "",
        }
    }

    /// Whether this is a stanza separator.
    pub const fn is_blank(&self) -> bool {
        matches!(self.kind, ParagraphKind::Blank)
    }
}

/// Convert rhyme text into paragraph descriptors.
///
/// The separator before stanza `i > 0` is emitted regardless of whether any
/// stanza produced content, so `"A\n\n\n\nB"` yields two separators around an
/// empty stanza.
pub fn convert(text: &str, style: Option<&StyleTag>) -> Vec<ParagraphDescriptor> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut paragraphs = Vec::new();

    for (i, stanza) in text.split(STANZA_BREAK).enumerate() {
        if i > 0 {
            paragraphs.push(ParagraphDescriptor::blank(style.cloned()));
        }

        paragraphs.extend(
            stanza
                .split(LINE_BREAK)
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| ParagraphDescriptor::content(line, style.cloned())),
        );
    }

    paragraphs
}

/// Convert an untyped JSON value. Anything but a string converts like `""`.
pub fn convert_value(value: &Value, style: Option<&StyleTag>) -> Vec<ParagraphDescriptor> {
    value.as_str().map_or_else(Vec::new, |text| convert(text, style))
}
