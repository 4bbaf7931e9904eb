//! Word template rendering.
//!
//! Merges a [`Context`] into a `.docx` template: inline placeholders become
//! text, paragraph placeholders become one paragraph per rhyme line with blank
//! paragraphs between stanzas.

pub mod package;
pub mod placeholder;
pub mod xml;

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::stanza::{self, ParagraphDescriptor, StyleTag};
use xml::{OwnedEvent, Paragraph};

static NULL: Value = Value::Null;

/// Values available to placeholders.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Value for `key`; `null` when absent.
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }

    /// Inline text for `key`. Strings render as-is, `null` as nothing, other
    /// values as their JSON text.
    pub fn text(&self, key: &str) -> String {
        match self.get(key) {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Render a template read from `path`.
pub fn render_file(path: &Path, context: &Context, style: Option<&StyleTag>) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::TemplateNotFound(path.to_path_buf()));
    }
    let template = fs_err::read(path).map_err(|e| Error::io(e, path.to_path_buf()))?;
    render(&template, context, style)
}

/// Render template bytes into a new `.docx`.
pub fn render(template: &[u8], context: &Context, style: Option<&StyleTag>) -> Result<Vec<u8>> {
    package::repackage(template, |name, xml| {
        tracing::debug!("Rendering {name}");
        render_part(xml, context, style)
    })
}

/// Substitute placeholders in one WordprocessingML part.
pub fn render_part(xml: &str, context: &Context, style: Option<&StyleTag>) -> Result<String> {
    xml::transform_paragraphs(xml, |paragraph| {
        let text = paragraph.text()?;
        if !placeholder::contains_placeholder(&text) {
            return Ok(paragraph.into_events());
        }

        if let Some(key) = placeholder::find_block(&text) {
            let descriptors = stanza::convert_value(context.get(key), style);
            return Ok(expand_paragraph(&paragraph, &descriptors));
        }

        let substituted = placeholder::substitute(&text, context);
        Ok(xml::paragraph(
            paragraph.properties(),
            paragraph.first_run_properties(),
            Some(&substituted),
        ))
    })
}

/// Replace a host paragraph with one paragraph per descriptor.
///
/// Paragraphs without a style inherit the host's paragraph properties. With
/// no descriptors one empty paragraph remains, since table cells must not be
/// left without a paragraph. A section break on the host stays on the last
/// paragraph only.
fn expand_paragraph(host: &Paragraph, descriptors: &[ParagraphDescriptor]) -> Vec<OwnedEvent> {
    let run_properties = host.first_run_properties();

    if descriptors.is_empty() {
        return xml::paragraph(host.properties(), run_properties, None);
    }

    let section = host.section_properties();
    let inner_properties = xml::without_section(host.properties());
    let last = descriptors.len() - 1;

    let mut events = Vec::new();
    for (i, descriptor) in descriptors.iter().enumerate() {
        let section = if i == last { section } else { &[] };
        let owned;
        let properties = match &descriptor.style {
            Some(style) => {
                owned = xml::style_properties(style.as_str(), section);
                owned.as_slice()
            }
            None if i == last => host.properties(),
            None => inner_properties.as_slice(),
        };
        let text = (!descriptor.is_blank()).then(|| descriptor.text());
        events.extend(xml::paragraph(properties, run_properties, text));
    }
    events
}
