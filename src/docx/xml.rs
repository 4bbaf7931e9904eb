//! WordprocessingML paragraph rewriting.
//!
//! Streams a document part through `quick-xml`, buffering each innermost
//! `<w:p>` so callers can inspect its text and replace it with any number of
//! paragraphs. Everything else is written back unchanged, including drawings
//! and text boxes around nested paragraphs.

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

const PARAGRAPH: &str = "w:p";
const PARAGRAPH_PROPS: &str = "w:pPr";
const PARAGRAPH_STYLE: &str = "w:pStyle";
const RUN: &str = "w:r";
const SECTION_PROPS: &str = "w:sectPr";
const RUN_PROPS: &str = "w:rPr";
const TEXT: &str = "w:t";

/// Owned XML event.
pub type OwnedEvent = Event<'static>;

fn is_named(start: &BytesStart<'_>, name: &str) -> bool {
    start.name().as_ref() == name.as_bytes()
}

fn is_end_named(end: &BytesEnd<'_>, name: &str) -> bool {
    end.name().as_ref() == name.as_bytes()
}

/// Index range of the first `name` element at or after `from`, including its
/// start and end events.
fn element_span(events: &[OwnedEvent], name: &str, from: usize) -> Option<Range<usize>> {
    let offset = events.get(from..)?.iter().position(|event| {
        matches!(event, Event::Start(e) | Event::Empty(e) if is_named(e, name))
    })?;
    let start = from + offset;

    if matches!(events[start], Event::Empty(_)) {
        return Some(start..start + 1);
    }

    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(e) if is_named(e, name) => depth += 1,
            Event::End(e) if is_end_named(e, name) => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// A buffered `<w:p>` element.
#[derive(Debug, Clone)]
pub struct Paragraph {
    events: Vec<OwnedEvent>,
}

impl Paragraph {
    /// Wrap the events of one paragraph, from its start tag to its end tag.
    pub const fn new(events: Vec<OwnedEvent>) -> Self {
        Self { events }
    }

    /// Concatenated text of all `<w:t>` elements.
    ///
    /// Word splits typed text across runs freely, so placeholders are only
    /// reliably visible at this level.
    pub fn text(&self) -> Result<String> {
        let mut text = String::new();
        let mut in_text = false;

        for event in &self.events {
            match event {
                Event::Start(e) if is_named(e, TEXT) => in_text = true,
                Event::End(e) if is_end_named(e, TEXT) => in_text = false,
                Event::Text(t) if in_text => text.push_str(&t.unescape()?),
                Event::CData(c) if in_text => text.push_str(&String::from_utf8_lossy(c)),
                _ => {}
            }
        }

        Ok(text)
    }

    /// The paragraph's `<w:pPr>` events, empty if it has none.
    pub fn properties(&self) -> &[OwnedEvent] {
        let limit = element_span(&self.events, RUN, 1).map_or(self.events.len(), |run| run.start);
        match element_span(&self.events[..limit], PARAGRAPH_PROPS, 1) {
            Some(span) => &self.events[span],
            None => &[],
        }
    }

    /// The `<w:sectPr>` events inside the paragraph properties, if the
    /// paragraph ends a section.
    pub fn section_properties(&self) -> &[OwnedEvent] {
        let properties = self.properties();
        match element_span(properties, SECTION_PROPS, 0) {
            Some(span) => &properties[span],
            None => &[],
        }
    }

    /// The `<w:rPr>` events of the first run that carries text.
    pub fn first_run_properties(&self) -> &[OwnedEvent] {
        let mut from = 1;
        while let Some(run) = element_span(&self.events, RUN, from) {
            let events = &self.events[run.clone()];
            if element_span(events, TEXT, 1).is_some() {
                return match element_span(events, RUN_PROPS, 1) {
                    Some(span) => &events[span],
                    None => &[],
                };
            }
            from = run.end;
        }
        &[]
    }

    /// Give back the original events.
    pub fn into_events(self) -> Vec<OwnedEvent> {
        self.events
    }
}

/// Paragraph properties with any `<w:sectPr>` removed.
pub fn without_section(properties: &[OwnedEvent]) -> Vec<OwnedEvent> {
    match element_span(properties, SECTION_PROPS, 0) {
        Some(span) => properties[..span.start]
            .iter()
            .chain(&properties[span.end..])
            .cloned()
            .collect(),
        None => properties.to_vec(),
    }
}

/// `<w:pPr><w:pStyle w:val="STYLE"/>SECTION</w:pPr>`
pub fn style_properties(style: &str, section: &[OwnedEvent]) -> Vec<OwnedEvent> {
    let mut style_ref = BytesStart::new(PARAGRAPH_STYLE);
    style_ref.push_attribute(("w:val", &*xml_safe(style)));

    let mut events = vec![
        Event::Start(BytesStart::new(PARAGRAPH_PROPS)),
        Event::Empty(style_ref.into_owned()),
    ];
    events.extend_from_slice(section);
    events.push(Event::End(BytesEnd::new(PARAGRAPH_PROPS)));
    events
}

/// Characters allowed in an XML 1.0 document.
const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// `text` without the control characters XML 1.0 cannot carry. Word refuses
/// to open a document containing them.
pub fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    tracing::warn!("Dropping characters not allowed in XML from {text:?}");
    Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
}

/// Build a paragraph. With `text` of `None` the paragraph has no run.
pub fn paragraph(
    properties: &[OwnedEvent],
    run_properties: &[OwnedEvent],
    text: Option<&str>,
) -> Vec<OwnedEvent> {
    let mut events = vec![Event::Start(BytesStart::new(PARAGRAPH))];
    events.extend_from_slice(properties);

    if let Some(text) = text {
        let mut text_start = BytesStart::new(TEXT);
        text_start.push_attribute(("xml:space", "preserve"));

        events.push(Event::Start(BytesStart::new(RUN)));
        events.extend_from_slice(run_properties);
        events.push(Event::Start(text_start));
        events.push(Event::Text(BytesText::new(&xml_safe(text)).into_owned()));
        events.push(Event::End(BytesEnd::new(TEXT)));
        events.push(Event::End(BytesEnd::new(RUN)));
    }

    events.push(Event::End(BytesEnd::new(PARAGRAPH)));
    events
}

/// A paragraph being read.
struct Frame {
    events: Vec<OwnedEvent>,
    has_nested: bool,
}

/// Stream `xml`, handing every innermost paragraph to `rewrite` and writing
/// back whatever events it returns.
///
/// A paragraph that contains other paragraphs (a text box anchor) is kept as
/// is around its rewritten inner paragraphs.
pub fn transform_paragraphs<F>(xml: &str, mut rewrite: F) -> Result<String>
where
    F: FnMut(Paragraph) -> Result<Vec<OwnedEvent>>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let output = match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if is_named(&e, PARAGRAPH) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_nested = true;
                }
                stack.push(Frame { events: vec![Event::Start(e.into_owned())], has_nested: false });
                continue;
            }
            Event::End(e) if !stack.is_empty() && is_end_named(&e, PARAGRAPH) => {
                let Some(mut frame) = stack.pop() else { break };
                frame.events.push(Event::End(e.into_owned()));
                if frame.has_nested {
                    frame.events
                } else {
                    rewrite(Paragraph::new(frame.events))?
                }
            }
            event => vec![event.into_owned()],
        };

        match stack.last_mut() {
            Some(parent) => parent.events.extend(output),
            None => {
                for event in output {
                    writer.write_event(event)?;
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(Error::template("document part ends inside a paragraph"));
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::template(format!("rewritten XML is not UTF-8: {e}")))
}
