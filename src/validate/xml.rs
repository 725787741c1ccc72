//! Markup validation and pretty-printing.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, BytesText, Event};

use super::{ValidationError, is_ncname};

/// Entities every XML parser knows without a DTD.
const PREDEFINED_ENTITIES: [&str; 5] = ["lt", "gt", "amp", "apos", "quot"];

const INDENT: &[u8] = b"  ";

/// Validate a markup document and re-indent it with two spaces per level.
///
/// Element-only content is laid out one child per line and the whitespace it
/// had before is discarded. Once an element holds text, the rest of that
/// element is copied exactly as written, so `<p>Some <b>bold</b></p>` stays
/// on one line. `<pre>` and `xml:space="preserve"` elements are always
/// copied as written. The XML declaration is passed through untouched and
/// the output has no trailing newline.
pub fn prettify_xml(source: &str) -> Result<String, ValidationError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().check_end_names = true;

    let mut out = Layout::new();
    let mut open: Vec<Frame> = Vec::new();
    let mut roots = 0usize;
    let mut text = String::new();

    loop {
        let position = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(markup_error(reader.error_position(), e)),
        };

        match event {
            Event::Text(t) => {
                let chunk = String::from_utf8_lossy(&t);
                if open.is_empty() && !chunk.trim().is_empty() {
                    return Err(markup_error(position, "text outside the root element"));
                }
                text.push_str(&chunk);
                continue;
            }
            Event::GeneralRef(r) => {
                let name = String::from_utf8_lossy(&r).into_owned();
                if open.is_empty() {
                    return Err(markup_error(position, "reference outside the root element"));
                }
                check_reference(&name).map_err(|message| markup_error(position, message))?;
                text.push('&');
                text.push_str(&name);
                text.push(';');
                continue;
            }
            _ => {}
        }

        out.flush_text(&mut text, &mut open, position)?;

        match event {
            Event::Decl(d) => {
                if !out.is_empty() {
                    return Err(markup_error(
                        position,
                        "XML declaration must be at the start of the document",
                    ));
                }
                out.markup(Event::Decl(d), 0, position)?;
            }
            Event::DocType(d) => {
                if roots > 0 {
                    return Err(markup_error(
                        position,
                        "DOCTYPE must come before the root element",
                    ));
                }
                out.markup(Event::DocType(d), 0, position)?;
            }
            Event::Start(e) => {
                check_start(&e).map_err(|message| markup_error(position, message))?;
                if open.is_empty() {
                    roots += 1;
                    if roots > 1 {
                        return Err(markup_error(position, "more than one root element"));
                    }
                }
                mark_content(&mut open);
                let preserve = preserves_space(&e);
                let name = e.name().as_ref().to_vec();
                out.markup(Event::Start(e), open.len(), position)?;
                open.push(Frame {
                    name,
                    has_content: false,
                });
                if preserve && out.verbatim_from.is_none() {
                    out.verbatim_from = Some(open.len());
                }
            }
            Event::Empty(e) => {
                check_start(&e).map_err(|message| markup_error(position, message))?;
                if open.is_empty() {
                    roots += 1;
                    if roots > 1 {
                        return Err(markup_error(position, "more than one root element"));
                    }
                }
                mark_content(&mut open);
                out.markup(Event::Empty(e), open.len(), position)?;
            }
            Event::End(e) => {
                let frame = match open.pop() {
                    Some(frame) if frame.name == e.name().as_ref() => frame,
                    Some(frame) => {
                        return Err(markup_error(
                            position,
                            format!(
                                "expected </{}>, found </{}>",
                                String::from_utf8_lossy(&frame.name),
                                String::from_utf8_lossy(e.name().as_ref())
                            ),
                        ));
                    }
                    None => {
                        return Err(markup_error(
                            position,
                            format!(
                                "unmatched end tag </{}>",
                                String::from_utf8_lossy(e.name().as_ref())
                            ),
                        ));
                    }
                };
                if frame.has_content {
                    out.markup(Event::End(e), open.len(), position)?;
                } else {
                    out.inline(Event::End(e), position)?;
                }
                if out.verbatim_from.is_some_and(|depth| open.len() < depth) {
                    out.verbatim_from = None;
                }
            }
            Event::CData(c) => {
                if open.is_empty() {
                    return Err(markup_error(position, "CDATA outside the root element"));
                }
                out.content(Event::CData(c), &mut open, position)?;
            }
            Event::Eof => {
                if let Some(frame) = open.last() {
                    return Err(markup_error(
                        position,
                        format!("unclosed element <{}>", String::from_utf8_lossy(&frame.name)),
                    ));
                }
                if roots == 0 {
                    return Err(markup_error(position, "document has no root element"));
                }
                break;
            }
            other => {
                mark_content(&mut open);
                out.markup(other, open.len(), position)?;
            }
        }
    }

    String::from_utf8(out.writer.into_inner()).map_err(|e| markup_error(0, e))
}

/// An element that has been opened but not yet closed.
struct Frame {
    name: Vec<u8>,
    has_content: bool,
}

fn mark_content(open: &mut [Frame]) {
    if let Some(frame) = open.last_mut() {
        frame.has_content = true;
    }
}

/// Output side of [`prettify_xml`]: decides where line breaks go.
struct Layout {
    writer: Writer<Vec<u8>>,
    /// Nesting depth of the element whose content is being copied as written.
    verbatim_from: Option<usize>,
    after_text: bool,
}

impl Layout {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            verbatim_from: None,
            after_text: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.writer.get_ref().is_empty()
    }

    /// Write a tag, comment or other markup on its own line at `level`,
    /// unless it continues text or sits inside verbatim content.
    fn markup(
        &mut self,
        event: Event<'_>,
        level: usize,
        position: u64,
    ) -> Result<(), ValidationError> {
        if self.verbatim_from.is_none() && !self.after_text && !self.is_empty() {
            let buf = self.writer.get_mut();
            buf.push(b'\n');
            for _ in 0..level {
                buf.extend_from_slice(INDENT);
            }
        }
        self.inline(event, position)
    }

    fn inline(&mut self, event: Event<'_>, position: u64) -> Result<(), ValidationError> {
        self.after_text = false;
        self.writer
            .write_event(event)
            .map_err(|e| markup_error(position, e))
    }

    /// Write character data. The enclosing element becomes mixed content and
    /// the rest of it is copied as written.
    fn content(
        &mut self,
        event: Event<'_>,
        open: &mut [Frame],
        position: u64,
    ) -> Result<(), ValidationError> {
        if self.verbatim_from.is_none() {
            self.verbatim_from = Some(open.len());
        }
        mark_content(open);
        self.inline(event, position)?;
        self.after_text = true;
        Ok(())
    }

    /// Write accumulated text as a single node. Outside verbatim content,
    /// whitespace-only text is layout and is dropped.
    fn flush_text(
        &mut self,
        text: &mut String,
        open: &mut [Frame],
        position: u64,
    ) -> Result<(), ValidationError> {
        let pending = std::mem::take(text);
        if pending.is_empty() || (self.verbatim_from.is_none() && pending.trim().is_empty()) {
            return Ok(());
        }
        self.content(Event::Text(BytesText::from_escaped(pending)), open, position)
    }
}

/// `<pre>` and `xml:space="preserve"` keep their whitespace.
fn preserves_space(start: &BytesStart<'_>) -> bool {
    if start.local_name().as_ref() == b"pre" {
        return true;
    }
    start.attributes().flatten().any(|attr| {
        attr.key.as_ref() == b"xml:space" && attr.value.as_ref() == b"preserve"
    })
}

fn check_start(start: &BytesStart<'_>) -> Result<(), String> {
    check_name(start.name().as_ref())?;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        check_name(attr.key.as_ref())?;
        check_attribute_value(&attr.value)?;
    }
    Ok(())
}

/// Element and attribute names: an NCName, optionally with one prefix.
fn check_name(raw: &[u8]) -> Result<(), String> {
    let name = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    let mut parts = name.split(':');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), None, _) => is_ncname(local),
        (Some(prefix), Some(local), None) => is_ncname(prefix) && is_ncname(local),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(format!("invalid name {name:?}"))
    }
}

/// Attribute values may not contain `<`, and every `&` must start a
/// reference.
fn check_attribute_value(raw: &[u8]) -> Result<(), String> {
    let value = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    if value.contains('<') {
        return Err(format!("'<' in attribute value {value:?}"));
    }
    let mut rest = value;
    while let Some(at) = rest.find('&') {
        let after = &rest[at + 1..];
        let Some(end) = after.find(';') else {
            return Err(format!("unescaped '&' in attribute value {value:?}"));
        };
        check_reference(&after[..end])?;
        rest = &after[end + 1..];
    }
    Ok(())
}

/// Accept predefined entities and character references that name a valid char.
fn check_reference(name: &str) -> Result<(), String> {
    if let Some(reference) = name.strip_prefix('#') {
        let code = match reference.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => reference.parse::<u32>(),
        };
        return match code.ok().and_then(char::from_u32) {
            Some(_) => Ok(()),
            None => Err(format!("invalid character reference &{name};")),
        };
    }
    if PREDEFINED_ENTITIES.contains(&name) {
        Ok(())
    } else {
        Err(format!("undefined entity &{name};"))
    }
}

fn markup_error(position: u64, message: impl ToString) -> ValidationError {
    ValidationError::Markup {
        position,
        message: message.to_string(),
    }
}
