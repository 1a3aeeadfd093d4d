//! XML codec (`application/problem+xml`)
//!
//! Mapping between the document model and XML:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <problem>
//!   <type>https://example.com/probs/out-of-credit</type>
//!   <title>You do not have enough credit.</title>
//!   <status>403</status>
//!   <balance>30</balance>
//!   <accounts>/account/12345</accounts>
//!   <accounts>/account/67890</accounts>
//!   <irken><invader>Zim</invader></irken>
//!   <tags kind="list"/>
//!   <meta kind="object"/>
//!   <matrix kind="list"><item>a</item><item>b</item></matrix>
//!   <matrix kind="list"><item>c</item></matrix>
//! </problem>
//! ```
//!
//! - Scalars become text content; `null` becomes an empty element.
//! - Objects become nested elements.
//! - Lists repeat the element once per item; repeated siblings parse back into a list.
//! - Empty lists and empty objects are written as empty elements marked with
//!   `kind="list"` / `kind="object"`, so the key and its shape survive.
//! - A list item that is itself a list is wrapped in one `kind="list"` element whose
//!   children are `<item>` elements.
//!
//! Known losses: every leaf parses back as a string (XML has no leaf types), `null`
//! parses back as `""`, and a one-item list parses back as its single item.
//!
//! The document must hold exactly one `<problem>` element; any element, CDATA or
//! non-whitespace text outside it is rejected.

use std::borrow::Cow;
use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use crate::config::{KeyPolicy, XmlOptions};
use crate::error::{ProblemError, Result};
use crate::problem::Problem;

const ROOT: &str = "problem";
const KIND_ATTR: &str = "kind";
const KIND_LIST: &str = "list";
const KIND_OBJECT: &str = "object";
const LIST_ITEM: &str = "item";

impl Problem {
    /// Serialize to XML with a `<problem>` root.
    ///
    /// `use_complex_properties` controls whether object and list extensions are
    /// rendered; when false only scalar extensions are written.
    ///
    /// # Errors
    /// [`ProblemError::InvalidExtensionKey`] when an extension key is not a valid
    /// element name. See [`to_xml_with`](Self::to_xml_with) for other policies.
    pub fn to_xml(&self, use_complex_properties: bool) -> Result<String> {
        let options = if use_complex_properties {
            XmlOptions::default()
        } else {
            XmlOptions::flat()
        };
        self.to_xml_with(&options)
    }

    /// Serialize to XML using explicit [`XmlOptions`].
    ///
    /// # Errors
    /// - [`ProblemError::InvalidExtensionKey`] for an illegal key under [`KeyPolicy::Reject`]
    /// - [`ProblemError::ElementNameCollision`] when two sibling keys sanitize to one name
    /// - [`ProblemError::Io`] if the underlying writer fails
    pub fn to_xml_with(&self, options: &XmlOptions) -> Result<String> {
        let mut writer = if options.pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

        write_text(&mut writer, "type", self.type_url())?;
        if let Some(title) = self.title() {
            write_text(&mut writer, "title", title)?;
        }
        if let Some(status) = self.status() {
            write_text(&mut writer, "status", &status.to_string())?;
        }
        if let Some(detail) = self.detail() {
            write_text(&mut writer, "detail", detail)?;
        }
        if let Some(instance) = self.instance() {
            write_text(&mut writer, "instance", instance)?;
        }

        let members = self.extensions().iter().filter(|&(key, value)| {
            if !options.complex_properties && (value.is_object() || value.is_array()) {
                tracing::trace!(key = %key, "skipping complex extension in flat XML output");
                return false;
            }
            true
        });
        write_members(&mut writer, members, options.key_policy)?;

        writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
        String::from_utf8(writer.into_inner()).map_err(|e| ProblemError::Utf8(e.utf8_error()))
    }

    /// Parse an XML problem document.
    ///
    /// # Errors
    /// - [`ProblemError::MalformedXml`] when the text is not well-formed
    /// - [`ProblemError::TruncatedXml`] when the root element is missing or unclosed
    /// - [`ProblemError::UnexpectedRoot`] when the root element is not `<problem>`
    /// - [`ProblemError::ContentOutsideRoot`] for elements or text around the root
    /// - [`ProblemError::InvalidField`] when a standard member cannot be coerced
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<Map<String, Value>> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let frame = Frame::open(&start)?;
                    if stack.is_empty() {
                        check_root(root.is_some(), &frame.name)?;
                    }
                    stack.push(frame);
                }
                Event::Empty(start) => {
                    let frame = Frame::open(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(frame.finish()),
                        None => {
                            check_root(root.is_some(), &frame.name)?;
                            root = Some(Map::new());
                        }
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some(frame) => frame.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(ProblemError::ContentOutsideRoot(format!(
                                "text '{}'",
                                text.trim()
                            )));
                        }
                    }
                }
                Event::CData(data) => match stack.last_mut() {
                    Some(frame) => frame.text.push_str(std::str::from_utf8(&data)?),
                    None => {
                        return Err(ProblemError::ContentOutsideRoot(
                            "CDATA section".to_owned(),
                        ));
                    }
                },
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or(ProblemError::TruncatedXml("closing tag without an open element"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(frame.finish()),
                        None => root = Some(fold_children(frame.children)),
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ProblemError::TruncatedXml("document ended before </problem>"));
        }
        let root = root.ok_or(ProblemError::TruncatedXml("missing <problem> root element"))?;
        Self::from_map(root)
    }
}

fn check_root(root_seen: bool, name: &str) -> Result<()> {
    if root_seen {
        return Err(ProblemError::ContentOutsideRoot(format!("<{name}>")));
    }
    if name == ROOT {
        Ok(())
    } else {
        Err(ProblemError::UnexpectedRoot {
            expected: "<problem>",
            found: format!("<{name}>"),
        })
    }
}

fn write_text<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_marked_empty<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    kind: &str,
) -> Result<()> {
    writer.write_event(Event::Empty(
        BytesStart::new(name).with_attributes([(KIND_ATTR, kind)]),
    ))?;
    Ok(())
}

/// Writes sibling members, failing when two keys end up with the same element name.
fn write_members<'a, W: std::io::Write>(
    writer: &mut Writer<W>,
    members: impl IntoIterator<Item = (&'a String, &'a Value)>,
    policy: KeyPolicy,
) -> Result<()> {
    let mut seen: HashSet<Cow<'a, str>> = HashSet::new();
    for (key, value) in members {
        let name = element_name(key, policy)?;
        if !seen.insert(name.clone()) {
            return Err(ProblemError::ElementNameCollision {
                key: key.clone(),
                element: name.into_owned(),
            });
        }
        write_value(writer, &name, value, policy)?;
    }
    Ok(())
}

fn write_value<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
    policy: KeyPolicy,
) -> Result<()> {
    match value {
        Value::Null => writer.write_event(Event::Empty(BytesStart::new(name)))?,
        Value::Bool(b) => write_text(writer, name, &b.to_string())?,
        Value::Number(n) => write_text(writer, name, &n.to_string())?,
        Value::String(s) => write_text(writer, name, s)?,
        Value::Array(items) if items.is_empty() => write_marked_empty(writer, name, KIND_LIST)?,
        Value::Array(items) => {
            for item in items {
                write_list_item(writer, name, item, policy)?;
            }
        }
        Value::Object(map) if map.is_empty() => write_marked_empty(writer, name, KIND_OBJECT)?,
        Value::Object(map) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            write_members(writer, map, policy)?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

/// A non-empty list inside a list is wrapped in a `kind="list"` element of `<item>`s.
fn write_list_item<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    item: &Value,
    policy: KeyPolicy,
) -> Result<()> {
    match item {
        Value::Array(inner) if !inner.is_empty() => {
            writer.write_event(Event::Start(
                BytesStart::new(name).with_attributes([(KIND_ATTR, KIND_LIST)]),
            ))?;
            for nested in inner {
                write_list_item(writer, LIST_ITEM, nested, policy)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
            Ok(())
        }
        _ => write_value(writer, name, item, policy),
    }
}

/// Checks `key` against the XML `Name` production, minus namespace colons.
#[must_use]
pub fn is_valid_element_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_name_start) && chars.all(is_name_char)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn element_name(key: &str, policy: KeyPolicy) -> Result<Cow<'_, str>> {
    if is_valid_element_name(key) {
        return Ok(Cow::Borrowed(key));
    }
    match policy {
        KeyPolicy::Reject => Err(ProblemError::InvalidExtensionKey(key.to_owned())),
        KeyPolicy::Sanitize => {
            let name = sanitize_element_name(key);
            tracing::debug!(key = %key, element = %name, "sanitized extension key for XML");
            Ok(Cow::Owned(name))
        }
    }
}

fn sanitize_element_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 1);
    if !key.chars().next().is_some_and(is_name_start) {
        name.push('_');
    }
    name.extend(
        key.chars()
            .map(|c| if is_name_char(c) { c } else { '_' }),
    );
    name
}

/// Container shape declared by a `kind` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Object,
}

/// An element being parsed: its text so far and the children already closed.
struct Frame {
    name: String,
    kind: Option<Container>,
    text: String,
    children: Vec<(String, Value)>,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
        let kind = start
            .try_get_attribute(KIND_ATTR)
            .map_err(quick_xml::Error::from)?
            .and_then(|attr| match attr.value.as_ref() {
                b"list" => Some(Container::List),
                b"object" => Some(Container::Object),
                _ => None,
            });
        Ok(Self {
            name,
            kind,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Leaf elements yield their text, elements with children yield an object,
    /// `kind="list"` elements yield their children in order.
    fn finish(self) -> (String, Value) {
        let value = match self.kind {
            Some(Container::List) => {
                Value::Array(self.children.into_iter().map(|(_, v)| v).collect())
            }
            None if self.children.is_empty() => Value::String(self.text),
            Some(Container::Object) | None => Value::Object(fold_children(self.children)),
        };
        (self.name, value)
    }
}

/// Collects child elements into an object; repeated names become a list.
fn fold_children(children: Vec<(String, Value)>) -> Map<String, Value> {
    let mut map = Map::new();
    let mut repeated: HashSet<String> = HashSet::new();
    for (name, value) in children {
        match map.get_mut(&name) {
            Some(Value::Array(items)) if repeated.contains(&name) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
                repeated.insert(name);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    map
}
