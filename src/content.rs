//! Fail-soft parsing of recognized text formats into a generic value tree.
//!
//! All parses degrade to `None` on malformed input; nothing here returns an
//! error. The value tree is `serde_json::Value`, so parsed content drops
//! straight into the serialized output records.

use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

/// Parses text according to a format hint derived from the file extension.
///
/// Recognized hints are `json`, `csv`, and `xml`. Any other hint yields
/// `None` without attempting a parse.
pub fn parse_content(text: &str, hint: &str) -> Option<Value> {
    match hint {
        "json" => parse_json(text),
        "csv" => Some(parse_csv(text)),
        "xml" => parse_xml(text),
        _ => None,
    }
}

/// Strict JSON parse; malformed input yields `None`.
pub fn parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Parses naive comma-separated text into an array of row objects.
///
/// The first line provides field names. Every field is trimmed and stripped
/// of one surrounding quote on each side. Rows shorter than the header list
/// pad missing fields with empty strings; fields beyond the header count are
/// dropped. Quoted commas are not interpreted.
pub fn parse_csv(text: &str) -> Value {
    let mut lines = text.trim().split('\n');
    let headers: Vec<String> = match lines.next() {
        Some(line) => line.split(',').map(clean_field).collect(),
        None => return Value::Array(Vec::new()),
    };

    let mut rows = Vec::new();
    for line in lines {
        let values: Vec<String> = line.split(',').map(clean_field).collect();
        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).cloned().unwrap_or_default();
            row.insert(header.clone(), Value::String(value));
        }
        rows.push(Value::Object(row));
    }
    Value::Array(rows)
}

fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Converts an XML document into the map form used by the value tree.
///
/// Attributes become `@`-prefixed keys, repeated child tags coalesce into
/// arrays in document order, and an element whose only content is text
/// collapses to a bare string. Text alongside attributes or child elements
/// lands under `#text`, and empty elements become null. Malformed documents
/// yield `None`.
pub fn parse_xml(text: &str) -> Option<Value> {
    let mut reader = quick_xml::Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let map = element_attrs(&e)?;
                stack.push(OpenElement {
                    name,
                    map,
                    text: None,
                });
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let value = close_element(element_attrs(&e)?, None);
                if !attach(&mut stack, &mut root, name, value) {
                    return None;
                }
            }
            Ok(Event::End(_)) => {
                let elem = stack.pop()?;
                let value = close_element(elem.map, elem.text);
                if !attach(&mut stack, &mut root, elem.name, value) {
                    return None;
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(open) = stack.last_mut() {
                    let unescaped = t.unescape().ok()?;
                    let trimmed = unescaped.trim();
                    if !trimmed.is_empty() {
                        open.text = Some(trimmed.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if !stack.is_empty() {
        return None;
    }
    root
}

struct OpenElement {
    name: String,
    map: Map<String, Value>,
    text: Option<String>,
}

fn element_attrs(e: &BytesStart) -> Option<Map<String, Value>> {
    let mut map = Map::new();
    for attr in e.attributes() {
        let attr = attr.ok()?;
        let name = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        let value = attr.unescape_value().ok()?.into_owned();
        map.insert(name, Value::String(value));
    }
    Some(map)
}

fn close_element(mut map: Map<String, Value>, text: Option<String>) -> Value {
    match text {
        Some(t) if map.is_empty() => Value::String(t),
        Some(t) => {
            map.insert("#text".to_string(), Value::String(t));
            Value::Object(map)
        }
        None if map.is_empty() => Value::Null,
        None => Value::Object(map),
    }
}

/// Hangs a finished element off its parent, coalescing repeated tag names
/// into arrays. Returns false when a second root element appears.
fn attach(
    stack: &mut Vec<OpenElement>,
    root: &mut Option<Value>,
    name: String,
    value: Value,
) -> bool {
    match stack.last_mut() {
        Some(parent) => {
            insert_child(&mut parent.map, name, value);
            true
        }
        None => {
            if root.is_some() {
                return false;
            }
            *root = Some(value);
            true
        }
    }
}

fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(list)) => list.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}
