//! Flattens the CMS wire representation of an entry into a content item.
//!
//! A raw entry looks roughly like:
//!
//! ```text
//! { title: { rendered }, content: { basic: { content, excerpt }, advanced? },
//!   advanced?: [ { fields: [ { name, class, value, fields? } ] } ],
//!   guid, link, _links, ... }
//! ```
//!
//! The normalized item keeps every other top-level key, turns `title` into the
//! rendered string, and folds each advanced field into `content` under its
//! field name.

use rooftop_logging::rooftop_trace;
use serde_json::{Map, Value};

use crate::TransformError;

/// Relationship fields may embed entries that embed entries; the CMS does not
/// promise the graph is acyclic, so recursion stops here.
pub const MAX_RELATIONSHIP_DEPTH: usize = 32;

const DISCARDED_KEYS: &[&str] = &["guid", "link", "_links"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldClass {
    Repeater,
    Relationship,
    Other,
}

impl FieldClass {
    fn parse(class: Option<&str>) -> Self {
        match class {
            Some("repeater") => Self::Repeater,
            Some("relationship") => Self::Relationship,
            _ => Self::Other,
        }
    }
}

/// Normalizes an owned raw entry and hands it back.
pub fn normalize(mut raw: Value) -> Result<Value, TransformError> {
    normalize_in_place(&mut raw)?;
    Ok(raw)
}

/// Normalizes a raw entry in place.
///
/// Must be applied exactly once per entry: the `advanced` collection is
/// consumed, so a second pass would fail on the already-flattened `title`.
pub fn normalize_in_place(item: &mut Value) -> Result<(), TransformError> {
    normalize_at_depth(item, 0)
}

/// JSON falsiness as the CMS treats it: `null`, `false`, `0` and `""`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn normalize_at_depth(item: &mut Value, depth: usize) -> Result<(), TransformError> {
    if depth > MAX_RELATIONSHIP_DEPTH {
        return Err(TransformError::DepthExceeded {
            limit: MAX_RELATIONSHIP_DEPTH,
        });
    }
    let entry = item
        .as_object_mut()
        .ok_or_else(|| TransformError::shape("item", "object"))?;

    flatten_title(entry)?;
    for key in DISCARDED_KEYS {
        entry.remove(*key);
    }
    hoist_basic(entry)?;
    fold_advanced(entry, depth)
}

fn flatten_title(entry: &mut Map<String, Value>) -> Result<(), TransformError> {
    let rendered = entry
        .get_mut("title")
        .and_then(Value::as_object_mut)
        .and_then(|title| title.remove("rendered"))
        .ok_or_else(|| TransformError::missing("title.rendered"))?;
    entry.insert("title".to_string(), rendered);
    Ok(())
}

fn hoist_basic(entry: &mut Map<String, Value>) -> Result<(), TransformError> {
    let content = entry
        .get_mut("content")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| TransformError::missing("content.basic"))?;

    let (body, excerpt) = match content.get_mut("basic") {
        Some(Value::Object(basic)) => (
            basic.remove("content").unwrap_or(Value::Null),
            basic.remove("excerpt").unwrap_or(Value::Null),
        ),
        Some(Value::Null) | None => return Err(TransformError::missing("content.basic")),
        Some(_) => return Err(TransformError::shape("content.basic", "object")),
    };

    content.insert("basic".to_string(), body);
    if is_falsy(&excerpt) {
        content.remove("excerpt");
    } else {
        content.insert("excerpt".to_string(), excerpt);
    }
    Ok(())
}

fn fold_advanced(entry: &mut Map<String, Value>, depth: usize) -> Result<(), TransformError> {
    // Older CMS responses nest the collection under `content`.
    let groups = match entry.remove("advanced") {
        Some(groups) if !is_falsy(&groups) => groups,
        _ => match entry
            .get_mut("content")
            .and_then(Value::as_object_mut)
            .and_then(|content| content.remove("advanced"))
        {
            Some(groups) if !is_falsy(&groups) => groups,
            _ => return Ok(()),
        },
    };
    let Value::Array(groups) = groups else {
        return Err(TransformError::shape("advanced", "array of field groups"));
    };

    let content = entry
        .entry("content")
        .or_insert_with(|| Value::Object(Map::new()));
    let content = content
        .as_object_mut()
        .ok_or_else(|| TransformError::shape("content", "object"))?;

    for group in groups {
        let fields = match group {
            Value::Object(mut group) => group.remove("fields"),
            _ => return Err(TransformError::shape("advanced[]", "object")),
        };
        let Some(Value::Array(fields)) = fields else {
            return Err(TransformError::shape("advanced[].fields", "array"));
        };
        for field in fields {
            fold_field(content, field, depth)?;
        }
    }
    Ok(())
}

fn fold_field(
    content: &mut Map<String, Value>,
    field: Value,
    depth: usize,
) -> Result<(), TransformError> {
    let Value::Object(mut field) = field else {
        return Err(TransformError::shape("advanced[].fields[]", "object"));
    };
    let name = match field.remove("name") {
        Some(Value::String(name)) => name,
        _ => return Err(TransformError::missing("advanced[].fields[].name")),
    };
    let class = FieldClass::parse(field.get("class").and_then(Value::as_str));
    let value = field.remove("value").unwrap_or(Value::Null);

    let folded = match class {
        FieldClass::Repeater => collapse_rows(&name, field.remove("fields"))?,
        FieldClass::Relationship if !is_falsy(&value) => {
            let Value::Array(mut related) = value else {
                return Err(TransformError::shape(
                    format!("{name}.value"),
                    "array of entries",
                ));
            };
            rooftop_trace!(
                "normalizing {} related entries in `{}` at depth {}",
                related.len(),
                name,
                depth + 1
            );
            for entry in related.iter_mut() {
                normalize_at_depth(entry, depth + 1)?;
            }
            Value::Array(related)
        }
        _ => value,
    };

    content.insert(name, folded);
    Ok(())
}

/// Repeater rows arrive as a list of lists; only the first cell of each row
/// carries the value.
fn collapse_rows(name: &str, rows: Option<Value>) -> Result<Value, TransformError> {
    let rows = match rows {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(TransformError::shape(format!("{name}.fields"), "array of rows")),
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) if cells.is_empty() => Ok(Value::Null),
            Value::Array(mut cells) => Ok(cells.swap_remove(0)),
            _ => Err(TransformError::shape(format!("{name}.fields[]"), "array")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
