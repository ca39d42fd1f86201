//! Item and cursor extractors over decoded JSON responses.
//!
//! Paths are JSON pointers (`/data/fields`, `/results`).

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::pager::Cursor;

fn array_at<'v>(value: &'v Value, pointer: &str) -> Result<&'v Vec<Value>> {
    match value.pointer(pointer) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::UnexpectedResponse(format!(
            "expected an array at {}, found {}",
            pointer,
            kind(other)
        ))),
        None => Err(Error::UnexpectedResponse(missing(value, pointer))),
    }
}

fn missing(value: &Value, pointer: &str) -> String {
    // GraphQL reports failures in-band next to (or instead of) `data`.
    let errors: Vec<&str> = value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if errors.is_empty() {
        format!("missing {}", pointer)
    } else {
        format!("missing {} ({})", pointer, errors.join("; "))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_cursor(value: &Value) -> Option<Cursor> {
    match value {
        Value::String(s) if !s.is_empty() => Some(Cursor::Token(s.clone())),
        Value::Number(n) => n.as_u64().map(Cursor::Number),
        _ => None,
    }
}

/// Items of the array at `pointer`, as raw JSON.
pub fn items_at(pointer: &str) -> impl FnMut(&Value) -> Result<Vec<Value>> + '_ {
    move |value| array_at(value, pointer).cloned()
}

/// Items of the array at `pointer`, deserialized into `T`.
pub fn items_as<T: DeserializeOwned>(pointer: &str) -> impl FnMut(&Value) -> Result<Vec<T>> + '_ {
    move |value| {
        array_at(value, pointer)?
            .iter()
            .map(|item| {
                T::deserialize(item).map_err(|e| {
                    Error::UnexpectedResponse(format!("invalid item at {}: {}", pointer, e))
                })
            })
            .collect()
    }
}

/// Cursor stored at `pointer`. Null, missing or empty values end the sequence.
pub fn cursor_at(pointer: &str) -> impl FnMut(&Value) -> Result<Option<Cursor>> + '_ {
    move |value| Ok(value.pointer(pointer).and_then(as_cursor))
}

/// Cursor carried by the last item of the array at `array_pointer`.
pub fn last_item_cursor<'p>(
    array_pointer: &'p str,
    field: &'p str,
) -> impl FnMut(&Value) -> Result<Option<Cursor>> + 'p {
    move |value| {
        Ok(array_at(value, array_pointer)?
            .last()
            .and_then(|item| item.get(field))
            .and_then(as_cursor))
    }
}

/// For endpoints paged by number alone.
pub fn no_cursor(_: &Value) -> Result<Option<Cursor>> {
    Ok(None)
}
