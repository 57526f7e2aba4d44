//! Request body encoding
//!
//! Request bodies are plain JSON, except that file-like values are inlined as
//! `data:<mime>;base64,<payload>` URIs. A value is file-like when it is an
//! object with a non-empty string `type` and either inline `data` or a `path`
//! on disk. A string under the `image` key that starts with `/` or `.` is read
//! as a path and gets its MIME type from the file extension.
//!
//! String `data` is taken to be base64 already and goes into the URI as is;
//! byte arrays and file contents are encoded.
//!
//! Every node of the body is visited top-down, so file-like values are found at
//! any depth and under any key.
//!
//! Reading from `path` is a blocking `std::fs::read` on the calling task.
//! Expected inputs are small (badge images), so the read is not moved to a
//! blocking pool.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

/// Key whose path-like string values are treated as image files
pub const IMAGE_KEY: &str = "image";

/// Encode a full request body, inlining every file-like value.
pub fn encode_body(data: &Value) -> Result<Value> {
    encode_node("", data.clone())
}

fn encode_node(key: &str, value: Value) -> Result<Value> {
    match encode_item(key, value)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                let v = encode_node(&k, v)?;
                Ok((k, v))
            })
            .collect::<Result<Map<String, Value>>>()
            .map(Value::Object),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| encode_node(&i.to_string(), v))
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Rewrite a single value found under `key`.
///
/// Fails with an IO error when a referenced file can't be read.
pub fn encode_item(key: &str, value: Value) -> Result<Value> {
    let value = match value {
        Value::String(path) if key == IMAGE_KEY && is_path_like(&path) => {
            Attachment::from_path(path).to_value()
        }
        other => other,
    };

    match inline_file(&value)? {
        Some(uri) => Ok(Value::String(uri)),
        None => Ok(value),
    }
}

fn is_path_like(value: &str) -> bool {
    value.starts_with('/') || value.starts_with('.')
}

fn inline_file(value: &Value) -> Result<Option<String>> {
    let Some(obj) = value.as_object() else {
        return Ok(None);
    };
    let Some(mime_type) = obj
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    else {
        return Ok(None);
    };

    let payload = match obj.get("data").and_then(inline_payload) {
        Some(payload) => payload,
        None => match obj
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        {
            Some(path) => {
                debug!(path, mime_type, "Inlining file into request body");
                STANDARD.encode(std::fs::read(path)?)
            }
            None => return Ok(None),
        },
    };

    Ok(Some(uri_with_payload(mime_type, &payload)))
}

/// Base64 payload carried inline: a non-empty string verbatim, or an array of
/// byte values encoded.
fn inline_payload(data: &Value) -> Option<String> {
    match data {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(|bytes| STANDARD.encode(bytes)),
        _ => None,
    }
}

/// Format `bytes` as a base64 data URI.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    uri_with_payload(mime_type, &STANDARD.encode(bytes))
}

fn uri_with_payload(mime_type: &str, payload: &str) -> String {
    format!("data:{};base64,{}", mime_type, payload)
}

/// A file to be inlined into a request body.
///
/// Converts to the `{type, path}` / `{type, data}` shape the encoder picks up,
/// so it can be placed anywhere inside a body built with `serde_json::json!`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: String,
    pub path: Option<PathBuf>,
    pub data: Option<Vec<u8>>,
}

impl Attachment {
    /// Reference a file on disk, guessing its MIME type from the extension
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            mime_type: guess_mime_type(&path),
            path: Some(path),
            data: None,
        }
    }

    /// Carry bytes already in memory
    pub fn from_bytes(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            path: None,
            data: Some(data.into()),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(self.mime_type.clone()));
        if let Some(path) = &self.path {
            map.insert(
                "path".into(),
                Value::String(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(data) = &self.data {
            map.insert(
                "data".into(),
                Value::Array(data.iter().map(|b| Value::from(*b)).collect()),
            );
        }
        Value::Object(map)
    }
}

impl From<Attachment> for Value {
    fn from(attachment: Attachment) -> Self {
        attachment.to_value()
    }
}

fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
