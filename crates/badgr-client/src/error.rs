//! Error types for Badgr client operations

use serde_json::Value;
use thiserror::Error;

/// Result type alias for Badgr client operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Classification name given to transport failures without a more specific label
pub const HTTP_ERROR: &str = "HttpError";

/// Coarse grouping of [`RemoteError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid constructor arguments
    Construction,
    /// Token response was malformed or carried no token
    Authentication,
    /// Network failure or undecodable transport payload
    Transport,
    /// Server answered with status >= 400
    Application,
    /// Local I/O failed: a file referenced by the request body, or a socket
    /// opened by the test server
    Filesystem,
}

/// Errors that can occur during Badgr client operations
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Client was constructed without an endpoint or credentials
    #[error("Client needs an endpoint and auth details to be provided: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Token endpoint answered without a token
    #[error("{message}")]
    Auth { message: String },

    /// HTTP request failed before a response was received
    #[error("{name}: {source}")]
    Transport {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Payload could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Server returned an error response
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local IO error, e.g. reading a file to inline into the request body
    /// or binding the test server's listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(source: reqwest::Error) -> Self {
        let name = if source.is_timeout() {
            "TimeoutError"
        } else if source.is_connect() {
            "ConnectionError"
        } else {
            HTTP_ERROR
        };
        Self::Transport {
            name: name.to_string(),
            source,
        }
    }
}

impl RemoteError {
    /// Which of the error kinds this value belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::InvalidUrl(_) => ErrorKind::Construction,
            Self::Auth { .. } => ErrorKind::Authentication,
            Self::Transport { .. } | Self::Decode(_) => ErrorKind::Transport,
            Self::Api(_) => ErrorKind::Application,
            Self::Io(_) => ErrorKind::Filesystem,
        }
    }

    /// Classification identifier, always ending in `Error`
    pub fn name(&self) -> &str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::InvalidUrl(_) => "InvalidUrlError",
            Self::Auth { .. } => "AuthenticationError",
            Self::Transport { name, .. } => name.as_str(),
            Self::Decode(_) => "DecodeError",
            Self::Api(err) => err.name.as_str(),
            Self::Io(_) => "IoError",
        }
    }

    /// Identifier code, when the error carries one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api(err) => Some(err.code.as_str()),
            _ => None,
        }
    }

    /// The normalized server error, if this is one
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Normalized error built from a response with status >= 400
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{name} ({status}): {message}")]
pub struct ApiError {
    /// HTTP status of the response
    pub status: u16,
    /// Server-supplied error code, or the status code as text
    pub code: String,
    /// Classification label, e.g. `NotFoundError`
    pub name: String,
    /// Server-supplied message, empty when absent
    pub message: String,
    /// Server-supplied `details`, verbatim
    pub details: Option<Value>,
}

impl ApiError {
    /// Build the normalized error from a status code and the (parsed) body.
    ///
    /// `code`/`message` are looked up at the top level first, then under `error`.
    /// Without a usable code the name is derived from the status phrase, falling
    /// back to `Http<status>Error` for statuses without one.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let body_code = lookup(body, "code");
        let message = lookup(body, "message").unwrap_or_default();

        let name = body_code
            .as_deref()
            .map(|code| camel_join(code, false))
            .filter(|name| !name.is_empty())
            .or_else(|| name_from_status(status))
            .unwrap_or_else(|| format!("Http{}", status));

        Self {
            status,
            code: body_code.unwrap_or_else(|| status.to_string()),
            name: with_error_suffix(name),
            message,
            details: body.get("details").cloned(),
        }
    }
}

/// Field lookup at the top level, then under `error`; empty or null values don't count.
fn lookup(body: &Value, field: &str) -> Option<String> {
    let direct = body.get(field).and_then(truthy_text);
    direct.or_else(|| {
        body.get("error")
            .and_then(|err| err.get(field))
            .and_then(truthy_text)
    })
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `NotFound` for 404; `None` for statuses without a canonical phrase.
fn name_from_status(status: u16) -> Option<String> {
    let phrase = reqwest::StatusCode::from_u16(status)
        .ok()?
        .canonical_reason()?;
    Some(camel_join(phrase, true))
}

/// Join the word parts of `input` with each part's first letter upper-cased.
///
/// Status phrases are split on whitespace with the rest of each word lower-cased
/// (`I'm a teapot` -> `ImATeapot`). Server codes are split on any non-alphanumeric
/// run and keep their inner casing (`invalid_request` -> `InvalidRequest`).
fn camel_join(input: &str, lower_rest: bool) -> String {
    let parts: Vec<&str> = if lower_rest {
        input.split_whitespace().collect()
    } else {
        input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect()
    };

    let mut name = String::new();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            let rest: String = chars.collect();
            if lower_rest {
                name.push_str(&rest.to_lowercase());
            } else {
                name.push_str(&rest);
            }
        }
    }
    name.retain(|c| c.is_alphanumeric() || c == '_');
    name
}

fn with_error_suffix(mut name: String) -> String {
    if !name.ends_with("Error") {
        name.push_str("Error");
    }
    name
}
