//! Request types for the Badgr client

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Credentials
// =============================================================================

/// Form fields posted to the token endpoint
///
/// Field order is preserved; setting an existing field overwrites it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "std::collections::BTreeMap<String, String>")]
#[serde(into = "std::collections::BTreeMap<String, String>")]
pub struct Credentials {
    fields: Vec<(String, String)>,
}

impl Credentials {
    /// The usual `username`/`password` pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut credentials = Self::default();
        credentials.insert("username", username);
        credentials.insert("password", password);
        credentials
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(field) => field.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields as form pairs
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl From<std::collections::BTreeMap<String, String>> for Credentials {
    fn from(map: std::collections::BTreeMap<String, String>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}

impl From<Credentials> for std::collections::BTreeMap<String, String> {
    fn from(credentials: Credentials) -> Self {
        credentials.fields.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut credentials = Self::default();
        for (k, v) in iter {
            credentials.insert(k, v);
        }
        credentials
    }
}

// =============================================================================
// Call Descriptor
// =============================================================================

/// Description of a single resource call
///
/// A bare path converts into a descriptor with only `path` set:
///
/// ```
/// use badgr_client::Call;
///
/// let call: Call = "v2/issuers".into();
/// assert_eq!(call.path, "v2/issuers");
///
/// let call = Call::new("v2/badgeclasses")
///     .query("num", "10")
///     .filter("result")
///     .default_value(serde_json::json!([]));
/// assert_eq!(call.filter.as_deref(), Some("result"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    /// Path relative to the client endpoint
    pub path: String,
    /// Pairs merged into the URL's query string
    pub query: Vec<(String, String)>,
    /// Pairs appended by the HTTP layer as-is
    pub qs: Vec<(String, String)>,
    /// JSON request body
    pub data: Option<Value>,
    /// Field of the response body to return instead of the whole body
    pub filter: Option<String>,
    /// Returned when the (filtered) body is absent
    pub default: Option<Value>,
}

impl Call {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn qs(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qs.push((key.into(), value.into()));
        self
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>) -> Self {
        self.filter = Some(field.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Reduce a successful response body according to `filter` and `default`.
    ///
    /// Objects are filtered by key and arrays by index; any other body has no
    /// fields. A missing result falls back to `default`, then to `null`.
    pub fn select(&self, body: Value) -> Value {
        let selected = match self.filter.as_deref().filter(|f| !f.is_empty()) {
            Some(field) => match body {
                Value::Object(mut map) => map.remove(field),
                Value::Array(mut items) => field
                    .parse::<usize>()
                    .ok()
                    .filter(|i| *i < items.len())
                    .map(|i| items.swap_remove(i)),
                _ => None,
            },
            None => Some(body),
        };

        selected
            .or_else(|| self.default.clone())
            .unwrap_or(Value::Null)
    }
}

impl From<&str> for Call {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Call {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&String> for Call {
    fn from(path: &String) -> Self {
        Self::new(path.as_str())
    }
}
