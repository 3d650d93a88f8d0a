//! Cache key definitions
//!
//! A key is an ordered tuple: resource name first, then the variable filter
//! values of the query. The same logical query always derives the same key,
//! which is what lets the cache de-duplicate concurrent requests.

use std::fmt;

/// One element of a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Text(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Text(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Null => f.write_str("null"),
        }
    }
}

/// Cache key for a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    parts: Vec<KeyPart>,
}

impl CacheKey {
    /// Key for a whole resource, e.g. `["patients"]`
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            parts: vec![KeyPart::Text(resource.into())],
        }
    }

    /// Append a variable part
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.parts.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// Resource name (first part)
    pub fn resource(&self) -> Option<&str> {
        match self.parts.first() {
            Some(KeyPart::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether `prefix` is a leading sub-tuple of this key
    ///
    /// `["wards"]` matches `["wards"]` and `["wards", 3]` but not `["ward"]`.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.parts.starts_with(&prefix.parts)
    }
}

/// Build a key from a resource name and its filter values
pub fn cache_key<I, P>(resource: &str, params: I) -> CacheKey
where
    I: IntoIterator<Item = P>,
    P: Into<KeyPart>,
{
    params
        .into_iter()
        .fold(CacheKey::new(resource), |key, part| key.with(part))
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", part)?;
        }
        f.write_str("]")
    }
}
