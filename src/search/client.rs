//! In-memory search over an already-fetched collection
//!
//! Items are inspected through their serde representation, so any
//! `Serialize` row type can be searched by field name:
//!
//! - strings match as case-insensitive substrings
//! - numbers match as substrings of their decimal text
//! - nested objects and arrays match as case-insensitive substrings of
//!   their JSON text
//!
//! Output keeps the input order.

use crate::debounce::Debounced;
use serde::Serialize;
use serde_json::{Number, Value};
use std::time::Duration;
use tracing::debug;

/// Quiet period for local filtering; no network cost, so shorter than remote
pub const CLIENT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

/// Extra condition every returned item must satisfy
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Filter `data` by `term` over `fields`, then by every predicate
///
/// An absent collection yields an empty result. An empty term matches every
/// item, so with no predicates the result equals the input.
pub fn filter_items<T>(
    data: Option<&[T]>,
    term: &str,
    fields: &[&str],
    predicates: &[Predicate<T>],
) -> Vec<T>
where
    T: Serialize + Clone,
{
    let Some(data) = data else {
        return Vec::new();
    };
    let term_lower = term.to_lowercase();

    data.iter()
        .filter(|item| term.is_empty() || item_matches(*item, term, &term_lower, fields))
        .filter(|item| predicates.iter().all(|p| p(*item)))
        .cloned()
        .collect()
}

fn item_matches<T: Serialize>(item: &T, term: &str, term_lower: &str, fields: &[&str]) -> bool {
    let value = match serde_json::to_value(item) {
        Ok(value) => value,
        Err(e) => {
            debug!("Row not searchable: {}", e);
            return false;
        }
    };
    let Value::Object(map) = value else {
        return false;
    };

    fields
        .iter()
        .filter_map(|field| map.get(*field))
        .any(|value| field_matches(value, term, term_lower))
}

fn field_matches(value: &Value, term: &str, term_lower: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(term_lower),
        Value::Number(n) => number_text(n).contains(term),
        Value::Object(_) | Value::Array(_) => value.to_string().to_lowercase().contains(term_lower),
        Value::Bool(_) | Value::Null => false,
    }
}

/// Decimal text without a trailing `.0` on integral floats (`1500.0` -> `1500`)
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Debounced local search term
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct ClientSearch {
    term: Debounced<String>,
}

impl Default for ClientSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSearch {
    pub fn new() -> Self {
        Self::with_delay(CLIENT_SEARCH_DEBOUNCE)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            term: Debounced::new(String::new(), delay),
        }
    }

    /// Feed the raw, per-keystroke term
    pub fn set_term(&self, term: impl Into<String>) {
        self.term.set(term.into());
    }

    /// Term currently applied
    pub fn term(&self) -> String {
        self.term.get()
    }

    /// Receiver notified whenever the applied term changes
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<String> {
        self.term.subscribe()
    }

    /// Filter with the current settled term
    pub fn apply<T>(&self, data: Option<&[T]>, fields: &[&str], predicates: &[Predicate<T>]) -> Vec<T>
    where
        T: Serialize + Clone,
    {
        filter_items(data, &self.term(), fields, predicates)
    }
}
