//! Link values.
//!
//! A link is a user field whose value is a map tagged with
//! `__sa_type__: "link"`. It carries a query string naming its targets and
//! is resolved lazily, only when an operator traverses it.

use common_error::{SaqError, SaqResult};

use crate::value::Value;

/// Reserved key tagging custom value kinds.
pub const SA_TYPE_KEY: &str = "__sa_type__";
/// Tag naming the link kind.
pub const LINK_TAG: &str = "link";

/// An unresolved link to other objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Query evaluated against the global store to resolve the link.
    pub query: String,
    /// Optional display label.
    pub label: Option<String>,
}

impl Link {
    /// Detect a link in `value`.
    ///
    /// Returns `None` when the value is not link-shaped at all, and an error
    /// when it is tagged as a link but malformed.
    pub fn detect(value: &Value) -> Option<SaqResult<Self>> {
        let map = value.as_map()?;
        let tag = map.get(SA_TYPE_KEY)?.as_str()?;
        if tag != LINK_TAG {
            // Other tagged kinds pass through as plain maps.
            return None;
        }

        let query = match map.get("query").and_then(Value::as_str) {
            Some(q) => q.to_string(),
            None => {
                return Some(Err(SaqError::value("link value must have a query string")));
            }
        };
        let label = map
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Ok(Self { query, label }))
    }

    /// Rendering placeholder used before resolution.
    pub fn display_string(&self) -> String {
        match &self.label {
            Some(label) => format!("<{label}>"),
            None => format!("<link: {}>", self.query),
        }
    }
}
