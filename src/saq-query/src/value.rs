//! The full value taxonomy seen by the operator runtime.

use std::sync::Arc;

use saq_core::{ObjectGrouping, ObjectList, SaObject, Value};

use crate::chain::Chain;

/// Anything a chain step can receive as context or produce as output.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// A plain value (primitive, list, or map).
    Value(Value),
    /// A single semantic object.
    Object(Arc<SaObject>),
    /// An ordered list of semantic objects.
    Objects(ObjectList),
    /// A keyed grouping of object lists.
    Grouping(ObjectGrouping),
    /// An unevaluated chain (`show_plan` output, predicate arguments).
    Chain(Chain),
    /// The absorbing "missing" sentinel.
    Absent,
}

impl QueryValue {
    /// Kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.kind_name(),
            Self::Object(_) => "Object",
            Self::Objects(_) => "ObjectList",
            Self::Grouping(_) => "ObjectGrouping",
            Self::Chain(_) => "Chain",
            Self::Absent => "Absent",
        }
    }

    /// Whether this is the absorbing sentinel.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrow the plain value, if that is what this is.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the object list, if that is what this is.
    pub fn as_objects(&self) -> Option<&ObjectList> {
        match self {
            Self::Objects(list) => Some(list),
            _ => None,
        }
    }
}

impl From<Value> for QueryValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

impl From<i64> for QueryValue {
    fn from(i: i64) -> Self {
        Self::Value(Value::Int(i))
    }
}

impl From<ObjectList> for QueryValue {
    fn from(list: ObjectList) -> Self {
        Self::Objects(list)
    }
}

impl From<ObjectGrouping> for QueryValue {
    fn from(grouping: ObjectGrouping) -> Self {
        Self::Grouping(grouping)
    }
}
