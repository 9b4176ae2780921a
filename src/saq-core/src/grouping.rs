//! Object groupings produced by the grouping operators.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::object::SaObject;
use crate::object_list::ObjectList;
use crate::value::Value;

/// A grouping key: a tuple of primitive values.
///
/// Keys hash numerically so that `Int(1)` and `Float(1.0)` land in the same
/// group, matching `Value` equality.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey(pub Vec<Value>);

impl GroupKey {
    /// Build a key from a key-expression result: lists become compound
    /// keys, any other value a single-element key.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::List(items) => Self(items),
            other => Self(vec![other]),
        }
    }

    /// Human-readable form for grouping headers.
    pub fn display_string(&self) -> String {
        self.0
            .iter()
            .map(Value::display_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            hash_value(value, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(b) => {
            state.write_u8(1);
            b.hash(state);
        }
        // Numbers hash as f64 bits so Int/Float agree with equality.
        Value::Int(i) => {
            state.write_u8(2);
            state.write_u64((*i as f64).to_bits());
        }
        Value::Float(f) => {
            state.write_u8(2);
            state.write_u64(f.to_bits());
        }
        Value::Str(s) => {
            state.write_u8(3);
            s.hash(state);
        }
        Value::List(items) => {
            state.write_u8(4);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Map(map) => {
            state.write_u8(5);
            for (k, v) in map {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

/// Insertion-ordered mapping from group key to member objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGrouping {
    groups: IndexMap<GroupKey, ObjectList>,
}

impl ObjectGrouping {
    /// Create an empty grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `object` to the group for `key`, creating it if needed.
    pub fn insert(&mut self, key: GroupKey, object: Arc<SaObject>) {
        self.groups.entry(key).or_default().push(object);
    }

    /// Replace the member list for `key`.
    pub fn set(&mut self, key: GroupKey, members: ObjectList) {
        self.groups.insert(key, members);
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &ObjectList)> {
        self.groups.iter()
    }

    /// Flatten back to a single list, preserving group then member order.
    pub fn flattened(&self) -> ObjectList {
        self.groups
            .values()
            .flat_map(|list| list.iter().cloned())
            .collect()
    }
}

impl IntoIterator for ObjectGrouping {
    type Item = (GroupKey, ObjectList);
    type IntoIter = indexmap::map::IntoIter<GroupKey, ObjectList>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::SaObject;
    use serde_json::json;
    use std::sync::Arc;

    fn obj(id: &str) -> Arc<SaObject> {
        Arc::new(
            SaObject::from_json(json!({
                "__id__": id,
                "__source__": "hr",
                "__types__": ["person"],
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_int_and_float_keys_agree() {
        let mut grouping = ObjectGrouping::new();
        grouping.insert(GroupKey::from_value(Value::Int(1)), obj("a"));
        grouping.insert(GroupKey::from_value(Value::Float(1.0)), obj("b"));
        assert_eq!(grouping.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut grouping = ObjectGrouping::new();
        grouping.insert(GroupKey::from_value(Value::from("z")), obj("a"));
        grouping.insert(GroupKey::from_value(Value::from("a")), obj("b"));
        grouping.insert(GroupKey::from_value(Value::from("z")), obj("c"));

        let keys: Vec<String> = grouping.iter().map(|(k, _)| k.display_string()).collect();
        assert_eq!(keys, ["z", "a"]);

        let flat = grouping.flattened();
        let ids: Vec<&str> = flat.iter().map(|o| o.id()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn test_compound_keys() {
        let key = GroupKey::from_value(Value::List(vec![Value::from("x"), Value::Int(2)]));
        assert_eq!(key.0.len(), 2);
        assert_eq!(key.display_string(), "x, 2");
    }
}
