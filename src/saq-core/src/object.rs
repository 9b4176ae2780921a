//! Semantic objects (SAOs).

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use common_error::{SaqError, SaqResult};

use crate::value::Value;

/// Reserved key holding the object id.
pub const ID_KEY: &str = "__id__";
/// Reserved key holding the publishing source.
pub const SOURCE_KEY: &str = "__source__";
/// Reserved key holding the ordered type list.
pub const TYPES_KEY: &str = "__types__";

/// A semantic object: reserved identity keys plus arbitrary user fields.
///
/// Objects are immutable once constructed; the store only ever replaces
/// whole provider contributions, never mutates an object in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SaObject {
    fields: IndexMap<String, Value>,
}

impl SaObject {
    /// Construct from already-converted fields, validating the reserved keys.
    pub fn new(fields: IndexMap<String, Value>) -> SaqResult<Self> {
        let obj = Self { fields };
        obj.validate()?;
        Ok(obj)
    }

    /// Construct from a provider JSON map.
    pub fn from_json(json: JsonValue) -> SaqResult<Self> {
        match Value::from(json) {
            Value::Map(fields) => Self::new(fields),
            other => Err(SaqError::value(format!(
                "object payload must be a JSON map, got {}",
                other.kind_name()
            ))),
        }
    }

    fn validate(&self) -> SaqResult<()> {
        match self.fields.get(ID_KEY) {
            Some(Value::Str(id)) if !id.is_empty() => {}
            Some(Value::Str(_)) => {
                return Err(SaqError::value("object __id__ must not be empty"));
            }
            _ => return Err(SaqError::value("object must have a string __id__ field")),
        }
        match self.fields.get(SOURCE_KEY) {
            Some(Value::Str(_)) => {}
            _ => {
                return Err(SaqError::value(
                    "object must have a string __source__ field",
                ));
            }
        }
        match self.fields.get(TYPES_KEY) {
            Some(Value::List(types)) if !types.is_empty() => {
                let mut seen = Vec::with_capacity(types.len());
                for t in types {
                    let Value::Str(name) = t else {
                        return Err(SaqError::value("object __types__ must contain strings"));
                    };
                    if seen.contains(&name.as_str()) {
                        return Err(SaqError::value(format!(
                            "object __types__ contains duplicate '{name}'"
                        )));
                    }
                    seen.push(name.as_str());
                }
            }
            _ => {
                return Err(SaqError::value(
                    "object must have a non-empty __types__ list",
                ));
            }
        }
        Ok(())
    }

    /// The object id.
    pub fn id(&self) -> &str {
        match self.fields.get(ID_KEY) {
            Some(Value::Str(id)) => id,
            _ => unreachable!("validated on construction"),
        }
    }

    /// The publishing source.
    pub fn source(&self) -> &str {
        match self.fields.get(SOURCE_KEY) {
            Some(Value::Str(source)) => source,
            _ => unreachable!("validated on construction"),
        }
    }

    /// The ordered type list.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        match self.fields.get(TYPES_KEY) {
            Some(Value::List(types)) => types.iter().filter_map(Value::as_str),
            _ => unreachable!("validated on construction"),
        }
    }

    /// Whether `type_name` is one of this object's types.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types().any(|t| t == type_name)
    }

    /// All fields including the reserved keys, in insertion order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// User fields only, in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the object carries `name` (reserved keys included).
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Look up a field (reserved keys included).
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Fully qualified identity triples: one `(type, id, source)` per type.
    pub fn unique_keys(&self) -> impl Iterator<Item = (String, String, String)> + '_ {
        self.types()
            .map(|t| (t.to_string(), self.id().to_string(), self.source().to_string()))
    }

    /// Logical identity pairs: one `(type, id)` per type.
    pub fn logical_keys(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.types().map(|t| (t.to_string(), self.id().to_string()))
    }

    /// The reserved keys alone, ready to seed a projected copy.
    pub fn reserved_fields(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::with_capacity(3);
        for key in [ID_KEY, SOURCE_KEY, TYPES_KEY] {
            if let Some(v) = self.fields.get(key) {
                out.insert(key.to_string(), v.clone());
            }
        }
        out
    }

    /// A shallow copy retaining the reserved keys plus `names`, in the
    /// order given.
    pub fn projected<'a, I: IntoIterator<Item = &'a str>>(&self, names: I) -> Self {
        let mut fields = self.reserved_fields();
        for name in names {
            if let Some(v) = self.fields.get(name) {
                if !is_reserved(name) {
                    fields.insert(name.to_string(), v.clone());
                }
            }
        }
        Self { fields }
    }

    /// Serialize back to provider-shaped JSON.
    pub fn to_json(&self) -> JsonValue {
        Value::Map(self.fields.clone()).to_json()
    }
}

/// Whether `key` is one of the three reserved attribute names.
pub fn is_reserved(key: &str) -> bool {
    matches!(key, ID_KEY | SOURCE_KEY | TYPES_KEY)
}

impl std::fmt::Display for SaObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self.types().collect();
        write!(f, "{}#{}@{}", types.join("|"), self.id(), self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice() -> SaObject {
        SaObject::from_json(json!({
            "__id__": "a",
            "__source__": "hr",
            "__types__": ["person", "employee"],
            "name": "Alice",
            "salary": 100,
        }))
        .unwrap()
    }

    #[test]
    fn test_reserved_accessors() {
        let obj = alice();
        assert_eq!(obj.id(), "a");
        assert_eq!(obj.source(), "hr");
        assert_eq!(obj.types().collect::<Vec<_>>(), ["person", "employee"]);
        assert!(obj.has_type("employee"));
        assert!(!obj.has_type("robot"));
    }

    #[test]
    fn test_validation_rejects_bad_objects() {
        assert!(SaObject::from_json(json!({"__source__": "s", "__types__": ["t"]})).is_err());
        assert!(SaObject::from_json(json!({"__id__": "", "__source__": "s", "__types__": ["t"]}))
            .is_err());
        assert!(SaObject::from_json(json!({"__id__": "x", "__types__": ["t"]})).is_err());
        assert!(SaObject::from_json(json!({"__id__": "x", "__source__": "s", "__types__": []}))
            .is_err());
        assert!(SaObject::from_json(
            json!({"__id__": "x", "__source__": "s", "__types__": ["t", "t"]})
        )
        .is_err());
        assert!(SaObject::from_json(json!(["not", "a", "map"])).is_err());
    }

    #[test]
    fn test_properties_skip_reserved() {
        let obj = alice();
        let props: Vec<&str> = obj.properties().map(|(k, _)| k).collect();
        assert_eq!(props, ["name", "salary"]);
    }

    #[test]
    fn test_unique_keys() {
        let obj = alice();
        let keys: Vec<_> = obj.unique_keys().collect();
        assert_eq!(
            keys,
            [
                ("person".to_string(), "a".to_string(), "hr".to_string()),
                ("employee".to_string(), "a".to_string(), "hr".to_string()),
            ]
        );
    }

    #[test]
    fn test_projected_keeps_reserved() {
        let obj = alice();
        let projected = obj.projected(["name"]);
        assert_eq!(projected.id(), "a");
        assert!(projected.has_field("name"));
        assert!(!projected.has_field("salary"));
        // Reserved keys cannot be dropped or duplicated by projection
        let projected2 = obj.projected(["__id__", "name"]);
        assert_eq!(projected2.fields().len(), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(alice().to_string(), "person|employee#a@hr");
    }
}
