use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that carries a persisted record's identifier.
pub const ID_FIELD: &str = "_id";

/// A generated or persisted record: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Structural description of a fixture's shape.
///
/// The schema is kept as raw JSON so that generator extensions such as the
/// `faker` keyword survive loading untouched. It is never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureSchema(Value);

impl FixtureSchema {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The name other schemas use to point at this one (`$id`, then `id`).
    pub fn id(&self) -> Option<&str> {
        let object = self.0.as_object()?;
        object
            .get("$id")
            .and_then(Value::as_str)
            .or_else(|| object.get("id").and_then(Value::as_str))
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }
}

impl From<Value> for FixtureSchema {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn id_prefers_dollar_id() {
        let schema = FixtureSchema::new(json!({"$id": "tag", "id": "legacy"}));
        assert_eq!(schema.id(), Some("tag"));
    }

    #[test]
    fn id_ignores_non_string_values() {
        let schema = FixtureSchema::new(json!({"id": {"type": "integer"}}));
        assert_eq!(schema.id(), None);
        assert_eq!(FixtureSchema::new(Value::Null).id(), None);
    }
}
