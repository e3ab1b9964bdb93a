use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field that carries a record's collection key inside a backup artifact.
pub const ID_FIELD: &str = "id";

/// A schemaless, field-ordered record.
///
/// Stored bodies never contain the `id` field; the key lives beside the
/// record (see [`KeyedRecord`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parses a JSON object. Anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(RecordError::NotAnObject(json_type_name(&other))),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Applies a merge write: every incoming field overwrites the matching
    /// destination field, nested objects merge recursively, and fields the
    /// incoming record does not mention are left untouched.
    pub fn merge_from(&mut self, incoming: Record) {
        merge_maps(&mut self.0, incoming.0);
    }

    /// Drops an inlined `id` field, if any.
    pub fn without_id(self) -> Record {
        self.split_id().1
    }

    /// Removes the `id` field, preserving the order of the remaining fields.
    fn split_id(self) -> (Option<Value>, Record) {
        let mut id = None;
        let mut fields = Map::with_capacity(self.0.len());
        for (name, value) in self.0 {
            if name == ID_FIELD {
                id = Some(value);
            } else {
                fields.insert(name, value);
            }
        }
        (id, Record(fields))
    }
}

fn merge_maps(dest: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (name, value) in incoming {
        if let Value::Object(nested) = value {
            if let Some(Value::Object(existing)) = dest.get_mut(&name) {
                merge_maps(existing, nested);
                continue;
            }
            dest.insert(name, Value::Object(nested));
        } else {
            dest.insert(name, value);
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised while converting between snapshot and stored records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record is missing the `id` field")]
    MissingId,

    #[error("record has an empty `id`")]
    EmptyId,

    #[error("record `id` must be a string, got {0}")]
    InvalidId(&'static str),

    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecord {
    pub id: String,
    pub record: Record,
}

impl KeyedRecord {
    pub fn new(id: impl Into<String>, record: Record) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }

    /// Detaches the inlined `id` from a snapshot record.
    pub fn from_snapshot(record: Record) -> Result<Self, RecordError> {
        let (id, record) = record.split_id();
        match id {
            None => Err(RecordError::MissingId),
            Some(Value::String(id)) if id.is_empty() => Err(RecordError::EmptyId),
            Some(Value::String(id)) => Ok(Self { id, record }),
            Some(other) => Err(RecordError::InvalidId(json_type_name(&other))),
        }
    }

    /// Attaches the key as the leading `id` field, ready for a snapshot.
    ///
    /// A stray `id` inside the body is dropped in favor of the real key.
    pub fn into_snapshot(self) -> Record {
        let mut fields = Map::with_capacity(self.record.len() + 1);
        fields.insert(ID_FIELD.to_string(), Value::String(self.id));
        for (name, value) in self.record.0 {
            if name != ID_FIELD {
                fields.insert(name, value);
            }
        }
        Record(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert_eq!(
            Record::from_value(json!([1, 2])).unwrap_err(),
            RecordError::NotAnObject("array")
        );
        assert_eq!(
            Record::from_value(json!("x")).unwrap_err(),
            RecordError::NotAnObject("string")
        );
    }

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut dest = record(json!({"name": "Ann", "phone": "555"}));
        dest.merge_from(record(json!({"name": "Anne"})));

        assert_eq!(dest.get("name"), Some(&json!("Anne")));
        assert_eq!(dest.get("phone"), Some(&json!("555")));
    }

    #[test]
    fn test_merge_nested_objects() {
        let mut dest = record(json!({"address": {"city": "Oslo", "zip": "0150"}}));
        dest.merge_from(record(json!({"address": {"city": "Bergen"}})));

        assert_eq!(
            dest.get("address"),
            Some(&json!({"city": "Bergen", "zip": "0150"}))
        );
    }

    #[test]
    fn test_merge_replaces_arrays_and_scalars_with_objects() {
        let mut dest = record(json!({"tags": ["a", "b"], "rate": 10}));
        dest.merge_from(record(json!({"tags": ["c"], "rate": {"hourly": 12}})));

        assert_eq!(dest.get("tags"), Some(&json!(["c"])));
        assert_eq!(dest.get("rate"), Some(&json!({"hourly": 12})));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let incoming = record(json!({"total": 120, "lines": {"a": 1}}));
        let mut once = record(json!({"total": 100, "paid": false}));
        once.merge_from(incoming.clone());
        let mut twice = once.clone();
        twice.merge_from(incoming);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_snapshot_strips_id() {
        let keyed = KeyedRecord::from_snapshot(record(json!({
            "name": "Ann",
            "id": "s1",
            "email": "ann@example.com"
        })))
        .unwrap();

        assert_eq!(keyed.id, "s1");
        assert!(!keyed.record.contains("id"));
        let names: Vec<&String> = keyed.record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["name", "email"]);
    }

    #[test]
    fn test_from_snapshot_requires_string_id() {
        assert_eq!(
            KeyedRecord::from_snapshot(record(json!({"name": "x"}))).unwrap_err(),
            RecordError::MissingId
        );
        assert_eq!(
            KeyedRecord::from_snapshot(record(json!({"id": ""}))).unwrap_err(),
            RecordError::EmptyId
        );
        assert_eq!(
            KeyedRecord::from_snapshot(record(json!({"id": 7}))).unwrap_err(),
            RecordError::InvalidId("number")
        );
    }

    #[test]
    fn test_into_snapshot_puts_id_first() {
        let keyed = KeyedRecord::new("inv-1", record(json!({"amount": 40, "id": "stale"})));
        let snapshot = keyed.into_snapshot();

        let names: Vec<&String> = snapshot.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "amount"]);
        assert_eq!(snapshot.get("id"), Some(&json!("inv-1")));
    }
}
