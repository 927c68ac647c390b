use serde_json::{
    Map,
    Value,
};

use crate::{
    ops::Ops,
    result::DataResult,
};

/// An implementation of [`Ops`] over [`serde_json::Value`].
///
/// Maps preserve insertion order. Non-finite floats cannot be represented
/// in JSON and collapse to null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOps;

impl JsonOps {
    fn float(value: f64) -> Value {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl Ops for JsonOps {
    type Value = Value;

    fn empty(&self) -> Value {
        Value::Null
    }

    fn empty_map(&self) -> Value {
        Value::Object(Map::new())
    }

    fn is_map(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn is_list(&self, value: &Value) -> bool {
        value.is_array()
    }

    fn is_string(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn is_number(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn is_bool(&self, value: &Value) -> bool {
        value.is_boolean()
    }

    fn create_string(&self, value: &str) -> Value {
        Value::String(value.to_owned())
    }

    fn create_bool(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn create_int(&self, value: i32) -> Value {
        Value::from(value)
    }

    fn create_long(&self, value: i64) -> Value {
        Value::from(value)
    }

    fn create_float(&self, value: f32) -> Value {
        Self::float(f64::from(value))
    }

    fn create_double(&self, value: f64) -> Value {
        Self::float(value)
    }

    fn get_string_value(&self, value: &Value) -> DataResult<String> {
        match value.as_str() {
            Some(s) => DataResult::Ok(s.to_owned()),
            None => DataResult::error(format!("not a string: {value}")),
        }
    }

    fn get_number_value(&self, value: &Value) -> DataResult<f64> {
        match value.as_f64() {
            Some(n) => DataResult::Ok(n),
            None => DataResult::error(format!("not a number: {value}")),
        }
    }

    fn get_bool_value(&self, value: &Value) -> DataResult<bool> {
        match value.as_bool() {
            Some(b) => DataResult::Ok(b),
            None => DataResult::error(format!("not a boolean: {value}")),
        }
    }

    fn create_list(&self, items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(items.into_iter().collect())
    }

    fn create_map(&self, entries: impl IntoIterator<Item = (Value, Value)>) -> DataResult<Value> {
        let mut map = Map::new();

        for (key, value) in entries {
            match key {
                Value::String(key) => {
                    map.insert(key, value);
                }
                other => {
                    return DataResult::error_with_partial(
                        format!("map key is not a string: {other}"),
                        Value::Object(map),
                    );
                }
            }
        }

        DataResult::Ok(Value::Object(map))
    }

    fn get_list(&self, value: &Value) -> DataResult<Vec<Value>> {
        match value.as_array() {
            Some(items) => DataResult::Ok(items.clone()),
            None => DataResult::error(format!("not a list: {value}")),
        }
    }

    fn get_map_entries(&self, value: &Value) -> DataResult<Vec<(Value, Value)>> {
        match value.as_object() {
            Some(map) => DataResult::Ok(
                map.iter()
                    .map(|(key, value)| (Value::String(key.clone()), value.clone()))
                    .collect(),
            ),
            None => DataResult::error(format!("not a map: {value}")),
        }
    }

    fn merge_to_list(&self, list: &Value, element: Value) -> DataResult<Value> {
        match list {
            Value::Null => DataResult::Ok(Value::Array(vec![element])),
            Value::Array(items) => {
                let mut items = items.clone();
                items.push(element);
                DataResult::Ok(Value::Array(items))
            }
            other => DataResult::error(format!("cannot append to non-list: {other}")),
        }
    }

    fn merge_to_map(&self, map: &Value, key: Value, value: Value) -> DataResult<Value> {
        let Value::String(key) = key else {
            return DataResult::error(format!("map key is not a string: {key}"));
        };

        match map {
            Value::Null => {
                let mut out = Map::new();
                out.insert(key, value);
                DataResult::Ok(Value::Object(out))
            }
            Value::Object(entries) => {
                let mut out = entries.clone();
                out.insert(key, value);
                DataResult::Ok(Value::Object(out))
            }
            other => DataResult::error(format!("cannot merge into non-map: {other}")),
        }
    }

    fn merge_maps(&self, map: &Value, other: &Value) -> DataResult<Value> {
        match (map, other) {
            (Value::Null, Value::Null) => DataResult::Ok(self.empty_map()),
            (Value::Null, Value::Object(_)) => DataResult::Ok(other.clone()),
            (Value::Object(_), Value::Null) => DataResult::Ok(map.clone()),
            (Value::Object(left), Value::Object(right)) => {
                let mut out = left.clone();
                for (key, value) in right {
                    out.insert(key.clone(), value.clone());
                }
                DataResult::Ok(Value::Object(out))
            }
            (Value::Object(_) | Value::Null, other) | (other, _) => {
                DataResult::error(format!("cannot merge non-map: {other}"))
            }
        }
    }

    fn get(&self, value: &Value, key: &str) -> Option<Value> {
        value.as_object().and_then(|map| map.get(key)).cloned()
    }

    fn set(&self, value: &Value, key: &str, entry: Value) -> Value {
        let mut map = value.as_object().cloned().unwrap_or_default();
        map.insert(key.to_owned(), entry);
        Value::Object(map)
    }

    fn remove(&self, value: &Value, key: &str) -> Value {
        match value.as_object() {
            Some(map) => Value::Object(
                map.iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            None => value.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_is_pure() {
        let ops = JsonOps;
        let before = json!({"a": 1});
        let after = ops.set(&before, "b", json!(2));

        assert_eq!(before, json!({"a": 1}));
        assert_eq!(after, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_remove_preserves_order() {
        let ops = JsonOps;
        let value = json!({"a": 1, "b": 2, "c": 3});

        let keys: Vec<_> = ops
            .remove(&value, "b")
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn test_merge_to_list_accepts_empty() {
        let ops = JsonOps;
        let list = ops.merge_to_list(&Value::Null, json!(1)).value().unwrap();
        assert_eq!(list, json!([1]));

        assert!(ops.merge_to_list(&json!({}), json!(1)).is_err());
    }

    #[test]
    fn test_kind_mismatch_renders_value() {
        let ops = JsonOps;
        let err = ops.get_string_value(&json!(42)).err().unwrap();
        assert!(err.message().contains("42"));
    }
}
