use toml::{
    Value,
    map::Map,
};

use crate::{
    ops::Ops,
    result::DataResult,
};

/// An implementation of [`Ops`] over [`toml::Value`].
///
/// TOML has no null: the canonical empty value is the empty table, so an
/// actual empty table is indistinguishable from "nothing" and conversions
/// through this format are lossy. Datetimes read as neither string nor
/// number and convert away as empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomlOps;

impl Ops for TomlOps {
    type Value = Value;

    fn empty(&self) -> Value {
        Value::Table(Map::new())
    }

    fn empty_map(&self) -> Value {
        Value::Table(Map::new())
    }

    fn is_map(&self, value: &Value) -> bool {
        value.is_table()
    }

    fn is_list(&self, value: &Value) -> bool {
        value.is_array()
    }

    fn is_string(&self, value: &Value) -> bool {
        value.is_str()
    }

    fn is_number(&self, value: &Value) -> bool {
        value.is_integer() || value.is_float()
    }

    fn is_bool(&self, value: &Value) -> bool {
        value.is_bool()
    }

    fn create_string(&self, value: &str) -> Value {
        Value::String(value.to_owned())
    }

    fn create_bool(&self, value: bool) -> Value {
        Value::Boolean(value)
    }

    fn create_int(&self, value: i32) -> Value {
        Value::Integer(i64::from(value))
    }

    fn create_long(&self, value: i64) -> Value {
        Value::Integer(value)
    }

    fn create_float(&self, value: f32) -> Value {
        Value::Float(f64::from(value))
    }

    fn create_double(&self, value: f64) -> Value {
        Value::Float(value)
    }

    fn get_string_value(&self, value: &Value) -> DataResult<String> {
        match value.as_str() {
            Some(s) => DataResult::Ok(s.to_owned()),
            None => DataResult::error(format!("not a string: {value}")),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn get_number_value(&self, value: &Value) -> DataResult<f64> {
        match value {
            Value::Integer(n) => DataResult::Ok(*n as f64),
            Value::Float(n) => DataResult::Ok(*n),
            other => DataResult::error(format!("not a number: {other}")),
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
                        Value::Table(map),
                    );
                }
            }
        }

        DataResult::Ok(Value::Table(map))
    }

    fn get_list(&self, value: &Value) -> DataResult<Vec<Value>> {
        match value.as_array() {
            Some(items) => DataResult::Ok(items.clone()),
            None => DataResult::error(format!("not a list: {value}")),
        }
    }

    fn get_map_entries(&self, value: &Value) -> DataResult<Vec<(Value, Value)>> {
        match value.as_table() {
            Some(map) => DataResult::Ok(
                map.iter()
                    .map(|(key, value)| (Value::String(key.clone()), value.clone()))
                    .collect(),
            ),
            None => DataResult::error(format!("not a map: {value}")),
        }
    }

    fn merge_to_list(&self, list: &Value, element: Value) -> DataResult<Value> {
        if self.is_empty(list) {
            return DataResult::Ok(Value::Array(vec![element]));
        }

        match list {
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
            Value::Table(entries) => {
                let mut out = entries.clone();
                out.insert(key, value);
                DataResult::Ok(Value::Table(out))
            }
            other => DataResult::error(format!("cannot merge into non-map: {other}")),
        }
    }

    fn merge_maps(&self, map: &Value, other: &Value) -> DataResult<Value> {
        match (map, other) {
            (Value::Table(left), Value::Table(right)) => {
                let mut out = left.clone();
                for (key, value) in right {
                    out.insert(key.clone(), value.clone());
                }
                DataResult::Ok(Value::Table(out))
            }
            (Value::Table(_), other) | (other, _) => {
                DataResult::error(format!("cannot merge non-map: {other}"))
            }
        }
    }

    fn get(&self, value: &Value, key: &str) -> Option<Value> {
        value.as_table().and_then(|map| map.get(key)).cloned()
    }

    fn set(&self, value: &Value, key: &str, entry: Value) -> Value {
        let mut map = value.as_table().cloned().unwrap_or_default();
        map.insert(key.to_owned(), entry);
        Value::Table(map)
    }

    fn remove(&self, value: &Value, key: &str) -> Value {
        match value.as_table() {
            Some(map) => Value::Table(
                map.iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            None => value.clone(),
        }
    }
}
