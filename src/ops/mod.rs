//! [`Ops`] describes how to inspect and construct values of an underlying
//! tree format.
//!
//! Every operation is pure: mutators return a new value and leave their
//! input untouched. Implementations exist for JSON ([`JsonOps`]) and TOML
//! ([`TomlOps`]); implementing the trait for another tree format is the
//! main extension point of the crate.

use std::fmt;

use crate::result::DataResult;

mod json;
#[cfg(feature = "toml")]
mod toml;

pub use json::JsonOps;
#[cfg(feature = "toml")]
pub use toml::TomlOps;

/// A reasonable default [`Ops`], human-readable.
pub type DefaultOps = JsonOps;

/// Capability interface over an opaque tree value format.
///
/// `Value` is the format's value type (e.g. [`serde_json::Value`]). The
/// trait is deliberately not object-safe: codecs and fixers are generic
/// over the implementation, so the compiler monomorphizes each format.
pub trait Ops: Copy + Send + Sync + 'static {
    /// The underlying tree value.
    type Value: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// The canonical "nothing" value.
    fn empty(&self) -> Self::Value;

    /// An empty list value.
    fn empty_list(&self) -> Self::Value {
        self.create_list(std::iter::empty())
    }

    /// An empty map value.
    fn empty_map(&self) -> Self::Value;

    /// Returns `true` if the value is the canonical [`empty`](Ops::empty).
    fn is_empty(&self, value: &Self::Value) -> bool {
        *value == self.empty()
    }

    /// Returns `true` if the value is a map.
    fn is_map(&self, value: &Self::Value) -> bool;

    /// Returns `true` if the value is a list.
    fn is_list(&self, value: &Self::Value) -> bool;

    /// Returns `true` if the value is a string.
    fn is_string(&self, value: &Self::Value) -> bool;

    /// Returns `true` if the value is a number.
    fn is_number(&self, value: &Self::Value) -> bool;

    /// Returns `true` if the value is a boolean.
    fn is_bool(&self, value: &Self::Value) -> bool;

    /// Creates a string value.
    fn create_string(&self, value: &str) -> Self::Value;

    /// Creates a boolean value.
    fn create_bool(&self, value: bool) -> Self::Value;

    /// Creates a 32-bit integer value.
    fn create_int(&self, value: i32) -> Self::Value;

    /// Creates a 64-bit integer value.
    fn create_long(&self, value: i64) -> Self::Value;

    /// Creates a 32-bit float value.
    fn create_float(&self, value: f32) -> Self::Value;

    /// Creates a 64-bit float value.
    fn create_double(&self, value: f64) -> Self::Value;

    /// Creates an 8-bit integer value.
    fn create_byte(&self, value: i8) -> Self::Value {
        self.create_int(i32::from(value))
    }

    /// Creates a 16-bit integer value.
    fn create_short(&self, value: i16) -> Self::Value {
        self.create_int(i32::from(value))
    }

    /// Creates a numeric value of unspecified width.
    fn create_numeric(&self, value: f64) -> Self::Value {
        self.create_double(value)
    }

    /// Reads a string value.
    ///
    /// # Errors
    /// If the value is not a string; the message renders the offending
    /// value.
    fn get_string_value(&self, value: &Self::Value) -> DataResult<String>;

    /// Reads a numeric value as `f64`.
    ///
    /// # Errors
    /// If the value is not a number; the message renders the offending
    /// value.
    fn get_number_value(&self, value: &Self::Value) -> DataResult<f64>;

    /// Reads a boolean value.
    ///
    /// # Errors
    /// If the value is not a boolean; the message renders the offending
    /// value.
    fn get_bool_value(&self, value: &Self::Value) -> DataResult<bool>;

    /// Creates a list from the given elements.
    fn create_list(&self, items: impl IntoIterator<Item = Self::Value>) -> Self::Value;

    /// Creates a map from the given key/value pairs.
    ///
    /// # Errors
    /// If any key is not a string value; the partial result holds the
    /// entries accepted so far.
    fn create_map(
        &self,
        entries: impl IntoIterator<Item = (Self::Value, Self::Value)>,
    ) -> DataResult<Self::Value>;

    /// Reads the elements of a list.
    ///
    /// # Errors
    /// If the value is not a list.
    fn get_list(&self, value: &Self::Value) -> DataResult<Vec<Self::Value>>;

    /// Reads the entries of a map, keys as values.
    ///
    /// # Errors
    /// If the value is not a map.
    fn get_map_entries(&self, value: &Self::Value) -> DataResult<Vec<(Self::Value, Self::Value)>>;

    /// Returns a new list with `element` appended. [`empty`](Ops::empty) is
    /// accepted and treated as the empty list.
    ///
    /// # Errors
    /// If `list` is neither a list nor empty.
    fn merge_to_list(&self, list: &Self::Value, element: Self::Value) -> DataResult<Self::Value>;

    /// Returns a new map with `key` set to `value`. [`empty`](Ops::empty)
    /// is accepted and treated as the empty map.
    ///
    /// # Errors
    /// If `map` is neither a map nor empty, or `key` is not a string value.
    fn merge_to_map(
        &self,
        map: &Self::Value,
        key: Self::Value,
        value: Self::Value,
    ) -> DataResult<Self::Value>;

    /// Shallow right-biased merge of two maps.
    ///
    /// # Errors
    /// If either argument is neither a map nor empty.
    fn merge_maps(&self, map: &Self::Value, other: &Self::Value) -> DataResult<Self::Value>;

    /// Reads a map field by key. Returns `None` if the value is not a map
    /// or the key is absent.
    fn get(&self, value: &Self::Value, key: &str) -> Option<Self::Value>;

    /// Returns `true` if the value is a map containing `key`.
    fn has(&self, value: &Self::Value, key: &str) -> bool {
        self.get(value, key).is_some()
    }

    /// Returns a new map with `key` set to `entry`, creating a fresh map if
    /// the value is not a map.
    fn set(&self, value: &Self::Value, key: &str, entry: Self::Value) -> Self::Value;

    /// Returns a new map without `key`, or the value unchanged if it is not
    /// a map.
    fn remove(&self, value: &Self::Value, key: &str) -> Self::Value;

    /// Recursively converts a value into another format.
    ///
    /// Best-effort: the generic probe order is bool, number, string, list,
    /// map, empty, and anything the target format cannot represent
    /// collapses to the target's [`empty`](Ops::empty). Integral numbers
    /// stay integral.
    fn convert_to<T: Ops>(&self, target: T, value: &Self::Value) -> T::Value {
        if self.is_bool(value) {
            if let DataResult::Ok(b) = self.get_bool_value(value) {
                return target.create_bool(b);
            }
        }
        if self.is_number(value) {
            if let DataResult::Ok(n) = self.get_number_value(value) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
                    return target.create_long(n as i64);
                }
                return target.create_double(n);
            }
        }
        if self.is_string(value) {
            if let DataResult::Ok(s) = self.get_string_value(value) {
                return target.create_string(&s);
            }
        }
        if self.is_list(value) {
            if let DataResult::Ok(items) = self.get_list(value) {
                return target
                    .create_list(items.iter().map(|item| self.convert_to(target, item)));
            }
        }
        if self.is_map(value) {
            if let DataResult::Ok(entries) = self.get_map_entries(value) {
                let converted = entries.iter().filter_map(|(key, entry)| {
                    self.get_string_value(key)
                        .value()
                        .map(|key| (target.create_string(&key), self.convert_to(target, entry)))
                });
                if let DataResult::Ok(map) = target.create_map(converted) {
                    return map;
                }
            }
        }
        target.empty()
    }
}
