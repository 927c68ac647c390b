//! [`Dynamic`] pairs a tree value with the [`Ops`] that can inspect it.

use std::fmt;

use crate::{
    ops::Ops,
    result::DataResult,
    types::TypeId,
};

/// A tree value together with its format capabilities.
///
/// Navigation methods always succeed and return a new `Dynamic`; reading an
/// absent key yields a `Dynamic` over [`Ops::empty`], so chained access
/// never panics and absence only surfaces when converting to a concrete
/// type.
pub struct Dynamic<O: Ops> {
    ops: O,
    value: O::Value,
}

impl<O: Ops> Clone for Dynamic<O> {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops,
            value: self.value.clone(),
        }
    }
}

impl<O: Ops> PartialEq for Dynamic<O> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<O: Ops> fmt::Debug for Dynamic<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dynamic").field(&self.value).finish()
    }
}

impl<O: Ops> Dynamic<O> {
    /// Wraps a value with its ops.
    pub fn new(ops: O, value: O::Value) -> Self {
        Self { ops, value }
    }

    /// The canonical empty value for the format.
    pub fn empty(ops: O) -> Self {
        Self::new(ops, ops.empty())
    }

    /// An empty map for the format.
    pub fn empty_map(ops: O) -> Self {
        Self::new(ops, ops.empty_map())
    }

    /// The ops of this value.
    pub fn ops(&self) -> O {
        self.ops
    }

    /// The underlying tree value.
    pub fn value(&self) -> &O::Value {
        &self.value
    }

    /// Consumes the wrapper, returning the tree value.
    pub fn into_value(self) -> O::Value {
        self.value
    }

    /// Returns `true` if this is the canonical empty value.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty(&self.value)
    }

    /// Returns `true` if this is a map.
    pub fn is_map(&self) -> bool {
        self.ops.is_map(&self.value)
    }

    /// Returns `true` if this is a list.
    pub fn is_list(&self) -> bool {
        self.ops.is_list(&self.value)
    }

    /// Returns `true` if this is a string.
    pub fn is_string(&self) -> bool {
        self.ops.is_string(&self.value)
    }

    /// Returns `true` if this is a number.
    pub fn is_number(&self) -> bool {
        self.ops.is_number(&self.value)
    }

    /// Returns `true` if this is a boolean.
    pub fn is_bool(&self) -> bool {
        self.ops.is_bool(&self.value)
    }

    /// Creates a string in the same format.
    pub fn create_string(&self, value: &str) -> Self {
        Self::new(self.ops, self.ops.create_string(value))
    }

    /// Creates a boolean in the same format.
    pub fn create_bool(&self, value: bool) -> Self {
        Self::new(self.ops, self.ops.create_bool(value))
    }

    /// Creates a 32-bit integer in the same format.
    pub fn create_int(&self, value: i32) -> Self {
        Self::new(self.ops, self.ops.create_int(value))
    }

    /// Creates a 64-bit integer in the same format.
    pub fn create_long(&self, value: i64) -> Self {
        Self::new(self.ops, self.ops.create_long(value))
    }

    /// Creates a 64-bit float in the same format.
    pub fn create_double(&self, value: f64) -> Self {
        Self::new(self.ops, self.ops.create_double(value))
    }

    /// Creates a list in the same format.
    pub fn create_list(&self, items: impl IntoIterator<Item = Self>) -> Self {
        Self::new(
            self.ops,
            self.ops.create_list(items.into_iter().map(|d| d.value)),
        )
    }

    /// Reads a field, yielding the empty value if absent.
    pub fn get(&self, key: &str) -> Self {
        Self::new(
            self.ops,
            self.ops.get(&self.value, key).unwrap_or_else(|| self.ops.empty()),
        )
    }

    /// Reads a field if present.
    pub fn try_get(&self, key: &str) -> Option<Self> {
        self.ops
            .get(&self.value, key)
            .map(|value| Self::new(self.ops, value))
    }

    /// Returns `true` if this is a map containing `key`.
    pub fn has(&self, key: &str) -> bool {
        self.ops.has(&self.value, key)
    }

    /// Returns a new value with the field set.
    pub fn set(&self, key: &str, entry: Self) -> Self {
        Self::new(self.ops, self.ops.set(&self.value, key, entry.value))
    }

    /// Returns a new value without the field.
    pub fn remove(&self, key: &str) -> Self {
        Self::new(self.ops, self.ops.remove(&self.value, key))
    }

    /// Renames a field, preserving its position among the other entries.
    /// Anything other than a map containing `old` is returned unchanged.
    pub fn rename_field(&self, old: &str, new: &str) -> Self {
        if !self.has(old) {
            return self.clone();
        }

        let Some(entries) = self.entries().value() else {
            return self.clone();
        };

        let renamed = entries.into_iter().map(|(key, value)| {
            let key = if key == old { new.to_owned() } else { key };
            (self.ops.create_string(&key), value.value)
        });

        match self.ops.create_map(renamed) {
            DataResult::Ok(value) => Self::new(self.ops, value),
            DataResult::Err(_) => self.clone(),
        }
    }

    /// Applies `f` to the field if present; otherwise returns self
    /// unchanged.
    pub fn update(&self, key: &str, f: impl FnOnce(Self) -> Self) -> Self {
        match self.try_get(key) {
            Some(entry) => self.set(key, f(entry)),
            None => self.clone(),
        }
    }

    /// Reads this value as a string.
    ///
    /// # Errors
    /// If the value is not a string.
    pub fn as_string(&self) -> DataResult<String> {
        self.ops.get_string_value(&self.value)
    }

    /// Reads this value as a number.
    ///
    /// # Errors
    /// If the value is not a number.
    pub fn as_number(&self) -> DataResult<f64> {
        self.ops.get_number_value(&self.value)
    }

    /// Reads this value as an integer, truncating any fraction.
    ///
    /// # Errors
    /// If the value is not a number.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> DataResult<i64> {
        self.as_number().map(|n| n as i64)
    }

    /// Reads this value as a boolean.
    ///
    /// # Errors
    /// If the value is not a boolean.
    pub fn as_bool(&self) -> DataResult<bool> {
        self.ops.get_bool_value(&self.value)
    }

    /// Reads this value as a list of dynamics.
    ///
    /// # Errors
    /// If the value is not a list.
    pub fn as_list(&self) -> DataResult<Vec<Self>> {
        let ops = self.ops;
        self.ops
            .get_list(&self.value)
            .map(|items| items.into_iter().map(|value| Self::new(ops, value)).collect())
    }

    /// Reads this value as map entries with string keys, in iteration
    /// order.
    ///
    /// # Errors
    /// If the value is not a map or a key is not a string.
    pub fn entries(&self) -> DataResult<Vec<(String, Self)>> {
        let ops = self.ops;
        self.ops.get_map_entries(&self.value).and_then(|entries| {
            let mut out = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                match ops.get_string_value(&key) {
                    DataResult::Ok(key) => out.push((key, Self::new(ops, value))),
                    DataResult::Err(err) => {
                        return DataResult::error(format!("bad map key: {}", err.message()));
                    }
                }
            }
            DataResult::Ok(out)
        })
    }

    /// Returns a new list with the element appended.
    ///
    /// # Errors
    /// If this value is neither a list nor empty.
    pub fn push(&self, element: Self) -> DataResult<Self> {
        let ops = self.ops;
        self.ops
            .merge_to_list(&self.value, element.value)
            .map(|value| Self::new(ops, value))
    }

    /// Returns a new map with the entry inserted.
    ///
    /// # Errors
    /// If this value is neither a map nor empty.
    pub fn insert(&self, key: &str, entry: Self) -> DataResult<Self> {
        let ops = self.ops;
        self.ops
            .merge_to_map(&self.value, ops.create_string(key), entry.value)
            .map(|value| Self::new(ops, value))
    }

    /// Shallow right-biased merge with another map.
    ///
    /// # Errors
    /// If either value is neither a map nor empty.
    pub fn merge(&self, other: &Self) -> DataResult<Self> {
        let ops = self.ops;
        self.ops
            .merge_maps(&self.value, &other.value)
            .map(|value| Self::new(ops, value))
    }

    /// Resolves the value at a dotted [`Path`](crate::path::Path), if every
    /// segment matches.
    pub fn at(&self, path: &crate::path::Path) -> Option<Self> {
        path.get_in(self)
    }

    /// Recursively converts this value into another format, best-effort.
    pub fn convert<T: Ops>(&self, target: T) -> Dynamic<T> {
        Dynamic::new(target, self.ops.convert_to(target, &self.value))
    }

    /// Tags this value with a type id, producing the unit of migration.
    pub fn tag(self, id: impl Into<TypeId>) -> TaggedDynamic<O> {
        TaggedDynamic::new(id, self)
    }
}

/// The unit of migration input and output: a [`Dynamic`] tagged with the
/// [`TypeId`] it claims to be.
pub struct TaggedDynamic<O: Ops> {
    id: TypeId,
    value: Dynamic<O>,
}

impl<O: Ops> Clone for TaggedDynamic<O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            value: self.value.clone(),
        }
    }
}

impl<O: Ops> PartialEq for TaggedDynamic<O> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value == other.value
    }
}

impl<O: Ops> fmt::Debug for TaggedDynamic<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedDynamic")
            .field("id", &self.id)
            .field("value", self.value.value())
            .finish()
    }
}

impl<O: Ops> TaggedDynamic<O> {
    /// Tags a dynamic value.
    pub fn new(id: impl Into<TypeId>, value: Dynamic<O>) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    /// The claimed type.
    pub fn type_id(&self) -> &TypeId {
        &self.id
    }

    /// The tagged value.
    pub fn value(&self) -> &Dynamic<O> {
        &self.value
    }

    /// Splits the tag from the value.
    pub fn into_parts(self) -> (TypeId, Dynamic<O>) {
        (self.id, self.value)
    }
}
