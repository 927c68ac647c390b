//! Record assembly: named field codecs composed into a codec for a
//! constructor of matching arity.

use std::sync::Arc;

use variadics_please::all_tuples;

use crate::{
    codec::Codec,
    dynamic::Dynamic,
    ops::Ops,
    result::DataResult,
};

/// A codec for one entry of a record: knows how to read its value out of a
/// map and write it back in.
pub trait EntryCodec {
    /// The entry's typed value.
    type Value;

    /// Writes the entry onto `map`.
    ///
    /// # Errors
    /// If the value cannot be represented or the map is malformed.
    fn encode_entry<O: Ops>(
        &self,
        value: &Self::Value,
        ops: O,
        map: O::Value,
    ) -> DataResult<O::Value>;

    /// Reads the entry from the input map.
    ///
    /// # Errors
    /// If the entry is missing (for required fields) or malformed.
    fn decode_entry<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<Self::Value>;

    /// Removes the entry's key from a map value, for leftover tracking.
    fn strip<O: Ops>(&self, ops: O, value: O::Value) -> O::Value;
}

/// A required named field. See [`Codec::field`].
#[derive(Debug, Clone)]
pub struct FieldCodec<C> {
    name: String,
    codec: C,
}

impl<C> FieldCodec<C> {
    pub(crate) fn new(name: impl Into<String>, codec: C) -> Self {
        Self {
            name: name.into(),
            codec,
        }
    }

    /// Makes the field optional with a fallback used when it is absent.
    pub fn with_default(self, default: C::Value) -> DefaultedFieldCodec<C>
    where
        C: Codec,
    {
        DefaultedFieldCodec {
            field: self,
            default,
        }
    }
}

impl<C: Codec> EntryCodec for FieldCodec<C> {
    type Value = C::Value;

    fn encode_entry<O: Ops>(
        &self,
        value: &C::Value,
        ops: O,
        map: O::Value,
    ) -> DataResult<O::Value> {
        match self.codec.encode(value, ops, ops.empty()) {
            DataResult::Ok(encoded) => {
                ops.merge_to_map(&map, ops.create_string(&self.name), encoded)
            }
            DataResult::Err(err) => {
                DataResult::error(format!("field `{}`: {}", self.name, err.message()))
            }
        }
    }

    fn decode_entry<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<C::Value> {
        match input.try_get(&self.name) {
            Some(child) => match self.codec.decode(&child) {
                DataResult::Ok((value, _)) => DataResult::Ok(value),
                DataResult::Err(err) => {
                    DataResult::error(format!("field `{}`: {}", self.name, err.message()))
                }
            },
            None => DataResult::error(format!(
                "missing required field `{}` in {:?}",
                self.name,
                input.value()
            )),
        }
    }

    fn strip<O: Ops>(&self, ops: O, value: O::Value) -> O::Value {
        ops.remove(&value, &self.name)
    }
}

impl<C: Codec> Codec for FieldCodec<C> {
    type Value = C::Value;

    fn encode<O: Ops>(&self, value: &C::Value, ops: O, prefix: O::Value) -> DataResult<O::Value> {
        let map = if ops.is_empty(&prefix) {
            ops.empty_map()
        } else {
            prefix
        };
        self.encode_entry(value, ops, map)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(C::Value, O::Value)> {
        let ops = input.ops();
        self.decode_entry(input)
            .map(|value| (value, self.strip(ops, input.value().clone())))
    }
}

/// An optional named field decoding absence as `None`. See
/// [`Codec::optional_field`].
#[derive(Debug, Clone)]
pub struct OptionalFieldCodec<C> {
    name: String,
    codec: C,
}

impl<C> OptionalFieldCodec<C> {
    pub(crate) fn new(name: impl Into<String>, codec: C) -> Self {
        Self {
            name: name.into(),
            codec,
        }
    }
}

impl<C: Codec> EntryCodec for OptionalFieldCodec<C> {
    type Value = Option<C::Value>;

    fn encode_entry<O: Ops>(
        &self,
        value: &Option<C::Value>,
        ops: O,
        map: O::Value,
    ) -> DataResult<O::Value> {
        match value {
            Some(value) => match self.codec.encode(value, ops, ops.empty()) {
                DataResult::Ok(encoded) => {
                    ops.merge_to_map(&map, ops.create_string(&self.name), encoded)
                }
                DataResult::Err(err) => {
                    DataResult::error(format!("field `{}`: {}", self.name, err.message()))
                }
            },
            None => DataResult::Ok(map),
        }
    }

    fn decode_entry<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<Option<C::Value>> {
        match input.try_get(&self.name) {
            Some(child) => match self.codec.decode(&child) {
                DataResult::Ok((value, _)) => DataResult::Ok(Some(value)),
                DataResult::Err(err) => {
                    DataResult::error(format!("field `{}`: {}", self.name, err.message()))
                }
            },
            None => DataResult::Ok(None),
        }
    }

    fn strip<O: Ops>(&self, ops: O, value: O::Value) -> O::Value {
        ops.remove(&value, &self.name)
    }
}

impl<C: Codec> Codec for OptionalFieldCodec<C> {
    type Value = Option<C::Value>;

    fn encode<O: Ops>(
        &self,
        value: &Option<C::Value>,
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value> {
        let map = if ops.is_empty(&prefix) {
            ops.empty_map()
        } else {
            prefix
        };
        self.encode_entry(value, ops, map)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Option<C::Value>, O::Value)> {
        let ops = input.ops();
        self.decode_entry(input)
            .map(|value| (value, self.strip(ops, input.value().clone())))
    }
}

/// A field with a fallback value for absence. See
/// [`FieldCodec::with_default`].
pub struct DefaultedFieldCodec<C: Codec> {
    field: FieldCodec<C>,
    default: C::Value,
}

impl<C> Clone for DefaultedFieldCodec<C>
where
    C: Codec + Clone,
    C::Value: Clone,
{
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            default: self.default.clone(),
        }
    }
}

impl<C> EntryCodec for DefaultedFieldCodec<C>
where
    C: Codec,
    C::Value: Clone,
{
    type Value = C::Value;

    fn encode_entry<O: Ops>(
        &self,
        value: &C::Value,
        ops: O,
        map: O::Value,
    ) -> DataResult<O::Value> {
        self.field.encode_entry(value, ops, map)
    }

    fn decode_entry<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<C::Value> {
        if input.has(&self.field.name) {
            self.field.decode_entry(input)
        } else {
            DataResult::Ok(self.default.clone())
        }
    }

    fn strip<O: Ops>(&self, ops: O, value: O::Value) -> O::Value {
        self.field.strip(ops, value)
    }
}

/// Composes field codecs with a constructor and a destructor into a codec
/// for a record type.
///
/// Fields decode in declaration order; encoding writes them in the same
/// order onto an initially empty map.
///
/// ```
/// use datafix::codec::{self, Codec};
/// use datafix::dynamic::Dynamic;
/// use datafix::ops::JsonOps;
///
/// #[derive(Debug, PartialEq)]
/// struct Item {
///     id: String,
///     count: i32,
/// }
///
/// let codec = codec::record(
///     (codec::string().field("id"), codec::int().field("count")),
///     |(id, count)| Item { id, count },
///     |item: &Item| (item.id.clone(), item.count),
/// );
///
/// let input = Dynamic::new(JsonOps, serde_json::json!({"id": "diamond", "count": 64}));
/// let (item, _leftover) = codec.decode(&input).value().unwrap();
/// assert_eq!(item, Item { id: "diamond".into(), count: 64 });
/// ```
pub fn record<Fields, T>(
    fields: Fields,
    pack: impl Fn(Fields::Values) -> T + Send + Sync + 'static,
    unpack: impl Fn(&T) -> Fields::Values + Send + Sync + 'static,
) -> RecordCodec<Fields, T>
where
    Fields: EntryCodecTuple,
{
    RecordCodec {
        fields,
        pack: Arc::new(pack),
        unpack: Arc::new(unpack),
    }
}

/// The codec produced by [`record`].
pub struct RecordCodec<Fields: EntryCodecTuple, T> {
    fields: Fields,
    pack: Arc<dyn Fn(Fields::Values) -> T + Send + Sync>,
    unpack: Arc<dyn Fn(&T) -> Fields::Values + Send + Sync>,
}

impl<Fields: EntryCodecTuple + Clone, T> Clone for RecordCodec<Fields, T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            pack: Arc::clone(&self.pack),
            unpack: Arc::clone(&self.unpack),
        }
    }
}

impl<Fields: EntryCodecTuple, T> Codec for RecordCodec<Fields, T> {
    type Value = T;

    fn encode<O: Ops>(&self, value: &T, ops: O, prefix: O::Value) -> DataResult<O::Value> {
        let map = if ops.is_empty(&prefix) {
            ops.empty_map()
        } else {
            prefix
        };
        self.fields.encode_entries(&(self.unpack)(value), ops, map)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(T, O::Value)> {
        let ops = input.ops();
        self.fields.decode_entries(input).map(|values| {
            let leftover = self.fields.strip_all(ops, input.value().clone());
            ((self.pack)(values), leftover)
        })
    }
}

/// Tuples of [`EntryCodec`]s usable as the field list of a [`record`].
pub trait EntryCodecTuple {
    /// The tuple of the entries' typed values.
    type Values;

    /// Writes every entry onto `map` in declaration order.
    ///
    /// # Errors
    /// If any entry fails to encode.
    fn encode_entries<O: Ops>(
        &self,
        values: &Self::Values,
        ops: O,
        map: O::Value,
    ) -> DataResult<O::Value>;

    /// Reads every entry from the input map in declaration order.
    ///
    /// # Errors
    /// If any entry fails to decode.
    fn decode_entries<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<Self::Values>;

    /// Removes every entry's key from a map value.
    fn strip_all<O: Ops>(&self, ops: O, value: O::Value) -> O::Value;
}

macro_rules! impl_entry_codec_tuple {
    ($(#[$meta:meta])* $(($F:ident, $v:ident)),*) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        impl<$($F: EntryCodec),*> EntryCodecTuple for ($($F,)*) {
            type Values = ($($F::Value,)*);

            fn encode_entries<O: Ops>(
                &self,
                values: &Self::Values,
                ops: O,
                map: O::Value,
            ) -> DataResult<O::Value> {
                let ($($F,)*) = self;
                let ($($v,)*) = values;
                $(
                    let map = match $F.encode_entry($v, ops, map) {
                        DataResult::Ok(map) => map,
                        DataResult::Err(err) => return DataResult::Err(err),
                    };
                )*
                DataResult::Ok(map)
            }

            fn decode_entries<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<Self::Values> {
                let ($($F,)*) = self;
                $(
                    let $v = match $F.decode_entry(input) {
                        DataResult::Ok(value) => value,
                        DataResult::Err(err) => {
                            return DataResult::error(err.message().to_owned());
                        }
                    };
                )*
                DataResult::Ok(($($v,)*))
            }

            fn strip_all<O: Ops>(&self, ops: O, value: O::Value) -> O::Value {
                let ($($F,)*) = self;
                $(
                    let value = $F.strip(ops, value);
                )*
                value
            }
        }
    };
}

all_tuples!(
    #[doc(fake_variadic)]
    impl_entry_codec_tuple,
    1,
    16,
    F,
    v
);
