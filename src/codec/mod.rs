//! Bidirectional, composable converters between typed values and tree
//! values.
//!
//! A [`Codec`] is universally quantified over [`Ops`]: the same codec
//! value encodes to and decodes from any tree format. Decoding returns the
//! value together with the *leftover* part of the input the codec did not
//! consume.

use std::marker::PhantomData;

use crate::{
    dynamic::Dynamic,
    ops::Ops,
    result::DataResult,
};

mod record;

pub use record::{
    DefaultedFieldCodec,
    EntryCodec,
    EntryCodecTuple,
    FieldCodec,
    OptionalFieldCodec,
    RecordCodec,
    record,
};

/// A value of one of two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    /// The first alternative.
    Left(L),
    /// The second alternative.
    Right(R),
}

/// A bidirectional converter for values of type `Self::Value`.
pub trait Codec {
    /// The typed value this codec converts.
    type Value;

    /// Encodes a value into the tree format, merging onto `prefix`.
    ///
    /// Map-shaped codecs merge their fields into the prefix; primitive and
    /// list codecs ignore it.
    ///
    /// # Errors
    /// If the value cannot be represented.
    fn encode<O: Ops>(
        &self,
        value: &Self::Value,
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value>;

    /// Decodes a value, returning it with the unconsumed leftover.
    ///
    /// # Errors
    /// If the input does not match; the error may carry a partial value.
    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Self::Value, O::Value)>;

    /// A codec for lists of this codec's value.
    fn list_of(self) -> ListCodec<Self>
    where
        Self: Sized,
    {
        ListCodec { element: self }
    }

    /// A codec tolerating absence, decoding it as `None`.
    fn optional(self) -> OptionalCodec<Self>
    where
        Self: Sized,
    {
        OptionalCodec { element: self }
    }

    /// A required named field holding this codec's value, for use in a
    /// [`record`].
    fn field(self, name: impl Into<String>) -> FieldCodec<Self>
    where
        Self: Sized,
    {
        FieldCodec::new(name, self)
    }

    /// An optional named field, decoding absence as `None`.
    fn optional_field(self, name: impl Into<String>) -> OptionalFieldCodec<Self>
    where
        Self: Sized,
    {
        OptionalFieldCodec::new(name, self)
    }

    /// Adapts this codec through a bijection.
    fn xmap<B, F, G>(self, forward: F, backward: G) -> XmapCodec<Self, B, F, G>
    where
        Self: Sized,
        F: Fn(Self::Value) -> B,
        G: Fn(&B) -> Self::Value,
    {
        XmapCodec {
            inner: self,
            forward,
            backward,
            _marker: PhantomData,
        }
    }

    /// Adapts this codec through a fallible conversion.
    fn flat_xmap<B, F, G>(self, forward: F, backward: G) -> FlatXmapCodec<Self, B, F, G>
    where
        Self: Sized,
        F: Fn(Self::Value) -> DataResult<B>,
        G: Fn(&B) -> DataResult<Self::Value>,
    {
        FlatXmapCodec {
            inner: self,
            forward,
            backward,
            _marker: PhantomData,
        }
    }
}

/// The string codec.
pub fn string() -> StringCodec {
    StringCodec
}

/// The boolean codec.
pub fn bool() -> BoolCodec {
    BoolCodec
}

/// The 32-bit integer codec.
pub fn int() -> IntCodec {
    IntCodec
}

/// The 64-bit integer codec.
pub fn long() -> LongCodec {
    LongCodec
}

/// The 32-bit float codec.
pub fn float() -> FloatCodec {
    FloatCodec
}

/// The 64-bit float codec.
pub fn double() -> DoubleCodec {
    DoubleCodec
}

/// The 8-bit integer codec.
pub fn byte() -> ByteCodec {
    ByteCodec
}

/// The 16-bit integer codec.
pub fn short() -> ShortCodec {
    ShortCodec
}

/// The unit codec: decodes to `()` consuming nothing, encodes to the
/// prefix unchanged.
pub fn unit() -> UnitCodec {
    UnitCodec
}

/// A codec for pairs: `first` then `second` over the same value.
pub fn pair<A: Codec, B: Codec>(first: A, second: B) -> PairCodec<A, B> {
    PairCodec { first, second }
}

/// A codec trying `left` first, falling back to `right`.
pub fn either<L: Codec, R: Codec>(left: L, right: R) -> EitherCodec<L, R> {
    EitherCodec { left, right }
}

/// A codec for string-keyed maps with homogeneous values.
pub fn map<K: Codec, V: Codec>(key: K, value: V) -> MapCodec<K, V> {
    MapCodec { key, value }
}

/// Codec for `String`.
#[derive(Debug, Clone, Copy)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Value = String;

    fn encode<O: Ops>(&self, value: &String, ops: O, _prefix: O::Value) -> DataResult<O::Value> {
        DataResult::Ok(ops.create_string(value))
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(String, O::Value)> {
        let ops = input.ops();
        input.as_string().map(|value| (value, ops.empty()))
    }
}

/// Codec for `bool`.
#[derive(Debug, Clone, Copy)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    type Value = bool;

    fn encode<O: Ops>(&self, value: &bool, ops: O, _prefix: O::Value) -> DataResult<O::Value> {
        DataResult::Ok(ops.create_bool(*value))
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(bool, O::Value)> {
        let ops = input.ops();
        input.as_bool().map(|value| (value, ops.empty()))
    }
}

macro_rules! impl_numeric_codec {
    ($name:ident, $ty:ty, $create:ident) => {
        impl Codec for $name {
            type Value = $ty;

            fn encode<O: Ops>(
                &self,
                value: &$ty,
                ops: O,
                _prefix: O::Value,
            ) -> DataResult<O::Value> {
                DataResult::Ok(ops.$create(*value))
            }

            #[allow(clippy::cast_possible_truncation)]
            fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<($ty, O::Value)> {
                let ops = input.ops();
                input.as_number().map(|value| (value as $ty, ops.empty()))
            }
        }
    };
}

/// Codec for `i32`.
#[derive(Debug, Clone, Copy)]
pub struct IntCodec;
/// Codec for `i64`.
#[derive(Debug, Clone, Copy)]
pub struct LongCodec;
/// Codec for `f32`.
#[derive(Debug, Clone, Copy)]
pub struct FloatCodec;
/// Codec for `f64`.
#[derive(Debug, Clone, Copy)]
pub struct DoubleCodec;
/// Codec for `i8`.
#[derive(Debug, Clone, Copy)]
pub struct ByteCodec;
/// Codec for `i16`.
#[derive(Debug, Clone, Copy)]
pub struct ShortCodec;

impl_numeric_codec!(IntCodec, i32, create_int);
impl_numeric_codec!(LongCodec, i64, create_long);
impl_numeric_codec!(FloatCodec, f32, create_float);
impl_numeric_codec!(DoubleCodec, f64, create_double);
impl_numeric_codec!(ByteCodec, i8, create_byte);
impl_numeric_codec!(ShortCodec, i16, create_short);

/// Codec for `()`.
#[derive(Debug, Clone, Copy)]
pub struct UnitCodec;

impl Codec for UnitCodec {
    type Value = ();

    fn encode<O: Ops>(&self, _value: &(), _ops: O, prefix: O::Value) -> DataResult<O::Value> {
        DataResult::Ok(prefix)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<((), O::Value)> {
        DataResult::Ok(((), input.value().clone()))
    }
}

/// Codec for `Vec<E>`. See [`Codec::list_of`].
#[derive(Debug, Clone, Copy)]
pub struct ListCodec<C> {
    element: C,
}

impl<C: Codec> Codec for ListCodec<C> {
    type Value = Vec<C::Value>;

    fn encode<O: Ops>(
        &self,
        value: &Vec<C::Value>,
        ops: O,
        _prefix: O::Value,
    ) -> DataResult<O::Value> {
        let mut out = ops.empty_list();
        for (index, item) in value.iter().enumerate() {
            match self.element.encode(item, ops, ops.empty()) {
                DataResult::Ok(encoded) => match ops.merge_to_list(&out, encoded) {
                    DataResult::Ok(next) => out = next,
                    DataResult::Err(err) => return DataResult::Err(err),
                },
                DataResult::Err(err) => {
                    return DataResult::error(format!("element {index}: {}", err.message()));
                }
            }
        }
        DataResult::Ok(out)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Vec<C::Value>, O::Value)> {
        let ops = input.ops();
        input.as_list().and_then(|items| {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match self.element.decode(item) {
                    DataResult::Ok((value, _)) => out.push(value),
                    DataResult::Err(err) => {
                        return DataResult::error_with_partial(
                            format!("element {index}: {}", err.message()),
                            (out, ops.empty()),
                        );
                    }
                }
            }
            DataResult::Ok((out, ops.empty()))
        })
    }
}

/// Codec for `Option<E>`. See [`Codec::optional`].
#[derive(Debug, Clone, Copy)]
pub struct OptionalCodec<C> {
    element: C,
}

impl<C: Codec> Codec for OptionalCodec<C> {
    type Value = Option<C::Value>;

    fn encode<O: Ops>(
        &self,
        value: &Option<C::Value>,
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value> {
        match value {
            Some(value) => self.element.encode(value, ops, prefix),
            None => DataResult::Ok(prefix),
        }
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Option<C::Value>, O::Value)> {
        let ops = input.ops();
        if input.is_empty() {
            DataResult::Ok((None, ops.empty()))
        } else {
            self.element
                .decode(input)
                .map(|(value, leftover)| (Some(value), leftover))
        }
    }
}

/// Codec for pairs. See [`pair`].
#[derive(Debug, Clone, Copy)]
pub struct PairCodec<A, B> {
    first: A,
    second: B,
}

impl<A: Codec, B: Codec> Codec for PairCodec<A, B> {
    type Value = (A::Value, B::Value);

    fn encode<O: Ops>(
        &self,
        value: &(A::Value, B::Value),
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value> {
        self.first
            .encode(&value.0, ops, prefix)
            .and_then(|built| self.second.encode(&value.1, ops, built))
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<((A::Value, B::Value), O::Value)> {
        let ops = input.ops();
        self.first.decode(input).and_then(|(first, rest)| {
            self.second
                .decode(&Dynamic::new(ops, rest))
                .map(|(second, leftover)| ((first, second), leftover))
        })
    }
}

/// Codec trying two alternatives. See [`either`].
#[derive(Debug, Clone, Copy)]
pub struct EitherCodec<L, R> {
    left: L,
    right: R,
}

impl<L: Codec, R: Codec> Codec for EitherCodec<L, R> {
    type Value = Either<L::Value, R::Value>;

    fn encode<O: Ops>(
        &self,
        value: &Either<L::Value, R::Value>,
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value> {
        match value {
            Either::Left(value) => self.left.encode(value, ops, prefix),
            Either::Right(value) => self.right.encode(value, ops, prefix),
        }
    }

    fn decode<O: Ops>(
        &self,
        input: &Dynamic<O>,
    ) -> DataResult<(Either<L::Value, R::Value>, O::Value)> {
        match self.left.decode(input) {
            DataResult::Ok((value, leftover)) => DataResult::Ok((Either::Left(value), leftover)),
            DataResult::Err(first) => match self.right.decode(input) {
                DataResult::Ok((value, leftover)) => {
                    DataResult::Ok((Either::Right(value), leftover))
                }
                DataResult::Err(second) => DataResult::error(format!(
                    "{}; {}",
                    first.message(),
                    second.message()
                )),
            },
        }
    }
}

/// Codec for string-keyed maps. See [`map`].
#[derive(Debug, Clone, Copy)]
pub struct MapCodec<K, V> {
    key: K,
    value: V,
}

impl<K, V> Codec for MapCodec<K, V>
where
    K: Codec,
    K::Value: std::hash::Hash + Eq,
    V: Codec,
{
    type Value = indexmap::IndexMap<K::Value, V::Value>;

    fn encode<O: Ops>(
        &self,
        value: &Self::Value,
        ops: O,
        prefix: O::Value,
    ) -> DataResult<O::Value> {
        let mut out = if ops.is_empty(&prefix) {
            ops.empty_map()
        } else {
            prefix
        };

        for (key, entry) in value {
            let encoded_key = match self.key.encode(key, ops, ops.empty()) {
                DataResult::Ok(key) => key,
                DataResult::Err(err) => return DataResult::error(err.message().to_owned()),
            };
            let encoded_value = match self.value.encode(entry, ops, ops.empty()) {
                DataResult::Ok(value) => value,
                DataResult::Err(err) => return DataResult::error(err.message().to_owned()),
            };
            match ops.merge_to_map(&out, encoded_key, encoded_value) {
                DataResult::Ok(next) => out = next,
                DataResult::Err(err) => return DataResult::Err(err),
            }
        }

        DataResult::Ok(out)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Self::Value, O::Value)> {
        let ops = input.ops();
        input.entries().and_then(|entries| {
            let mut out = indexmap::IndexMap::with_capacity(entries.len());
            for (key, entry) in entries {
                let key_dynamic = Dynamic::new(ops, ops.create_string(&key));
                let decoded_key = match self.key.decode(&key_dynamic) {
                    DataResult::Ok((key, _)) => key,
                    DataResult::Err(err) => {
                        return DataResult::error(format!("key `{key}`: {}", err.message()));
                    }
                };
                match self.value.decode(&entry) {
                    DataResult::Ok((value, _)) => {
                        out.insert(decoded_key, value);
                    }
                    DataResult::Err(err) => {
                        return DataResult::error(format!("entry `{key}`: {}", err.message()));
                    }
                }
            }
            DataResult::Ok((out, ops.empty()))
        })
    }
}

/// Codec adapted through a bijection. See [`Codec::xmap`].
#[derive(Debug, Clone, Copy)]
pub struct XmapCodec<C, B, F, G> {
    inner: C,
    forward: F,
    backward: G,
    _marker: PhantomData<fn() -> B>,
}

impl<C, B, F, G> Codec for XmapCodec<C, B, F, G>
where
    C: Codec,
    F: Fn(C::Value) -> B,
    G: Fn(&B) -> C::Value,
{
    type Value = B;

    fn encode<O: Ops>(&self, value: &B, ops: O, prefix: O::Value) -> DataResult<O::Value> {
        self.inner.encode(&(self.backward)(value), ops, prefix)
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(B, O::Value)> {
        self.inner
            .decode(input)
            .map(|(value, leftover)| ((self.forward)(value), leftover))
    }
}

/// Codec adapted through a fallible conversion. See [`Codec::flat_xmap`].
#[derive(Debug, Clone, Copy)]
pub struct FlatXmapCodec<C, B, F, G> {
    inner: C,
    forward: F,
    backward: G,
    _marker: PhantomData<fn() -> B>,
}

impl<C, B, F, G> Codec for FlatXmapCodec<C, B, F, G>
where
    C: Codec,
    F: Fn(C::Value) -> DataResult<B>,
    G: Fn(&B) -> DataResult<C::Value>,
{
    type Value = B;

    fn encode<O: Ops>(&self, value: &B, ops: O, prefix: O::Value) -> DataResult<O::Value> {
        match (self.backward)(value) {
            DataResult::Ok(inner) => self.inner.encode(&inner, ops, prefix),
            DataResult::Err(err) => DataResult::error(err.message().to_owned()),
        }
    }

    fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(B, O::Value)> {
        self.inner.decode(input).and_then(|(value, leftover)| {
            match (self.forward)(value) {
                DataResult::Ok(mapped) => DataResult::Ok((mapped, leftover)),
                DataResult::Err(err) => DataResult::error(err.message().to_owned()),
            }
        })
    }
}
