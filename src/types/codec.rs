use crate::{
    dynamic::Dynamic,
    ops::Ops,
    result::DataResult,
    types::{
        Primitive,
        Type,
        TypeKind,
        Typed,
    },
};

/// The codec derived from a [`Type`]: validates a [`Dynamic`] against the
/// type's structure and rebuilds values field by field.
///
/// Decoding returns the typed view together with the *leftover*: whatever
/// part of the input the type did not consume. A passthrough type consumes
/// everything; a field consumes its entry.
#[derive(Debug, Clone)]
pub struct TypeCodec {
    ty: Type,
}

impl TypeCodec {
    pub(crate) fn new(ty: Type) -> Self {
        Self { ty }
    }

    /// The type this codec interprets.
    pub fn type_of(&self) -> &Type {
        &self.ty
    }

    /// Validates the input against the type.
    ///
    /// # Errors
    /// If the input does not conform; the message names the first mismatch.
    pub fn decode<O: Ops>(&self, input: &Dynamic<O>) -> DataResult<(Typed<O>, O::Value)> {
        let ty = self.ty.clone();
        decode_leftover(&self.ty, input).map(|leftover| (Typed::new(ty, input.clone()), leftover))
    }

    /// Rebuilds the fields described by the type onto `prefix`.
    ///
    /// For map-shaped types the prefix must be a map or empty; primitive
    /// and list types ignore the prefix and return the value itself.
    ///
    /// # Errors
    /// If the value does not conform to the type.
    pub fn encode<O: Ops>(&self, value: &Dynamic<O>, prefix: O::Value) -> DataResult<O::Value> {
        encode_onto(&self.ty, value, prefix)
    }
}

fn primitive_matches<O: Ops>(primitive: Primitive, input: &Dynamic<O>) -> bool {
    match primitive {
        Primitive::Bool => input.is_bool(),
        Primitive::String => input.is_string(),
        Primitive::Int
        | Primitive::Long
        | Primitive::Float
        | Primitive::Double
        | Primitive::Byte
        | Primitive::Short => input.is_number(),
    }
}

fn decode_leftover<O: Ops>(ty: &Type, input: &Dynamic<O>) -> DataResult<O::Value> {
    let ops = input.ops();

    match ty.kind() {
        TypeKind::Primitive(primitive) => {
            if primitive_matches(*primitive, input) {
                DataResult::Ok(ops.empty())
            } else {
                DataResult::error(format!(
                    "expected {}, found {:?}",
                    primitive.describe(),
                    input.value()
                ))
            }
        }
        TypeKind::List(element) => input.as_list().and_then(|items| {
            for (index, item) in items.iter().enumerate() {
                if let DataResult::Err(err) = decode_leftover(element, item) {
                    return DataResult::error(format!("element {index}: {}", err.message()));
                }
            }
            DataResult::Ok(ops.empty())
        }),
        TypeKind::Optional(element) => {
            if input.is_empty() {
                DataResult::Ok(ops.empty())
            } else {
                decode_leftover(element, input)
            }
        }
        TypeKind::Product(first, second) => decode_leftover(first, input).and_then(|rest| {
            decode_leftover(second, &Dynamic::new(ops, rest))
        }),
        TypeKind::Sum(left, right) => match decode_leftover(left, input) {
            DataResult::Ok(leftover) => DataResult::Ok(leftover),
            DataResult::Err(first) => decode_leftover(right, input)
                .map_err(|second| format!("{}; {second}", first.message())),
        },
        TypeKind::Field { name, element } => match input.try_get(name) {
            Some(child) => match decode_leftover(element, &child) {
                DataResult::Ok(_) => DataResult::Ok(input.remove(name).into_value()),
                DataResult::Err(err) => {
                    DataResult::error(format!("field `{name}`: {}", err.message()))
                }
            },
            None => DataResult::error(format!(
                "missing required field `{name}` in {:?}",
                input.value()
            )),
        },
        TypeKind::OptionalField { name, element } => match input.try_get(name) {
            Some(child) => match decode_leftover(element, &child) {
                DataResult::Ok(_) => DataResult::Ok(input.remove(name).into_value()),
                DataResult::Err(err) => {
                    DataResult::error(format!("field `{name}`: {}", err.message()))
                }
            },
            None => DataResult::Ok(input.value().clone()),
        },
        TypeKind::Passthrough => DataResult::Ok(ops.empty()),
        TypeKind::TaggedChoice { tag, cases } => {
            let Some(tag_value) = input.try_get(tag) else {
                return DataResult::error(format!(
                    "missing tag `{tag}` in {:?}",
                    input.value()
                ));
            };

            tag_value
                .as_string()
                .map_err(|message| format!("tag `{tag}`: {message}"))
                .and_then(|key| match cases.get(&key) {
                    Some(case) => decode_leftover(case, &input.remove(tag)),
                    None => {
                        let known = cases.keys().cloned().collect::<Vec<_>>().join(", ");
                        DataResult::error(format!(
                            "unknown tag `{key}` for dispatch on `{tag}`; known tags: [{known}]"
                        ))
                    }
                })
        }
        TypeKind::Named { element, .. } => decode_leftover(element, input),
        TypeKind::Recursive { .. } => decode_leftover(&ty.unfold(), input),
    }
}

fn encode_onto<O: Ops>(ty: &Type, value: &Dynamic<O>, prefix: O::Value) -> DataResult<O::Value> {
    let ops = value.ops();

    match ty.kind() {
        TypeKind::Primitive(primitive) => {
            if primitive_matches(*primitive, value) {
                DataResult::Ok(value.value().clone())
            } else {
                DataResult::error(format!(
                    "expected {}, found {:?}",
                    primitive.describe(),
                    value.value()
                ))
            }
        }
        TypeKind::List(element) => value.as_list().and_then(|items| {
            let mut out = ops.empty_list();
            for (index, item) in items.iter().enumerate() {
                match encode_onto(element, item, ops.empty()) {
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
        }),
        TypeKind::Optional(element) => {
            if value.is_empty() {
                DataResult::Ok(prefix)
            } else {
                encode_onto(element, value, prefix)
            }
        }
        TypeKind::Product(first, second) => {
            encode_onto(first, value, prefix).and_then(|built| encode_onto(second, value, built))
        }
        TypeKind::Sum(left, right) => match encode_onto(left, value, prefix.clone()) {
            DataResult::Ok(built) => DataResult::Ok(built),
            DataResult::Err(first) => encode_onto(right, value, prefix)
                .map_err(|second| format!("{}; {second}", first.message())),
        },
        TypeKind::Field { name, element } => match value.try_get(name) {
            Some(child) => encode_onto(element, &child, ops.empty()).and_then(|encoded| {
                ops.merge_to_map(&prefix, ops.create_string(name), encoded)
            }),
            None => DataResult::error(format!(
                "missing required field `{name}` in {:?}",
                value.value()
            )),
        },
        TypeKind::OptionalField { name, element } => match value.try_get(name) {
            Some(child) => encode_onto(element, &child, ops.empty()).and_then(|encoded| {
                ops.merge_to_map(&prefix, ops.create_string(name), encoded)
            }),
            None => DataResult::Ok(prefix),
        },
        TypeKind::Passthrough => {
            if value.is_empty() {
                DataResult::Ok(prefix)
            } else if ops.is_empty(&prefix) {
                DataResult::Ok(value.value().clone())
            } else {
                ops.merge_maps(&prefix, value.value())
            }
        }
        TypeKind::TaggedChoice { tag, cases } => {
            let Some(tag_value) = value.try_get(tag) else {
                return DataResult::error(format!(
                    "missing tag `{tag}` in {:?}",
                    value.value()
                ));
            };

            tag_value
                .as_string()
                .map_err(|message| format!("tag `{tag}`: {message}"))
                .and_then(|key| match cases.get(&key) {
                    Some(case) => ops
                        .merge_to_map(&prefix, ops.create_string(tag), tag_value.into_value())
                        .and_then(|with_tag| encode_onto(case, &value.remove(tag), with_tag)),
                    None => {
                        let known = cases.keys().cloned().collect::<Vec<_>>().join(", ");
                        DataResult::error(format!(
                            "unknown tag `{key}` for dispatch on `{tag}`; known tags: [{known}]"
                        ))
                    }
                })
        }
        TypeKind::Named { element, .. } => encode_onto(element, value, prefix),
        TypeKind::Recursive { .. } => encode_onto(&ty.unfold(), value, prefix),
    }
}
