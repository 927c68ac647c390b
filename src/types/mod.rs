//! Logical types: symbolic identity plus per-version structural templates.

use std::{
    fmt,
    sync::{
        Arc,
        OnceLock,
    },
};

use indexmap::IndexMap;

use crate::{
    dynamic::Dynamic,
    ops::Ops,
    optics::Finder,
    template::TypeFamily,
};

mod codec;
mod registry;

pub use codec::TypeCodec;
pub use registry::TypeRegistry;

/// A non-empty string identifier for a logical data kind, e.g. `"player"`.
///
/// Equality is string equality. Cheap to clone.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(Arc<str>);

impl TypeId {
    /// Creates a type id.
    ///
    /// # Panics
    /// If `id` is empty.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.is_empty(), "type ids must be non-empty");
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

impl serde::Serialize for TypeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The primitive kinds a [`Type`] can name directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Boolean.
    Bool,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// UTF-8 string.
    String,
}

impl Primitive {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::String => "String",
        }
    }
}

/// The logical shape of data for a [`TypeId`] at one schema version.
///
/// Types are immutable and cheap to clone. Recursive shapes are expressed
/// through an indexed [`TypeFamily`] rather than cyclic references; the
/// self-reference unfolds lazily and memoizes its expansion.
#[derive(Clone)]
pub struct Type {
    kind: Arc<TypeKind>,
}

pub(crate) enum TypeKind {
    Primitive(Primitive),
    List(Type),
    Optional(Type),
    Product(Type, Type),
    Sum(Type, Type),
    Field {
        name: String,
        element: Type,
    },
    OptionalField {
        name: String,
        element: Type,
    },
    Passthrough,
    TaggedChoice {
        tag: String,
        cases: IndexMap<String, Type>,
    },
    Named {
        name: String,
        element: Type,
    },
    Recursive {
        name: String,
        family: TypeFamily,
        index: usize,
        unfolded: OnceLock<Type>,
    },
}

impl Type {
    pub(crate) fn from_kind(kind: TypeKind) -> Self {
        Self {
            kind: Arc::new(kind),
        }
    }

    pub(crate) fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub(crate) fn primitive(primitive: Primitive) -> Self {
        Self::from_kind(TypeKind::Primitive(primitive))
    }

    pub(crate) fn list(element: Type) -> Self {
        Self::from_kind(TypeKind::List(element))
    }

    pub(crate) fn optional(element: Type) -> Self {
        Self::from_kind(TypeKind::Optional(element))
    }

    pub(crate) fn product(first: Type, second: Type) -> Self {
        Self::from_kind(TypeKind::Product(first, second))
    }

    pub(crate) fn sum(left: Type, right: Type) -> Self {
        Self::from_kind(TypeKind::Sum(left, right))
    }

    pub(crate) fn field(name: impl Into<String>, element: Type) -> Self {
        Self::from_kind(TypeKind::Field {
            name: name.into(),
            element,
        })
    }

    pub(crate) fn optional_field(name: impl Into<String>, element: Type) -> Self {
        Self::from_kind(TypeKind::OptionalField {
            name: name.into(),
            element,
        })
    }

    pub(crate) fn passthrough() -> Self {
        Self::from_kind(TypeKind::Passthrough)
    }

    pub(crate) fn tagged_choice(
        tag: impl Into<String>,
        cases: IndexMap<String, Type>,
    ) -> Self {
        Self::from_kind(TypeKind::TaggedChoice {
            tag: tag.into(),
            cases,
        })
    }

    pub(crate) fn named(name: impl Into<String>, element: Type) -> Self {
        Self::from_kind(TypeKind::Named {
            name: name.into(),
            element,
        })
    }

    pub(crate) fn recursive(name: impl Into<String>, family: TypeFamily, index: usize) -> Self {
        Self::from_kind(TypeKind::Recursive {
            name: name.into(),
            family,
            index,
            unfolded: OnceLock::new(),
        })
    }

    /// The name this type is registered or aliased under, if any.
    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            TypeKind::Named { name, .. } | TypeKind::Recursive { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The codec that validates and rebuilds values of this type.
    pub fn codec(&self) -> TypeCodec {
        TypeCodec::new(self.clone())
    }

    /// Expands a recursive reference one level; any other type is returned
    /// as-is. The expansion is memoized per reference.
    pub fn unfold(&self) -> Type {
        match self.kind() {
            TypeKind::Recursive {
                family,
                index,
                unfolded,
                ..
            } => unfolded.get_or_init(|| family.apply(*index)).clone(),
            _ => self.clone(),
        }
    }

    /// Locates the named field within this type's product structure,
    /// yielding a [`Finder`] that can focus a [`Dynamic`] on it.
    pub fn finder(&self, name: &str) -> Option<Finder> {
        match self.kind() {
            TypeKind::Field { name: n, .. } | TypeKind::OptionalField { name: n, .. }
                if n == name =>
            {
                Some(Finder::field(name))
            }
            TypeKind::Product(first, second) => {
                first.finder(name).or_else(|| second.finder(name))
            }
            TypeKind::Named { element, .. } => element.finder(name),
            TypeKind::Recursive { .. } => self.unfold().finder(name),
            _ => None,
        }
    }

    /// The `index`-th child type, if any.
    pub fn get_child(&self, index: usize) -> Option<Type> {
        match self.kind() {
            TypeKind::List(element)
            | TypeKind::Optional(element)
            | TypeKind::Field { element, .. }
            | TypeKind::OptionalField { element, .. }
            | TypeKind::Named { element, .. } => (index == 0).then(|| element.clone()),
            TypeKind::Product(first, second) | TypeKind::Sum(first, second) => match index {
                0 => Some(first.clone()),
                1 => Some(second.clone()),
                _ => None,
            },
            TypeKind::TaggedChoice { cases, .. } => {
                cases.get_index(index).map(|(_, case)| case.clone())
            }
            TypeKind::Recursive { .. } => self.unfold().get_child(index),
            _ => None,
        }
    }

    /// A short structural description, e.g. `name: String × experience: Int × …`.
    pub fn describe(&self) -> String {
        match self.kind() {
            TypeKind::Primitive(primitive) => primitive.describe().to_owned(),
            TypeKind::List(element) => format!("List<{}>", element.describe()),
            TypeKind::Optional(element) => format!("Optional<{}>", element.describe()),
            TypeKind::Product(first, second) => {
                format!("{} \u{d7} {}", first.describe(), second.describe())
            }
            TypeKind::Sum(left, right) => {
                format!("{} + {}", left.describe(), right.describe())
            }
            TypeKind::Field { name, element } => format!("{name}: {}", element.describe()),
            TypeKind::OptionalField { name, element } => {
                format!("?{name}: {}", element.describe())
            }
            TypeKind::Passthrough => "\u{2026}".to_owned(),
            TypeKind::TaggedChoice { tag, cases } => {
                let cases = cases
                    .iter()
                    .map(|(value, case)| format!("{value} \u{2192} {}", case.describe()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("TaggedChoice<{tag}>{{{cases}}}")
            }
            TypeKind::Named { name, .. } => name.clone(),
            TypeKind::Recursive { name, .. } => format!("\u{b5}{name}"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.describe())
    }
}

/// A [`Dynamic`] known to conform to a [`Type`].
pub struct Typed<O: Ops> {
    ty: Type,
    value: Dynamic<O>,
}

impl<O: Ops> Clone for Typed<O> {
    fn clone(&self) -> Self {
        Self {
            ty: self.ty.clone(),
            value: self.value.clone(),
        }
    }
}

impl<O: Ops> fmt::Debug for Typed<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("type", &self.ty)
            .field("value", self.value.value())
            .finish()
    }
}

impl<O: Ops> Typed<O> {
    /// Pairs a dynamic value with the type it is believed to conform to.
    /// No validation is performed; see [`TypeCodec::decode`] for checked
    /// construction.
    pub fn new(ty: Type, value: Dynamic<O>) -> Self {
        Self { ty, value }
    }

    /// The logical type.
    pub fn type_of(&self) -> &Type {
        &self.ty
    }

    /// The dynamic value.
    pub fn value(&self) -> &Dynamic<O> {
        &self.value
    }

    /// Consumes the pair, returning the dynamic value.
    pub fn into_value(self) -> Dynamic<O> {
        self.value
    }

    /// Replaces the value, keeping the type.
    pub fn map_value(self, f: impl FnOnce(Dynamic<O>) -> Dynamic<O>) -> Self {
        Self {
            ty: self.ty,
            value: f(self.value),
        }
    }
}
