//! The declarative DSL that builds [`Type`]s for schema registration.
//!
//! A [`TypeTemplate`] is a deferred type: a function from a [`TypeFamily`]
//! to a [`Type`]. Most templates ignore the family; [`id`] and
//! [`recursive`] use it to express self-referential shapes without cyclic
//! ownership.

use std::sync::Arc;

use indexmap::IndexMap;
use variadics_please::all_tuples;

use crate::types::{
    Primitive,
    Type,
};

/// A deferred [`Type`]: evaluated against a [`TypeFamily`] at schema
/// construction time.
#[derive(Clone)]
pub struct TypeTemplate {
    build: Arc<dyn Fn(&TypeFamily) -> Type + Send + Sync>,
}

impl TypeTemplate {
    /// Creates a template from its evaluation function.
    pub fn new(build: impl Fn(&TypeFamily) -> Type + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
        }
    }

    /// Evaluates the template against a family.
    pub fn apply(&self, family: &TypeFamily) -> Type {
        (self.build)(family)
    }

    /// Evaluates the template with no surrounding family.
    pub fn build(&self) -> Type {
        self.apply(&TypeFamily::root())
    }

    /// A short structural description of the resulting type.
    pub fn describe(&self) -> String {
        self.build().describe()
    }
}

impl std::fmt::Debug for TypeTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeTemplate({})", self.describe())
    }
}

/// An integer-indexed family of templates, backing recursive and mutually
/// recursive type definitions.
#[derive(Clone)]
pub struct TypeFamily {
    inner: Arc<FamilyInner>,
}

struct FamilyInner {
    entries: Vec<(String, TypeTemplate)>,
}

impl TypeFamily {
    /// The empty family. Evaluating an [`id`] reference against it is a
    /// programmer fault that surfaces when the reference is unfolded.
    pub fn root() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a family from named entries; entry `i` is referenced by
    /// [`id`]`(i)`.
    pub fn new(entries: Vec<(String, TypeTemplate)>) -> Self {
        Self {
            inner: Arc::new(FamilyInner { entries }),
        }
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns `true` if the family has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub(crate) fn name(&self, index: usize) -> Option<&str> {
        self.inner.entries.get(index).map(|(name, _)| name.as_str())
    }

    /// Evaluates the `index`-th entry against this family.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn apply(&self, index: usize) -> Type {
        let (_, template) = self
            .inner
            .entries
            .get(index)
            .expect("unbound type family index");
        template.apply(self)
    }
}

fn constant(ty: Type) -> TypeTemplate {
    TypeTemplate::new(move |_| ty.clone())
}

/// The boolean primitive.
pub fn bool() -> TypeTemplate {
    constant(Type::primitive(Primitive::Bool))
}

/// The 32-bit integer primitive.
pub fn int() -> TypeTemplate {
    constant(Type::primitive(Primitive::Int))
}

/// The 64-bit integer primitive.
pub fn long() -> TypeTemplate {
    constant(Type::primitive(Primitive::Long))
}

/// The 32-bit float primitive.
pub fn float() -> TypeTemplate {
    constant(Type::primitive(Primitive::Float))
}

/// The 64-bit float primitive.
pub fn double() -> TypeTemplate {
    constant(Type::primitive(Primitive::Double))
}

/// The 8-bit integer primitive.
pub fn byte() -> TypeTemplate {
    constant(Type::primitive(Primitive::Byte))
}

/// The 16-bit integer primitive.
pub fn short() -> TypeTemplate {
    constant(Type::primitive(Primitive::Short))
}

/// The string primitive.
pub fn string() -> TypeTemplate {
    constant(Type::primitive(Primitive::String))
}

/// A homogeneous list of `element`.
pub fn list(element: TypeTemplate) -> TypeTemplate {
    TypeTemplate::new(move |family| Type::list(element.apply(family)))
}

/// An optional `element`: absence decodes as the empty value.
pub fn optional(element: TypeTemplate) -> TypeTemplate {
    TypeTemplate::new(move |family| Type::optional(element.apply(family)))
}

/// A required map entry.
pub fn field(name: impl Into<String>, element: TypeTemplate) -> TypeTemplate {
    let name = name.into();
    TypeTemplate::new(move |family| Type::field(name.clone(), element.apply(family)))
}

/// A map entry that may be absent.
pub fn optional_field(name: impl Into<String>, element: TypeTemplate) -> TypeTemplate {
    let name = name.into();
    TypeTemplate::new(move |family| Type::optional_field(name.clone(), element.apply(family)))
}

/// The remainder: all fields not otherwise consumed, preserved verbatim.
pub fn remainder() -> TypeTemplate {
    constant(Type::passthrough())
}

/// An alias wrapper carrying a name for lookup and description.
pub fn named(name: impl Into<String>, element: TypeTemplate) -> TypeTemplate {
    let name = name.into();
    TypeTemplate::new(move |family| Type::named(name.clone(), element.apply(family)))
}

/// A discriminated union dispatching on the string field `tag`.
///
/// The dispatcher owns the tag: it is written on encode and stripped
/// before the selected case sees the value on decode.
pub fn tagged_choice<S: Into<String>>(
    tag: impl Into<String>,
    cases: impl IntoIterator<Item = (S, TypeTemplate)>,
) -> TypeTemplate {
    let tag = tag.into();
    let cases: Vec<(String, TypeTemplate)> = cases
        .into_iter()
        .map(|(value, case)| (value.into(), case))
        .collect();

    TypeTemplate::new(move |family| {
        let cases: IndexMap<String, Type> = cases
            .iter()
            .map(|(value, case)| (value.clone(), case.apply(family)))
            .collect();
        Type::tagged_choice(tag.clone(), cases)
    })
}

/// A reference to the `index`-th type of the surrounding family.
pub fn id(index: usize) -> TypeTemplate {
    TypeTemplate::new(move |family| {
        let name = family
            .name(index)
            .map_or_else(|| index.to_string(), ToOwned::to_owned);
        Type::recursive(name, family.clone(), index)
    })
}

/// A recursive definition: `body` receives the self-reference.
///
/// ```
/// use datafix::template::{self, TypeTemplate};
///
/// // A cons list: value plus optional tail of the same shape.
/// let cons: TypeTemplate = template::recursive("cons", |cons| {
///     template::and((
///         template::field("value", template::int()),
///         template::optional_field("next", cons),
///     ))
/// });
/// assert_eq!(cons.describe(), "\u{b5}cons");
/// ```
pub fn recursive(
    name: impl Into<String>,
    body: impl FnOnce(TypeTemplate) -> TypeTemplate,
) -> TypeTemplate {
    let name = name.into();
    let inner = body(id(0));

    TypeTemplate::new(move |_| {
        let family = TypeFamily::new(vec![(name.clone(), inner.clone())]);
        Type::recursive(name.clone(), family, 0)
    })
}

/// A right-associative product of two or more templates.
pub fn and(templates: impl ProductTemplates) -> TypeTemplate {
    templates.into_product()
}

/// A right-associative sum of two or more templates.
pub fn or(templates: impl SumTemplates) -> TypeTemplate {
    templates.into_sum()
}

/// Tuples of templates accepted by [`and`].
pub trait ProductTemplates {
    /// Folds the tuple into a right-associated product template.
    fn into_product(self) -> TypeTemplate;
}

/// Tuples of templates accepted by [`or`].
pub trait SumTemplates {
    /// Folds the tuple into a right-associated sum template.
    fn into_sum(self) -> TypeTemplate;
}

/// Anything convertible into a [`TypeTemplate`]; implemented for the
/// template itself so tuple impls can be generic per position.
pub trait IntoTemplate {
    /// The template.
    fn into_template(self) -> TypeTemplate;
}

impl IntoTemplate for TypeTemplate {
    fn into_template(self) -> TypeTemplate {
        self
    }
}

fn fold_templates(
    parts: Vec<TypeTemplate>,
    combine: fn(Type, Type) -> Type,
) -> TypeTemplate {
    parts
        .into_iter()
        .rev()
        .reduce(|acc, part| {
            TypeTemplate::new(move |family| combine(part.apply(family), acc.apply(family)))
        })
        .expect("products and sums need at least two templates")
}

macro_rules! impl_template_tuples {
    ($(#[$meta:meta])* $($T:ident),*) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        impl<$($T: IntoTemplate),*> ProductTemplates for ($($T,)*) {
            fn into_product(self) -> TypeTemplate {
                let ($($T,)*) = self;
                fold_templates(vec![$($T.into_template()),*], Type::product)
            }
        }

        $(#[$meta])*
        #[allow(non_snake_case)]
        impl<$($T: IntoTemplate),*> SumTemplates for ($($T,)*) {
            fn into_sum(self) -> TypeTemplate {
                let ($($T,)*) = self;
                fold_templates(vec![$($T.into_template()),*], Type::sum)
            }
        }
    };
}

all_tuples!(impl_template_tuples, 2, 12, T);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_describe_notation() {
        let player = and((
            field("name", string()),
            field("experience", int()),
            remainder(),
        ));
        assert_eq!(
            player.describe(),
            "name: String \u{d7} experience: Int \u{d7} \u{2026}"
        );

        let entity = tagged_choice("type", [
            ("player", remainder()),
            ("monster", field("health", int())),
        ]);
        assert_eq!(
            entity.describe(),
            "TaggedChoice<type>{player \u{2192} \u{2026}, monster \u{2192} health: Int}"
        );

        assert_eq!(optional(list(double())).describe(), "Optional<List<Double>>");
        assert_eq!(or((int(), string())).describe(), "Int + String");
    }

    #[test]
    fn test_recursive_unfolds() {
        let cons = recursive("cons", |cons| {
            and((field("value", int()), optional_field("next", cons)))
        });

        let ty = cons.build();
        assert_eq!(ty.describe(), "\u{b5}cons");

        let unfolded = ty.unfold();
        assert_eq!(
            unfolded.describe(),
            "value: Int \u{d7} ?next: \u{b5}cons"
        );

        // One more level resolves to the same shape.
        let next = unfolded.get_child(1).unwrap().get_child(0).unwrap();
        assert_eq!(next.unfold().describe(), "value: Int \u{d7} ?next: \u{b5}cons");
    }
}
