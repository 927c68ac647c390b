//! [`DataFix`]: a named, versioned transformation unit.

use std::sync::Arc;

use crate::{
    context::Context,
    dynamic::Dynamic,
    ops::Ops,
    rules::Rule,
    schema::Schema,
    types::{
        Type,
        TypeId,
        Typed,
    },
    version::{
        IntoVersion,
        Version,
    },
};

/// A single migration step for one type, upgrading values from
/// `from_version` to `to_version`.
///
/// Invariant: `from_version() <= to_version()`, checked at registration.
pub trait DataFix<O: Ops>: Send + Sync {
    /// The fix's name, used in logs and reports.
    fn name(&self) -> &str;

    /// The version this fix upgrades from.
    fn from_version(&self) -> Version;

    /// The version this fix upgrades to.
    fn to_version(&self) -> Version;

    /// Transforms a value of the given type.
    fn apply(&self, type_id: &TypeId, value: Dynamic<O>, ctx: &mut Context) -> Dynamic<O>;
}

/// A fix that derives its transformation from the schemas on either side
/// of the version step, expressed as a rewrite [`Rule`].
pub trait SchemaDataFix<O: Ops>: Send + Sync {
    /// The fix's name.
    fn name(&self) -> &str;

    /// The version this fix upgrades from.
    fn from_version(&self) -> Version;

    /// The version this fix upgrades to.
    fn to_version(&self) -> Version;

    /// Builds the rewrite rule from the input and output schemas.
    fn make_rule(&self, input: &Schema, output: &Schema) -> Rule<O>;
}

/// A [`DataFix`] built from a closure.
pub struct FnFix<O: Ops> {
    name: String,
    from: Version,
    to: Version,
    apply: Arc<dyn Fn(&TypeId, Dynamic<O>, &mut Context) -> Dynamic<O> + Send + Sync>,
}

impl<O: Ops> FnFix<O> {
    /// Creates a fix from a closure.
    ///
    /// # Panics
    /// If either version is invalid.
    pub fn new(
        name: impl Into<String>,
        from: impl IntoVersion,
        to: impl IntoVersion,
        apply: impl Fn(&TypeId, Dynamic<O>, &mut Context) -> Dynamic<O> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            from: from.into_version().expect("invalid version"),
            to: to.into_version().expect("invalid version"),
            apply: Arc::new(apply),
        }
    }
}

impl<O: Ops> DataFix<O> for FnFix<O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn from_version(&self) -> Version {
        self.from
    }

    fn to_version(&self) -> Version {
        self.to
    }

    fn apply(&self, type_id: &TypeId, value: Dynamic<O>, ctx: &mut Context) -> Dynamic<O> {
        (self.apply)(type_id, value, ctx)
    }
}

/// A [`SchemaDataFix`] built from a rule-producing closure.
pub struct RuleFix<O: Ops> {
    name: String,
    from: Version,
    to: Version,
    make: Arc<dyn Fn(&Schema, &Schema) -> Rule<O> + Send + Sync>,
}

impl<O: Ops> RuleFix<O> {
    /// Creates a schema fix from a closure.
    ///
    /// # Panics
    /// If either version is invalid.
    pub fn new(
        name: impl Into<String>,
        from: impl IntoVersion,
        to: impl IntoVersion,
        make: impl Fn(&Schema, &Schema) -> Rule<O> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            from: from.into_version().expect("invalid version"),
            to: to.into_version().expect("invalid version"),
            make: Arc::new(make),
        }
    }
}

impl<O: Ops> SchemaDataFix<O> for RuleFix<O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn from_version(&self) -> Version {
        self.from
    }

    fn to_version(&self) -> Version {
        self.to
    }

    fn make_rule(&self, input: &Schema, output: &Schema) -> Rule<O> {
        (self.make)(input, output)
    }
}

/// Adapts a [`SchemaDataFix`] into a [`DataFix`].
///
/// Schemas and the fixed type are resolved at registration, and the rule
/// is built once, so application cannot fail on lookups.
pub(crate) struct SchemaFixAdapter<O: Ops> {
    inner: Arc<dyn SchemaDataFix<O>>,
    ty: Type,
    rule: Rule<O>,
}

impl<O: Ops> SchemaFixAdapter<O> {
    pub(crate) fn new(
        inner: Arc<dyn SchemaDataFix<O>>,
        input: &Schema,
        output: &Schema,
        ty: Type,
    ) -> Self {
        let rule = inner.make_rule(input, output);
        Self { inner, ty, rule }
    }
}

impl<O: Ops> DataFix<O> for SchemaFixAdapter<O> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn from_version(&self) -> Version {
        self.inner.from_version()
    }

    fn to_version(&self) -> Version {
        self.inner.to_version()
    }

    fn apply(&self, _type_id: &TypeId, value: Dynamic<O>, ctx: &mut Context) -> Dynamic<O> {
        self.rule
            .apply(Typed::new(self.ty.clone(), value), ctx)
            .into_value()
    }
}
