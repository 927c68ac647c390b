//! The fixer runtime: bootstrap protocol, factory, and the [`DataFixer`]
//! entry point.

use std::sync::Arc;

use crate::{
    context::Context,
    diagnostics,
    dynamic::{
        Dynamic,
        TaggedDynamic,
    },
    error::Error,
    fix::{
        DataFix,
        SchemaDataFix,
        SchemaFixAdapter,
    },
    ops::Ops,
    schema::{
        SchemaRegistry,
        SchemaRegistryBuilder,
    },
    types::TypeId,
    version::{
        IntoVersion,
        Version,
    },
};

mod registry;

pub use registry::{
    FixRegistry,
    FixRegistryBuilder,
};

/// Supplies schemas and fixes to [`DataFixerFactory::create`].
pub trait Bootstrap<O: Ops> {
    /// Registers every schema version.
    fn register_schemas(&self, schemas: &mut SchemaRegistryBuilder);

    /// Registers every fix.
    fn register_fixes(&self, fixes: &mut FixRegistrar<'_, O>);
}

/// The registrar handed to [`Bootstrap::register_fixes`].
///
/// Schema fixes are resolved against the frozen [`SchemaRegistry`] at
/// registration time, so lookup problems surface from
/// [`DataFixerFactory::create`] instead of mid-migration.
pub struct FixRegistrar<'a, O: Ops> {
    builder: &'a mut FixRegistryBuilder<O>,
    schemas: &'a SchemaRegistry,
    errors: &'a mut Vec<Error>,
}

impl<O: Ops> FixRegistrar<'_, O> {
    /// Registers a plain [`DataFix`] for a type.
    ///
    /// # Panics
    /// If the fix declares `from > to`.
    pub fn register(&mut self, type_id: impl Into<TypeId>, fix: impl DataFix<O> + 'static) {
        self.builder.register(type_id.into(), Arc::new(fix));
    }

    /// Registers a [`SchemaDataFix`] for a type, resolving its schemas and
    /// the type's shape immediately.
    ///
    /// # Panics
    /// If the fix declares `from > to`.
    pub fn register_schema_fix(
        &mut self,
        type_id: impl Into<TypeId>,
        fix: impl SchemaDataFix<O> + 'static,
    ) {
        let type_id = type_id.into();

        let resolved: Result<SchemaFixAdapter<O>, Error> = (|| {
            let input = self.schemas.require(fix.from_version())?.clone();
            let output = self.schemas.require(fix.to_version())?.clone();
            let ty = input.require(&type_id)?;
            Ok(SchemaFixAdapter::new(Arc::new(fix), &input, &output, ty))
        })();

        match resolved {
            Ok(adapter) => self.builder.register(type_id, Arc::new(adapter)),
            Err(err) => self.errors.push(err),
        }
    }
}

/// Builds [`DataFixer`]s from a [`Bootstrap`].
pub struct DataFixerFactory;

impl DataFixerFactory {
    /// Drives the bootstrap, freezes both registries, and returns the
    /// fixer.
    ///
    /// # Errors
    /// - [`Error::UnknownVersion`] / [`Error::UnknownType`] if a schema
    ///   fix references a version or type that was never registered.
    /// - [`Error::InvalidVersion`] if `current_version` is invalid.
    pub fn create<O: Ops>(
        current_version: impl IntoVersion,
        bootstrap: &impl Bootstrap<O>,
    ) -> Result<DataFixer<O>, Error> {
        let current = current_version.into_version()?;

        let mut schemas = SchemaRegistryBuilder::new();
        bootstrap.register_schemas(&mut schemas);
        let schemas = schemas.freeze();

        let mut builder = FixRegistryBuilder::new();
        let mut errors = Vec::new();
        bootstrap.register_fixes(&mut FixRegistrar {
            builder: &mut builder,
            schemas: &schemas,
            errors: &mut errors,
        });

        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }

        Ok(DataFixer {
            current,
            schemas,
            fixes: Arc::new(builder.freeze()),
        })
    }
}

/// The migration entry point: a thin, freely shareable handle over the
/// frozen schema and fix registries.
pub struct DataFixer<O: Ops> {
    current: Version,
    schemas: SchemaRegistry,
    fixes: Arc<FixRegistry<O>>,
}

impl<O: Ops> std::fmt::Debug for DataFixer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFixer")
            .field("current", &self.current)
            .field("schemas", &self.schemas)
            .finish_non_exhaustive()
    }
}

impl<O: Ops> Clone for DataFixer<O> {
    fn clone(&self) -> Self {
        Self {
            current: self.current,
            schemas: self.schemas.clone(),
            fixes: Arc::clone(&self.fixes),
        }
    }
}

impl<O: Ops> DataFixer<O> {
    /// The version this fixer migrates data up to.
    pub fn current_version(&self) -> Version {
        self.current
    }

    /// The frozen schemas.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// The frozen fixes.
    pub fn fixes(&self) -> &FixRegistry<O> {
        &self.fixes
    }

    /// Rewrites a tagged value from its stored version to the target
    /// version by applying the ordered chain of applicable fixes.
    ///
    /// `from == to` returns the input untouched. When no fix for the
    /// type starts inside `(from, to]` there is nothing to do and the
    /// input passes through unchanged.
    ///
    /// # Errors
    /// - [`Error::BackwardMigration`] if `from > to`.
    /// - [`Error::InvalidVersion`] if either version is invalid.
    pub fn update(
        &self,
        tagged: TaggedDynamic<O>,
        from: impl IntoVersion,
        to: impl IntoVersion,
        ctx: &mut Context,
    ) -> Result<TaggedDynamic<O>, Error> {
        let from = from.into_version()?;
        let to = to.into_version()?;

        if from > to {
            return Err(Error::BackwardMigration { from, to });
        }
        if from == to {
            return Ok(tagged);
        }

        let (type_id, value) = tagged.into_parts();

        if !self.fixes.needs_update(&type_id, from, to) {
            return Ok(TaggedDynamic::new(type_id, value));
        }

        let chain = self.fixes.chain(&type_id, from, to);
        let options = ctx.options().cloned();
        let snapshot = |value: &Dynamic<O>| {
            options
                .as_ref()
                .filter(|options| options.capture_snapshots)
                .map(|options| diagnostics::render_snapshot(value, options))
        };

        ctx.info(&format!(
            "migrating `{type_id}` {from} -> {to} ({} fixes)",
            chain.len()
        ));

        let before = snapshot(&value);
        if let Some(collector) = ctx.collector_mut() {
            collector.begin_migration(type_id.clone(), from, to, before);
        }

        let mut current = value;
        for fix in chain {
            let before = snapshot(&current);
            if let Some(collector) = ctx.collector_mut() {
                collector.begin_fix(fix.name(), fix.from_version(), fix.to_version(), before);
            }

            current = fix.apply(&type_id, current, ctx);

            let after = snapshot(&current);
            if let Some(collector) = ctx.collector_mut() {
                collector.end_fix(after);
            }
        }

        let after = snapshot(&current);
        if let Some(collector) = ctx.collector_mut() {
            collector.end_migration(after);
        }

        Ok(TaggedDynamic::new(type_id, current))
    }

    /// Migrates a tagged value up to [`current_version`](Self::current_version).
    ///
    /// # Errors
    /// See [`update`](Self::update).
    pub fn update_to_current(
        &self,
        tagged: TaggedDynamic<O>,
        from: impl IntoVersion,
        ctx: &mut Context,
    ) -> Result<TaggedDynamic<O>, Error> {
        self.update(tagged, from, self.current, ctx)
    }
}
