//! Versioned schemas: [`TypeId`] → [`Type`] registries with parent
//! fallback.

use std::{
    collections::BTreeMap,
    fmt,
    sync::Arc,
};

use crate::{
    error::Error,
    template::TypeTemplate,
    types::{
        Type,
        TypeId,
        TypeRegistry,
    },
    version::{
        IntoVersion,
        Version,
    },
};

/// The types known at one schema version.
///
/// Lookups fall back to the parent schema, so a version only registers the
/// types that changed. Immutable and cheap to clone once built.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    version: Version,
    parent: Option<Schema>,
    types: TypeRegistry,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("version", &self.inner.version)
            .field("types", &self.inner.types.len())
            .finish()
    }
}

impl Schema {
    /// The schema's version.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// The parent schema, if any.
    pub fn parent(&self) -> Option<&Schema> {
        self.inner.parent.as_ref()
    }

    /// Looks up a type locally, falling back to the parent chain.
    pub fn get(&self, id: &TypeId) -> Option<Type> {
        self.inner
            .types
            .get(id)
            .cloned()
            .or_else(|| self.parent().and_then(|parent| parent.get(id)))
    }

    /// Looks up a type, erroring if it is unknown to this schema and all
    /// parents.
    ///
    /// # Errors
    /// - [`Error::UnknownType`] if the id is not registered.
    pub fn require(&self, id: &TypeId) -> Result<Type, Error> {
        self.get(id).ok_or_else(|| Error::UnknownType {
            type_id: id.clone(),
            version: self.version(),
        })
    }

    /// The types registered locally at this version, in registration
    /// order.
    pub fn types(&self) -> &TypeRegistry {
        &self.inner.types
    }
}

/// The registrar handed to schema construction callbacks.
#[derive(Default)]
pub struct SchemaTypes {
    registry: TypeRegistry,
}

impl SchemaTypes {
    /// Registers a type template under an id.
    ///
    /// The evaluated type is wrapped with the id as its name so
    /// type-indexed rewrite rules can match it.
    pub fn register(&mut self, id: impl Into<TypeId>, template: TypeTemplate) {
        let id = id.into();
        let ty = template.build();
        let ty = if ty.name() == Some(id.as_str()) {
            ty
        } else {
            Type::named(id.as_str(), ty)
        };
        self.registry.register(id, ty);
    }
}

/// Builder for a [`SchemaRegistry`]. Schemas are added in ascending
/// version order; each new schema's parent is the previously added one.
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    schemas: BTreeMap<Version, Schema>,
    last: Option<Schema>,
}

impl SchemaRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema at `version`, registering its types through the
    /// callback.
    ///
    /// # Panics
    /// If the version is invalid, already registered, or not greater than
    /// the previously added version.
    pub fn schema(
        &mut self,
        version: impl IntoVersion,
        register: impl FnOnce(&mut SchemaTypes),
    ) -> &mut Self {
        let version = version.into_version().expect("invalid schema version");

        if let Some(last) = &self.last {
            assert!(
                version > last.version(),
                "schema {version} must be added after {}",
                last.version()
            );
        }

        let mut types = SchemaTypes::default();
        register(&mut types);

        let schema = Schema {
            inner: Arc::new(SchemaInner {
                version,
                parent: self.last.clone(),
                types: types.registry,
            }),
        };

        self.schemas.insert(version, schema.clone());
        self.last = Some(schema);
        self
    }

    /// Freezes the builder into an immutable registry.
    pub fn freeze(self) -> SchemaRegistry {
        SchemaRegistry {
            schemas: Arc::new(self.schemas),
        }
    }
}

/// The frozen, shareable set of schemas, ordered by version.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Arc<BTreeMap<Version, Schema>>,
}

impl SchemaRegistry {
    /// Looks up the schema at `version`.
    pub fn get(&self, version: Version) -> Option<&Schema> {
        self.schemas.get(&version)
    }

    /// Looks up the schema at `version`, erroring if unregistered.
    ///
    /// # Errors
    /// - [`Error::UnknownVersion`] if no schema exists at that version.
    pub fn require(&self, version: Version) -> Result<&Schema, Error> {
        self.get(version).ok_or(Error::UnknownVersion(version))
    }

    /// The registered versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = Version> + '_ {
        self.schemas.keys().copied()
    }

    /// The schema with the highest version, if any.
    pub fn latest(&self) -> Option<&Schema> {
        self.schemas.values().next_back()
    }

    /// The number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::template;

    #[test]
    fn test_parent_fallback() {
        let mut builder = SchemaRegistryBuilder::new();
        builder
            .schema(1, |s| {
                s.register("player", template::and((
                    template::field("name", template::string()),
                    template::remainder(),
                )));
                s.register("level", template::field("depth", template::int()));
            })
            .schema(2, |s| {
                s.register("player", template::and((
                    template::field("name", template::string()),
                    template::field("experience", template::int()),
                    template::remainder(),
                )));
            });
        let registry = builder.freeze();

        let v2 = registry.require(Version::new(2)).unwrap();
        // "level" is inherited from v1 unchanged.
        assert!(v2.get(&TypeId::new("level")).is_some());
        assert_eq!(v2.types().len(), 1);

        let err = registry.require(Version::new(3)).unwrap_err();
        assert_eq!(err, Error::UnknownVersion(Version::new(3)));
    }
}
