use indexmap::IndexMap;

use crate::types::{
    Type,
    TypeId,
};

/// The types registered for a single schema version, in registration order.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: IndexMap<TypeId, Type>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any previous registration of the same
    /// id.
    pub fn register(&mut self, id: impl Into<TypeId>, ty: Type) {
        self.types.insert(id.into(), ty);
    }

    /// Looks up a type by id.
    pub fn get(&self, id: &TypeId) -> Option<&Type> {
        self.types.get(id)
    }

    /// Returns `true` if the id is registered.
    pub fn contains(&self, id: &TypeId) -> bool {
        self.types.contains_key(id)
    }

    /// Iterates registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeId, &Type)> {
        self.types.iter()
    }

    /// The number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
