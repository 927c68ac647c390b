use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    fix::DataFix,
    ops::Ops,
    types::TypeId,
    version::Version,
};

type FixBuckets<O> = BTreeMap<Version, Vec<Arc<dyn DataFix<O>>>>;

/// Builder for a [`FixRegistry`]. Converted into the immutable registry by
/// [`freeze`](FixRegistryBuilder::freeze); registration afterwards is
/// impossible by construction.
pub struct FixRegistryBuilder<O: Ops> {
    fixes: IndexMap<TypeId, FixBuckets<O>>,
}

impl<O: Ops> Default for FixRegistryBuilder<O> {
    fn default() -> Self {
        Self {
            fixes: IndexMap::new(),
        }
    }
}

impl<O: Ops> FixRegistryBuilder<O> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fix for a type, keyed by the fix's starting version.
    /// Fixes sharing a starting version keep their registration order.
    ///
    /// # Panics
    /// If the fix declares `from > to`.
    pub fn register(&mut self, type_id: TypeId, fix: Arc<dyn DataFix<O>>) {
        assert!(
            fix.from_version() <= fix.to_version(),
            "fix `{}` declares an inverted version range {} -> {}",
            fix.name(),
            fix.from_version(),
            fix.to_version()
        );

        self.fixes
            .entry(type_id)
            .or_default()
            .entry(fix.from_version())
            .or_default()
            .push(fix);
    }

    /// Freezes the builder into an immutable registry.
    pub fn freeze(self) -> FixRegistry<O> {
        FixRegistry { fixes: self.fixes }
    }
}

/// The frozen set of fixes, per type and per starting version. Shared
/// read-only; lookups never block.
pub struct FixRegistry<O: Ops> {
    fixes: IndexMap<TypeId, FixBuckets<O>>,
}

impl<O: Ops> FixRegistry<O> {
    /// Returns `true` if migrating the type from `from` to `to` has any
    /// work to do.
    ///
    /// The probe scans `(from, to]`: a fix starting exactly at `from` does
    /// not by itself require migration, one starting later does.
    pub fn needs_update(&self, type_id: &TypeId, from: Version, to: Version) -> bool {
        self.fixes.get(type_id).is_some_and(|buckets| {
            buckets
                .range((Bound::Excluded(from), Bound::Included(to)))
                .any(|(_, fixes)| !fixes.is_empty())
        })
    }

    /// The ordered chain of fixes to apply when migrating the type from
    /// `from` to `to`.
    ///
    /// Application walks `[from, to]` inclusive on both sides, ordered by
    /// starting version, ties broken by registration order.
    pub fn chain(&self, type_id: &TypeId, from: Version, to: Version) -> Vec<Arc<dyn DataFix<O>>> {
        self.fixes
            .get(type_id)
            .map(|buckets| {
                buckets
                    .range(from..=to)
                    .flat_map(|(_, fixes)| fixes.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The types that have registered fixes, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeId> {
        self.fixes.keys()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        context::Context,
        fix::FnFix,
        ops::JsonOps,
    };

    fn noop(name: &str, from: u32, to: u32) -> Arc<dyn DataFix<JsonOps>> {
        Arc::new(FnFix::new(name, from, to, |_, value, _: &mut Context| value))
    }

    fn registry() -> FixRegistry<JsonOps> {
        let mut builder = FixRegistryBuilder::new();
        builder.register(TypeId::new("player"), noop("first", 1, 2));
        builder.register(TypeId::new("player"), noop("second", 2, 3));
        builder.register(TypeId::new("player"), noop("second-tie", 2, 3));
        builder.freeze()
    }

    #[test]
    fn test_probe_excludes_lower_bound() {
        let registry = registry();
        let player = TypeId::new("player");

        // A fix starting exactly at `from` is not reason enough to run.
        assert!(!registry.needs_update(&player, Version::new(2), Version::new(2)));
        assert!(registry.needs_update(&player, Version::new(1), Version::new(2)));
        assert!(!registry.needs_update(&player, Version::new(3), Version::new(9)));
    }

    #[test]
    fn test_chain_is_inclusive_and_ordered() {
        let registry = registry();
        let player = TypeId::new("player");

        let names: Vec<_> = registry
            .chain(&player, Version::new(1), Version::new(3))
            .iter()
            .map(|fix| fix.name().to_owned())
            .collect();
        assert_eq!(names, ["first", "second", "second-tie"]);

        let names: Vec<_> = registry
            .chain(&player, Version::new(2), Version::new(3))
            .iter()
            .map(|fix| fix.name().to_owned())
            .collect();
        assert_eq!(names, ["second", "second-tie"]);
    }

    #[test]
    #[should_panic(expected = "inverted version range")]
    fn test_inverted_range_panics() {
        let mut builder = FixRegistryBuilder::new();
        builder.register(TypeId::new("player"), noop("backwards", 3, 1));
    }

    #[test]
    fn test_unknown_type_has_no_chain() {
        let registry = registry();
        let level = TypeId::new("level");

        assert!(!registry.needs_update(&level, Version::new(1), Version::new(3)));
        assert!(registry.chain(&level, Version::new(1), Version::new(3)).is_empty());
    }
}
