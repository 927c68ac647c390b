use crate::{
    dynamic::Dynamic,
    ops::Ops,
    optics::Optic,
    result::DataResult,
};

/// A locator over [`Dynamic`] values: field by name, index in list, or the
/// remainder of a map excluding known fields.
///
/// Finders attached to [`Type`](crate::types::Type)s let rules focus into
/// structures without hard-coding the tree format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finder {
    /// Focuses the named map entry.
    Field(String),
    /// Focuses the `n`-th list element.
    Index(usize),
    /// Focuses everything in a map except the excluded keys.
    Remainder {
        /// Keys that are not part of the remainder.
        excluding: Vec<String>,
    },
}

impl Finder {
    /// Focuses the named map entry.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Focuses the `index`-th list element.
    pub fn index(index: usize) -> Self {
        Self::Index(index)
    }

    /// Focuses a map's remainder, excluding the given keys.
    pub fn remainder(excluding: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Remainder {
            excluding: excluding.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolves the focus, if present.
    pub fn apply<O: Ops>(&self, input: &Dynamic<O>) -> Option<Dynamic<O>> {
        match self {
            Self::Field(name) => input.try_get(name),
            Self::Index(index) => input
                .as_list()
                .value()
                .and_then(|items| items.into_iter().nth(*index)),
            Self::Remainder { excluding } => {
                if !input.is_map() {
                    return None;
                }
                Some(
                    excluding
                        .iter()
                        .fold(input.clone(), |rest, key| rest.remove(key)),
                )
            }
        }
    }

    /// Writes a new value at the focus; a miss returns the input
    /// unchanged.
    pub fn set<O: Ops>(&self, input: &Dynamic<O>, value: Dynamic<O>) -> Dynamic<O> {
        match self {
            Self::Field(name) => {
                if input.has(name) {
                    input.set(name, value)
                } else {
                    input.clone()
                }
            }
            Self::Index(index) => {
                let Some(mut items) = input.as_list().value() else {
                    return input.clone();
                };
                if *index >= items.len() {
                    return input.clone();
                }
                items[*index] = value;
                input.create_list(items)
            }
            Self::Remainder { excluding } => {
                if !input.is_map() {
                    return input.clone();
                }
                let kept = excluding.iter().fold(Dynamic::empty_map(input.ops()), |kept, key| {
                    match input.try_get(key) {
                        Some(entry) => kept.set(key, entry),
                        None => kept,
                    }
                });
                match kept.merge(&value) {
                    DataResult::Ok(merged) => merged,
                    DataResult::Err(_) => input.clone(),
                }
            }
        }
    }

    /// This finder as an affine [`Optic`] over [`Dynamic`] values.
    pub fn optic<O: Ops>(&self) -> Optic<Dynamic<O>, Dynamic<O>> {
        let read = self.clone();
        let write = self.clone();
        Optic::affine(
            move |source: &Dynamic<O>| read.apply(source),
            move |source: &Dynamic<O>, value| write.set(source, value),
        )
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::ops::JsonOps;

    fn value() -> Dynamic<JsonOps> {
        Dynamic::new(
            JsonOps,
            json!({"name": "Steve", "x": 1.0, "y": 2.0, "items": ["a", "b"]}),
        )
    }

    #[test]
    fn test_field_and_index() {
        let v = value();
        assert_eq!(
            Finder::field("name").apply(&v).unwrap().value(),
            &json!("Steve")
        );
        let items = Finder::field("items").apply(&v).unwrap();
        assert_eq!(Finder::index(1).apply(&items).unwrap().value(), &json!("b"));
        assert!(Finder::index(5).apply(&items).is_none());
    }

    #[test]
    fn test_remainder_excludes() {
        let v = value();
        let rest = Finder::remainder(["name", "items"]).apply(&v).unwrap();
        assert_eq!(rest.value(), &json!({"x": 1.0, "y": 2.0}));
    }

    #[test]
    fn test_remainder_set_keeps_excluded() {
        let v = value();
        let finder = Finder::remainder(["name", "items"]);
        let replacement = Dynamic::new(JsonOps, json!({"z": 3.0}));
        let out = finder.set(&v, replacement);
        assert_eq!(
            out.value(),
            &json!({"name": "Steve", "items": ["a", "b"], "z": 3.0})
        );
    }
}
