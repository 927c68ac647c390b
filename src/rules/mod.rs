//! Type-indexed rewrite rules and their combinators.
//!
//! A [`Rule`] transforms a [`Typed`] value into another. Rules declare
//! whether they apply to a given input ([`Rule::matches`]); a rule that
//! does not apply returns its input unchanged. Combinators compose rules
//! sequentially, by first match, under predicates, and along dotted paths.

use std::sync::Arc;

use crate::{
    context::Context,
    dynamic::Dynamic,
    ops::Ops,
    path::Path,
    result::DataResult,
    types::{
        Type,
        TypeId,
        Typed,
    },
};

type TransformFn<O> = Arc<dyn Fn(Dynamic<O>) -> Dynamic<O> + Send + Sync>;
type FactoryFn<O> = Arc<dyn Fn(&Dynamic<O>) -> Dynamic<O> + Send + Sync>;
type PredicateFn<O> = Arc<dyn Fn(&Dynamic<O>) -> bool + Send + Sync>;

/// A transformation over [`Typed`] values. Pure and cheap to clone.
pub struct Rule<O: Ops> {
    kind: Arc<RuleKind<O>>,
}

impl<O: Ops> Clone for Rule<O> {
    fn clone(&self) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
        }
    }
}

enum RuleKind<O: Ops> {
    Identity,
    Transform {
        target: TypeId,
        f: TransformFn<O>,
    },
    Apply {
        f: TransformFn<O>,
    },
    RenameField {
        old: String,
        new: String,
    },
    AddField {
        name: String,
        value: FactoryFn<O>,
    },
    RemoveField {
        name: String,
    },
    TransformField {
        name: String,
        f: TransformFn<O>,
    },
    MoveField {
        name: String,
        to: Path,
    },
    Sequence(Vec<Rule<O>>),
    Choice(Vec<Rule<O>>),
    Conditional {
        predicate: PredicateFn<O>,
        rule: Rule<O>,
    },
    AtPath {
        path: Path,
        rule: Rule<O>,
    },
    Batch(Vec<FieldOp<O>>),
    Guard {
        guard: Guard<O>,
        rule: Rule<O>,
    },
}

enum FieldOp<O: Ops> {
    Rename { old: String, new: String },
    Add { name: String, value: FactoryFn<O> },
    Remove { name: String },
    Transform { name: String, f: TransformFn<O> },
}

enum Guard<O: Ops> {
    FieldExists(String),
    FieldMissing(String),
    FieldEquals { name: String, expected: Dynamic<O> },
}

impl<O: Ops> Guard<O> {
    fn holds(&self, value: &Dynamic<O>) -> bool {
        match self {
            Self::FieldExists(name) => value.has(name),
            Self::FieldMissing(name) => value.is_map() && !value.has(name),
            Self::FieldEquals { name, expected } => {
                value.try_get(name).is_some_and(|entry| entry == *expected)
            }
        }
    }
}

/// The identity rule: applies to nothing, changes nothing.
pub fn identity<O: Ops>() -> Rule<O> {
    Rule::from_kind(RuleKind::Identity)
}

/// A rule that applies `f` when the input's declared type id equals
/// `target`, and is the identity otherwise.
pub fn transform<O: Ops>(
    target: impl Into<TypeId>,
    f: impl Fn(Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
) -> Rule<O> {
    Rule::from_kind(RuleKind::Transform {
        target: target.into(),
        f: Arc::new(f),
    })
}

/// Renames a top-level field, preserving its position.
pub fn rename_field<O: Ops>(old: impl Into<String>, new: impl Into<String>) -> Rule<O> {
    Rule::from_kind(RuleKind::RenameField {
        old: old.into(),
        new: new.into(),
    })
}

/// Adds a top-level field computed from the current value. Applies to
/// maps that do not already carry the field.
pub fn add_field<O: Ops>(
    name: impl Into<String>,
    value: impl Fn(&Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
) -> Rule<O> {
    Rule::from_kind(RuleKind::AddField {
        name: name.into(),
        value: Arc::new(value),
    })
}

/// Removes a top-level field.
pub fn remove_field<O: Ops>(name: impl Into<String>) -> Rule<O> {
    Rule::from_kind(RuleKind::RemoveField { name: name.into() })
}

/// Applies `f` to a top-level field if present.
pub fn transform_field<O: Ops>(
    name: impl Into<String>,
    f: impl Fn(Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
) -> Rule<O> {
    Rule::from_kind(RuleKind::TransformField {
        name: name.into(),
        f: Arc::new(f),
    })
}

/// Moves a top-level field to a dotted path, creating intermediate maps.
///
/// # Panics
/// If `to` is not a well-formed path.
pub fn move_field<O: Ops>(name: impl Into<String>, to: &str) -> Rule<O> {
    Rule::from_kind(RuleKind::MoveField {
        name: name.into(),
        to: Path::parse(to).expect("malformed path"),
    })
}

/// Applies rules left to right, each receiving the previous output.
pub fn sequence<O: Ops>(rules: impl IntoIterator<Item = Rule<O>>) -> Rule<O> {
    Rule::from_kind(RuleKind::Sequence(rules.into_iter().collect()))
}

/// Applies the first rule that matches, in declaration order. A matching
/// rule counts even when its output is structurally equal to the input.
pub fn choice<O: Ops>(rules: impl IntoIterator<Item = Rule<O>>) -> Rule<O> {
    Rule::from_kind(RuleKind::Choice(rules.into_iter().collect()))
}

/// Applies `rule` only while the predicate holds on the value.
pub fn conditional<O: Ops>(
    predicate: impl Fn(&Dynamic<O>) -> bool + Send + Sync + 'static,
    rule: Rule<O>,
) -> Rule<O> {
    Rule::from_kind(RuleKind::Conditional {
        predicate: Arc::new(predicate),
        rule,
    })
}

/// Applies `rule` to the value at a dotted path; a path miss is the
/// identity. Type-indexed rules do not match below a path.
///
/// # Panics
/// If `path` is not well-formed.
pub fn at_path<O: Ops>(path: &str, rule: Rule<O>) -> Rule<O> {
    Rule::from_kind(RuleKind::AtPath {
        path: Path::parse(path).expect("malformed path"),
        rule,
    })
}

/// Renames the field addressed by `path` to `new`.
///
/// # Panics
/// If `path` is empty or not well-formed.
pub fn rename_field_at<O: Ops>(path: &str, new: impl Into<String>) -> Rule<O> {
    let (parent, name) = split_path(path);
    Rule::from_kind(RuleKind::AtPath {
        path: parent,
        rule: rename_field(name, new),
    })
}

/// Applies `f` to the value addressed by `path`.
///
/// # Panics
/// If `path` is not well-formed.
pub fn transform_field_at<O: Ops>(
    path: &str,
    f: impl Fn(Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
) -> Rule<O> {
    Rule::from_kind(RuleKind::AtPath {
        path: Path::parse(path).expect("malformed path"),
        rule: Rule::from_kind(RuleKind::Apply { f: Arc::new(f) }),
    })
}

/// Adds the field addressed by `path`, computed from its parent map.
///
/// # Panics
/// If `path` is empty or not well-formed.
pub fn add_field_at<O: Ops>(
    path: &str,
    value: impl Fn(&Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
) -> Rule<O> {
    let (parent, name) = split_path(path);
    Rule::from_kind(RuleKind::AtPath {
        path: parent,
        rule: add_field(name, value),
    })
}

/// Removes the field addressed by `path`.
///
/// # Panics
/// If `path` is empty or not well-formed.
pub fn remove_field_at<O: Ops>(path: &str) -> Rule<O> {
    let (parent, name) = split_path(path);
    Rule::from_kind(RuleKind::AtPath {
        path: parent,
        rule: remove_field(name),
    })
}

/// Applies `rule` only when the field exists.
pub fn if_field_exists<O: Ops>(name: impl Into<String>, rule: Rule<O>) -> Rule<O> {
    Rule::from_kind(RuleKind::Guard {
        guard: Guard::FieldExists(name.into()),
        rule,
    })
}

/// Applies `rule` only when the value is a map without the field.
pub fn if_field_missing<O: Ops>(name: impl Into<String>, rule: Rule<O>) -> Rule<O> {
    Rule::from_kind(RuleKind::Guard {
        guard: Guard::FieldMissing(name.into()),
        rule,
    })
}

/// Applies `rule` only when the field equals the expected value.
pub fn if_field_equals<O: Ops>(
    name: impl Into<String>,
    expected: Dynamic<O>,
    rule: Rule<O>,
) -> Rule<O> {
    Rule::from_kind(RuleKind::Guard {
        guard: Guard::FieldEquals {
            name: name.into(),
            expected,
        },
        rule,
    })
}

/// Groups several field operations into a single pass over the map's
/// entries, avoiding one rebuild per operation.
pub fn batch<O: Ops>(build: impl FnOnce(&mut BatchBuilder<O>)) -> Rule<O> {
    let mut builder = BatchBuilder { ops: Vec::new() };
    build(&mut builder);
    Rule::from_kind(RuleKind::Batch(builder.ops))
}

fn split_path(path: &str) -> (Path, String) {
    Path::parse(path)
        .expect("malformed path")
        .split_last()
        .expect("path must address a field")
}

/// Collects field operations for [`batch`].
pub struct BatchBuilder<O: Ops> {
    ops: Vec<FieldOp<O>>,
}

impl<O: Ops> BatchBuilder<O> {
    /// Renames a field in place.
    pub fn rename(&mut self, old: impl Into<String>, new: impl Into<String>) -> &mut Self {
        self.ops.push(FieldOp::Rename {
            old: old.into(),
            new: new.into(),
        });
        self
    }

    /// Appends a field computed from the original map.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Fn(&Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
    ) -> &mut Self {
        self.ops.push(FieldOp::Add {
            name: name.into(),
            value: Arc::new(value),
        });
        self
    }

    /// Drops a field.
    pub fn remove(&mut self, name: impl Into<String>) -> &mut Self {
        self.ops.push(FieldOp::Remove { name: name.into() });
        self
    }

    /// Transforms a field's value in place.
    pub fn transform(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Dynamic<O>) -> Dynamic<O> + Send + Sync + 'static,
    ) -> &mut Self {
        self.ops.push(FieldOp::Transform {
            name: name.into(),
            f: Arc::new(f),
        });
        self
    }
}

impl<O: Ops> Rule<O> {
    fn from_kind(kind: RuleKind<O>) -> Self {
        Self {
            kind: Arc::new(kind),
        }
    }

    /// Returns `true` if this rule applies to the input.
    pub fn matches(&self, input: &Typed<O>) -> bool {
        let value = input.value();

        match &*self.kind {
            RuleKind::Identity => false,
            RuleKind::Transform { target, .. } => {
                input.type_of().name() == Some(target.as_str())
            }
            RuleKind::Apply { .. } => true,
            RuleKind::RenameField { old, .. } => value.has(old),
            RuleKind::AddField { name, .. } => value.is_map() && !value.has(name),
            RuleKind::RemoveField { name }
            | RuleKind::TransformField { name, .. }
            | RuleKind::MoveField { name, .. } => value.has(name),
            RuleKind::Sequence(rules) | RuleKind::Choice(rules) => {
                rules.iter().any(|rule| rule.matches(input))
            }
            RuleKind::Conditional { predicate, .. } => predicate(value),
            RuleKind::AtPath { path, rule } => path
                .get_in(value)
                .is_some_and(|sub| rule.matches(&Typed::new(Type::passthrough(), sub))),
            RuleKind::Batch(_) => value.is_map(),
            RuleKind::Guard { guard, .. } => guard.holds(value),
        }
    }

    /// Applies this rule. Inputs the rule does not match pass through
    /// unchanged.
    pub fn apply(&self, input: Typed<O>, ctx: &mut Context) -> Typed<O> {
        match &*self.kind {
            RuleKind::Identity => input,
            RuleKind::Transform { target, f } => {
                if input.type_of().name() == Some(target.as_str()) {
                    let label = || format!("transform({target})");
                    leaf(input, ctx, label, |value| f(value))
                } else {
                    input
                }
            }
            RuleKind::Apply { f } => {
                leaf(input, ctx, || "transform".to_owned(), |value| f(value))
            }
            RuleKind::RenameField { old, new } => {
                let label = || format!("rename_field({old} -> {new})");
                leaf(input, ctx, label, |value| value.rename_field(old, new))
            }
            RuleKind::AddField { name, value: factory } => {
                if !self.matches(&input) {
                    return input;
                }
                let label = || format!("add_field({name})");
                leaf(input, ctx, label, |value| {
                    let entry = factory(&value);
                    value.set(name, entry)
                })
            }
            RuleKind::RemoveField { name } => {
                let label = || format!("remove_field({name})");
                leaf(input, ctx, label, |value| value.remove(name))
            }
            RuleKind::TransformField { name, f } => {
                let label = || format!("transform_field({name})");
                leaf(input, ctx, label, |value| value.update(name, |entry| f(entry)))
            }
            RuleKind::MoveField { name, to } => {
                if !self.matches(&input) {
                    return input;
                }
                let label = || format!("move_field({name} -> {to})");
                leaf(input, ctx, label, |value| {
                    let moved = value.get(name);
                    to.set_in(&value.remove(name), moved)
                })
            }
            RuleKind::Sequence(rules) => rules
                .iter()
                .fold(input, |current, rule| rule.apply(current, ctx)),
            RuleKind::Choice(rules) => {
                match rules.iter().find(|rule| rule.matches(&input)) {
                    Some(rule) => rule.apply(input, ctx),
                    None => input,
                }
            }
            RuleKind::Conditional { predicate, rule } => {
                if predicate(input.value()) {
                    rule.apply(input, ctx)
                } else {
                    input
                }
            }
            RuleKind::AtPath { path, rule } => input.map_value(|value| {
                path.update_in(&value, |sub| {
                    rule.apply(Typed::new(Type::passthrough(), sub), ctx).into_value()
                })
            }),
            RuleKind::Batch(ops) => {
                if !input.value().is_map() {
                    return input;
                }
                let label = || format!("batch({} ops)", ops.len());
                leaf(input, ctx, label, |value| apply_batch(ops, &value))
            }
            RuleKind::Guard { guard, rule } => {
                if guard.holds(input.value()) {
                    rule.apply(input, ctx)
                } else {
                    input
                }
            }
        }
    }
}

/// Applies a leaf transformation, recording it when diagnostics capture
/// rule details and the value actually changed.
fn leaf<O: Ops>(
    input: Typed<O>,
    ctx: &mut Context,
    label: impl FnOnce() -> String,
    f: impl FnOnce(Dynamic<O>) -> Dynamic<O>,
) -> Typed<O> {
    if ctx.is_recording_rules() {
        let before = input.value().clone();
        let output = input.map_value(f);
        if *output.value() != before {
            ctx.record_rule(label());
        }
        output
    } else {
        input.map_value(f)
    }
}

fn apply_batch<O: Ops>(ops: &[FieldOp<O>], value: &Dynamic<O>) -> Dynamic<O> {
    let DataResult::Ok(mut entries) = value.entries() else {
        return value.clone();
    };

    for op in ops {
        match op {
            FieldOp::Rename { old, new } => {
                for (key, _) in &mut entries {
                    if key == old {
                        new.clone_into(key);
                    }
                }
            }
            FieldOp::Add { name, value: factory } => {
                if !entries.iter().any(|(key, _)| key == name) {
                    entries.push((name.clone(), factory(value)));
                }
            }
            FieldOp::Remove { name } => {
                entries.retain(|(key, _)| key != name);
            }
            FieldOp::Transform { name, f } => {
                for (key, entry) in &mut entries {
                    if key == name {
                        *entry = f(entry.clone());
                    }
                }
            }
        }
    }

    let ops_handle = value.ops();
    let rebuilt = ops_handle.create_map(
        entries
            .into_iter()
            .map(|(key, entry)| (ops_handle.create_string(&key), entry.into_value())),
    );

    match rebuilt {
        DataResult::Ok(map) => Dynamic::new(ops_handle, map),
        DataResult::Err(_) => value.clone(),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::ops::JsonOps;

    fn typed(value: serde_json::Value) -> Typed<JsonOps> {
        Typed::new(Type::passthrough(), Dynamic::new(JsonOps, value))
    }

    #[test]
    fn test_sequence_threads_output() {
        let rule = sequence([
            rename_field("playerName", "name"),
            rename_field("xp", "experience"),
        ]);

        let out = rule.apply(
            typed(json!({"playerName": "Steve", "xp": 1500})),
            &mut Context::new(),
        );
        assert_eq!(out.value().value(), &json!({"name": "Steve", "experience": 1500}));
    }

    #[test]
    fn test_choice_takes_first_match() {
        let rule = choice([
            if_field_exists("a", add_field("picked", |d| d.create_string("a"))),
            if_field_exists("b", add_field("picked", |d| d.create_string("b"))),
        ]);

        let out = rule.apply(typed(json!({"b": 1})), &mut Context::new());
        assert_eq!(out.value().value(), &json!({"b": 1, "picked": "b"}));
    }

    #[test]
    fn test_unmatched_rule_is_identity() {
        let input = typed(json!({"name": "Steve"}));
        let out = rename_field("missing", "other").apply(input.clone(), &mut Context::new());
        assert_eq!(out.value(), input.value());
    }

    #[test]
    fn test_batch_single_pass_preserves_order() {
        let rule = batch(|b| {
            b.rename("playerName", "name")
                .remove("obsolete")
                .add("level", |d| {
                    d.create_int(i32::try_from(d.get("xp").as_int().unwrap_or(0) / 100).unwrap_or(0))
                });
        });

        let out = rule.apply(
            typed(json!({"playerName": "Steve", "obsolete": true, "xp": 1500})),
            &mut Context::new(),
        );
        assert_eq!(
            out.value().value(),
            &json!({"name": "Steve", "xp": 1500, "level": 15})
        );
    }

    #[test]
    fn test_move_field_creates_intermediate_maps() {
        let rule = sequence([
            move_field("x", "position.x"),
            move_field("y", "position.y"),
        ]);

        let out = rule.apply(typed(json!({"x": 1.0, "y": 2.0})), &mut Context::new());
        assert_eq!(out.value().value(), &json!({"position": {"x": 1.0, "y": 2.0}}));
    }

    #[test]
    fn test_at_path() {
        let rule = transform_field_at("stats.xp", |d| {
            d.create_long(d.as_int().unwrap_or(0) * 2)
        });

        let out = rule.apply(typed(json!({"stats": {"xp": 10}})), &mut Context::new());
        assert_eq!(out.value().value(), &json!({"stats": {"xp": 20}}));
    }

    #[test]
    fn test_path_variants() {
        let input = json!({"stats": {"hp": 20, "mp": 5}, "junk": {"old": 1}});

        let out = rename_field_at("stats.hp", "health")
            .apply(typed(input.clone()), &mut Context::new());
        assert_eq!(
            out.value().value(),
            &json!({"stats": {"health": 20, "mp": 5}, "junk": {"old": 1}})
        );

        let out = add_field_at("stats.sp", |stats| stats.create_int(0))
            .apply(typed(input.clone()), &mut Context::new());
        assert_eq!(
            out.value().value(),
            &json!({"stats": {"hp": 20, "mp": 5, "sp": 0}, "junk": {"old": 1}})
        );

        let out = remove_field_at("junk.old").apply(typed(input.clone()), &mut Context::new());
        assert_eq!(
            out.value().value(),
            &json!({"stats": {"hp": 20, "mp": 5}, "junk": {}})
        );

        // A path miss leaves the value alone.
        let out = rename_field_at("missing.hp", "health")
            .apply(typed(input.clone()), &mut Context::new());
        assert_eq!(out.value().value(), &input);
    }

    #[test]
    fn test_guards() {
        let stamp = || add_field("migrated", |d| d.create_bool(true));

        let out = if_field_missing("migrated", stamp())
            .apply(typed(json!({"a": 1})), &mut Context::new());
        assert_eq!(out.value().value(), &json!({"a": 1, "migrated": true}));

        let already = json!({"a": 1, "migrated": false});
        let out = if_field_missing("migrated", stamp())
            .apply(typed(already.clone()), &mut Context::new());
        assert_eq!(out.value().value(), &already);
    }

    #[test]
    fn test_conditional() {
        let rule = conditional(
            |d: &Dynamic<JsonOps>| d.get("xp").as_int().unwrap_or(0) >= 100,
            remove_field("novice"),
        );

        let veteran = json!({"xp": 150, "novice": true});
        let out = rule.apply(typed(veteran), &mut Context::new());
        assert_eq!(out.value().value(), &json!({"xp": 150}));

        let novice = json!({"xp": 50, "novice": true});
        let out = rule.apply(typed(novice.clone()), &mut Context::new());
        assert_eq!(out.value().value(), &novice);
    }
}
