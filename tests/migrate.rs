use datafix::prelude::*;
use serde_json::json;

struct GameBootstrap;

impl Bootstrap<JsonOps> for GameBootstrap {
    fn register_schemas(&self, schemas: &mut SchemaRegistryBuilder) {
        schemas.schema(1, |s| {
            s.register(
                "player",
                template::and((
                    template::field("playerName", template::string()),
                    template::field("xp", template::int()),
                    template::remainder(),
                )),
            );
            s.register(
                "unit",
                template::and((
                    template::field("name", template::string()),
                    template::field("x", template::double()),
                    template::field("y", template::double()),
                    template::field("z", template::double()),
                    template::remainder(),
                )),
            );
            s.register(
                "entity",
                template::tagged_choice("type", [
                    (
                        "player",
                        template::and((
                            template::field("name", template::string()),
                            template::remainder(),
                        )),
                    ),
                    (
                        "monster",
                        template::and((
                            template::field("species", template::string()),
                            template::remainder(),
                        )),
                    ),
                    ("item", template::remainder()),
                ]),
            );
            s.register("level", template::field("depth", template::int()));
        });
        schemas.schema(2, |s| {
            s.register(
                "player",
                template::and((
                    template::field("name", template::string()),
                    template::field("experience", template::int()),
                    template::remainder(),
                )),
            );
        });
        schemas.schema(3, |s| {
            s.register(
                "player",
                template::and((
                    template::field("name", template::string()),
                    template::field("experience", template::int()),
                    template::field("level", template::int()),
                    template::remainder(),
                )),
            );
        });
    }

    fn register_fixes(&self, fixes: &mut FixRegistrar<'_, JsonOps>) {
        fixes.register_schema_fix(
            "player",
            RuleFix::new("rename player fields", 1, 2, |_, _| {
                rules::transform("player", |value| {
                    value
                        .rename_field("playerName", "name")
                        .rename_field("xp", "experience")
                })
            }),
        );
        fixes.register_schema_fix(
            "player",
            RuleFix::new("compute player level", 2, 3, |_, _| {
                rules::add_field("level", |value| {
                    let experience = value.get("experience").as_int().unwrap_or(0);
                    value.create_long(experience / 100)
                })
            }),
        );
        fixes.register_schema_fix(
            "unit",
            RuleFix::new("group unit position", 1, 2, |_, _| {
                rules::sequence([
                    rules::move_field("x", "position.x"),
                    rules::move_field("y", "position.y"),
                    rules::move_field("z", "position.z"),
                ])
            }),
        );
        fixes.register_schema_fix(
            "entity",
            RuleFix::new("monster loot tables", 1, 2, |_, _| {
                rules::if_field_equals(
                    "type",
                    Dynamic::new(JsonOps, json!("monster")),
                    rules::add_field("lootTable", |value| {
                        let species = value.get("species").as_string().unwrap_or_default();
                        value.create_string(&format!("loot_tables/{species}.json"))
                    }),
                )
            }),
        );
    }
}

fn fixer() -> DataFixer<JsonOps> {
    DataFixerFactory::create(3, &GameBootstrap).expect("bootstrap is valid")
}

fn tagged(type_id: &str, value: serde_json::Value) -> TaggedDynamic<JsonOps> {
    Dynamic::new(JsonOps, value).tag(type_id)
}

#[test]
fn test_rename_fields() {
    let fixer = fixer();

    let out = fixer
        .update(
            tagged("player", json!({"playerName": "Steve", "xp": 1500})),
            1,
            2,
            &mut Context::new(),
        )
        .unwrap();

    assert_eq!(out.value().value(), &json!({"name": "Steve", "experience": 1500}));
}

#[test]
fn test_multi_step_chain_with_compute() {
    let fixer = fixer();

    let out = fixer
        .update(
            tagged("player", json!({"playerName": "Steve", "xp": 1500})),
            1,
            3,
            &mut Context::new(),
        )
        .unwrap();

    assert_eq!(
        out.value().value(),
        &json!({"name": "Steve", "experience": 1500, "level": 15})
    );
}

#[test]
fn test_noop_at_current_version() {
    let fixer = fixer();
    let input = tagged("player", json!({"name": "Bob", "experience": 3000, "level": 30}));

    let out = fixer.update(input.clone(), 3, 3, &mut Context::new()).unwrap();

    assert_eq!(out, input);
}

#[test]
fn test_nesting_restructure() {
    let fixer = fixer();

    let out = fixer
        .update(
            tagged(
                "unit",
                json!({"name": "Steve", "x": 100.5, "y": 64.0, "z": -200.25}),
            ),
            1,
            2,
            &mut Context::new(),
        )
        .unwrap();

    assert_eq!(
        out.value().value(),
        &json!({"name": "Steve", "position": {"x": 100.5, "y": 64.0, "z": -200.25}})
    );
}

#[test]
fn test_tagged_choice_dispatch() {
    let fixer = fixer();

    let player = json!({"type": "player", "name": "Steve", "level": 10});
    let out = fixer
        .update(tagged("entity", player.clone()), 1, 2, &mut Context::new())
        .unwrap();
    assert_eq!(out.value().value(), &player);

    let out = fixer
        .update(
            tagged(
                "entity",
                json!({"type": "monster", "species": "zombie", "health": 20, "damage": 3}),
            ),
            1,
            2,
            &mut Context::new(),
        )
        .unwrap();
    assert_eq!(
        out.value().value(),
        &json!({
            "type": "monster",
            "species": "zombie",
            "health": 20,
            "damage": 3,
            "lootTable": "loot_tables/zombie.json",
        })
    );

    let item = json!({"type": "item", "itemId": "diamond", "count": 64});
    let out = fixer
        .update(tagged("entity", item.clone()), 1, 2, &mut Context::new())
        .unwrap();
    assert_eq!(out.value().value(), &item);
}

#[test]
fn test_monotonicity() {
    let fixer = fixer();
    let input = tagged("player", json!({"playerName": "Steve", "xp": 1500}));

    let direct = fixer.update(input.clone(), 1, 3, &mut Context::new()).unwrap();

    let stepped = fixer.update(input, 1, 2, &mut Context::new()).unwrap();
    let stepped = fixer.update(stepped, 2, 3, &mut Context::new()).unwrap();

    assert_eq!(direct, stepped);
}

#[test]
fn test_empty_chain_is_noop() {
    let fixer = fixer();

    // "level" has schemas but no fixes at all.
    let input = tagged("level", json!({"depth": 12}));
    let out = fixer.update(input.clone(), 1, 3, &mut Context::new()).unwrap();
    assert_eq!(out, input);

    // An unregistered type passes through untouched as well.
    let input = tagged("chunk", json!({"blocks": []}));
    let out = fixer.update(input.clone(), 1, 3, &mut Context::new()).unwrap();
    assert_eq!(out, input);
}

#[test]
fn test_backward_migration_is_an_error() {
    let fixer = fixer();

    let err = fixer
        .update(
            tagged("player", json!({"name": "Bob"})),
            3,
            1,
            &mut Context::new(),
        )
        .unwrap_err();

    assert_eq!(err, Error::BackwardMigration {
        from: Version::new(3),
        to: Version::new(1),
    });
}

#[test]
fn test_update_to_current() {
    let fixer = fixer();
    assert_eq!(fixer.current_version(), Version::new(3));

    let out = fixer
        .update_to_current(
            tagged("player", json!({"playerName": "Steve", "xp": 200})),
            1,
            &mut Context::new(),
        )
        .unwrap();

    assert_eq!(
        out.value().value(),
        &json!({"name": "Steve", "experience": 200, "level": 2})
    );
}

#[test]
fn test_schema_fix_for_unknown_type_fails_at_create() {
    struct BadBootstrap;

    impl Bootstrap<JsonOps> for BadBootstrap {
        fn register_schemas(&self, schemas: &mut SchemaRegistryBuilder) {
            schemas.schema(1, |s| {
                s.register("player", template::remainder());
            });
            schemas.schema(2, |_| {});
        }

        fn register_fixes(&self, fixes: &mut FixRegistrar<'_, JsonOps>) {
            fixes.register_schema_fix(
                "ghost",
                RuleFix::new("fix for unregistered type", 1, 2, |_, _| rules::identity()),
            );
        }
    }

    let err = DataFixerFactory::create(2, &BadBootstrap).unwrap_err();
    assert_eq!(err, Error::UnknownType {
        type_id: TypeId::new("ghost"),
        version: Version::new(1),
    });
}

#[test]
fn test_schema_fix_for_unknown_version_fails_at_create() {
    struct BadBootstrap;

    impl Bootstrap<JsonOps> for BadBootstrap {
        fn register_schemas(&self, schemas: &mut SchemaRegistryBuilder) {
            schemas.schema(1, |s| {
                s.register("player", template::remainder());
            });
        }

        fn register_fixes(&self, fixes: &mut FixRegistrar<'_, JsonOps>) {
            fixes.register_schema_fix(
                "player",
                RuleFix::new("fix into the void", 1, 9, |_, _| rules::identity()),
            );
        }
    }

    let err = DataFixerFactory::create(9, &BadBootstrap).unwrap_err();
    assert_eq!(err, Error::UnknownVersion(Version::new(9)));
}

#[test]
fn test_plain_data_fix() {
    struct PlainBootstrap;

    impl Bootstrap<JsonOps> for PlainBootstrap {
        fn register_schemas(&self, schemas: &mut SchemaRegistryBuilder) {
            schemas.schema(1, |s| {
                s.register("save", template::remainder());
            });
            schemas.schema(2, |_| {});
        }

        fn register_fixes(&self, fixes: &mut FixRegistrar<'_, JsonOps>) {
            fixes.register(
                "save",
                FnFix::new("stamp format marker", 1, 2, |_, value, ctx: &mut Context| {
                    ctx.warn("legacy save encountered");
                    let marker = value.create_int(2);
                    value.set("format", marker)
                }),
            );
        }
    }

    let fixer = DataFixerFactory::create(2, &PlainBootstrap).unwrap();
    let mut ctx = Context::with_diagnostics(DiagnosticOptions::default());

    let out = fixer
        .update(tagged("save", json!({"world": "overworld"})), 1, 2, &mut ctx)
        .unwrap();

    assert_eq!(out.value().value(), &json!({"world": "overworld", "format": 2}));

    let report = ctx.take_report().unwrap();
    assert_eq!(report.warnings, ["legacy save encountered"]);
}

#[test]
fn test_diagnostics_report() {
    let fixer = fixer();
    let mut ctx = Context::with_diagnostics(
        DiagnosticOptions::default().with_snapshots().with_pretty_snapshots(),
    );

    fixer
        .update(
            tagged("player", json!({"playerName": "Steve", "xp": 1500})),
            1,
            3,
            &mut ctx,
        )
        .unwrap();

    let report = ctx.take_report().unwrap();
    println!("{}", report.render());

    assert_eq!(report.type_id, TypeId::new("player"));
    assert_eq!(report.from, Version::new(1));
    assert_eq!(report.to, Version::new(3));
    assert_eq!(report.fixes.len(), 2);
    assert_eq!(report.fixes[0].name, "rename player fields");
    assert_eq!(report.fixes[0].rules_applied, ["transform(player)"]);
    assert_eq!(report.fixes[1].rules_applied, ["add_field(level)"]);
    assert!(report.touched_types.contains(&TypeId::new("player")));

    let after = report.after.as_deref().unwrap();
    assert!(after.contains("\"level\": 15"));
    assert_eq!(
        report.before.as_deref().unwrap(),
        report.fixes[0].before.as_deref().unwrap()
    );
}

#[test]
fn test_report_serializes() -> anyhow::Result<()> {
    let fixer = fixer();
    let mut ctx = Context::with_diagnostics(DiagnosticOptions::default().with_snapshots());

    fixer.update(
        tagged("player", json!({"playerName": "Steve", "xp": 1500})),
        1,
        3,
        &mut ctx,
    )?;

    let report = ctx.take_report().expect("diagnostics were enabled");
    let exported = serde_json::to_value(&report)?;

    assert_eq!(exported["type_id"], json!("player"));
    assert_eq!(exported["from"], json!(1));
    assert_eq!(exported["to"], json!(3));
    assert_eq!(exported["fixes"][0]["name"], json!("rename player fields"));
    Ok(())
}

#[test]
fn test_snapshot_truncation() {
    let fixer = fixer();
    let mut ctx = Context::with_diagnostics(
        DiagnosticOptions::default()
            .with_snapshots()
            .with_max_snapshot_length(16),
    );

    fixer
        .update(
            tagged("player", json!({"playerName": "Steve", "xp": 1500})),
            1,
            2,
            &mut ctx,
        )
        .unwrap();

    let report = ctx.take_report().unwrap();
    let before = report.before.as_deref().unwrap();
    assert!(before.chars().count() <= 17, "snapshot too long: {before}");
    assert!(before.ends_with('\u{2026}'));
}
