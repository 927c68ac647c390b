use datafix::{
    dynamic::Dynamic,
    ops::{
        JsonOps,
        Ops,
    },
};
use serde_json::json;

#[test]
fn test_mutators_are_pure() {
    let ops = JsonOps;
    let value = json!({"name": "Steve", "xp": 1500});
    let original = value.clone();

    let _ = ops.set(&value, "level", json!(15));
    assert_eq!(value, original);

    let _ = ops.remove(&value, "xp");
    assert_eq!(value, original);

    let _ = ops.merge_to_map(&value, json!("a"), json!(1));
    assert_eq!(value, original);

    let list = json!([1, 2]);
    let list_original = list.clone();
    let _ = ops.merge_to_list(&list, json!(3));
    assert_eq!(list, list_original);
}

#[test]
fn test_set_on_non_map_creates_map() {
    let ops = JsonOps;
    let out = ops.set(&json!(42), "a", json!(1));
    assert_eq!(out, json!({"a": 1}));
}

#[test]
fn test_remove_on_non_map_is_identity() {
    let ops = JsonOps;
    assert_eq!(ops.remove(&json!(42), "a"), json!(42));
}

#[test]
fn test_merge_maps_is_right_biased() {
    let ops = JsonOps;
    let merged = ops
        .merge_maps(&json!({"a": 1, "b": 2}), &json!({"b": 9, "c": 3}))
        .value()
        .unwrap();
    assert_eq!(merged, json!({"a": 1, "b": 9, "c": 3}));
}

#[test]
fn test_merge_to_map_rejects_non_string_key() {
    let ops = JsonOps;
    let err = ops
        .merge_to_map(&json!({}), json!(1), json!("x"))
        .err()
        .unwrap();
    assert!(err.message().contains("key"));
}

#[test]
fn test_create_map_partial_on_bad_key() {
    let ops = JsonOps;
    let err = ops
        .create_map(vec![
            (json!("a"), json!(1)),
            (json!(2), json!("bad")),
            (json!("c"), json!(3)),
        ])
        .err()
        .unwrap();

    // Entries accepted before the failure survive as the partial value.
    assert_eq!(err.partial(), Some(&json!({"a": 1})));
}

#[test]
fn test_dynamic_chain_never_panics() {
    let value = Dynamic::new(JsonOps, json!({"a": {"b": 1}}));

    let missing = value.get("x").get("y").get("z");
    assert!(missing.is_empty());
    assert!(missing.as_string().is_err());
}

#[test]
fn test_convert_json_to_json_is_identity() {
    let value = Dynamic::new(
        JsonOps,
        json!({"name": "Steve", "xp": 1500, "ratio": 0.5, "tags": ["a", "b"], "alive": true}),
    );

    let converted = value.convert(JsonOps);
    assert_eq!(converted.value(), value.value());
}

#[cfg(feature = "toml")]
mod toml_interop {
    use datafix::ops::TomlOps;

    use super::*;

    #[test]
    fn test_convert_roundtrip_through_toml() {
        let value = Dynamic::new(
            JsonOps,
            json!({"name": "Steve", "xp": 1500, "ratio": 0.5, "tags": ["a", "b"], "alive": true}),
        );

        let toml = value.convert(TomlOps);
        assert!(toml.is_map());
        assert_eq!(toml.get("xp").as_int().value(), Some(1500));

        let back = toml.convert(JsonOps);
        assert_eq!(back.value(), value.value());
    }

    #[test]
    fn test_convert_preserves_field_order() {
        let value = Dynamic::new(JsonOps, json!({"z": 1, "a": 2, "m": 3}));

        let keys: Vec<String> = value
            .convert(TomlOps)
            .entries()
            .value()
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_null_is_lossy_through_toml() {
        // TOML has no null; the canonical empty value is the empty table.
        let value = Dynamic::new(JsonOps, json!({"ghost": null}));
        let back = value.convert(TomlOps).convert(JsonOps);
        assert_eq!(back.value(), &json!({"ghost": {}}));
    }
}
