use datafix::{
    dynamic::Dynamic,
    ops::JsonOps,
    template,
    types::Type,
};
use serde_json::json;

fn player_type() -> Type {
    template::named(
        "player",
        template::and((
            template::field("name", template::string()),
            template::field("experience", template::int()),
            template::optional_field("level", template::int()),
            template::remainder(),
        )),
    )
    .build()
}

fn entity_type() -> Type {
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
    ])
    .build()
}

fn dynamic(value: serde_json::Value) -> Dynamic<JsonOps> {
    Dynamic::new(JsonOps, value)
}

#[test]
fn test_decode_validates_and_tracks_leftover() {
    let codec = player_type().codec();

    let (typed, leftover) = codec
        .decode(&dynamic(
            json!({"name": "Steve", "experience": 1500, "modded": true}),
        ))
        .value()
        .unwrap();

    // The typed view is the validated input; the remainder consumed the
    // unknown field, so nothing is left over.
    assert_eq!(
        typed.value().value(),
        &json!({"name": "Steve", "experience": 1500, "modded": true})
    );
    assert_eq!(leftover, json!(null));
}

#[test]
fn test_decode_missing_required_field() {
    let codec = player_type().codec();

    let err = codec.decode(&dynamic(json!({"name": "Steve"}))).err().unwrap();
    assert!(err.message().contains("experience"));
}

#[test]
fn test_decode_kind_mismatch_names_field() {
    let codec = player_type().codec();

    let err = codec
        .decode(&dynamic(json!({"name": 42, "experience": 10})))
        .err()
        .unwrap();
    assert!(err.message().contains("name"));
    assert!(err.message().contains("42"));
}

#[test]
fn test_encode_rebuilds_described_fields() {
    let codec = player_type().codec();
    let value = dynamic(json!({"name": "Steve", "experience": 1500, "modded": true}));

    let encoded = codec.encode(&value, serde_json::Value::Null).value().unwrap();
    assert_eq!(
        encoded,
        json!({"name": "Steve", "experience": 1500, "modded": true})
    );
}

#[test]
fn test_tagged_choice_unknown_tag() {
    let codec = entity_type().codec();

    let err = codec
        .decode(&dynamic(json!({"type": "dragon", "name": "x"})))
        .err()
        .unwrap();
    assert!(err.message().contains("dragon"));
    assert!(err.message().contains("player"));
    assert!(err.message().contains("monster"));
}

#[test]
fn test_tagged_choice_missing_tag() {
    let codec = entity_type().codec();

    let err = codec.decode(&dynamic(json!({"name": "x"}))).err().unwrap();
    assert!(err.message().contains("type"));
}

#[test]
fn test_tagged_choice_dispatches_case() {
    let codec = entity_type().codec();

    assert!(
        codec
            .decode(&dynamic(json!({"type": "monster", "species": "zombie"})))
            .is_ok()
    );
    // The monster case requires a species.
    assert!(
        codec
            .decode(&dynamic(json!({"type": "monster", "name": "zombie"})))
            .is_err()
    );
}

#[test]
fn test_tagged_choice_encode_writes_tag_first() {
    let codec = entity_type().codec();
    let value = dynamic(json!({"species": "zombie", "hp": 20, "type": "monster"}));

    let encoded = codec.encode(&value, serde_json::Value::Null).value().unwrap();
    let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["type", "species", "hp"]);
}

#[test]
fn test_recursive_type_decodes_nested() {
    let cons = template::recursive("cons", |cons| {
        template::and((
            template::field("value", template::int()),
            template::optional_field("next", cons),
        ))
    })
    .build();
    let codec = cons.codec();

    let ok = codec.decode(&dynamic(
        json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}}),
    ));
    assert!(ok.is_ok());

    let err = codec
        .decode(&dynamic(json!({"value": 1, "next": {"value": "two"}})))
        .err()
        .unwrap();
    assert!(err.message().contains("value"));
}

#[test]
fn test_sum_tries_both_branches() {
    let ty = template::or((
        template::field("left", template::int()),
        template::field("right", template::string()),
    ))
    .build();
    let codec = ty.codec();

    assert!(codec.decode(&dynamic(json!({"left": 1}))).is_ok());
    assert!(codec.decode(&dynamic(json!({"right": "r"}))).is_ok());

    let err = codec.decode(&dynamic(json!({"middle": 1}))).err().unwrap();
    assert!(err.message().contains("left"));
    assert!(err.message().contains("right"));
}

#[test]
fn test_finder_from_type() {
    let ty = player_type();

    let finder = ty.finder("experience").unwrap();
    let focused = finder
        .apply(&dynamic(json!({"name": "Steve", "experience": 1500})))
        .unwrap();
    assert_eq!(focused.value(), &json!(1500));

    assert!(ty.finder("unknown").is_none());
}

#[test]
fn test_get_child_walks_structure() {
    let ty = player_type();

    // named -> product(field(name), ...)
    let product = ty.get_child(0).unwrap();
    let name_field = product.get_child(0).unwrap();
    assert_eq!(name_field.describe(), "name: String");
}

#[test]
fn test_list_type_rejects_bad_element() {
    let ty = template::list(template::int()).build();
    let codec = ty.codec();

    assert!(codec.decode(&dynamic(json!([1, 2, 3]))).is_ok());

    let err = codec.decode(&dynamic(json!([1, "x"]))).err().unwrap();
    assert!(err.message().contains("element 1"));
}
