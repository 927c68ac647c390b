use datafix::{
    codec::{
        self,
        Codec,
        Either,
    },
    dynamic::Dynamic,
    ops::{
        JsonOps,
        Ops,
    },
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct Player {
    name: String,
    experience: i32,
}

fn player_codec() -> impl Codec<Value = Player> {
    codec::record(
        (
            codec::string().field("name"),
            codec::int().field("experience"),
        ),
        |(name, experience)| Player { name, experience },
        |player: &Player| (player.name.clone(), player.experience),
    )
}

fn dynamic(value: serde_json::Value) -> Dynamic<JsonOps> {
    Dynamic::new(JsonOps, value)
}

#[test]
fn test_record_roundtrip() {
    let codec = player_codec();
    let player = Player {
        name: "Steve".to_owned(),
        experience: 1500,
    };

    let encoded = codec
        .encode(&player, JsonOps, JsonOps.empty())
        .value()
        .unwrap();
    assert_eq!(encoded, json!({"name": "Steve", "experience": 1500}));

    let (decoded, leftover) = codec.decode(&dynamic(encoded)).value().unwrap();
    assert_eq!(decoded, player);
    assert_eq!(leftover, json!({}));
}

#[test]
fn test_record_leftover_keeps_unknown_fields() {
    let codec = player_codec();

    let (decoded, leftover) = codec
        .decode(&dynamic(
            json!({"name": "Steve", "experience": 1500, "modded": true}),
        ))
        .value()
        .unwrap();

    assert_eq!(decoded.name, "Steve");
    assert_eq!(leftover, json!({"modded": true}));
}

#[test]
fn test_kind_mismatch_surfaces_offending_value() {
    let codec = player_codec();
    let input = dynamic(json!({"name": 42, "experience": 10}));

    let err = codec.decode(&input).err().unwrap();
    assert!(err.message().contains("name"), "message: {}", err.message());
    assert!(err.message().contains("42"), "message: {}", err.message());

    // The input is untouched.
    assert_eq!(input.value(), &json!({"name": 42, "experience": 10}));
}

#[test]
fn test_missing_field() {
    let codec = player_codec();

    let err = codec.decode(&dynamic(json!({"name": "Steve"}))).err().unwrap();
    assert!(err.message().contains("experience"));
}

#[test]
fn test_optional_field_and_default() {
    let codec = codec::record(
        (
            codec::string().field("name"),
            codec::int().optional_field("level"),
            codec::int().field("health").with_default(20),
        ),
        |(name, level, health)| (name, level, health),
        |value: &(String, Option<i32>, i32)| value.clone(),
    );

    let (decoded, _) = codec.decode(&dynamic(json!({"name": "zombie"}))).value().unwrap();
    assert_eq!(decoded, ("zombie".to_owned(), None, 20));

    let (decoded, _) = codec
        .decode(&dynamic(json!({"name": "zombie", "level": 3, "health": 7})))
        .value()
        .unwrap();
    assert_eq!(decoded, ("zombie".to_owned(), Some(3), 7));
}

#[test]
fn test_list_partial_on_bad_element() {
    let codec = codec::int().list_of();

    let err = codec.decode(&dynamic(json!([1, 2, "x"]))).err().unwrap();
    assert!(err.message().contains("element 2"));
    assert_eq!(err.partial().unwrap().0, vec![1, 2]);
}

#[test]
fn test_list_roundtrip() {
    let codec = codec::long().list_of();

    let encoded = codec
        .encode(&vec![1, 2, 3], JsonOps, JsonOps.empty())
        .value()
        .unwrap();
    assert_eq!(encoded, json!([1, 2, 3]));

    let (decoded, _) = codec.decode(&dynamic(encoded)).value().unwrap();
    assert_eq!(decoded, vec![1, 2, 3]);
}

#[test]
fn test_optional_codec() {
    let codec = codec::string().optional();

    let (decoded, _) = codec.decode(&Dynamic::empty(JsonOps)).value().unwrap();
    assert_eq!(decoded, None);

    let (decoded, _) = codec.decode(&dynamic(json!("hello"))).value().unwrap();
    assert_eq!(decoded, Some("hello".to_owned()));
}

#[test]
fn test_either_prefers_left() {
    let codec = codec::either(codec::int(), codec::string());

    let (decoded, _) = codec.decode(&dynamic(json!(7))).value().unwrap();
    assert_eq!(decoded, Either::Left(7));

    let (decoded, _) = codec.decode(&dynamic(json!("seven"))).value().unwrap();
    assert_eq!(decoded, Either::Right("seven".to_owned()));

    let err = codec.decode(&dynamic(json!(true))).err().unwrap();
    assert!(err.message().contains("not a number"));
    assert!(err.message().contains("not a string"));
}

#[test]
fn test_xmap() {
    #[derive(Debug, PartialEq)]
    struct Meters(f64);

    let codec = codec::double().xmap(Meters, |m: &Meters| m.0);

    let encoded = codec
        .encode(&Meters(2.5), JsonOps, JsonOps.empty())
        .value()
        .unwrap();
    assert_eq!(encoded, json!(2.5));

    let (decoded, _) = codec.decode(&dynamic(json!(2.5))).value().unwrap();
    assert_eq!(decoded, Meters(2.5));
}

#[test]
fn test_flat_xmap_rejects_invalid() {
    use datafix::result::DataResult;

    let codec = codec::int().flat_xmap(
        |value| {
            if value >= 0 {
                DataResult::Ok(u32::try_from(value).unwrap_or_default())
            } else {
                DataResult::error(format!("negative count: {value}"))
            }
        },
        |value: &u32| DataResult::Ok(i32::try_from(*value).unwrap_or(i32::MAX)),
    );

    let (decoded, _) = codec.decode(&dynamic(json!(3))).value().unwrap();
    assert_eq!(decoded, 3_u32);

    let err = codec.decode(&dynamic(json!(-3))).err().unwrap();
    assert!(err.message().contains("negative count"));
}

#[test]
fn test_map_codec() {
    let codec = codec::map(codec::string(), codec::long());

    let (decoded, _) = codec
        .decode(&dynamic(json!({"a": 1, "b": 2})))
        .value()
        .unwrap();
    assert_eq!(decoded.get("a"), Some(&1));
    assert_eq!(decoded.get("b"), Some(&2));

    let encoded = codec
        .encode(&decoded, JsonOps, JsonOps.empty())
        .value()
        .unwrap();
    assert_eq!(encoded, json!({"a": 1, "b": 2}));
}

#[test]
fn test_pair_threads_leftover() {
    let codec = codec::pair(
        codec::string().field("name"),
        codec::int().field("count"),
    );

    // A pair of field codecs consumes both entries from the same map.
    let input = dynamic(json!({"name": "diamond", "count": 64, "extra": 1}));
    let (decoded, leftover) = codec.decode(&input).value().unwrap();
    assert_eq!(decoded, ("diamond".to_owned(), 64));
    assert_eq!(leftover, json!({"extra": 1}));
}
