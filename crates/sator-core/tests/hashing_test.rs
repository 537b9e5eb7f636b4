//! Tests for canonical serialization and chain digests.

use proptest::prelude::*;
use sator_core::hashing::*;
use serde_json::json;

#[test]
fn key_order_does_not_change_the_digest() {
    let a: serde_json::Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[{"q":1,"p":2}]}}"#).unwrap();
    let b: serde_json::Value = serde_json::from_str(r#"{"a":{"x":[{"p":2,"q":1}],"y":2},"b":1}"#).unwrap();
    assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
}

#[test]
fn canonical_bytes_are_compact_and_sorted() {
    let bytes = canonical_bytes(&json!({"z": 1, "a": true})).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":true,"z":1}"#);
}

#[test]
fn digest_is_64_hex_chars() {
    let h = content_hash(&json!({"k": "v"})).unwrap();
    assert_eq!(h.len(), 64);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn previous_hash_participates_in_the_digest() {
    let content = json!({"k": "v"});
    let genesis = hash_linked(&content, None).unwrap();
    let linked = hash_linked(&content, Some(&genesis)).unwrap();
    assert_ne!(genesis, linked);
    assert_eq!(genesis, hash_linked(&content, Some("")).unwrap());
}

proptest! {
    #[test]
    fn changing_any_value_changes_the_digest(key in "[a-z]{1,8}", v1 in any::<i64>(), v2 in any::<i64>()) {
        prop_assume!(v1 != v2);
        let mut a = serde_json::Map::new();
        a.insert(key.clone(), json!(v1));
        let mut b = serde_json::Map::new();
        b.insert(key, json!(v2));
        prop_assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn digest_is_deterministic(text in ".{0,64}", n in any::<u32>()) {
        let v = json!({ "text": text, "n": n });
        prop_assert_eq!(content_hash(&v).unwrap(), content_hash(&v.clone()).unwrap());
    }
}
