//! Secured API key derivation as seen by an application embedding the client.

use std::collections::BTreeMap;

use algolia_core::{
    decode_query_string, generate_secured_api_key, generate_secured_api_key_from_tag_filters, sign, Query,
    SearchClient, SecuredApiKey,
};
use serde_json::json;

fn client() -> SearchClient {
    SearchClient::with_hosts("APPID", "api-key", vec![String::from("localhost")]).expect("valid client")
}

// =============================================================================
// Query encoding
// =============================================================================

#[test]
fn encoded_queries_decode_to_the_same_parameters() {
    let queries = [
        Query::new(),
        Query::new().query("red shoes & socks"),
        Query::new()
            .filters("brand:\"Acme Corp\" AND price < 100")
            .hits_per_page(5)
            .page(2),
        Query::new()
            .attributes_to_retrieve(["name", "price"])
            .set("facetFilters", json!([["color:red", "color:blue"], "size:42"]))
            .set("aroundLatLngViaIP", true),
        Query::new().set("restrictIndices", "products,articles").set("validUntil", 1_700_000_000_u64),
    ];

    for query in queries {
        let encoded = query.to_query_string();
        let decoded = decode_query_string(&encoded).expect("well-formed query string");
        assert_eq!(decoded, query.to_string_params(), "round trip of {encoded}");
    }
}

#[test]
fn null_parameters_are_left_out() {
    let query = Query::new().query("lamp").set("filters", serde_json::Value::Null);

    assert_eq!(query.to_query_string(), "query=lamp");
    assert_eq!(decode_query_string("").expect("empty is valid"), BTreeMap::new());
}

// =============================================================================
// Derivation
// =============================================================================

#[test]
fn secured_key_embeds_a_verifiable_signature() {
    let query = Query::new().filters("visibility:public").set("validUntil", 1_900_000_000_u64);

    let key = generate_secured_api_key("parent-key", &query, Some("user 42")).expect("derive");
    let decoded = SecuredApiKey::decode(&key).expect("decodable key");

    assert_eq!(
        decoded.signature,
        sign("parent-key", &decoded.query_string).expect("sign")
    );
    assert!(decoded.verify("parent-key").expect("verify"));
    assert!(!decoded.verify("another-key").expect("verify"));

    let scope = decode_query_string(&decoded.query_string).expect("embedded query string");
    assert_eq!(scope.get("filters").map(String::as_str), Some("visibility:public"));
    assert_eq!(scope.get("userToken").map(String::as_str), Some("user 42"));
    assert_eq!(scope.get("validUntil").map(String::as_str), Some("1900000000"));
}

#[test]
fn derivation_is_deterministic() {
    let query = Query::new().tag_filters("(public,user_42)");
    let first = generate_secured_api_key("parent-key", &query, Some("42")).expect("derive");
    let second = generate_secured_api_key("parent-key", &query, Some("42")).expect("derive");
    let other_user = generate_secured_api_key("parent-key", &query, Some("43")).expect("derive");

    assert_eq!(first, second);
    assert_ne!(first, other_user);
}

#[test]
fn empty_user_token_is_ignored() {
    let query = Query::new().filters("visibility:public");

    assert_eq!(
        generate_secured_api_key("parent-key", &query, Some("")).expect("derive"),
        generate_secured_api_key("parent-key", &query, None).expect("derive")
    );
}

#[test]
fn client_delegates_to_the_signer() {
    let query = Query::new().filters("visibility:public");

    assert_eq!(
        client()
            .generate_secured_api_key("parent-key", &query, Some("u1"))
            .expect("derive"),
        generate_secured_api_key("parent-key", &query, Some("u1")).expect("derive")
    );
}

// =============================================================================
// Legacy tag-filter form
// =============================================================================

#[test]
fn plain_tag_filters_are_wrapped_as_a_query() {
    let key = generate_secured_api_key_from_tag_filters("parent-key", "(public,user_42)", Some("42"))
        .expect("derive");
    let structured = generate_secured_api_key("parent-key", &Query::new().tag_filters("(public,user_42)"), Some("42"))
        .expect("derive");

    assert_eq!(key, structured);
    let decoded = SecuredApiKey::decode(&key).expect("decodable key");
    let scope = decode_query_string(&decoded.query_string).expect("embedded query string");
    assert_eq!(scope.get("tagFilters").map(String::as_str), Some("(public,user_42)"));
}

#[test]
fn prebuilt_query_strings_are_signed_verbatim() {
    let key = client()
        .generate_secured_api_key_from_tag_filters("parent-key", "tagFilters=public&hitsPerPage=5", Some("jane doe"))
        .expect("derive");
    let decoded = SecuredApiKey::decode(&key).expect("decodable key");

    assert_eq!(
        decoded.query_string,
        "tagFilters=public&hitsPerPage=5&userToken=jane%20doe"
    );
    assert!(decoded.verify("parent-key").expect("verify"));

    let without_token = generate_secured_api_key_from_tag_filters("parent-key", "tagFilters=public", None)
        .expect("derive");
    assert_eq!(
        SecuredApiKey::decode(&without_token).expect("decodable key").query_string,
        "tagFilters=public"
    );
}

#[test]
fn garbage_keys_do_not_decode() {
    assert!(SecuredApiKey::decode("not base64!").is_err());
    assert!(SecuredApiKey::decode("c2hvcnQ=").is_err());
}
