//! Tests for the search service client.

use super::*;
use crate::config::ServiceConfig;

fn test_config() -> ServiceConfig {
    ServiceConfig {
        service: None,
        endpoint: Some("http://localhost:8080".to_string()),
        api_key: "admin-key".to_string(),
        index: "products".to_string(),
        api_version: "2020-06-30".to_string(),
    }
}

#[test]
fn test_client_from_explicit_endpoint() {
    let client = SearchClient::new(&test_config()).unwrap();
    assert_eq!(client.endpoint(), "http://localhost:8080");
}

#[test]
fn test_client_from_service_name() {
    let mut config = test_config();
    config.endpoint = None;
    config.service = Some("legacy-search".to_string());
    let client = SearchClient::new(&config).unwrap();
    assert_eq!(client.endpoint(), "https://legacy-search.search.windows.net");
}

#[test]
fn test_client_requires_an_endpoint() {
    let mut config = test_config();
    config.endpoint = None;
    config.service = None;
    assert!(SearchClient::new(&config).is_err());
}

#[test]
fn test_build_url_appends_api_version() {
    let client = SearchClient::new(&test_config()).unwrap();
    assert_eq!(
        client.url("indexes/products/docs/$count"),
        "http://localhost:8080/indexes/products/docs/$count?api-version=2020-06-30"
    );
}

#[test]
fn test_build_url_trailing_slash_endpoint() {
    let mut config = test_config();
    config.endpoint = Some("http://localhost:8080/".to_string());
    let client = SearchClient::new(&config).unwrap();
    assert_eq!(
        client.url("indexes"),
        "http://localhost:8080/indexes?api-version=2020-06-30"
    );
}

#[test]
fn test_parse_count_plain() {
    assert_eq!(parse_count("120").unwrap(), 120);
    assert_eq!(parse_count("0").unwrap(), 0);
}

#[test]
fn test_parse_count_with_bom() {
    assert_eq!(parse_count("\u{feff}42").unwrap(), 42);
}

#[test]
fn test_parse_count_with_whitespace() {
    assert_eq!(parse_count(" 7\r\n").unwrap(), 7);
}

#[test]
fn test_parse_count_garbage() {
    let err = parse_count("not-a-number").unwrap_err();
    assert!(err.to_string().contains("not a number"));
}

#[test]
fn test_handle_http_error_auth() {
    let err = handle_http_error(401, "access denied".to_string(), "http://localhost:8080");
    assert!(matches!(err, Error::Authentication(_)));
}

#[test]
fn test_handle_http_error_forbidden() {
    let err = handle_http_error(403, "forbidden".to_string(), "http://localhost:8080");
    assert!(matches!(err, Error::Authentication(_)));
}

#[test]
fn test_handle_http_error_other() {
    let err = handle_http_error(500, "internal error".to_string(), "http://localhost:8080");
    assert!(matches!(err, Error::Service { status: 500, .. }));
}

#[test]
fn test_search_request_serialization() {
    let request = SearchRequest {
        search: "*",
        top: 50,
        skip: 100,
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["search"], "*");
    assert_eq!(json["top"], 50);
    assert_eq!(json["skip"], 100);
}

#[test]
fn test_search_response_deserialization() {
    let json = r#"{"@odata.context":"ctx","value":[{"@search.score":1.0,"id":"p1","title":"T"}]}"#;
    let response: SearchResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.value.len(), 1);
    assert_eq!(response.value[0]["id"], "p1");
}

#[test]
fn test_index_action_wire_shape() {
    let mut document = Document::new();
    document.insert("id".to_string(), serde_json::json!("p1"));
    document.insert("title".to_string(), serde_json::json!("Product 1"));

    let json = serde_json::to_value(IndexAction::upload(document)).unwrap();
    assert_eq!(json["@search.action"], "upload");
    assert_eq!(json["id"], "p1");
    assert_eq!(json["title"], "Product 1");
}

#[test]
fn test_index_action_type_wire_names() {
    for (action, expected) in [
        (IndexActionType::Upload, "upload"),
        (IndexActionType::Merge, "merge"),
        (IndexActionType::MergeOrUpload, "mergeOrUpload"),
        (IndexActionType::Delete, "delete"),
    ] {
        assert_eq!(serde_json::to_value(action).unwrap(), expected);
    }
}

#[test]
fn test_index_batch_wire_shape() {
    let mut document = Document::new();
    document.insert("id".to_string(), serde_json::json!("p1"));
    let batch = IndexBatch {
        value: vec![IndexAction::upload(document)],
    };

    let json = serde_json::to_string(&batch).unwrap();
    assert!(json.starts_with(r#"{"value":[{"@search.action":"upload""#));
}

#[test]
fn test_document_preserves_field_order() {
    let json = r#"{"zebra":1,"apple":2,"mango":3}"#;
    let document: Document = serde_json::from_str(json).unwrap();
    let keys: Vec<&String> = document.keys().collect();
    assert_eq!(keys, ["zebra", "apple", "mango"]);
}
