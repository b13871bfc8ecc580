//! End-to-end CRUD tests against a mock server
//!
//! Every operation of the mock `Post` resource is executed through
//! `ResourceClient` and checked on both sides of the wire.

mod test_support;

use restmap_core::{
    Action, ApiController, Error, OperationConfig, OperationMetadata, PropertyMap, PropertyValue,
    ResourceClient,
};
use serde_json::json;
use test_support::{controller_for, fields, post_json, Post};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn text<'a>(map: &'a PropertyMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(PropertyValue::as_str)
}

#[tokio::test]
async fn test_list_returns_sequence_under_list_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mock_crud_server/posts"))
        .and(query_param("Format", "JSON"))
        .and(query_param("max", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([post_json(1, "first"), post_json(2, "second")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let result = posts.list(Some(fields(json!({"max": 2})))).await.unwrap();

    assert_eq!(result.size(), 1);
    assert_eq!(text(&result, "list[0].title"), Some("first"));
    assert_eq!(text(&result, "list[1].title"), Some("second"));
    assert!(result.get("list[2]").is_none());
}

#[tokio::test]
async fn test_create_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mock_crud_server/posts"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(header("user-agent", "Rust-SDK/1.0.0"))
        .and(header("x-test-auth", "signed"))
        .and(body_json(json!({"title": "Title", "body": "Body"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(101, "Title")))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let created = posts
        .create(fields(json!({"title": "Title", "body": "Body"})))
        .await
        .unwrap();

    assert_eq!(created.get("id").and_then(PropertyValue::as_i64), Some(101));
    assert_eq!(text(&created, "title"), Some("Title"));
}

#[tokio::test]
async fn test_read_with_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mock_crud_server/posts/1"))
        .and(query_param("expand", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(1, "first")))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let post = posts
        .read(1, Some(fields(json!({"expand": true}))))
        .await
        .unwrap();

    assert_eq!(text(&post, "title"), Some("first"));
    assert_eq!(post.get("userId").and_then(PropertyValue::as_i64), Some(1));
}

#[tokio::test]
async fn test_update_puts_remaining_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/mock_crud_server/posts/1"))
        .and(body_json(json!({"title": "updated"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(1, "updated")))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let updated = posts
        .update(fields(json!({"id": 1, "title": "updated"})))
        .await
        .unwrap();

    assert_eq!(text(&updated, "title"), Some("updated"));
}

#[tokio::test]
async fn test_delete_with_empty_body_yields_empty_map() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/mock_crud_server/posts/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let by_id = posts.delete_by_id(1).await.unwrap();
    assert!(by_id.is_empty());

    let by_map = posts.delete(fields(json!({"id": 1}))).await.unwrap();
    assert!(by_map.is_empty());
}

#[tokio::test]
async fn test_ok_with_empty_body_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let op = OperationConfig::new("/widgets", Action::Query);
    let result = controller
        .execute(&op, &OperationMetadata::new("1.0.0"), PropertyMap::new())
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_unknown_operation_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let posts = ResourceClient::new(&controller, Post::at(&server));

    let err = posts.query(None).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_header_fields_are_sent_as_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/7"))
        .and(header("X-Partner-Id", "partner-1"))
        .and(query_param("verbose", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Account": {"Listed": "True"}})))
        .expect(1)
        .mount(&server)
        .await;

    let controller: ApiController = controller_for(&server);
    let op = OperationConfig::new("/accounts/{id}", Action::Read).with_header_params(["X-Partner-Id"]);
    let mut request = PropertyMap::new();
    request
        .set("id", 7)
        .unwrap()
        .set("X-Partner-Id", "partner-1")
        .unwrap()
        .set("verbose", true)
        .unwrap();

    let result = controller
        .execute(&op, &OperationMetadata::new("1.0.0"), request)
        .await
        .unwrap();

    assert_eq!(text(&result, "Account.Listed"), Some("True"));
}

#[tokio::test]
async fn test_prepare_does_not_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let op = OperationConfig::new("/widgets", Action::Create);
    let exchange = controller
        .prepare(&op, &OperationMetadata::new("1.0.0"), fields(json!({"name": "a"})))
        .unwrap();

    assert_eq!(exchange.url.path(), "/widgets");
    assert_eq!(exchange.header("X-Test-Auth"), Some("signed"));
    assert_eq!(exchange.body_text(), r#"{"name":"a"}"#);
}
