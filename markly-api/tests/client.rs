use markly_api::endpoints::OrderBy;
use markly_api::request::EmptyResponse;
use markly_api::{Client, MarklyApiError, Request};
use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_id() -> Uuid {
    Uuid::from_u128(0x5c1b_2c56_4a0e_4f8c_9b1a_2f4e_8d7c_6b5a)
}

fn bookmark_json(id: u128, title: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": Uuid::from_u128(id),
        "user_id": user_id(),
        "title": title,
        "url": "https://example.com",
        "tag": "Design",
        "created_at": created_at
    })
}

#[tokio::test]
async fn test_list_sends_user_filter_and_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", format!("eq.{}", user_id()).as_str()))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            bookmark_json(2, "Newer", "2025-01-02T10:00:00+00:00"),
            bookmark_json(1, "Older", "2025-01-01T10:00:00+00:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon").bearer_auth("user-token");
    let bookmarks = client
        .send(Request::bookmarks(user_id()).list())
        .await
        .unwrap();

    assert_eq!(bookmarks.len(), 2);
    assert_eq!(bookmarks[0].title, "Newer");
    assert_eq!(bookmarks[0].tag.as_deref(), Some("Design"));
}

#[tokio::test]
async fn test_list_order_can_be_overridden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("order", "title.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon");
    let req = Request::bookmarks(user_id())
        .list()
        .order(OrderBy::ascending("title"));

    assert!(client.send(req).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_posts_row_and_asks_for_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookmarks"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "user_id": user_id(),
            "title": "Rust",
            "url": "https://www.rust-lang.org",
            "tag": "Reading"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            bookmark_json(3, "Rust", "2025-01-03T10:00:00+00:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon").bearer_auth("user-token");
    let req = Request::bookmarks(user_id())
        .create(" Rust ", "https://www.rust-lang.org ")
        .tag("Reading".to_string());

    let created = client.send(req).await.unwrap();
    assert_eq!(created[0].id, Uuid::from_u128(3));
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("id", format!("eq.{}", Uuid::from_u128(9)).as_str()))
        .and(query_param("user_id", format!("eq.{}", user_id()).as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon").bearer_auth("user-token");
    let result = client
        .send(Request::bookmarks(user_id()).delete(Uuid::from_u128(9)))
        .await
        .unwrap();

    assert_eq!(result, EmptyResponse);
}

#[tokio::test]
async fn test_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "details": null,
            "hint": null,
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon").bearer_auth("stale");
    let err = client
        .send(Request::bookmarks(user_id()).create("a", "b"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "JWT expired");
    assert!(matches!(err, MarklyApiError::Api(status, _) if status.as_u16() == 401));
}

#[tokio::test]
async fn test_send_as_uses_given_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .and(header("authorization", "Bearer per-call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(&server.uri(), "anon").bearer_auth("stored");
    let token = SecretString::from("per-call".to_string());
    let bookmarks = client
        .send_as(&token, Request::bookmarks(user_id()).list())
        .await
        .unwrap();

    assert!(bookmarks.is_empty());
}
