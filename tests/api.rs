use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use blog_api::{app, AppState, BlogModel, MemoryGateway};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    test_app_with_limit(1024 * 1024)
}

fn test_app_with_limit(max_body_bytes: usize) -> Router {
    let model = BlogModel::new("blog");
    let gateway = Arc::new(MemoryGateway::new(model.clone()));
    app(AppState::new(gateway, model), max_body_bytes)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    send_request(app, builder.body(body).unwrap()).await
}

async fn send_request(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_post(app: &Router, body: Value) -> Value {
    let (status, res) = send(app, "POST", "/api/v1/posts", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", res);
    res["data"]["data"].clone()
}

#[tokio::test]
async fn health_ready_version() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    let (status, body) = send(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "blog-api");
}

#[tokio::test]
async fn post_lifecycle() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/v1/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "All posts", "data": []}));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/posts",
        Some(json!({"title": "First", "content": "Hello", "image": "https://img.example/1.png", "category": "news"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Post created successfully");
    assert_eq!(body["data"]["created"], true);
    let post = &body["data"]["data"];
    assert_eq!(post["id"], 1);
    assert_eq!(post["title"], "First");
    assert_eq!(post["categoryID"], 1);
    assert_eq!(post["category"]["name"], "news");
    assert!(post["createdAt"].is_string());

    let (status, body) = send(&app, "GET", "/api/v1/posts/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post ID: 1");
    assert_eq!(body["data"]["content"], "Hello");
    assert_eq!(body["data"]["category"]["id"], 1);

    let (status, body) = send(&app, "PUT", "/api/v1/posts/1", Some(json!({"title": "Renamed", "category": "tech"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post edited successfully");
    assert_eq!(body["data"]["edited"], true);
    assert_eq!(body["data"]["data"]["title"], "Renamed");
    assert_eq!(body["data"]["data"]["content"], "Hello");
    assert_eq!(body["data"]["data"]["category"]["name"], "tech");

    let (status, body) = send(&app, "GET", "/api/v1/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "DELETE", "/api/v1/posts/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"deleted": true}));

    let (status, body) = send(&app, "GET", "/api/v1/posts/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn body_alias_and_existing_category_id() {
    let app = test_app();
    let first = create_post(&app, json!({"title": "a", "body": "via body", "category": "rust"})).await;
    assert_eq!(first["content"], "via body");

    let second = create_post(&app, json!({"title": "b", "content": "c", "categoryID": 1})).await;
    assert_eq!(second["categoryID"], 1);

    let third = create_post(&app, json!({"title": "c", "content": "c", "category": "rust"})).await;
    assert_eq!(third["categoryID"], 1);

    let (_, cats) = send(&app, "GET", "/api/v1/categories", None).await;
    assert_eq!(cats["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_validation_errors() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/v1/posts", Some(json!({"image": "nope"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "content", "image", "category"]);

    let (status, body) = send(&app, "POST", "/api/v1/posts", Some(json!({"title": "t", "content": "c", "category": 42}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "category");

    let (status, _) = send(&app, "POST", "/api/v1/posts", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/posts")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (_, posts) = send(&app, "GET", "/api/v1/posts", None).await;
    assert!(posts["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn edit_and_delete_missing_post() {
    let app = test_app();
    let (status, body) = send(&app, "PATCH", "/api/v1/posts/7", Some(json!({"title": "x", "category": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post doesn't exist");
    assert_eq!(body["error"]["details"], json!({"edited": false}));

    let (_, cats) = send(&app, "GET", "/api/v1/categories", None).await;
    assert!(cats["data"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "DELETE", "/api/v1/posts/7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"], json!({"deleted": false}));
}

#[tokio::test]
async fn edit_requires_fields() {
    let app = test_app();
    create_post(&app, json!({"title": "a", "content": "b", "category": "c"})).await;
    let (status, body) = send(&app, "PUT", "/api/v1/posts/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "body");

    let (status, _) = send(&app, "PUT", "/api/v1/posts/1", Some(json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let app = test_app();
    for uri in ["/api/v1/posts/abc", "/api/v1/posts/0", "/api/v1/posts/-1", "/api/v1/categories/x"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn category_endpoints() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/v1/categories", Some(json!({"name": "rust"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created"], true);
    assert_eq!(body["data"]["data"]["name"], "rust");

    let (status, body) = send(&app, "POST", "/api/v1/categories", Some(json!({"name": "rust"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], false);
    assert_eq!(body["data"]["data"]["id"], 1);

    let (status, _) = send(&app, "POST", "/api/v1/categories", Some(json!({"name": "  "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    create_post(&app, json!({"title": "a", "content": "b", "category": 1})).await;

    let (status, body) = send(&app, "GET", "/api/v1/categories/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["posts"][0]["categoryID"], 1);

    let (status, body) = send(&app, "DELETE", "/api/v1/categories/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    send(&app, "DELETE", "/api/v1/posts/1", None).await;
    let (status, _) = send(&app, "DELETE", "/api/v1/categories/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "DELETE", "/api/v1/categories/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"], json!({"deleted": false}));
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = test_app_with_limit(64);
    let big = "x".repeat(1024);
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/posts",
        Some(json!({"title": "t", "content": big, "category": "c"})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn oversized_bodies_with_content_length_get_the_envelope() {
    let app = test_app_with_limit(64);
    let payload = json!({"title": "t", "content": "x".repeat(1024), "category": "c"}).to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/posts")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "payload_too_large");

    let (_, posts) = send(&app, "GET", "/api/v1/posts", None).await;
    assert!(posts["data"].as_array().unwrap().is_empty());
}
