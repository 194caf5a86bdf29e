use std::net::SocketAddr;

use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use clipcue_comment::{CommentApi, CommentError, GENERIC_API_ERROR, GENERIC_REQUEST_FAILED};
use clipcue_common::VideoInfo;
use serde_json::{json, Value};

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub serve");
    });
    addr
}

fn video() -> VideoInfo {
    VideoInfo {
        title: "滑板少年的一天".to_string(),
        url: "https://www.douyin.com/video/42".to_string(),
    }
}

#[tokio::test]
async fn generate_posts_title_and_url_and_returns_comment() {
    let app = Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["title"], "滑板少年的一天");
            assert_eq!(body["url"], "https://www.douyin.com/video/42");
            Json(json!({ "success": true, "comment": "这运镜我能看一天" }))
        }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(&format!("http://{addr}/api/"), None).expect("client");
    let comment = api.generate(&video()).await.expect("comment");
    assert_eq!(comment, "这运镜我能看一天");
}

#[tokio::test]
async fn generate_sends_bearer_token_when_configured() {
    let app = Router::new().route(
        "/api/generate",
        post(|headers: HeaderMap, Json(_): Json<Value>| async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            assert_eq!(auth, "Bearer ingress-token");
            Json(json!({ "success": true, "comment": "ok" }))
        }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(
        &format!("http://{addr}/api/"),
        Some("ingress-token".to_string()),
    )
    .expect("client");
    api.generate(&video()).await.expect("comment");
}

#[tokio::test]
async fn bad_status_surfaces_error_text_from_body() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "视频下载失败，请检查链接是否正确" })),
            )
        }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(&format!("http://{addr}/api/"), None).expect("client");
    let err = api.generate(&video()).await.unwrap_err();
    match err {
        CommentError::Upstream(text) => assert_eq!(text, "视频下载失败，请检查链接是否正确"),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_status_without_error_text_uses_generic_message() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "gateway blew up") }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(&format!("http://{addr}/api/"), None).expect("client");
    let err = api.generate(&video()).await.unwrap_err();
    match err {
        CommentError::Upstream(text) => assert_eq!(text, GENERIC_REQUEST_FAILED),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn declared_failure_surfaces_api_error_field() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({ "success": false, "error": "评论生成失败，请稍后再试" })) }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(&format!("http://{addr}/api/"), None).expect("client");
    let err = api.generate(&video()).await.unwrap_err();
    match err {
        CommentError::Upstream(text) => assert_eq!(text, "评论生成失败，请稍后再试"),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn declared_failure_without_text_uses_generic_message() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({ "success": false })) }),
    );
    let addr = spawn(app).await;

    let api = CommentApi::new(&format!("http://{addr}/api/"), None).expect("client");
    let err = api.generate(&video()).await.unwrap_err();
    match err {
        CommentError::Upstream(text) => assert_eq!(text, GENERIC_API_ERROR),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error_not_upstream() {
    // Nothing listens here; the connection itself fails.
    let api = CommentApi::new("http://127.0.0.1:9/api/", None).expect("client");
    let err = api.generate(&video()).await.unwrap_err();
    assert!(matches!(err, CommentError::Http(_)));
}
