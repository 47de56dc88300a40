//! Integration tests for the content writer client against a wiremock server.

use briefpress_config::WriterConfig;
use briefpress_generation::{ContentWriter, DraftRequest, GenerationError};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> WriterConfig {
    WriterConfig {
        base_url: Some(server.uri()),
        api_key: None,
        model: "content-writer-large".to_string(),
        timeout_seconds: 5,
    }
}

fn request() -> DraftRequest {
    DraftRequest {
        title: "AI Contract Review for Small Firms".to_string(),
        outline: serde_json::json!({"sections": ["intro", "workflow", "risks"]}),
        sources: vec!["https://example.com/a".to_string()],
        quality_level: "premium".to_string(),
        seo_optimization: true,
        legal_compliance: true,
        model: String::new(),
    }
}

#[tokio::test]
async fn draft_article_fills_default_model_and_parses_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/drafts"))
        .and(body_partial_json(serde_json::json!({
            "model": "content-writer-large",
            "quality_level": "premium"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": "Small firms adopting AI contract review...",
            "word_count": 2500
        })))
        .mount(&server)
        .await;

    let writer = ContentWriter::new(&config_for(&server)).expect("build client");
    let draft = writer.draft_article(request()).await.expect("draft");

    assert!(draft.body.starts_with("Small firms"));
    assert_eq!(draft.word_count, 2500);
}

#[tokio::test]
async fn empty_body_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/drafts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": "   ",
            "word_count": 0
        })))
        .mount(&server)
        .await;

    let writer = ContentWriter::new(&config_for(&server)).expect("build client");
    let err = writer.draft_article(request()).await.expect_err("should fail");

    assert!(matches!(
        err,
        GenerationError::InvalidResponse { service: "writer", .. }
    ));
}

#[tokio::test]
async fn server_error_is_surfaced_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/drafts"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let writer = ContentWriter::new(&config_for(&server)).expect("build client");
    let err = writer.draft_article(request()).await.expect_err("should fail");

    match err {
        GenerationError::ApiError { status, message, .. } => {
            assert_eq!(status, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
