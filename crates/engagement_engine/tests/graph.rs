use std::time::Duration;

use engagement_engine::{GraphClient, GraphErrorKind, GraphSettings, ReqwestGraphClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestGraphClient {
    let settings = GraphSettings {
        base_url: server.uri(),
        access_token: "secret-token".to_string(),
        ..GraphSettings::default()
    };
    ReqwestGraphClient::new(settings).unwrap()
}

#[tokio::test]
async fn query_one_reads_object_and_engagement() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.10/"))
        .and(query_param("id", "https://doi.org/10.1/x"))
        .and(query_param("fields", "engagement,og_object"))
        .and(query_param("access_token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "https://doi.org/10.1/x",
            "engagement": {"share_count": 3, "comment_count": 1},
            "og_object": {"id": "42", "title": "A paper", "type": "article"}
        })))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .query_one(" https://doi.org/10.1/x ")
        .await
        .unwrap();
    assert_eq!(outcome.engagement, Some(json!({"share_count": 3, "comment_count": 1})));
    assert_eq!(outcome.object.unwrap()["title"], "A paper");
    assert_eq!(outcome.error, None);
}

#[tokio::test]
async fn query_one_without_og_object_is_still_a_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.10/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "https://j.org/new",
            "engagement": {"share_count": 0}
        })))
        .mount(&server)
        .await;

    let outcome = client_for(&server).query_one("https://j.org/new").await.unwrap();
    assert_eq!(outcome.object, None);
    assert!(outcome.engagement.is_some());
}

#[tokio::test]
async fn query_many_joins_ids_and_keys_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.10/"))
        .and(query_param("ids", "https://a.org/1,https://b.org/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "https://a.org/1": {"id": "https://a.org/1", "engagement": {"share_count": 5}},
            "https://b.org/2": {"id": "https://b.org/2", "error": {"message": "not crawled"}}
        })))
        .mount(&server)
        .await;

    let ids = vec!["https://a.org/1".to_string(), " https://b.org/2".to_string()];
    let results = client_for(&server).query_many(&ids).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(
        results["https://a.org/1"].engagement,
        Some(json!({"share_count": 5}))
    );
    assert_eq!(results["https://b.org/2"].error.as_deref(), Some("not crawled"));
}

#[tokio::test]
async fn query_many_with_no_ids_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let results = client_for(&server).query_many(&[]).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn api_error_body_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.10/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "message": "(#4) Application request limit reached",
                "type": "OAuthException",
                "code": 4
            }
        })))
        .mount(&server)
        .await;

    let ids = vec!["https://a.org/1".to_string()];
    let err = client_for(&server).query_many(&ids).await.unwrap_err();
    assert_eq!(
        err.kind,
        GraphErrorKind::Api {
            code: Some(4),
            error_type: Some("OAuthException".to_string()),
        }
    );
    assert!(err.message.contains("request limit"));
}

#[tokio::test]
async fn plain_http_failure_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server).query_one("https://a.org").await.unwrap_err();
    assert_eq!(err.kind, GraphErrorKind::HttpStatus(502));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).query_one("https://a.org").await.unwrap_err();
    assert_eq!(err.kind, GraphErrorKind::MalformedResponse);
}

#[tokio::test]
async fn empty_identifier_is_rejected_locally() {
    let server = MockServer::start().await;
    let err = client_for(&server).query_one("   ").await.unwrap_err();
    assert_eq!(err.kind, GraphErrorKind::InvalidIdentifier);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let settings = GraphSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..GraphSettings::default()
    };
    let client = ReqwestGraphClient::new(settings).unwrap();
    let err = client.query_one("https://a.org").await.unwrap_err();
    assert_eq!(err.kind, GraphErrorKind::Timeout);
}
