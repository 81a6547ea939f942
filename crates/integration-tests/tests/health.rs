mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;
use tally_config::{AnyOrList, CorsConfig};

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let mock = MockUpstream::replying("unused").await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url()).build())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let mock = MockUpstream::replying("unused").await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url()).without_health().build())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_works_without_credential() {
    let mock = MockUpstream::replying("unused").await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url()).without_api_key().build())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn cors_headers_for_allowed_origin() {
    let mock = MockUpstream::replying("Hello").await.unwrap();
    let cors = CorsConfig {
        origins: AnyOrList::List(vec!["http://localhost:5173".to_owned()]),
        ..CorsConfig::default()
    };
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url()).with_cors(cors).build())
        .await
        .unwrap();

    let resp = server
        .client()
        .post(server.url("/api/chat"))
        .header("origin", "http://localhost:5173")
        .json(&serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}
