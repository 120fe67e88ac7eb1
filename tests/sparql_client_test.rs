//! Integration tests for SparqlClient using wiremock
//!
//! These tests validate the HTTP client's behavior with mock servers.

use quagga::sparql::{SparqlClient, SparqlEndpoint};
use quagga::utils::error::QueryError;
use quagga::utils::retry::RetryConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY: &str = "SELECT ?type WHERE { <http://dbpedia.org/resource/Photon> a ?type . }";

fn client(server: &MockServer, timeout: Duration) -> SparqlClient {
    SparqlClient::with_config(
        &format!("{}/sparql", server.uri()),
        "quagga-test/1.0",
        1000.0,
        2,
        timeout,
    )
    .unwrap()
    .with_retry(RetryConfig::with_delays(2, 1, 5))
}

/// Test JSON results are parsed into bindings
#[tokio::test]
async fn test_select_parses_bindings() {
    let mock_server = MockServer::start().await;
    let body = json!({
        "head": {"vars": ["type"]},
        "results": {"bindings": [
            {"type": {"type": "uri", "value": "http://dbpedia.org/ontology/Particle"}},
            {"type": {"type": "literal", "xml:lang": "en", "value": "boson"}}
        ]}
    });

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_param("query", QUERY))
        .and(header("accept", "application/sparql-results+json"))
        .and(header("user-agent", "quagga-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rows = client(&mock_server, Duration::from_secs(5))
        .select(QUERY)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows[0]["type"].is_uri());
    assert_eq!(rows[0]["type"].value, "http://dbpedia.org/ontology/Particle");
    assert_eq!(rows[1]["type"].lang.as_deref(), Some("en"));
}

/// Test construct queries request Turtle and return the body text
#[tokio::test]
async fn test_construct_returns_turtle() {
    let mock_server = MockServer::start().await;
    let turtle = "@prefix dbr: <http://dbpedia.org/resource/> .\n\
                  dbr:Photon <http://dbpedia.org/ontology/field> dbr:Optics .\n";

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(header("accept", "text/turtle"))
        .respond_with(ResponseTemplate::new(200).set_body_string(turtle))
        .mount(&mock_server)
        .await;

    let body = client(&mock_server, Duration::from_secs(5))
        .construct("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }")
        .await
        .unwrap();

    assert_eq!(body, turtle);
}

/// Test that server errors trigger retries
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    // Return 503 twice, then succeed
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dbr:A dbr:b dbr:C ."))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server, Duration::from_secs(5))
        .construct("CONSTRUCT {} WHERE {}")
        .await;

    assert!(result.is_ok(), "Should succeed after retries: {:?}", result.err());
}

/// Test 400 does not retry
#[tokio::test]
async fn test_bad_request_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server, Duration::from_secs(5)).select(QUERY).await;

    assert!(matches!(result, Err(QueryError::Status(400))));
}

/// Test persistent failures give up after the retry budget
#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server, Duration::from_secs(5)).select(QUERY).await;

    assert!(matches!(result, Err(QueryError::Status(502))));
}

/// Test malformed JSON is a decode failure
#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server, Duration::from_secs(5)).select(QUERY).await;

    assert!(matches!(result, Err(QueryError::Decode(_))));
}

/// Test slow responses time out without being retried
#[tokio::test]
async fn test_timeout_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // Retries are configured, but a timed-out step is not repeated
    let client = SparqlClient::with_config(
        &format!("{}/sparql", mock_server.uri()),
        "quagga-test/1.0",
        1000.0,
        2,
        Duration::from_millis(100),
    )
    .unwrap()
    .with_retry(RetryConfig::with_delays(2, 1, 5));

    let result = client.construct("CONSTRUCT {} WHERE {}").await;

    assert!(matches!(result, Err(QueryError::Timeout)));
}
