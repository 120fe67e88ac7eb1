//! Pipeline integration tests
//!
//! Drives discovery output through the worker pool against a wiremock
//! SPARQL endpoint and materializes the records into a temporary warehouse.

use quagga::config::GraphConfig;
use quagga::crawler::{EntityDetailFetcher, PipelineBuilder};
use quagga::models::EntityList;
use quagga::negative::NegativeSampler;
use quagga::sparql::{SparqlClient, SparqlEndpoint};
use quagga::storage::{DatasetMaterializer, SqliteCatalog, TableIdentifier, WriteOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const RELATIVITY: &str = "http://dbpedia.org/resource/Theory_of_relativity";
const STUB: &str = "http://dbpedia.org/resource/Stub_article";

const EN_COMMENT: &str = "The theory of relativity usually encompasses two interrelated \
    physics theories by Einstein: special relativity and general relativity, proposed \
    and published in 1905 and 1915, respectively.";

const DE_COMMENT: &str = "Die Relativitätstheorie befasst sich mit der Struktur von Raum \
    und Zeit sowie mit dem Wesen der Gravitation. Sie wurde von Einstein in zwei \
    Schritten entwickelt, zuerst die spezielle und danach die allgemeine Theorie.";

/// Matches requests whose `query` parameter contains a substring
struct QueryContains(String);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "query" && value.contains(self.0.as_str()))
    }
}

fn query_contains(needle: impl Into<String>) -> QueryContains {
    QueryContains(needle.into())
}

fn select_body(var: &str, terms: Vec<Value>) -> Value {
    let bindings: Vec<Value> = terms.into_iter().map(|t| json!({ var: t })).collect();
    json!({
        "head": {"vars": [var]},
        "results": {"bindings": bindings}
    })
}

async fn mount_select(server: &MockServer, needle: String, body: Value) {
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_contains(needle))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_graph(server: &MockServer) {
    mount_select(
        server,
        format!("<{RELATIVITY}> rdfs:comment"),
        select_body(
            "comment",
            vec![
                json!({"type": "literal", "xml:lang": "en", "value": EN_COMMENT}),
                json!({"type": "literal", "xml:lang": "de", "value": DE_COMMENT}),
                json!({"type": "literal", "xml:lang": "fr", "value": "Trop court."}),
            ],
        ),
    )
    .await;

    mount_select(
        server,
        format!("<{STUB}> rdfs:comment"),
        select_body(
            "comment",
            vec![json!({"type": "literal", "xml:lang": "en", "value": "A stub."})],
        ),
    )
    .await;

    let turtle = "@prefix dbo: <http://dbpedia.org/ontology/> .\n\
                  @prefix dbr: <http://dbpedia.org/resource/> .\n\
                  dbr:Theory_of_relativity dbo:developedBy dbr:Einstein ;\n    \
                  dbo:field dbr:Physics .\n";
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_contains(format!("<{RELATIVITY}> ?p1 ?o1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(turtle))
        .mount(server)
        .await;

    mount_select(
        server,
        "<http://dbpedia.org/resource/Einstein> a ?type".to_string(),
        select_body(
            "type",
            vec![json!({"type": "uri", "value": "http://dbpedia.org/ontology/Scientist"})],
        ),
    )
    .await;

    mount_select(
        server,
        "?replacement a <http://dbpedia.org/ontology/Scientist>".to_string(),
        select_body(
            "replacement",
            vec![json!({"type": "uri", "value": "http://dbpedia.org/resource/Newton"})],
        ),
    )
    .await;
}

fn endpoint(server: &MockServer) -> Arc<dyn SparqlEndpoint> {
    let client = SparqlClient::with_config(
        &format!("{}/sparql", server.uri()),
        "quagga-test/1.0",
        1000.0,
        0,
        Duration::from_secs(5),
    )
    .unwrap();
    Arc::new(client)
}

#[tokio::test]
async fn test_discovered_entities_to_table() {
    let server = MockServer::start().await;
    mount_graph(&server).await;

    let endpoint = endpoint(&server);
    let graph = GraphConfig::default();
    let pipeline = PipelineBuilder::new().workers(2).seed(11).build(
        EntityDetailFetcher::from_config(Arc::clone(&endpoint), &graph),
        NegativeSampler::from_config(endpoint, &graph),
    );
    let entities = EntityList::new(vec![RELATIVITY.to_string(), STUB.to_string()]);

    let output = pipeline.run(&entities).await;

    assert_eq!(output.stats.total_jobs, 2);
    assert_eq!(output.stats.processed_count, 1);
    assert_eq!(output.stats.skipped_count, 1);
    assert_eq!(output.stats.record_count, 2);

    // Association rows never mention Einstein, so only the two comments yield records
    let mut records = output.records;
    records.sort_by(|a, b| a.anchor_text.cmp(&b.anchor_text));
    assert_eq!(records.len(), 2);

    for record in &records {
        assert_eq!(record.subject_uri, RELATIVITY);
        assert_eq!(record.subject_uri_id, 0);
        assert_eq!(
            record.positive_text,
            format!("From a different perspective, {}", record.anchor_text.to_lowercase())
        );
        assert!(record.anchor_text.contains("Einstein"));
        assert!(record.negative_text.contains("Newton"));
        assert!(!record.negative_text.contains("Einstein"));
        assert!(record.negative_rdf.contains("dbo:developedBy dbr:Newton"));
        assert!(record.anchor_rdf.contains("dbr:Einstein"));
    }
    assert_eq!(records[0].anchor_text, DE_COMMENT);
    assert_eq!(records[1].anchor_text, EN_COMMENT);

    let warehouse = TempDir::new().unwrap();
    let table = TableIdentifier::parse("dbpedia.physics_triplets_multilingual").unwrap();
    let materializer = DatasetMaterializer::new(SqliteCatalog::open(warehouse.path()).unwrap());

    let outcome = materializer.write(&records, &table).unwrap();

    assert_eq!(outcome, WriteOutcome::Written { rows: 2 });
    assert_eq!(materializer.catalog().scan(&table).unwrap(), records);
}

#[tokio::test]
async fn test_unreachable_details_are_skipped() {
    let server = MockServer::start().await;

    // Every query fails; entities are skipped rather than aborting the run
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let endpoint = endpoint(&server);
    let graph = GraphConfig::default();
    let pipeline = PipelineBuilder::new().workers(3).build(
        EntityDetailFetcher::from_config(Arc::clone(&endpoint), &graph),
        NegativeSampler::from_config(endpoint, &graph),
    );
    let entities = EntityList::new(vec![RELATIVITY.to_string(), STUB.to_string()]);

    let output = pipeline.run(&entities).await;

    assert!(output.records.is_empty());
    assert_eq!(output.stats.skipped_count, 2);
    assert_eq!(output.stats.unstarted(), 0);
}
