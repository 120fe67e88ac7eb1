//! Worker-pool dataset pipeline
//!
//! This module implements a Producer-Consumer pattern using tokio::mpsc channels
//! to turn a list of entity URIs into triplet records concurrently.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────┐     ┌─────────────┐
//! │   Entity    │     │        Entity Workers        │     │   Record    │
//! │  Producer   │────▶│ fetch → align → corrupt      │────▶│   Buffers   │
//! └─────────────┘     └──────────────────────────────┘     └─────────────┘
//!       │                   │                                    │
//!  mpsc channel        shared rate limiter             merged after join
//!       │                   │
//!       └───────────────────┴──────── Progress/Stats
//! ```
//!
//! Workers share one SPARQL endpoint, so its rate limiter gates every query.
//! Each worker keeps its own record buffer; buffers are merged once all
//! workers have finished.
//!
//! # Example
//!
//! ```no_run
//! use quagga::config::Config;
//! use quagga::crawler::pipeline::DatasetPipeline;
//! use quagga::models::EntityList;
//! use quagga::sparql::SparqlClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let client = Arc::new(SparqlClient::from_config(&config.sparql)?);
//! let pipeline = DatasetPipeline::from_config(&config, client);
//!
//! let entities = EntityList::new(vec!["http://dbpedia.org/resource/Photon".to_string()]);
//! let output = pipeline.run(&entities).await;
//!
//! println!("Generated {} records", output.records.len());
//! # Ok(())
//! # }
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{Config, PipelineSettings};
use crate::crawler::detail::EntityDetailFetcher;
use crate::error::QuaggaErrorTrait;
use crate::llm::{TemplateAugmenter, TextAugmenter};
use crate::models::{EntityList, TripletRecord};
use crate::negative::NegativeSampler;
use crate::sparql::SparqlEndpoint;
use crate::utils::truncate_text;

// ============================================================================
// Message Types
// ============================================================================

/// Message from the producer to the entity workers
#[derive(Debug, Clone)]
pub struct EntityJob {
    /// Entity URI
    pub uri: String,

    /// Dense subject id assigned from the input order
    pub subject_id: i64,
}

/// Result message for tracking
#[derive(Debug, Clone)]
pub enum JobResult {
    /// Entity processed, possibly without any record
    Completed {
        subject_id: i64,
        uri: String,
        records: usize,
    },
    /// Entity lacked usable text or neighborhood
    Skipped {
        subject_id: i64,
        uri: String,
        reason: String,
    },
    /// Dequeued after shutdown was requested
    Cancelled { subject_id: i64 },
}

// ============================================================================
// Pipeline Statistics
// ============================================================================

/// Pipeline statistics (thread-safe)
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Entities submitted
    pub total_jobs: AtomicU64,

    /// Entities whose texts were processed
    pub processed_count: AtomicU64,

    /// Entities skipped for lack of details
    pub skipped_count: AtomicU64,

    /// Entities dropped by cancellation
    pub cancelled_count: AtomicU64,

    /// Triplet records generated
    pub record_count: AtomicU64,
}

impl PipelineStats {
    /// Create new stats counter
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_processed(&self, records: usize) {
        self.processed_count.fetch_add(1, Ordering::Relaxed);
        self.record_count.fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel(&self) {
        self.cancelled_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_jobs: self.total_jobs.load(Ordering::Relaxed),
            processed_count: self.processed_count.load(Ordering::Relaxed),
            skipped_count: self.skipped_count.load(Ordering::Relaxed),
            cancelled_count: self.cancelled_count.load(Ordering::Relaxed),
            record_count: self.record_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_jobs: u64,
    pub processed_count: u64,
    pub skipped_count: u64,
    pub cancelled_count: u64,
    pub record_count: u64,
}

impl StatsSnapshot {
    /// Entities that were never started because of cancellation or an early stop
    pub fn unstarted(&self) -> u64 {
        self.total_jobs
            .saturating_sub(self.processed_count + self.skipped_count)
    }
}

/// Records and statistics of one run
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub records: Vec<TripletRecord>,
    pub stats: StatsSnapshot,
}

// ============================================================================
// Pipeline Implementation
// ============================================================================

/// Per-entity collaborators shared by all workers
struct Stages {
    fetcher: EntityDetailFetcher,
    sampler: NegativeSampler,
    augmenter: Arc<dyn TextAugmenter>,
    primary_language: String,
    generate_associations: bool,
}

/// Concurrent dataset generation over a list of entities
pub struct DatasetPipeline {
    settings: PipelineSettings,
    stages: Arc<Stages>,
    stats: Arc<PipelineStats>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl DatasetPipeline {
    /// Build a pipeline with template augmentation from a full configuration
    pub fn from_config(config: &Config, endpoint: Arc<dyn SparqlEndpoint>) -> Self {
        PipelineBuilder::new()
            .settings(config.pipeline.clone())
            .build(
                EntityDetailFetcher::from_config(Arc::clone(&endpoint), &config.graph),
                NegativeSampler::from_config(endpoint, &config.graph),
            )
    }

    /// Process every entity and collect the generated records
    ///
    /// Never fails: entities without details are skipped, and after a
    /// shutdown request the records generated so far are still returned.
    pub async fn run(&self, entities: &EntityList) -> PipelineOutput {
        let total = entities.len() as u64;
        self.stats.total_jobs.store(total, Ordering::Relaxed);

        let workers = self.settings.workers.max(1);
        tracing::info!(total, workers, "Starting dataset pipeline");

        let (job_tx, job_rx) = mpsc::channel::<EntityJob>(self.settings.channel_buffer_size.max(1));
        let (result_tx, mut result_rx) =
            mpsc::channel::<JobResult>(self.settings.channel_buffer_size.max(1));

        let handles = self.spawn_workers(workers, job_rx, result_tx);

        // Spawn result collector
        let stats = Arc::clone(&self.stats);
        let result_handle = tokio::spawn(async move {
            while let Some(result) = result_rx.recv().await {
                match result {
                    JobResult::Completed {
                        subject_id,
                        uri,
                        records,
                    } => {
                        stats.record_processed(records);
                        tracing::debug!(subject_id, uri, records, "Entity processed");
                    }
                    JobResult::Skipped {
                        subject_id,
                        uri,
                        reason,
                    } => {
                        stats.record_skip();
                        tracing::debug!(subject_id, uri, reason, "Entity skipped");
                    }
                    JobResult::Cancelled { subject_id } => {
                        stats.record_cancel();
                        tracing::trace!(subject_id, "Entity cancelled");
                    }
                }
            }
        });

        for (subject_id, uri) in entities.with_ids() {
            if is_cancelled(&self.shutdown) {
                tracing::warn!(
                    remaining = total - subject_id as u64,
                    "Shutdown requested, no new entities will be issued"
                );
                break;
            }

            let job = EntityJob {
                uri: uri.to_string(),
                subject_id,
            };
            if job_tx.send(job).await.is_err() {
                tracing::error!("Entity channel closed");
                break;
            }
        }

        // Close job channel to signal completion
        drop(job_tx);

        let mut records = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(mut buffer) => records.append(&mut buffer),
                Err(e) => tracing::error!(error = %e, "Entity worker panicked"),
            }
        }

        let _ = result_handle.await;

        let snapshot = self.stats.snapshot();
        tracing::info!(
            processed = snapshot.processed_count,
            skipped = snapshot.skipped_count,
            cancelled = snapshot.cancelled_count,
            records = snapshot.record_count,
            "Pipeline completed"
        );

        PipelineOutput {
            records,
            stats: snapshot,
        }
    }

    /// Spawn entity worker tasks, each returning its record buffer
    fn spawn_workers(
        &self,
        workers: usize,
        job_rx: mpsc::Receiver<EntityJob>,
        result_tx: mpsc::Sender<JobResult>,
    ) -> Vec<JoinHandle<Vec<TripletRecord>>> {
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let stages = Arc::clone(&self.stages);
            let shutdown = self.shutdown.clone();
            let mut rng = match self.settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
                None => StdRng::from_entropy(),
            };

            let handle = tokio::spawn(async move {
                let mut buffer = Vec::new();

                loop {
                    let job = {
                        let mut rx = job_rx.lock().await;
                        rx.recv().await
                    };

                    let job = match job {
                        Some(j) => j,
                        None => break, // Channel closed
                    };

                    if is_cancelled(&shutdown) {
                        let _ = result_tx
                            .send(JobResult::Cancelled {
                                subject_id: job.subject_id,
                            })
                            .await;
                        continue;
                    }

                    tracing::debug!(worker_id, subject_id = job.subject_id, uri = %job.uri, "Processing entity");

                    let result = stages.process(&job, &mut rng, &mut buffer).await;
                    let _ = result_tx.send(result).await;
                }

                tracing::debug!(worker_id, records = buffer.len(), "Entity worker shutting down");
                buffer
            });

            handles.push(handle);
        }

        handles
    }

    /// Get current statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Stages {
    /// Fetch, align and corrupt one entity, appending its records to `buffer`
    async fn process(
        &self,
        job: &EntityJob,
        rng: &mut StdRng,
        buffer: &mut Vec<TripletRecord>,
    ) -> JobResult {
        let detail = match self.fetcher.fetch(&job.uri).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::debug!(
                    uri = %job.uri,
                    category = e.category().as_str(),
                    error = %e,
                    "No usable details"
                );
                return JobResult::Skipped {
                    subject_id: job.subject_id,
                    uri: job.uri.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let mut texts: Vec<(String, String)> = detail
            .multilingual_texts
            .iter()
            .map(|(lang, text)| (lang.clone(), text.clone()))
            .collect();

        if self.generate_associations {
            if let Some(primary) = detail.text(&self.primary_language) {
                let tag = format!("{}_llm_assoc", self.primary_language);
                for text in self.augmenter.associations(&detail.title, primary) {
                    texts.push((tag.clone(), text));
                }
            }
        }

        let before = buffer.len();
        for (lang, anchor_text) in texts {
            let positive_text = self.augmenter.paraphrase(&anchor_text);

            match self.sampler.sample(&anchor_text, &detail.rdf, rng).await {
                Some(negative) => buffer.push(TripletRecord {
                    anchor_text,
                    anchor_rdf: detail.rdf.clone(),
                    positive_text,
                    negative_text: negative.text,
                    negative_rdf: negative.rdf,
                    subject_uri: detail.uri.clone(),
                    subject_uri_id: job.subject_id,
                }),
                None => tracing::debug!(
                    uri = %detail.uri,
                    lang,
                    text = %truncate_text(&anchor_text, 60),
                    "No negative sample"
                ),
            }
        }

        JobResult::Completed {
            subject_id: job.subject_id,
            uri: job.uri.clone(),
            records: buffer.len() - before,
        }
    }
}

fn is_cancelled(shutdown: &Option<watch::Receiver<bool>>) -> bool {
    shutdown.as_ref().is_some_and(|rx| *rx.borrow())
}

// ============================================================================
// Pipeline Builder
// ============================================================================

/// Builder for DatasetPipeline
pub struct PipelineBuilder {
    settings: PipelineSettings,
    augmenter: Arc<dyn TextAugmenter>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl PipelineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            settings: PipelineSettings::default(),
            augmenter: Arc::new(TemplateAugmenter::default()),
            shutdown: None,
        }
    }

    /// Replace all settings at once
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set number of entity workers
    pub fn workers(mut self, count: usize) -> Self {
        self.settings.workers = count;
        self
    }

    /// Set channel buffer size
    pub fn channel_buffer_size(mut self, size: usize) -> Self {
        self.settings.channel_buffer_size = size;
        self
    }

    /// Seed the per-worker random sources
    pub fn seed(mut self, seed: u64) -> Self {
        self.settings.seed = Some(seed);
        self
    }

    /// Set the language whose comment seeds association rows
    pub fn primary_language(mut self, language: impl Into<String>) -> Self {
        self.settings.primary_language = language.into();
        self
    }

    /// Enable or disable association rows
    pub fn generate_associations(mut self, enabled: bool) -> Self {
        self.settings.generate_associations = enabled;
        self
    }

    /// Use a custom text augmenter
    pub fn augmenter(mut self, augmenter: Arc<dyn TextAugmenter>) -> Self {
        self.augmenter = augmenter;
        self
    }

    /// Stop issuing entities once the channel reads `true`
    pub fn shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Build the pipeline
    pub fn build(self, fetcher: EntityDetailFetcher, sampler: NegativeSampler) -> DatasetPipeline {
        let stages = Stages {
            fetcher,
            sampler,
            augmenter: self.augmenter,
            primary_language: self.settings.primary_language.clone(),
            generate_associations: self.settings.generate_associations,
        };

        DatasetPipeline {
            settings: self.settings,
            stages: Arc::new(stages),
            stats: PipelineStats::new(),
            shutdown: self.shutdown,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::sparql::{Binding, SparqlTerm};
    use crate::utils::error::QueryError;
    use async_trait::async_trait;

    /// Endpoint on which every entity lacks a usable comment
    struct Silent;

    #[async_trait]
    impl SparqlEndpoint for Silent {
        async fn select(&self, _query: &str) -> Result<Vec<Binding>, QueryError> {
            Ok(vec![Binding::from([(
                "comment".to_string(),
                SparqlTerm::literal("short", Some("en")),
            )])])
        }

        async fn construct(&self, _query: &str) -> Result<String, QueryError> {
            Ok(String::new())
        }
    }

    /// Endpoint on which every entity yields one record; the first comment
    /// query requests shutdown
    struct InterruptingGraph {
        shutdown: watch::Sender<bool>,
    }

    #[async_trait]
    impl SparqlEndpoint for InterruptingGraph {
        async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
            let row = |var: &str, term: SparqlTerm| Binding::from([(var.to_string(), term)]);

            if query.contains("?replacement") {
                return Ok(vec![row(
                    "replacement",
                    SparqlTerm::uri("http://dbpedia.org/resource/Newton"),
                )]);
            }
            if query.contains("a ?type") {
                return Ok(vec![row(
                    "type",
                    SparqlTerm::uri("http://dbpedia.org/ontology/Scientist"),
                )]);
            }

            self.shutdown.send_replace(true);
            let comment = format!(
                "Einstein developed the theory of relativity. {}",
                "It reshaped how physicists think about space and time. ".repeat(3)
            );
            Ok(vec![row("comment", SparqlTerm::literal(comment, Some("en")))])
        }

        async fn construct(&self, _query: &str) -> Result<String, QueryError> {
            Ok("@prefix dbo: <http://dbpedia.org/ontology/> .\n\
                @prefix dbr: <http://dbpedia.org/resource/> .\n\
                dbr:Relativity dbo:developedBy dbr:Einstein .\n"
                .to_string())
        }
    }

    fn pipeline(builder: PipelineBuilder) -> DatasetPipeline {
        let endpoint: Arc<dyn SparqlEndpoint> = Arc::new(Silent);
        let graph = GraphConfig::default();
        builder.build(
            EntityDetailFetcher::from_config(Arc::clone(&endpoint), &graph),
            NegativeSampler::from_config(endpoint, &graph),
        )
    }

    fn entities(n: usize) -> EntityList {
        EntityList::new((0..n).map(|i| format!("http://dbpedia.org/resource/E{i}")))
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = PipelineStats::new();
        stats.total_jobs.store(5, Ordering::Relaxed);
        stats.record_processed(3);
        stats.record_processed(0);
        stats.record_skip();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed_count, 2);
        assert_eq!(snapshot.record_count, 3);
        assert_eq!(snapshot.unstarted(), 2);
    }

    #[test]
    fn test_pipeline_builder() {
        let p = pipeline(PipelineBuilder::new().workers(2).channel_buffer_size(8).seed(7));
        assert_eq!(p.settings.workers, 2);
        assert_eq!(p.settings.channel_buffer_size, 8);
        assert_eq!(p.settings.seed, Some(7));
    }

    #[tokio::test]
    async fn test_entities_without_details_are_skipped() {
        let p = pipeline(PipelineBuilder::new().workers(3));
        let output = p.run(&entities(7)).await;

        assert!(output.records.is_empty());
        assert_eq!(output.stats.total_jobs, 7);
        assert_eq!(output.stats.skipped_count, 7);
    }

    #[tokio::test]
    async fn test_shutdown_mid_run_keeps_finished_records() {
        let (tx, rx) = watch::channel(false);
        let endpoint: Arc<dyn SparqlEndpoint> = Arc::new(InterruptingGraph { shutdown: tx });
        let graph = GraphConfig::default();
        let p = PipelineBuilder::new()
            .workers(1)
            .channel_buffer_size(1)
            .generate_associations(false)
            .seed(3)
            .shutdown(rx)
            .build(
                EntityDetailFetcher::from_config(Arc::clone(&endpoint), &graph),
                NegativeSampler::from_config(endpoint, &graph),
            );

        let output = p.run(&entities(6)).await;

        // The entity in flight when shutdown was requested still completes
        assert_eq!(output.stats.processed_count, 1);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.stats.record_count, 1);
        assert_eq!(output.records[0].subject_uri_id, 0);
        assert!(output.records[0].negative_text.starts_with("Newton developed"));

        // No further entity is started
        assert_eq!(output.stats.skipped_count, 0);
        assert!(output.stats.unstarted() > 0);
        let issued = output.stats.processed_count + output.stats.cancelled_count;
        assert!(issued < output.stats.total_jobs);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_issues_nothing() {
        let (tx, rx) = watch::channel(true);
        let p = pipeline(PipelineBuilder::new().shutdown(rx));
        let output = p.run(&entities(4)).await;

        assert!(output.records.is_empty());
        assert_eq!(output.stats.skipped_count + output.stats.processed_count, 0);
        assert_eq!(output.stats.unstarted(), 4);
        drop(tx);
    }
}
