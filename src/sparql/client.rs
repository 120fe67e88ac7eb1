//! HTTP SPARQL client with rate limiting and retries
//!
//! This module provides the production [`SparqlEndpoint`] with features including:
//! - A distinguishing User-Agent on every request
//! - A fixed-interval rate limiter shared by every caller of one client
//! - Retry with exponential backoff for transient failures
//! - A bounded wait per request, after which the query counts as failed

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::ACCEPT, Client};
use std::num::NonZeroU32;
use std::time::Duration;

use super::{Binding, SelectResponse, SparqlEndpoint};
use crate::config::SparqlConfig;
use crate::utils::error::QueryError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Accept header for tabular results
const JSON_RESULTS: &str = "application/sparql-results+json";

/// Accept header for graph results
const TURTLE: &str = "text/turtle";

/// SPARQL-over-HTTP client
///
/// Share one instance behind an `Arc` so that all workers draw from the
/// same rate limiter.
pub struct SparqlClient {
    /// HTTP client with configured timeout, user agent and compression
    client: Client,

    /// Endpoint URL
    endpoint: String,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Backoff policy for retryable failures
    retry: RetryConfig,
}

impl SparqlClient {
    /// Create a client with default user agent, timeout and retries
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidEndpoint` for a malformed URL and
    /// `QueryError::Http` if the HTTP client cannot be created
    pub fn new(endpoint: &str, requests_per_second: f64) -> Result<Self, QueryError> {
        let defaults = SparqlConfig::default();
        Self::with_config(
            endpoint,
            &defaults.user_agent,
            requests_per_second,
            defaults.max_retries,
            defaults.request_timeout(),
        )
    }

    /// Create a client from the `[sparql]` configuration section
    pub fn from_config(config: &SparqlConfig) -> Result<Self, QueryError> {
        Self::with_config(
            &config.endpoint,
            &config.user_agent,
            config.rate_limit,
            config.max_retries,
            config.request_timeout(),
        )
    }

    /// Create a client with custom configuration
    ///
    /// # Arguments
    ///
    /// * `endpoint` - SPARQL endpoint URL
    /// * `user_agent` - User-Agent header value
    /// * `requests_per_second` - Maximum request rate, fractional rates allowed
    /// * `max_retries` - Maximum number of retry attempts
    /// * `timeout` - Request timeout duration
    pub fn with_config(
        endpoint: &str,
        user_agent: &str,
        requests_per_second: f64,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        url::Url::parse(endpoint)
            .map_err(|e| QueryError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            rate_limiter: RateLimiter::direct(quota_for(requests_per_second)),
            retry: RetryConfig::new(max_retries),
        })
    }

    /// Override the backoff policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint URL this client queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a query with retries, returning the UTF-8 response body
    async fn execute(&self, query: &str, accept: &'static str) -> Result<String, QueryError> {
        with_retry_if(
            &self.retry,
            || self.send_once(query, accept),
            QueryError::is_retryable,
        )
        .await
    }

    /// One rate-limited request
    async fn send_once(&self, query: &str, accept: &'static str) -> Result<String, QueryError> {
        self.rate_limiter.until_ready().await;

        tracing::trace!(endpoint = %self.endpoint, accept, "Sending SPARQL query");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query)])
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(classify)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| QueryError::Decode(format!("response is not UTF-8: {e}")))
    }
}

#[async_trait]
impl SparqlEndpoint for SparqlClient {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
        let body = self.execute(query, JSON_RESULTS).await?;
        let parsed: SelectResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::Decode(format!("invalid JSON results: {e}")))?;
        Ok(parsed.results.bindings)
    }

    async fn construct(&self, query: &str) -> Result<String, QueryError> {
        self.execute(query, TURTLE).await
    }
}

/// Map transport errors, separating timeouts
fn classify(error: reqwest::Error) -> QueryError {
    if error.is_timeout() {
        QueryError::Timeout
    } else {
        QueryError::Http(error)
    }
}

/// Fixed-interval quota for a (possibly fractional) request rate
fn quota_for(requests_per_second: f64) -> Quota {
    let period = Duration::from_secs_f64(1.0 / requests_per_second.max(0.001));
    Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SparqlClient::new("https://dbpedia.org/sparql", 10.0);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().endpoint(), "https://dbpedia.org/sparql");
    }

    #[test]
    fn test_invalid_endpoint() {
        let client = SparqlClient::new("dbpedia sparql", 10.0);
        assert!(matches!(client, Err(QueryError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_from_config() {
        let client = SparqlClient::from_config(&SparqlConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_fractional_rate_quota() {
        let quota = quota_for(0.5);
        assert_eq!(quota.replenish_interval(), Duration::from_secs(2));

        let quota = quota_for(10.0);
        assert_eq!(quota.replenish_interval(), Duration::from_millis(100));
    }
}
