//! Rate-limited WDQS client.
//!
//! Every SPARQL query in the pipeline flows through [`WdqsClient::execute`]:
//! one inter-call delay, one retry policy, one place that decides what is
//! fatal. Queries are POSTed as the request body, so large VALUES batches
//! never hit URL-length limits.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::sleep;
use url::Url;

use super::retry::RetryPolicy;
use super::types::SparqlResults;
use crate::config::EnrichConfig;
use crate::error::{WdqsError, WdqsResult};

/// Transport seam for SPARQL execution. Production uses HTTP; tests
/// substitute scripted responses.
#[async_trait]
pub trait SparqlTransport: Send + Sync {
    async fn execute(&self, sparql: &str) -> WdqsResult<SparqlResults>;
}

/// HTTP transport against a SPARQL endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &EnrichConfig) -> WdqsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SparqlTransport for HttpTransport {
    async fn execute(&self, sparql: &str) -> WdqsResult<SparqlResults> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .body(sparql.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WdqsError::Status {
                status: status.as_u16(),
                body_prefix: body.chars().take(200).collect(),
            });
        }

        Ok(response.json::<SparqlResults>().await?)
    }
}

pub struct WdqsClient {
    transport: Box<dyn SparqlTransport>,
    retry: RetryPolicy,
    call_delay: Duration,
    last_request: Mutex<Instant>,
}

impl WdqsClient {
    pub fn new(transport: Box<dyn SparqlTransport>, retry: RetryPolicy, call_delay: Duration) -> Self {
        Self {
            transport,
            retry,
            call_delay,
            last_request: Mutex::new(Instant::now()),
        }
    }

    pub fn from_config(config: &EnrichConfig) -> WdqsResult<Self> {
        Ok(Self::new(
            Box::new(HttpTransport::new(config)?),
            RetryPolicy::new(config.max_retries, config.call_delay),
            config.call_delay,
        ))
    }

    /// Enforce the inter-call delay between requests.
    async fn pace(&self) {
        let elapsed = {
            let last = self.last_request.lock().unwrap();
            last.elapsed()
        };

        if elapsed < self.call_delay {
            sleep(self.call_delay - elapsed).await;
        }

        let mut last = self.last_request.lock().unwrap();
        *last = Instant::now();
    }

    /// Run one SPARQL query with pacing and retries.
    ///
    /// HTTP 429 retries from the elevated backoff floor; connection resets
    /// and timeouts retry on the normal schedule. Any other HTTP error is
    /// fatal for the batch immediately: a partial or garbled result written
    /// into the coordinate caches would be indistinguishable from "no
    /// location found" downstream.
    pub async fn execute(&self, sparql: &str) -> WdqsResult<SparqlResults> {
        for attempt in 0..self.retry.max_attempts {
            self.pace().await;

            match self.transport.execute(sparql).await {
                Ok(results) => return Ok(results),
                Err(WdqsError::Status { status, .. })
                    if status == StatusCode::TOO_MANY_REQUESTS.as_u16() =>
                {
                    let wait = self.retry.rate_limit_backoff(attempt);
                    tracing::warn!(
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        "WDQS rate limited, backing off"
                    );
                    sleep(wait).await;
                }
                Err(WdqsError::Http(e)) if self.retry.is_retryable(&e) => {
                    let wait = self.retry.transport_backoff(attempt);
                    tracing::warn!(
                        attempt,
                        error = %e,
                        wait_secs = wait.as_secs_f64(),
                        "transient WDQS failure, retrying"
                    );
                    sleep(wait).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "WDQS query failed");
                    return Err(e);
                }
            }
        }

        Err(WdqsError::RetriesExhausted {
            attempts: self.retry.max_attempts,
        })
    }
}
