//! Source registry and the fetch decision loop.
//!
//! One registered source at a time: the primary runs inside a bounded
//! timeout on its own task, fallbacks run sequentially in registration
//! order. Every attempt goes through the source's circuit breaker, and the
//! winning quote is sanitized and annotated exactly once on the way out.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::adapter::{QuoteSource, SourceError};
use crate::adapters::{EastMoneyAdapter, SinaAdapter, SpotSnapshotAdapter, TencentAdapter};
use crate::circuit_breaker::{BreakerConfig, CircuitBreaker};
use crate::gate::CrawlGate;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::rate_limit::DomainRateLimiter;
use crate::robots::RobotsPolicyCache;
use crate::{AnnotatedQuote, FetchedAt, Quote, SourceId, StockCode};

/// Orchestration knobs; the defaults mirror production operation.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wall-clock budget for the bounded primary, including its retries.
    pub primary_timeout: Duration,
    /// Attempts per source before moving on.
    pub max_retries: u32,
    /// Linear backoff unit between attempts (delay = base * attempt number).
    pub retry_base_delay: Duration,
    /// Floor for the per-origin inter-request interval.
    pub default_min_interval: Duration,
    /// Thresholds applied to every per-source breaker.
    pub breaker: BreakerConfig,
    /// Identity used for robots policy evaluation.
    pub user_agent: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            primary_timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(200),
            default_min_interval: Duration::from_millis(10),
            breaker: BreakerConfig::default(),
            user_agent: "quotechainbot".to_owned(),
        }
    }
}

struct SourceRegistration {
    id: SourceId,
    adapter: Arc<dyn QuoteSource>,
    breaker: Arc<CircuitBreaker>,
    bounded_timeout: bool,
}

/// Fetch-level failure, produced only after every registered source has had
/// its chance.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no quote sources are configured")]
    NoSourcesConfigured,
    #[error("all quote sources exhausted")]
    AllSourcesExhausted {
        #[source]
        last_error: Option<SourceError>,
    },
}

/// Coordinates registered sources into a single resilient fetch.
pub struct FetchOrchestrator {
    config: OrchestratorConfig,
    sources: Vec<SourceRegistration>,
}

impl FetchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Production wiring: spot snapshot as the bounded primary, then Sina,
    /// Tencent, and EastMoney as sequential fallbacks, all sharing one
    /// transport, robots policy cache, and rate limiter.
    pub fn with_default_sources(config: OrchestratorConfig) -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let robots = Arc::new(RobotsPolicyCache::new(
            Arc::clone(&http),
            config.user_agent.clone(),
        ));
        let limiter = Arc::new(DomainRateLimiter::new(
            Arc::clone(&robots),
            config.default_min_interval,
        ));
        let gate = CrawlGate::new(robots, limiter);

        let mut orchestrator = Self::new(config);
        orchestrator.register_bounded_primary(Arc::new(SpotSnapshotAdapter::new(
            Arc::clone(&http),
            gate.clone(),
        )));
        orchestrator.register(Arc::new(SinaAdapter::new(Arc::clone(&http), gate.clone())));
        orchestrator.register(Arc::new(TencentAdapter::new(Arc::clone(&http), gate.clone())));
        orchestrator.register(Arc::new(EastMoneyAdapter::new(http, gate)));
        orchestrator
    }

    /// Append a source to the fallback chain. Order of registration is the
    /// order of consultation.
    pub fn register(&mut self, adapter: Arc<dyn QuoteSource>) {
        self.push(adapter, false);
    }

    /// Append a source whose attempt runs on its own task under
    /// `primary_timeout`. Meaningful for the first registration; a bounded
    /// source later in the chain is treated as a plain fallback.
    pub fn register_bounded_primary(&mut self, adapter: Arc<dyn QuoteSource>) {
        self.push(adapter, true);
    }

    fn push(&mut self, adapter: Arc<dyn QuoteSource>, bounded_timeout: bool) {
        self.sources.push(SourceRegistration {
            id: adapter.id(),
            adapter,
            breaker: Arc::new(CircuitBreaker::new(self.config.breaker)),
            bounded_timeout,
        });
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id).collect()
    }

    /// Fetch one quote, trying the primary under its timeout and then each
    /// fallback in order. The first success wins; the result is sanitized
    /// and tagged with its source and fetch time.
    pub async fn fetch_quote(&self, code: &StockCode) -> Result<AnnotatedQuote, FetchError> {
        if self.sources.is_empty() {
            return Err(FetchError::NoSourcesConfigured);
        }

        let mut last_error: Option<SourceError> = None;
        let mut primary_consumed = false;

        let first = &self.sources[0];
        if first.bounded_timeout {
            primary_consumed = true;
            match self.bounded_attempt(first, code).await {
                Ok(quote) => return Ok(self.annotate(quote, first.id)),
                Err(err) => {
                    if err.is_some() {
                        last_error = err;
                    }
                }
            }
        }

        let skip = usize::from(primary_consumed);
        for registration in self.sources.iter().skip(skip) {
            log::debug!("trying source {} for {}", registration.id, code);
            match self.attempt(registration, code).await {
                Ok(quote) => return Ok(self.annotate(quote, registration.id)),
                Err(Some(err)) => last_error = Some(err),
                Err(None) => {}
            }
        }

        Err(FetchError::AllSourcesExhausted { last_error })
    }

    /// Run the primary's guarded attempt on its own task so a stall cannot
    /// hold up the fallback chain. On expiry the task is dropped, not
    /// aborted; it finishes in the background and its result is discarded.
    async fn bounded_attempt(
        &self,
        registration: &SourceRegistration,
        code: &StockCode,
    ) -> Result<Quote, Option<SourceError>> {
        let handle = tokio::spawn(guarded_attempt(
            Arc::clone(&registration.adapter),
            Arc::clone(&registration.breaker),
            code.clone(),
            self.config.max_retries,
            self.config.retry_base_delay,
        ));

        match tokio::time::timeout(self.config.primary_timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                log::warn!("primary source {} task failed: {join_error}", registration.id);
                Err(None)
            }
            Err(_) => {
                log::warn!(
                    "primary source {} exceeded {:?}, abandoning it and falling back",
                    registration.id,
                    self.config.primary_timeout
                );
                Err(None)
            }
        }
    }

    async fn attempt(
        &self,
        registration: &SourceRegistration,
        code: &StockCode,
    ) -> Result<Quote, Option<SourceError>> {
        guarded_attempt(
            Arc::clone(&registration.adapter),
            Arc::clone(&registration.breaker),
            code.clone(),
            self.config.max_retries,
            self.config.retry_base_delay,
        )
        .await
    }

    fn annotate(&self, quote: Quote, source: SourceId) -> AnnotatedQuote {
        AnnotatedQuote::new(quote.sanitized(), source, FetchedAt::now())
    }

    #[cfg(test)]
    fn breaker_for(&self, index: usize) -> Arc<CircuitBreaker> {
        Arc::clone(&self.sources[index].breaker)
    }
}

/// One source's full attempt cycle: breaker check, up to `max_retries`
/// tries with linear backoff, breaker bookkeeping on every outcome.
///
/// `Err(None)` means the breaker rejected the attempt without any network
/// activity; `Err(Some(_))` carries the last failure observed.
async fn guarded_attempt(
    adapter: Arc<dyn QuoteSource>,
    breaker: Arc<CircuitBreaker>,
    code: StockCode,
    max_retries: u32,
    retry_base_delay: Duration,
) -> Result<Quote, Option<SourceError>> {
    if breaker.is_open() {
        log::debug!("circuit open for {}, skipping", adapter.id());
        return Err(None);
    }

    let mut last_error = None;
    for attempt in 1..=max_retries.max(1) {
        match adapter.fetch_quote(&code).await {
            Ok(quote) => {
                breaker.record_success();
                return Ok(quote);
            }
            Err(error) => {
                breaker.record_failure();
                log::warn!(
                    "source {} attempt {attempt} for {code} failed: {error}",
                    adapter.id()
                );
                let retryable = error.retryable();
                last_error = Some(error);
                if !retryable {
                    break;
                }
                if attempt < max_retries {
                    tokio::time::sleep(retry_base_delay * attempt).await;
                }
            }
        }
    }

    Err(last_error)
}
