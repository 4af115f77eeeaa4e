//! Core library for quotechain: resilient multi-source A-share quote
//! fetching.
//!
//! A fetch consults registered sources one at a time. The primary (a
//! full-market spot snapshot) runs under a bounded timeout on its own task;
//! if it stalls or fails, the per-instrument fallbacks (Sina, Tencent,
//! EastMoney) are tried sequentially. Every outbound request respects the
//! origin's robots policy and a per-origin minimum interval, every source
//! sits behind a sliding-window circuit breaker, and the winning quote is
//! sanitized and tagged with its provenance before it reaches the caller.
//!
//! Module map:
//! - [`domain`]: validated stock codes, quote models, fetch timestamps
//! - [`source`]: stable source identifiers
//! - [`adapter`]: the [`QuoteSource`] contract and its error taxonomy
//! - [`adapters`]: one adapter per provider
//! - [`http`]: transport trait plus the reqwest-backed implementation
//! - [`robots`]: robots.txt parsing and the per-origin policy cache
//! - [`rate_limit`]: per-origin minimum-interval limiter
//! - [`gate`]: combined policy-check-then-throttle step
//! - [`circuit_breaker`]: per-source failure tracking
//! - [`orchestrator`]: registration order, timeout, retry, and fallback

pub mod adapter;
pub mod adapters;
pub mod circuit_breaker;
pub mod domain;
pub mod error;
pub mod gate;
pub mod http;
pub mod orchestrator;
pub mod rate_limit;
pub mod robots;
pub mod source;

pub use adapter::{QuoteSource, SourceError, SourceErrorKind};
pub use circuit_breaker::{BreakerConfig, CircuitBreaker};
pub use domain::{AnnotatedQuote, FetchedAt, Quote, StockCode};
pub use error::ValidationError;
pub use gate::CrawlGate;
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use orchestrator::{FetchError, FetchOrchestrator, OrchestratorConfig};
pub use rate_limit::DomainRateLimiter;
pub use robots::{RobotsPolicyCache, RobotsRecord};
pub use source::SourceId;
