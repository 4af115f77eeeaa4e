//! Source adapter contract and the adapter-level error taxonomy.
//!
//! Every provider implements [`QuoteSource`]; the orchestrator only ever
//! talks to adapters through this trait. Adapters own their provider's
//! identifier mapping, request construction, crawl-policy gating, and
//! payload decoding.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Quote, SourceId, StockCode};

/// Adapter-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The origin's robots policy forbids the request. Hard failure for the
    /// source within this call; never retried.
    PolicyDenied,
    /// Transport failure or non-2xx upstream response.
    Unavailable,
    /// A response arrived but its shape is unrecognizable.
    Malformed,
    /// The provider answered but has no record for the code.
    NotFound,
}

/// Structured adapter error consumed by the orchestrator's retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn policy_denied(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::PolicyDenied,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: true,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::PolicyDenied => "source.policy_denied",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::NotFound => "source.not_found",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// An implementation maps the canonical [`StockCode`] into its provider's
/// identifier scheme, gates every direct network request through the crawl
/// policy and rate limiter, and decodes the raw payload into a [`Quote`],
/// treating missing or unparseable numeric fields as zero. Only an
/// unrecognizable payload shape is a hard [`SourceErrorKind::Malformed`]
/// failure.
///
/// Implementations must be `Send + Sync`; one adapter instance is shared
/// across concurrent fetches.
pub trait QuoteSource: Send + Sync {
    /// Stable identifier used as the provenance tag.
    fn id(&self) -> SourceId;

    /// Fetch one point-in-time quote for the given code.
    fn fetch_quote<'a>(
        &'a self,
        code: &'a StockCode,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, SourceError>> + Send + 'a>>;
}
