use std::sync::Arc;

use crate::adapter::SourceError;
use crate::rate_limit::DomainRateLimiter;
use crate::robots::RobotsPolicyCache;

/// Shared pre-request gate: robots permission check followed by the
/// per-origin rate limit wait.
///
/// Every adapter that performs direct network I/O must pass each request
/// through [`CrawlGate::clear`] before issuing it.
#[derive(Clone)]
pub struct CrawlGate {
    robots: Arc<RobotsPolicyCache>,
    limiter: Arc<DomainRateLimiter>,
}

impl CrawlGate {
    pub fn new(robots: Arc<RobotsPolicyCache>, limiter: Arc<DomainRateLimiter>) -> Self {
        Self { robots, limiter }
    }

    /// Deny with [`SourceError::policy_denied`] when the origin's policy
    /// forbids the URL; otherwise wait out the origin's minimum interval.
    pub async fn clear(&self, url: &str) -> Result<(), SourceError> {
        if !self.robots.allow(url).await {
            return Err(SourceError::policy_denied(format!(
                "robots policy forbids fetching {url}"
            )));
        }
        self.limiter.throttle(url).await;
        Ok(())
    }
}
