//! Per-origin minimum-interval rate limiting.
//!
//! One governor direct limiter per origin, with the quota period set to the
//! effective crawl interval for that origin (the larger of the configured
//! default and any robots-declared crawl delay). Acquisition is atomic, so
//! two concurrent callers against one origin can never both observe a stale
//! last-request time and proceed without waiting.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::robots::{split_origin, RobotsPolicyCache};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

struct OriginLimiter {
    interval: Duration,
    limiter: Arc<DirectRateLimiter>,
}

/// Enforces a minimum inter-request interval per origin, informed by the
/// robots policy cache.
pub struct DomainRateLimiter {
    robots: Arc<RobotsPolicyCache>,
    default_interval: Duration,
    limiters: Mutex<HashMap<String, OriginLimiter>>,
}

impl DomainRateLimiter {
    pub fn new(robots: Arc<RobotsPolicyCache>, default_interval: Duration) -> Self {
        Self {
            robots,
            default_interval,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until the minimum inter-request interval for this URL's origin
    /// has elapsed since the last request to that origin, then claim "now"
    /// as the new last-request time.
    ///
    /// The wait happens on the limiter itself; the map lock is only held for
    /// lookup/insert. A changed effective interval (a re-fetched policy
    /// declaring a different crawl delay) replaces the origin's limiter,
    /// which also resets its last-request state.
    pub async fn throttle(&self, url: &str) {
        let Some((origin, _)) = split_origin(url) else {
            return;
        };

        let interval = self
            .robots
            .crawl_delay(url, self.default_interval)
            .await
            .max(Duration::from_millis(1));

        let limiter = {
            let mut limiters = self
                .limiters
                .lock()
                .expect("rate limiter map lock is not poisoned");
            let entry = limiters
                .entry(origin)
                .and_modify(|entry| {
                    if entry.interval != interval {
                        entry.interval = interval;
                        entry.limiter = Arc::new(RateLimiter::direct(interval_quota(interval)));
                    }
                })
                .or_insert_with(|| OriginLimiter {
                    interval,
                    limiter: Arc::new(RateLimiter::direct(interval_quota(interval))),
                });
            Arc::clone(&entry.limiter)
        };

        limiter.until_ready().await;
    }
}

fn interval_quota(interval: Duration) -> Quota {
    let burst = NonZeroU32::new(1).expect("burst of one is non-zero");
    Quota::with_period(interval)
        .expect("interval is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Instant;

    struct NoRobotsClient;

    impl HttpClient for NoRobotsClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move { Err(HttpError::new("no robots endpoint")) })
        }
    }

    fn limiter(default_interval: Duration) -> DomainRateLimiter {
        let robots = Arc::new(RobotsPolicyCache::new(
            Arc::new(NoRobotsClient),
            "quotechainbot",
        ));
        DomainRateLimiter::new(robots, default_interval)
    }

    #[tokio::test]
    async fn back_to_back_calls_observe_the_minimum_gap() {
        let limiter = limiter(Duration::from_millis(60));
        let url = "http://hq.sinajs.cn/list=sh600519";

        limiter.throttle(url).await;
        let first_done = Instant::now();
        limiter.throttle(url).await;
        let second_done = Instant::now();

        assert!(second_done.duration_since(first_done) >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn different_origins_do_not_contend() {
        let limiter = limiter(Duration::from_millis(200));

        limiter.throttle("http://hq.sinajs.cn/list=sh600519").await;
        let start = Instant::now();
        limiter.throttle("http://qt.gtimg.cn/q=sh600519").await;

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn robots_crawl_delay_stretches_the_interval() {
        struct DelayRobots;

        impl HttpClient for DelayRobots {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>
            {
                Box::pin(async move {
                    Ok(HttpResponse::ok("User-agent: *\nCrawl-delay: 0.1\n"))
                })
            }
        }

        let robots = Arc::new(RobotsPolicyCache::new(Arc::new(DelayRobots), "quotechainbot"));
        let limiter = DomainRateLimiter::new(robots, Duration::from_millis(10));
        let url = "http://push2.eastmoney.com/api/qt/stock/get?secid=1.600519";

        limiter.throttle(url).await;
        let first_done = Instant::now();
        limiter.throttle(url).await;

        assert!(first_done.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn refreshed_crawl_delay_reaches_an_existing_limiter() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        // Serves a short delay on the first policy fetch, a long one after.
        struct ShiftingRobots {
            fetches: AtomicUsize,
        }

        impl HttpClient for ShiftingRobots {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>
            {
                let fetch_index = self.fetches.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    let body = if fetch_index == 0 {
                        "User-agent: *\nCrawl-delay: 0.001\n"
                    } else {
                        "User-agent: *\nCrawl-delay: 0.1\n"
                    };
                    Ok(HttpResponse::ok(body))
                })
            }
        }

        let robots = Arc::new(RobotsPolicyCache::new(
            Arc::new(ShiftingRobots {
                fetches: AtomicUsize::new(0),
            }),
            "quotechainbot",
        ));
        let limiter = DomainRateLimiter::new(Arc::clone(&robots), Duration::from_millis(1));
        let url = "http://qt.gtimg.cn/q=sh600519";

        // Populate the origin's limiter under the short delay, then force a
        // policy re-fetch that declares the long one.
        limiter.throttle(url).await;
        robots.clear();

        limiter.throttle(url).await;
        let first_done = Instant::now();
        limiter.throttle(url).await;

        assert!(first_done.elapsed() >= Duration::from_millis(90));
    }
}
