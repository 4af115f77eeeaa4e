//! Behavior tests for robots policy caching and per-origin throttling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use quotechain_core::adapter::SourceErrorKind;
use quotechain_core::{CrawlGate, DomainRateLimiter, RobotsPolicyCache};
use quotechain_tests::{FixedBodyHttpClient, HttpClient};

fn gate_over(robots: Arc<RobotsPolicyCache>, interval: Duration) -> CrawlGate {
    let limiter = Arc::new(DomainRateLimiter::new(Arc::clone(&robots), interval));
    CrawlGate::new(robots, limiter)
}

#[tokio::test]
async fn when_the_policy_disallows_a_path_the_gate_denies() {
    // Given: an origin whose policy forbids the quote API
    let transport = Arc::new(FixedBodyHttpClient::serving(
        "User-agent: *\nDisallow: /api/\n",
    ));
    let robots = Arc::new(RobotsPolicyCache::new(
        transport as Arc<dyn HttpClient>,
        "quotechainbot",
    ));
    let gate = gate_over(robots, Duration::from_millis(1));

    // When / Then: the gated URL is refused, a sibling path passes
    let err = gate
        .clear("http://push2.eastmoney.com/api/qt/stock/get?secid=1.600519")
        .await
        .expect_err("denied");
    assert_eq!(err.kind(), SourceErrorKind::PolicyDenied);

    gate.clear("http://push2.eastmoney.com/public/index.html")
        .await
        .expect("allowed path passes");
}

#[tokio::test]
async fn when_the_policy_cannot_be_fetched_the_gate_fails_open() {
    let transport = Arc::new(FixedBodyHttpClient::unreachable());
    let robots = Arc::new(RobotsPolicyCache::new(
        transport as Arc<dyn HttpClient>,
        "quotechainbot",
    ));
    let gate = gate_over(robots, Duration::from_millis(1));

    gate.clear("http://hq.sinajs.cn/list=sh600519")
        .await
        .expect("unknown policy is permissive");
}

#[tokio::test]
async fn when_many_callers_probe_one_origin_the_policy_is_fetched_once() {
    // Given: a shared cache and several concurrent checks against one origin
    let transport = Arc::new(FixedBodyHttpClient::serving("User-agent: *\nAllow: /\n"));
    let robots = Arc::new(RobotsPolicyCache::new(
        Arc::clone(&transport) as Arc<dyn HttpClient>,
        "quotechainbot",
    ));

    let urls = [
        "http://qt.gtimg.cn/q=sh600519",
        "http://qt.gtimg.cn/q=sz000001",
        "http://qt.gtimg.cn/q=sh601318",
    ];

    // When: the checks run concurrently
    let (a, b, c) = tokio::join!(
        robots.allow(urls[0]),
        robots.allow(urls[1]),
        robots.allow(urls[2])
    );

    // Then: all pass and only one robots.txt request went out
    assert!(a && b && c);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn when_requests_target_one_origin_the_minimum_interval_holds() {
    let transport = Arc::new(FixedBodyHttpClient::unreachable());
    let robots = Arc::new(RobotsPolicyCache::new(
        transport as Arc<dyn HttpClient>,
        "quotechainbot",
    ));
    let limiter = DomainRateLimiter::new(robots, Duration::from_millis(50));

    let url = "http://hq.sinajs.cn/list=sh600519";
    limiter.throttle(url).await;
    let first_done = Instant::now();
    limiter.throttle(url).await;

    assert!(first_done.elapsed() >= Duration::from_millis(45));
}
