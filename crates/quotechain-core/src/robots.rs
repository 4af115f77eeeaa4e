//! Per-origin robots.txt compliance cache.
//!
//! Each origin's policy document is fetched and parsed at most once per
//! process; a failed fetch or parse caches a permissive allow-all record so
//! a broken robots endpoint never blocks traffic and is never re-fetched on
//! every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use crate::http::{HttpClient, HttpRequest};

const ROBOTS_FETCH_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
struct RobotRule {
    allow: bool,
    path: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct RobotGroup {
    agents: Vec<String>,
    rules: Vec<RobotRule>,
    crawl_delay: Option<Duration>,
}

impl RobotGroup {
    fn applies_to(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_ascii_lowercase();
        self.agents
            .iter()
            .any(|agent| agent != "*" && ua.contains(agent.as_str()))
    }

    fn is_wildcard(&self) -> bool {
        self.agents.iter().any(|agent| agent == "*")
    }
}

/// Parsed crawl policy for one origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRecord {
    groups: Vec<RobotGroup>,
}

impl RobotsRecord {
    /// The record cached when a policy document cannot be obtained:
    /// everything allowed, no extra delay.
    pub fn permissive() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<RobotGroup> = Vec::new();
        let mut current = RobotGroup::default();
        // Consecutive user-agent lines share one group; any rule line closes
        // the agent-collection phase.
        let mut collecting_agents = false;

        for raw_line in text.lines() {
            let line = raw_line
                .split('#')
                .next()
                .unwrap_or_default()
                .trim();
            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if !collecting_agents && !current.agents.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    current.agents.push(value.to_ascii_lowercase());
                    collecting_agents = true;
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    // An empty Disallow line means "allow everything".
                    if !current.agents.is_empty() && !value.is_empty() {
                        current.rules.push(RobotRule {
                            allow: field == "allow",
                            path: value.to_owned(),
                        });
                    }
                }
                "crawl-delay" => {
                    collecting_agents = false;
                    if !current.agents.is_empty() {
                        if let Ok(seconds) = value.parse::<f64>() {
                            if seconds.is_finite() && seconds >= 0.0 {
                                current.crawl_delay = Some(Duration::from_secs_f64(seconds));
                            }
                        }
                    }
                }
                _ => {
                    collecting_agents = false;
                }
            }
        }

        if !current.agents.is_empty() {
            groups.push(current);
        }

        Self { groups }
    }

    fn group_for(&self, user_agent: &str) -> Option<&RobotGroup> {
        self.groups
            .iter()
            .find(|group| group.applies_to(user_agent))
            .or_else(|| self.groups.iter().find(|group| group.is_wildcard()))
    }

    /// Whether the configured identity may fetch the path. Absence of any
    /// applicable rule means allowed.
    pub fn allowed(&self, user_agent: &str, path: &str) -> bool {
        let Some(group) = self.group_for(user_agent) else {
            return true;
        };

        // Longest matching rule path wins.
        group
            .rules
            .iter()
            .filter(|rule| path.starts_with(rule.path.as_str()))
            .max_by_key(|rule| rule.path.len())
            .map(|rule| rule.allow)
            .unwrap_or(true)
    }

    /// Declared crawl delay for the identity, falling back to a wildcard
    /// group's declaration.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.group_for(user_agent)
            .and_then(|group| group.crawl_delay)
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|group| group.is_wildcard())
                    .and_then(|group| group.crawl_delay)
            })
    }
}

type RecordSlot = Arc<AsyncMutex<Option<Arc<RobotsRecord>>>>;

/// Origin-keyed robots policy cache.
///
/// The outer map lock is short (lookup/insert only); the per-origin slot
/// lock serializes the fetch-and-populate step so concurrent callers for
/// the same uncached origin trigger exactly one policy fetch, without any
/// network I/O under the map lock.
pub struct RobotsPolicyCache {
    http: Arc<dyn HttpClient>,
    user_agent: String,
    slots: Mutex<HashMap<String, RecordSlot>>,
}

impl RobotsPolicyCache {
    pub fn new(http: Arc<dyn HttpClient>, user_agent: impl Into<String>) -> Self {
        Self {
            http,
            user_agent: user_agent.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether the configured identity may fetch this URL. Unparseable URLs
    /// and unobtainable policies fail open.
    pub async fn allow(&self, url: &str) -> bool {
        let Some((origin, path)) = split_origin(url) else {
            return true;
        };
        let record = self.record_for(&origin).await;
        record.allowed(&self.user_agent, &path)
    }

    /// Effective crawl delay for this URL's origin: the maximum of the
    /// caller-supplied default and any declared delay.
    pub async fn crawl_delay(&self, url: &str, default: Duration) -> Duration {
        let Some((origin, _)) = split_origin(url) else {
            return default;
        };
        let record = self.record_for(&origin).await;
        match record.crawl_delay(&self.user_agent) {
            Some(declared) => declared.max(default),
            None => default,
        }
    }

    /// Drop all cached records; the next call per origin re-fetches.
    pub fn clear(&self) {
        self.slots
            .lock()
            .expect("robots cache lock is not poisoned")
            .clear();
    }

    async fn record_for(&self, origin: &str) -> Arc<RobotsRecord> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .expect("robots cache lock is not poisoned");
            Arc::clone(slots.entry(origin.to_owned()).or_default())
        };

        let mut guard = slot.lock().await;
        if let Some(record) = guard.as_ref() {
            return Arc::clone(record);
        }

        let record = Arc::new(self.fetch_record(origin).await);
        *guard = Some(Arc::clone(&record));
        record
    }

    async fn fetch_record(&self, origin: &str) -> RobotsRecord {
        let robots_url = format!("{origin}/robots.txt");
        let request = HttpRequest::get(&robots_url).with_timeout_ms(ROBOTS_FETCH_TIMEOUT_MS);

        match self.http.execute(request).await {
            Ok(response) if response.is_success() => RobotsRecord::parse(&response.body),
            Ok(response) => {
                log::debug!(
                    "robots fetch for {origin} returned status {}; caching permissive policy",
                    response.status
                );
                RobotsRecord::permissive()
            }
            Err(error) => {
                log::debug!(
                    "robots fetch for {origin} failed ({}); caching permissive policy",
                    error.message()
                );
                RobotsRecord::permissive()
            }
        }
    }
}

/// Split a URL into its origin (`scheme://host[:port]`) and request path
/// (path plus query).
pub fn split_origin(url: &str) -> Option<(String, String)> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    };
    let path = match parsed.query() {
        Some(query) => format!("{}?{query}", parsed.path()),
        None => parsed.path().to_owned(),
    };
    Some((origin, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const POLICY: &str = "\
# test policy
User-agent: quotechainbot
Disallow: /private/
Allow: /private/open
Crawl-delay: 2

User-agent: *
Disallow: /internal/
Crawl-delay: 0.5
";

    #[test]
    fn longest_rule_wins_for_named_agent() {
        let record = RobotsRecord::parse(POLICY);
        assert!(!record.allowed("quotechainbot/0.1", "/private/data"));
        assert!(record.allowed("quotechainbot/0.1", "/private/open/today"));
        assert!(record.allowed("quotechainbot/0.1", "/quotes/600519"));
    }

    #[test]
    fn wildcard_group_applies_to_unknown_agents() {
        let record = RobotsRecord::parse(POLICY);
        assert!(!record.allowed("otherbot", "/internal/x"));
        assert!(record.allowed("otherbot", "/private/data"));
    }

    #[test]
    fn crawl_delay_prefers_named_group_then_wildcard() {
        let record = RobotsRecord::parse(POLICY);
        assert_eq!(
            record.crawl_delay("quotechainbot"),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            record.crawl_delay("otherbot"),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn empty_policy_allows_everything() {
        let record = RobotsRecord::parse("");
        assert!(record.allowed("anybot", "/anything"));
        assert_eq!(record.crawl_delay("anybot"), None);
    }

    #[test]
    fn splits_origin_and_path_with_query() {
        let (origin, path) = split_origin("http://hq.sinajs.cn/list=sh600519").expect("must split");
        assert_eq!(origin, "http://hq.sinajs.cn");
        assert_eq!(path, "/list=sh600519");

        let (origin, path) =
            split_origin("http://push2.eastmoney.com/api/qt/stock/get?secid=1.600519")
                .expect("must split");
        assert_eq!(origin, "http://push2.eastmoney.com");
        assert_eq!(path, "/api/qt/stock/get?secid=1.600519");
    }

    struct CountingClient {
        calls: AtomicUsize,
        response: Result<HttpResponse, HttpError>,
    }

    impl CountingClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
            }
        }
    }

    impl HttpClient for CountingClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn fetches_each_origin_once() {
        let client = Arc::new(CountingClient::new(Ok(HttpResponse::ok(POLICY))));
        let cache = RobotsPolicyCache::new(client.clone(), "quotechainbot");

        assert!(!cache.allow("http://hq.sinajs.cn/private/data").await);
        assert!(cache.allow("http://hq.sinajs.cn/list=sh600519").await);
        let delay = cache
            .crawl_delay("http://hq.sinajs.cn/list=sh600519", Duration::from_millis(10))
            .await;
        assert_eq!(delay, Duration::from_secs(2));

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_caches_a_permissive_record() {
        let client = Arc::new(CountingClient::new(Err(HttpError::new("connect refused"))));
        let cache = RobotsPolicyCache::new(client.clone(), "quotechainbot");

        assert!(cache.allow("http://qt.gtimg.cn/q=sz000001").await);
        assert!(cache.allow("http://qt.gtimg.cn/q=sh600519").await);
        let delay = cache
            .crawl_delay("http://qt.gtimg.cn/q=sh600519", Duration::from_millis(10))
            .await;
        assert_eq!(delay, Duration::from_millis(10));

        // The failure outcome is cached too; no retry per call.
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_forces_a_refetch() {
        let client = Arc::new(CountingClient::new(Ok(HttpResponse::ok(POLICY))));
        let cache = RobotsPolicyCache::new(client.clone(), "quotechainbot");

        cache.allow("http://hq.sinajs.cn/list=sh600519").await;
        cache.clear();
        cache.allow("http://hq.sinajs.cn/list=sh600519").await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }
}
