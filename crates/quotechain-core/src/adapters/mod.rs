//! Provider adapters (Spot snapshot, Sina, Tencent, EastMoney).
//!
//! Each provider lives in its own file behind the [`QuoteSource`] contract:
//! a struct holding the shared transport and crawl gate, the provider's URL
//! construction and identifier mapping, and payload decoding with
//! zero-defaulting numeric parses.
//!
//! [`QuoteSource`]: crate::adapter::QuoteSource

mod eastmoney;
mod sina;
mod spot;
mod tencent;

pub use eastmoney::EastMoneyAdapter;
pub use sina::SinaAdapter;
pub use spot::SpotSnapshotAdapter;
pub use tencent::TencentAdapter;

pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";

pub(crate) const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Best-effort numeric parse: missing or unparseable values become zero.
pub(crate) fn parse_f64_or_zero(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub(crate) fn parse_u64_or_zero(raw: Option<&str>) -> u64 {
    parse_f64_or_zero(raw).max(0.0) as u64
}

/// Extract a numeric JSON field, tolerating the "-" placeholder some
/// endpoints emit for halted instruments.
pub(crate) fn json_f64(value: &serde_json::Value, key: &str) -> f64 {
    match value.get(key) {
        Some(serde_json::Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(text)) => parse_f64_or_zero(Some(text)),
        _ => 0.0,
    }
}

pub(crate) fn json_u64(value: &serde_json::Value, key: &str) -> u64 {
    json_f64(value, key).max(0.0) as u64
}

pub(crate) fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
