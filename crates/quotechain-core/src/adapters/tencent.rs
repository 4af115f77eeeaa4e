//! Tencent realtime quote endpoint (`qt.gtimg.cn`).
//!
//! The payload is a tilde-separated record inside a JavaScript assignment:
//! name at index 1, current price at 3, previous close at 4, open at 5, and
//! volume in hands at 6. The record carries no intraday extremes, so high and
//! low are synthesized from current, open, and previous close.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapter::{QuoteSource, SourceError};
use crate::adapters::{parse_f64_or_zero, parse_u64_or_zero, BROWSER_USER_AGENT, REQUEST_TIMEOUT_MS};
use crate::gate::CrawlGate;
use crate::http::{HttpClient, HttpRequest};
use crate::{Quote, SourceId, StockCode};

const ENDPOINT: &str = "http://qt.gtimg.cn/q=";
const REFERER: &str = "https://stockapp.finance.qq.com/";

pub struct TencentAdapter {
    http: Arc<dyn HttpClient>,
    gate: CrawlGate,
}

impl TencentAdapter {
    pub fn new(http: Arc<dyn HttpClient>, gate: CrawlGate) -> Self {
        Self { http, gate }
    }

    fn quote_url(code: &StockCode) -> String {
        let prefix = if code.is_shanghai() { "sh" } else { "sz" };
        format!("{ENDPOINT}{prefix}{code}")
    }

    fn decode(body: &str) -> Result<Quote, SourceError> {
        // v_sh600519="1~贵州茅台~600519~1712.30~...";
        let payload = body
            .split_once("=\"")
            .map(|(_, rest)| rest)
            .and_then(|rest| rest.split("\";").next())
            .ok_or_else(|| SourceError::malformed("response carries no quoted payload"))?;

        let fields: Vec<&str> = payload.split('~').collect();
        if fields.len() < 2 {
            // Unknown codes come back as v_pv_none_match="1";
            return Err(SourceError::not_found("no record for code"));
        }

        let name = fields[1].trim();
        let current = parse_f64_or_zero(fields.get(3).copied());
        let prev_close = parse_f64_or_zero(fields.get(4).copied());
        let open = parse_f64_or_zero(fields.get(5).copied());
        // Volume arrives in hands (lots of 100 shares).
        let volume = parse_u64_or_zero(fields.get(6).copied()) * 100;

        let close = if current == 0.0 { prev_close } else { current };
        let high = current.max(open).max(prev_close);
        let low = current.min(open).min(prev_close);

        Quote::new(name, open, close, high, low, volume)
            .map_err(|e| SourceError::malformed(e.to_string()))
    }
}

impl QuoteSource for TencentAdapter {
    fn id(&self) -> SourceId {
        SourceId::Tencent
    }

    fn fetch_quote<'a>(
        &'a self,
        code: &'a StockCode,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let url = Self::quote_url(code);
            self.gate.clear(&url).await?;

            let request = HttpRequest::get(&url)
                .with_header("referer", REFERER)
                .with_header("user-agent", BROWSER_USER_AGENT)
                .with_timeout_ms(REQUEST_TIMEOUT_MS);

            let response = self
                .http
                .execute(request)
                .await
                .map_err(|e| SourceError::unavailable(e.to_string()))?;

            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "upstream returned status {}",
                    response.status
                )));
            }

            Self::decode(&response.body)
        })
    }
}
