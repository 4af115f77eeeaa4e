//! EastMoney single-instrument endpoint (`push2.eastmoney.com`).
//!
//! A JSON envelope with a `data` object keyed by field codes: f58 name,
//! f43 current, f46 open, f44 high, f45 low, f47 volume. A null `data` means
//! the exchange/code pair is unknown. Missing extremes fall back to the
//! spread of current and open.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapter::{QuoteSource, SourceError};
use crate::adapters::{json_f64, json_string, json_u64, BROWSER_USER_AGENT, REQUEST_TIMEOUT_MS};
use crate::gate::CrawlGate;
use crate::http::{HttpClient, HttpRequest};
use crate::{Quote, SourceId, StockCode};

const ENDPOINT: &str = "http://push2.eastmoney.com/api/qt/stock/get";
const FIELDS: &str = "f58,f43,f46,f44,f45,f47";
const REFERER: &str = "https://quote.eastmoney.com/";
const FALLBACK_NAME: &str = "未知名称";

pub struct EastMoneyAdapter {
    http: Arc<dyn HttpClient>,
    gate: CrawlGate,
}

impl EastMoneyAdapter {
    pub fn new(http: Arc<dyn HttpClient>, gate: CrawlGate) -> Self {
        Self { http, gate }
    }

    fn quote_url(code: &StockCode) -> String {
        let market = if code.is_shanghai() { "1" } else { "0" };
        format!("{ENDPOINT}?secid={market}.{code}&fields={FIELDS}")
    }

    fn decode(body: &str) -> Result<Quote, SourceError> {
        let envelope: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| SourceError::malformed(format!("invalid json envelope: {e}")))?;

        let data = match envelope.get("data") {
            Some(data) if !data.is_null() => data,
            _ => return Err(SourceError::not_found("no record for secid")),
        };

        let name = json_string(data, "f58").unwrap_or_else(|| FALLBACK_NAME.to_owned());
        let current = json_f64(data, "f43");
        let open = json_f64(data, "f46");

        let mut high = json_f64(data, "f44");
        if high == 0.0 {
            high = current.max(open);
        }
        let mut low = json_f64(data, "f45");
        if low == 0.0 {
            low = current.min(open);
        }
        let volume = json_u64(data, "f47");

        Quote::new(name, open, current, high, low, volume)
            .map_err(|e| SourceError::malformed(e.to_string()))
    }
}

impl QuoteSource for EastMoneyAdapter {
    fn id(&self) -> SourceId {
        SourceId::EastMoney
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
