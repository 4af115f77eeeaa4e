//! Full-market spot snapshot (`push2.eastmoney.com` clist endpoint).
//!
//! One request returns a page of every listed A-share; the target row is
//! located by its zero-padded code. Fields: f12 code, f14 name, f2 latest,
//! f17 open, f15 high, f16 low, f5 volume. Halted instruments carry "-"
//! placeholders, which decode as zero. A single snapshot covers both
//! exchanges, so no market prefix is needed.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapter::{QuoteSource, SourceError};
use crate::adapters::{json_f64, json_string, json_u64, BROWSER_USER_AGENT};
use crate::gate::CrawlGate;
use crate::http::{HttpClient, HttpRequest};
use crate::{Quote, SourceId, StockCode};

const ENDPOINT: &str = "http://push2.eastmoney.com/api/qt/clist/get";
const REFERER: &str = "https://quote.eastmoney.com/";
const FALLBACK_NAME: &str = "未知名称";

// The snapshot is large; allow more than the per-instrument budget.
const SNAPSHOT_TIMEOUT_MS: u64 = 30_000;

pub struct SpotSnapshotAdapter {
    http: Arc<dyn HttpClient>,
    gate: CrawlGate,
}

impl SpotSnapshotAdapter {
    pub fn new(http: Arc<dyn HttpClient>, gate: CrawlGate) -> Self {
        Self { http, gate }
    }

    fn snapshot_url() -> String {
        // fs selects SZ main/ChiNext and SH main/STAR boards.
        format!(
            "{ENDPOINT}?pn=1&pz=6000&po=1&fltt=2&fid=f12\
             &fs=m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23\
             &fields=f2,f5,f12,f14,f15,f16,f17"
        )
    }

    fn decode(body: &str, code: &StockCode) -> Result<Quote, SourceError> {
        let envelope: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| SourceError::malformed(format!("invalid json envelope: {e}")))?;

        let rows = envelope
            .get("data")
            .and_then(|data| data.get("diff"))
            .and_then(|diff| diff.as_array())
            .ok_or_else(|| SourceError::unavailable("snapshot returned no data"))?;

        if rows.is_empty() {
            return Err(SourceError::unavailable("snapshot returned no rows"));
        }

        let row = rows
            .iter()
            .find(|row| {
                json_string(row, "f12")
                    .map(|raw| format!("{raw:0>6}") == code.as_str())
                    .unwrap_or(false)
            })
            .ok_or_else(|| SourceError::not_found("code not present in snapshot"))?;

        let name = json_string(row, "f14").unwrap_or_else(|| FALLBACK_NAME.to_owned());
        let close = json_f64(row, "f2");
        let open = json_f64(row, "f17");
        let high = json_f64(row, "f15");
        let low = json_f64(row, "f16");
        let volume = json_u64(row, "f5");

        Quote::new(name, open, close, high, low, volume)
            .map_err(|e| SourceError::malformed(e.to_string()))
    }
}

impl QuoteSource for SpotSnapshotAdapter {
    fn id(&self) -> SourceId {
        SourceId::Spot
    }

    fn fetch_quote<'a>(
        &'a self,
        code: &'a StockCode,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let url = Self::snapshot_url();
            self.gate.clear(&url).await?;

            let request = HttpRequest::get(&url)
                .with_header("referer", REFERER)
                .with_header("user-agent", BROWSER_USER_AGENT)
                .with_timeout_ms(SNAPSHOT_TIMEOUT_MS);

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

            Self::decode(&response.body, code)
        })
    }
}
