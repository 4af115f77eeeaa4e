//! Sina realtime quote endpoint (`hq.sinajs.cn`).
//!
//! The payload is a JavaScript assignment whose quoted value is a
//! comma-separated record: name, open, previous close, current, high, low,
//! then bid/ask levels, with volume in shares at index 8. A current price of
//! zero (suspended instrument) falls back to the previous close. The endpoint
//! rejects requests without a Sina referer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapter::{QuoteSource, SourceError};
use crate::adapters::{parse_f64_or_zero, parse_u64_or_zero, BROWSER_USER_AGENT, REQUEST_TIMEOUT_MS};
use crate::gate::CrawlGate;
use crate::http::{HttpClient, HttpRequest};
use crate::{Quote, SourceId, StockCode};

const ENDPOINT: &str = "http://hq.sinajs.cn/list=";
const REFERER: &str = "http://finance.sina.com.cn/";

pub struct SinaAdapter {
    http: Arc<dyn HttpClient>,
    gate: CrawlGate,
}

impl SinaAdapter {
    pub fn new(http: Arc<dyn HttpClient>, gate: CrawlGate) -> Self {
        Self { http, gate }
    }

    fn quote_url(code: &StockCode) -> String {
        let prefix = if code.is_shanghai() { "sh" } else { "sz" };
        format!("{ENDPOINT}{prefix}{code}")
    }

    fn decode(body: &str) -> Result<Quote, SourceError> {
        // var hq_str_sh600519="贵州茅台,1700.00,...";
        let payload = body
            .split('"')
            .nth(1)
            .ok_or_else(|| SourceError::malformed("response carries no quoted payload"))?;

        if payload.trim().is_empty() {
            return Err(SourceError::not_found("empty payload for code"));
        }

        let fields: Vec<&str> = payload.split(',').collect();
        if fields.len() < 6 {
            return Err(SourceError::malformed(format!(
                "expected at least 6 fields, got {}",
                fields.len()
            )));
        }

        let name = fields[0].trim();
        let open = parse_f64_or_zero(fields.get(1).copied());
        let prev_close = parse_f64_or_zero(fields.get(2).copied());
        let mut current = parse_f64_or_zero(fields.get(3).copied());
        let high = parse_f64_or_zero(fields.get(4).copied());
        let low = parse_f64_or_zero(fields.get(5).copied());
        // Volume arrives in hands (lots of 100 shares).
        let volume = parse_u64_or_zero(fields.get(8).copied()) * 100;

        if current == 0.0 {
            current = prev_close;
        }

        Quote::new(name, open, current, high, low, volume)
            .map_err(|e| SourceError::malformed(e.to_string()))
    }
}

impl QuoteSource for SinaAdapter {
    fn id(&self) -> SourceId {
        SourceId::Sina
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SourceErrorKind;
    use crate::adapters::testing::{denying_gate, permissive_gate, StaticHttpClient};

    const MOUTAI: &str = "var hq_str_sh600519=\"贵州茅台,1700.00,1695.00,1712.30,1720.00,1698.50,1712.00,1712.30,2831400,4841253000.00,100,1712.00,200,1711.99,300,1711.98,400,1711.97,500,1711.96,100,1712.30,200,1712.31,300,1712.32,400,1712.33,500,1712.34,2024-06-14,15:00:00,00\";";

    fn code(raw: &str) -> StockCode {
        StockCode::parse(raw).expect("valid code")
    }

    #[tokio::test]
    async fn decodes_a_realtime_payload() {
        let http = Arc::new(StaticHttpClient::success(MOUTAI));
        let adapter = SinaAdapter::new(http, permissive_gate());

        let quote = adapter.fetch_quote(&code("600519")).await.expect("quote");
        assert_eq!(quote.name, "贵州茅台");
        assert_eq!(quote.open, 1700.00);
        assert_eq!(quote.close, 1712.30);
        assert_eq!(quote.high, 1720.00);
        assert_eq!(quote.low, 1698.50);
        assert_eq!(quote.volume, 283_140_000);
    }

    #[tokio::test]
    async fn suspended_instrument_falls_back_to_previous_close() {
        let body = "var hq_str_sz000001=\"平安银行,0.00,10.50,0.00,0.00,0.00,0,0,0\";";
        let http = Arc::new(StaticHttpClient::success(body));
        let adapter = SinaAdapter::new(http, permissive_gate());

        let quote = adapter.fetch_quote(&code("000001")).await.expect("quote");
        assert_eq!(quote.close, 10.50);
    }

    #[tokio::test]
    async fn empty_payload_maps_to_not_found() {
        let http = Arc::new(StaticHttpClient::success("var hq_str_sh600000=\"\";"));
        let adapter = SinaAdapter::new(http, permissive_gate());

        let err = adapter.fetch_quote(&code("600000")).await.expect_err("err");
        assert_eq!(err.kind(), SourceErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unquoted_body_is_malformed() {
        let http = Arc::new(StaticHttpClient::success("<html>blocked</html>"));
        let adapter = SinaAdapter::new(http, permissive_gate());

        let err = adapter.fetch_quote(&code("600519")).await.expect_err("err");
        assert_eq!(err.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let http = Arc::new(StaticHttpClient::status(456, ""));
        let adapter = SinaAdapter::new(http, permissive_gate());

        let err = adapter.fetch_quote(&code("600519")).await.expect_err("err");
        assert_eq!(err.kind(), SourceErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn denied_policy_short_circuits_before_the_request() {
        let http = Arc::new(StaticHttpClient::success(MOUTAI));
        let adapter = SinaAdapter::new(Arc::clone(&http) as Arc<dyn HttpClient>, denying_gate());

        let err = adapter.fetch_quote(&code("600519")).await.expect_err("err");
        assert_eq!(err.kind(), SourceErrorKind::PolicyDenied);
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn shenzhen_codes_use_the_sz_prefix() {
        assert_eq!(
            SinaAdapter::quote_url(&code("000001")),
            "http://hq.sinajs.cn/list=sz000001"
        );
        assert_eq!(
            SinaAdapter::quote_url(&code("600519")),
            "http://hq.sinajs.cn/list=sh600519"
        );
    }
}
