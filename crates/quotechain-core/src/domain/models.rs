use serde::{Deserialize, Serialize};

use crate::{FetchedAt, SourceId, ValidationError};

/// Canonical single-day quote as decoded from one provider.
///
/// High/low are carried as declared by the provider; the ordering invariant
/// (`high >= max(open, close)`, `low <= min(open, close)`) is restored by
/// [`Quote::sanitized`] before a quote ever reaches a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub name: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

impl Quote {
    pub fn new(
        name: impl Into<String>,
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("close", close)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;

        Ok(Self {
            name: name.into(),
            open,
            close,
            high,
            low,
            volume,
        })
    }

    /// Repair the high/low bounds so they bracket open and close.
    ///
    /// Providers routinely return zeroed or inverted extremes; the repaired
    /// quote satisfies `high >= max(open, close)`, `low <= min(open, close)`
    /// and `high >= low` without rejecting the rest of the data.
    pub fn sanitized(mut self) -> Self {
        let max_oc = self.open.max(self.close);
        let min_oc = self.open.min(self.close);

        if self.high < max_oc {
            self.high = max_oc;
        }
        if self.low > min_oc {
            self.low = min_oc;
        }
        if self.high < self.low {
            std::mem::swap(&mut self.high, &mut self.low);
        }

        self
    }
}

/// Quote plus provenance metadata, created once by the orchestrator
/// immediately before return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedQuote {
    #[serde(flatten)]
    pub quote: Quote,
    pub source: SourceId,
    pub fetched_at: FetchedAt,
}

impl AnnotatedQuote {
    pub fn new(quote: Quote, source: SourceId, fetched_at: FetchedAt) -> Self {
        Self {
            quote,
            source,
            fetched_at,
        }
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(open: f64, close: f64, high: f64, low: f64) -> Quote {
        Quote::new("测试股份", open, close, high, low, 1_000).expect("valid quote")
    }

    #[test]
    fn sanitize_lifts_high_to_cover_open_and_close() {
        let repaired = quote(10.0, 12.0, 0.0, 9.5).sanitized();
        assert_eq!(repaired.high, 12.0);
        assert_eq!(repaired.low, 9.5);
    }

    #[test]
    fn sanitize_lowers_low_below_open_and_close() {
        let repaired = quote(10.0, 12.0, 12.5, 11.0).sanitized();
        assert_eq!(repaired.low, 10.0);
        assert_eq!(repaired.high, 12.5);
    }

    #[test]
    fn sanitize_swaps_inverted_bounds() {
        // Both bounds collapse to open/close, then the swap fixes ordering.
        let repaired = quote(0.0, 0.0, -1.0, 1.0).sanitized();
        assert!(repaired.high >= repaired.low);
    }

    #[test]
    fn sanitize_keeps_consistent_quotes_untouched() {
        let original = quote(10.0, 12.0, 12.8, 9.9);
        let repaired = original.clone().sanitized();
        assert_eq!(repaired, original);
    }

    #[test]
    fn rejects_negative_open() {
        let err = Quote::new("x", -1.0, 0.0, 0.0, 0.0, 0).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::NegativeValue { field: "open" }
        ));
    }
}
