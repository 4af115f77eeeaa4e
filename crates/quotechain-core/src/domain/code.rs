use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CODE_LEN: usize = 6;

/// Normalized 6-digit A-share stock code.
///
/// All-digit inputs shorter than six characters are left-padded with zeros
/// ("1" becomes "000001"); anything containing a non-digit is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    /// Parse and normalize a raw code to exactly six ASCII digits.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCode);
        }

        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::CodeNotNumeric {
                value: trimmed.to_owned(),
            });
        }

        let len = trimmed.len();
        if len > CODE_LEN {
            return Err(ValidationError::CodeTooLong { len });
        }

        let mut normalized = String::with_capacity(CODE_LEN);
        for _ in len..CODE_LEN {
            normalized.push('0');
        }
        normalized.push_str(trimmed);

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shanghai-listed codes start with '6'; everything else trades in Shenzhen.
    pub fn is_shanghai(&self) -> bool {
        self.0.starts_with('6')
    }
}

impl Display for StockCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StockCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for StockCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StockCode> for String {
    fn from(value: StockCode) -> Self {
        value.0
    }
}
