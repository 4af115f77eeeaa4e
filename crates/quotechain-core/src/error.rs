use thiserror::Error;

/// Validation and contract errors exposed by `quotechain-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("stock code cannot be empty")]
    EmptyCode,
    #[error("stock code must contain only ASCII digits: '{value}'")]
    CodeNotNumeric { value: String },
    #[error("stock code length {len} exceeds 6 digits")]
    CodeTooLong { len: usize },

    #[error("invalid source '{value}', expected one of spot, sina, tencent, eastmoney")]
    InvalidSource { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}
