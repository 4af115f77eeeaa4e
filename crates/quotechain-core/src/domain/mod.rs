//! Canonical domain types: validated stock codes, quotes, and capture
//! timestamps. Construction validates invariants; invalid states are
//! unrepresentable once a value exists.

mod code;
mod models;
mod timestamp;

pub use code::StockCode;
pub use models::{AnnotatedQuote, Quote};
pub use timestamp::FetchedAt;
