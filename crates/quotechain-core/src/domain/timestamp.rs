use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Wall-clock capture timestamp with second precision.
///
/// Rendered as `YYYY-MM-DD HH:MM:SS`; sub-second components are dropped at
/// construction so two renders of the same value always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchedAt(OffsetDateTime);

const FETCHED_AT_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

impl FetchedAt {
    pub fn now() -> Self {
        Self::from_offset_datetime(OffsetDateTime::now_utc())
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        Self(value.replace_nanosecond(0).unwrap_or(value))
    }

    pub fn parse(input: &str) -> Result<Self, time::error::Parse> {
        let parsed = PrimitiveDateTime::parse(input, FETCHED_AT_FORMAT)?;
        Ok(Self(parsed.assume_utc()))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn render(self) -> String {
        self.0
            .format(FETCHED_AT_FORMAT)
            .expect("capture timestamp must be formattable")
    }
}

impl Display for FetchedAt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for FetchedAt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for FetchedAt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
