use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical source identifiers used for registration order and provenance
/// tags. `Spot` is the aggregated full-market snapshot source that serves as
/// the bounded-timeout primary in the default configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Spot,
    Sina,
    Tencent,
    EastMoney,
}

impl SourceId {
    pub const ALL: [Self; 4] = [Self::Spot, Self::Sina, Self::Tencent, Self::EastMoney];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Sina => "sina",
            Self::Tencent => "tencent",
            Self::EastMoney => "eastmoney",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "sina" => Ok(Self::Sina),
            "tencent" => Ok(Self::Tencent),
            "eastmoney" => Ok(Self::EastMoney),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
