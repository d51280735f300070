use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical source identifiers, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Innertube,
    Direct,
    Converter,
    Ytdlp,
}

impl ProviderId {
    /// Cheapest-first order used by the standard fallback chain.
    pub const ALL: [Self; 4] = [Self::Innertube, Self::Direct, Self::Converter, Self::Ytdlp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Innertube => "innertube",
            Self::Direct => "direct",
            Self::Converter => "converter",
            Self::Ytdlp => "ytdlp",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "innertube" => Ok(Self::Innertube),
            "direct" => Ok(Self::Direct),
            "converter" => Ok(Self::Converter),
            "ytdlp" => Ok(Self::Ytdlp),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
