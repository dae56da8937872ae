use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Banks with a dedicated extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankId {
    Abb,
    Asb,
    Afb,
    #[serde(rename = "expressbank")]
    ExpressBank,
    #[serde(rename = "turanbank")]
    TuranBank,
}

impl BankId {
    pub const ALL: [Self; 5] = [
        Self::Abb,
        Self::Asb,
        Self::Afb,
        Self::ExpressBank,
        Self::TuranBank,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abb => "abb",
            Self::Asb => "asb",
            Self::Afb => "afb",
            Self::ExpressBank => "expressbank",
            Self::TuranBank => "turanbank",
        }
    }

    /// Name used in the combined dataset.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Abb => "ABB Bank",
            Self::Asb => "ASB Bank",
            Self::Afb => "AFB",
            Self::ExpressBank => "Express Bank",
            Self::TuranBank => "Turan Bank",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Abb => "abb_branches.csv",
            Self::Asb => "asb_branches.csv",
            Self::Afb => "afb_branches.csv",
            Self::ExpressBank => "expressbank_branches.csv",
            Self::TuranBank => "turanbank_branches.csv",
        }
    }

    /// Sites that publish addresses only, so coordinates come from the geocoder.
    pub const fn needs_geocoding(self) -> bool {
        matches!(self, Self::Afb | Self::TuranBank)
    }
}

impl Display for BankId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abb" => Ok(Self::Abb),
            "asb" => Ok(Self::Asb),
            "afb" => Ok(Self::Afb),
            "expressbank" | "express" => Ok(Self::ExpressBank),
            "turanbank" | "turan" => Ok(Self::TuranBank),
            other => Err(ValidationError::InvalidBank {
                value: other.to_owned(),
            }),
        }
    }
}
