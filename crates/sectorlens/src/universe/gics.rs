//! GICS (Global Industry Classification Standard) sectors and their
//! Select Sector SPDR ETFs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GICS Level 1 sectors (11 sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GicsSector {
    /// Information Technology
    InformationTechnology,

    /// Health Care
    HealthCare,

    /// Financials
    Financials,

    /// Consumer Discretionary
    ConsumerDiscretionary,

    /// Communication Services
    CommunicationServices,

    /// Industrials
    Industrials,

    /// Consumer Staples
    ConsumerStaples,

    /// Energy
    Energy,

    /// Utilities
    Utilities,

    /// Real Estate
    RealEstate,

    /// Materials
    Materials,
}

impl GicsSector {
    /// Returns all GICS sectors, in the customary Select Sector ETF order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ConsumerDiscretionary,
            Self::ConsumerStaples,
            Self::Energy,
            Self::Financials,
            Self::HealthCare,
            Self::Industrials,
            Self::Materials,
            Self::InformationTechnology,
            Self::CommunicationServices,
            Self::RealEstate,
            Self::Utilities,
        ]
    }

    /// Returns the full sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InformationTechnology => "Information Technology",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::CommunicationServices => "Communication Services",
            Self::Industrials => "Industrials",
            Self::ConsumerStaples => "Consumer Staples",
            Self::Energy => "Energy",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
            Self::Materials => "Materials",
        }
    }

    /// Ticker of the SPDR Select Sector ETF tracking this sector.
    pub const fn etf(&self) -> &'static str {
        match self {
            Self::ConsumerDiscretionary => "XLY",
            Self::ConsumerStaples => "XLP",
            Self::Energy => "XLE",
            Self::Financials => "XLF",
            Self::HealthCare => "XLV",
            Self::Industrials => "XLI",
            Self::Materials => "XLB",
            Self::InformationTechnology => "XLK",
            Self::CommunicationServices => "XLC",
            Self::RealEstate => "XLRE",
            Self::Utilities => "XLU",
        }
    }

    /// Sector tracked by a Select Sector ETF ticker (case-insensitive).
    pub fn from_etf(symbol: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|sector| sector.etf().eq_ignore_ascii_case(symbol))
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
