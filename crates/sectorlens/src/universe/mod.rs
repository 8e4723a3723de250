//! The instruments a run analyzes.
//!
//! A universe is the configured sector ETFs plus the benchmark index and an
//! optional volatility index. Each instrument carries a role so that later
//! stages know which series is the benchmark and which ones are not
//! investable returns.

pub mod gics;

pub use gics::GicsSector;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for instrument universes.
pub trait Universe {
    /// Get all symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Get the number of instruments.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

/// What an instrument is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentRole {
    /// A Select Sector ETF.
    Sector(GicsSector),
    /// The broad-market benchmark.
    Benchmark,
    /// The volatility index; its level is not an investable return.
    VolatilityIndex,
    /// Any other configured symbol.
    Other,
}

/// A ticker with display name and role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Role in the analysis.
    pub role: InstrumentRole,
}

impl Instrument {
    /// A sector ETF, or an `Other` instrument when the ticker is not a known
    /// Select Sector ETF.
    pub fn sector_etf(symbol: &str) -> Self {
        match GicsSector::from_etf(symbol) {
            Some(sector) => Self {
                symbol: symbol.to_string(),
                name: sector.name().to_string(),
                role: InstrumentRole::Sector(sector),
            },
            None => Self {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                role: InstrumentRole::Other,
            },
        }
    }

    /// The benchmark index.
    pub fn benchmark(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: index_name(symbol),
            role: InstrumentRole::Benchmark,
        }
    }

    /// The volatility index.
    pub fn volatility_index(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: index_name(symbol),
            role: InstrumentRole::VolatilityIndex,
        }
    }

    /// Whether the price level can be read as an investment return.
    pub const fn is_investable(&self) -> bool {
        !matches!(self.role, InstrumentRole::VolatilityIndex)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.name)
    }
}

fn index_name(symbol: &str) -> String {
    match symbol {
        "^GSPC" => "S&P 500".to_string(),
        "^VIX" => "CBOE Volatility Index".to_string(),
        other => other.to_string(),
    }
}

/// Sector ETFs plus benchmark and volatility index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorUniverse {
    instruments: Vec<Instrument>,
}

impl SectorUniverse {
    /// Build a universe; an empty `volatility_index` disables it and symbols
    /// already present are not added twice.
    pub fn new(sectors: &[String], benchmark: &str, volatility_index: &str) -> Self {
        let mut instruments: Vec<Instrument> = Vec::with_capacity(sectors.len() + 2);
        let mut push = |instrument: Instrument| {
            if !instruments.iter().any(|i| i.symbol == instrument.symbol) {
                instruments.push(instrument);
            }
        };

        push(Instrument::benchmark(benchmark));
        for symbol in sectors.iter().filter(|s| !s.trim().is_empty()) {
            push(Instrument::sector_etf(symbol.trim()));
        }
        if !volatility_index.trim().is_empty() {
            push(Instrument::volatility_index(volatility_index.trim()));
        }

        Self { instruments }
    }

    /// The eleven Select Sector SPDR ETFs against the S&P 500 and the VIX.
    pub fn select_sectors() -> Self {
        let sectors: Vec<String> = GicsSector::all().iter().map(|s| s.etf().to_string()).collect();
        Self::new(&sectors, "^GSPC", "^VIX")
    }

    /// All instruments, benchmark first.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Instrument by symbol.
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    /// The benchmark instrument.
    pub fn benchmark(&self) -> Option<&Instrument> {
        self.instruments
            .iter()
            .find(|i| i.role == InstrumentRole::Benchmark)
    }
}

impl Universe for SectorUniverse {
    fn symbols(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.symbol.clone()).collect()
    }
}
