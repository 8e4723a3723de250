//! Named lookback periods.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named trailing window, e.g. "5Y" covering five calendar years.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Display label.
    pub label: String,
    /// Length in calendar years.
    pub years: u32,
}

impl Period {
    /// Create a new period.
    pub fn new(label: impl Into<String>, years: u32) -> Self {
        Self {
            label: label.into(),
            years,
        }
    }

    /// The standard 10Y / 5Y / 3Y / 1Y set.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("10Y", 10),
            Self::new("5Y", 5),
            Self::new("3Y", 3),
            Self::new("1Y", 1),
        ]
    }

    /// First date of the window ending at `end`.
    ///
    /// Month arithmetic: a Feb 29 end maps to Feb 28 in non-leap years.
    pub fn start_for(&self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, (2024, 6, 28), (2023, 6, 28))]
    #[case(5, (2024, 6, 28), (2019, 6, 28))]
    #[case(1, (2024, 2, 29), (2023, 2, 28))]
    #[case(10, (2023, 12, 31), (2013, 12, 31))]
    fn test_start_for(#[case] years: u32, #[case] end: (i32, u32, u32), #[case] start: (i32, u32, u32)) {
        let period = Period::new(format!("{years}Y"), years);
        let end = NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap();
        let expected = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        assert_eq!(period.start_for(end), expected);
    }

    #[test]
    fn test_defaults_order() {
        let labels: Vec<String> = Period::defaults().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["10Y", "5Y", "3Y", "1Y"]);
    }
}
