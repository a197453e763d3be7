use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback window for a price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[default]
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "ALL")]
    All,
}

impl HistoryRange {
    pub const ALL_RANGES: [HistoryRange; 7] = [
        HistoryRange::OneWeek,
        HistoryRange::OneMonth,
        HistoryRange::ThreeMonths,
        HistoryRange::SixMonths,
        HistoryRange::OneYear,
        HistoryRange::FiveYears,
        HistoryRange::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRange::OneWeek => "1W",
            HistoryRange::OneMonth => "1M",
            HistoryRange::ThreeMonths => "3M",
            HistoryRange::SixMonths => "6M",
            HistoryRange::OneYear => "1Y",
            HistoryRange::FiveYears => "5Y",
            HistoryRange::All => "ALL",
        }
    }

    /// Short windows chart the 30-minute series; longer ones the daily closes.
    pub fn uses_intraday(&self) -> bool {
        matches!(self, HistoryRange::OneWeek | HistoryRange::OneMonth)
    }

    pub fn start(&self, end: NaiveDateTime) -> NaiveDateTime {
        let years = |n: u32| end.checked_sub_months(Months::new(12 * n)).unwrap_or(NaiveDateTime::MIN);
        match self {
            HistoryRange::OneWeek => end - Duration::days(7),
            HistoryRange::OneMonth => end - Duration::days(30),
            HistoryRange::ThreeMonths => end - Duration::days(90),
            HistoryRange::SixMonths => end - Duration::days(180),
            HistoryRange::OneYear => years(1),
            HistoryRange::FiveYears => years(5),
            HistoryRange::All => years(30),
        }
    }

    pub fn contains(&self, ts: NaiveDateTime, end: NaiveDateTime) -> bool {
        ts >= self.start(end) && ts <= end
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL_RANGES
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown history range {s:?} (expected 1W, 1M, 3M, 6M, 1Y, 5Y or ALL)"))
    }
}
