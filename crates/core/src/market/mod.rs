pub mod alpha_vantage;
pub mod error;
pub mod history;

use crate::domain::holding::StockSnapshot;
use chrono::{NaiveDate, NaiveDateTime};
use error::MarketDataError;
use history::HistoryRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Bar timestamp as reported by the provider; daily bars sit at midnight.
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

impl PricePoint {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub region: String,
    pub currency: String,
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot, MarketDataError>;

    /// Closing prices within `range`, oldest first.
    async fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, MarketDataError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError>;
}

/// Tickers are plain uppercase ASCII letters.
pub fn validate_symbol(symbol: &str) -> Result<(), MarketDataError> {
    if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(MarketDataError::InvalidSymbol(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_validation() {
        assert!(validate_symbol("AAPL").is_ok());
        assert!(validate_symbol("V").is_ok());
        assert!(validate_symbol("aapl").is_err());
        assert!(validate_symbol("BRK.B").is_err());
        assert!(validate_symbol("").is_err());
    }
}
