use crate::domain::holding::StockSnapshot;
use anyhow::Context;

/// Ordered source of recommendation candidates.
pub trait ReferenceCatalog: Send + Sync {
    fn candidates(&self) -> &[StockSnapshot];

    fn candidates_in_sector(&self, sector: &str) -> Vec<&StockSnapshot> {
        self.candidates()
            .iter()
            .filter(|s| s.sector.as_deref() == Some(sector))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct StaticCatalog {
    stocks: Vec<StockSnapshot>,
}

impl StaticCatalog {
    pub fn from_snapshots(stocks: Vec<StockSnapshot>) -> Self {
        Self { stocks }
    }

    /// Parses a JSON array of snapshots (camelCase keys).
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let stocks = serde_json::from_str::<Vec<StockSnapshot>>(s)
            .context("catalog is not a JSON array of stock snapshots")?;
        for stock in &stocks {
            anyhow::ensure!(!stock.symbol.trim().is_empty(), "catalog symbol must be non-empty");
        }
        Ok(Self { stocks })
    }

    /// Built-in reference list used until a live screener is wired in.
    pub fn mocked() -> Self {
        Self::from_snapshots(vec![
            entry("NVDA", 789.45, 12.5, 1.61, 23_456_789, 800.12, 400.23, "Technology", "Semiconductors", Some(65.2), Some(0.02), Some(1.94e12), Some(1.68)),
            entry("AMD", 178.23, 5.67, 3.29, 45_678_912, 185.45, 95.67, "Technology", "Semiconductors", Some(48.7), None, Some(2.88e11), Some(1.71)),
            entry("JNJ", 156.78, 1.23, 0.79, 5_678_912, 165.34, 140.23, "Healthcare", "Drug Manufacturers", Some(15.4), Some(3.05), Some(3.77e11), Some(0.54)),
            entry("UNH", 478.90, 3.45, 0.73, 2_345_678, 490.12, 420.56, "Healthcare", "Healthcare Plans", Some(21.3), Some(1.52), Some(4.42e11), Some(0.61)),
            entry("V", 267.89, 2.34, 0.88, 6_789_123, 275.45, 220.34, "Financial Services", "Credit Services", Some(30.1), Some(0.78), Some(5.46e11), Some(0.95)),
            entry("JPM", 189.45, 1.56, 0.83, 8_901_234, 195.67, 150.23, "Financial Services", "Banks", Some(11.6), Some(2.32), Some(5.45e11), Some(1.12)),
            entry("XOM", 104.12, -0.87, -0.83, 15_234_567, 123.75, 95.77, "Energy", "Oil & Gas Integrated", Some(12.1), Some(3.64), Some(4.13e11), Some(0.91)),
            entry("CVX", 151.34, -1.02, -0.67, 7_123_456, 171.70, 139.62, "Energy", "Oil & Gas Integrated", Some(14.2), Some(4.21), Some(2.85e11), Some(1.09)),
            entry("NEE", 59.87, 0.45, 0.76, 9_876_543, 80.92, 47.15, "Utilities", "Utilities - Regulated Electric", Some(16.5), Some(3.11), Some(1.23e11), Some(0.47)),
            entry("PG", 158.92, 0.64, 0.40, 6_234_567, 163.06, 141.45, "Consumer Defensive", "Household & Personal Products", Some(26.0), Some(2.37), Some(3.74e11), Some(0.42)),
            entry("KO", 60.12, 0.21, 0.35, 12_345_678, 64.99, 51.55, "Consumer Defensive", "Beverages - Non-Alcoholic", Some(24.4), Some(3.07), Some(2.59e11), Some(0.59)),
            entry("PLD", 128.45, -0.92, -0.71, 3_456_789, 137.52, 96.64, "Real Estate", "REIT - Industrial", Some(38.9), Some(2.72), Some(1.19e11), Some(1.05)),
        ])
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::mocked()
    }
}

impl ReferenceCatalog for StaticCatalog {
    fn candidates(&self) -> &[StockSnapshot] {
        &self.stocks
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    symbol: &str,
    price: f64,
    change: f64,
    change_percent: f64,
    volume: u64,
    high_52_week: f64,
    low_52_week: f64,
    sector: &str,
    industry: &str,
    pe_ratio: Option<f64>,
    dividend_yield: Option<f64>,
    market_cap: Option<f64>,
    beta: Option<f64>,
) -> StockSnapshot {
    StockSnapshot {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        volume,
        high_52_week,
        low_52_week,
        sector: Some(sector.to_string()),
        industry: Some(industry.to_string()),
        pe_ratio,
        dividend_yield,
        market_cap,
        beta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sector::is_canonical;

    #[test]
    fn mocked_catalog_uses_canonical_sectors() {
        let catalog = StaticCatalog::mocked();
        assert!(!catalog.candidates().is_empty());
        for stock in catalog.candidates() {
            assert!(is_canonical(stock.sector_or_unknown()), "{}", stock.symbol);
        }
    }

    #[test]
    fn sector_lookup_preserves_catalog_order() {
        let catalog = StaticCatalog::mocked();
        let tech: Vec<_> = catalog
            .candidates_in_sector("Technology")
            .into_iter()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(tech, vec!["NVDA", "AMD"]);
        assert!(catalog.candidates_in_sector("Industrials").is_empty());
    }

    #[test]
    fn parses_catalog_json() {
        let json = r#"[{"symbol":"T","price":17.0,"change":0.1,"changePercent":0.5,
            "volume":10,"high52Week":18.0,"low52Week":13.0,"sector":"Communication Services"}]"#;
        let catalog = StaticCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.candidates_in_sector("Communication Services").len(), 1);
    }

    #[test]
    fn rejects_blank_symbols() {
        let json = r#"[{"symbol":" ","price":1.0,"change":0.0,"changePercent":0.0,
            "volume":0,"high52Week":1.0,"low52Week":1.0}]"#;
        assert!(StaticCatalog::from_json_str(json).is_err());
    }
}
