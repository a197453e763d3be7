use serde::{Deserialize, Serialize};

/// Point-in-time market and fundamental data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(rename = "high52Week")]
    pub high_52_week: f64,
    #[serde(rename = "low52Week")]
    pub low_52_week: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
}

impl StockSnapshot {
    /// Snapshot carrying only a quote; every fundamental is absent.
    pub fn quote(symbol: impl Into<String>, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change,
            change_percent,
            volume: 0,
            high_52_week: price,
            low_52_week: price,
            sector: None,
            industry: None,
            pe_ratio: None,
            dividend_yield: None,
            market_cap: None,
            beta: None,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Sector name used for allocation; absent or blank sectors read as "Unknown".
    pub fn sector_or_unknown(&self) -> &str {
        self.sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SECTOR)
    }
}

pub const UNKNOWN_SECTOR: &str = "Unknown";

/// One lot of a stock in a user's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    pub average_price: f64,
    pub stats: StockSnapshot,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, shares: f64, average_price: f64, stats: StockSnapshot) -> Self {
        Self {
            symbol: symbol.into(),
            shares,
            average_price,
            stats,
        }
    }

    pub fn market_value(&self) -> f64 {
        self.shares * self.stats.price
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares * self.average_price
    }

    pub fn gain_loss(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }

    /// Gain relative to cost basis, in percent. `None` when nothing was paid.
    pub fn gain_loss_percent(&self) -> Option<f64> {
        let cost = self.cost_basis();
        (cost != 0.0).then(|| self.gain_loss() / cost * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percent: Option<f64>,
}

impl PortfolioSummary {
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let total_value: f64 = holdings.iter().map(Holding::market_value).sum();
        let total_cost: f64 = holdings.iter().map(Holding::cost_basis).sum();
        let total_gain_loss = total_value - total_cost;
        let gain_loss_percent = (total_cost != 0.0).then(|| total_gain_loss / total_cost * 100.0);

        Self {
            total_value,
            total_cost,
            total_gain_loss,
            gain_loss_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_snapshot_with_optional_fundamentals() {
        let v = json!({
            "symbol": "AAPL",
            "price": 175.43,
            "change": 2.1,
            "changePercent": 1.21,
            "volume": 1000,
            "high52Week": 199.62,
            "low52Week": 124.17,
            "sector": "Technology"
        });

        let snap: StockSnapshot = serde_json::from_value(v).unwrap();
        assert_eq!(snap.sector.as_deref(), Some("Technology"));
        assert_eq!(snap.high_52_week, 199.62);
        assert!(snap.pe_ratio.is_none());
        assert!(snap.beta.is_none());
    }

    #[test]
    fn blank_sector_reads_as_unknown() {
        let snap = StockSnapshot::quote("X", 1.0, 0.0, 0.0).with_sector("  ");
        assert_eq!(snap.sector_or_unknown(), UNKNOWN_SECTOR);
        let snap = StockSnapshot::quote("X", 1.0, 0.0, 0.0);
        assert_eq!(snap.sector_or_unknown(), UNKNOWN_SECTOR);
    }

    #[test]
    fn summary_reports_gain_against_cost_basis() {
        let holdings = vec![
            Holding::new("AAPL", 10.0, 150.0, StockSnapshot::quote("AAPL", 175.0, 0.0, 0.0)),
            Holding::new("JNJ", 5.0, 160.0, StockSnapshot::quote("JNJ", 150.0, 0.0, 0.0)),
        ];

        let summary = PortfolioSummary::from_holdings(&holdings);
        assert_eq!(summary.total_value, 2500.0);
        assert_eq!(summary.total_cost, 2300.0);
        assert_eq!(summary.total_gain_loss, 200.0);
        let pct = summary.gain_loss_percent.unwrap();
        assert!((pct - 8.695652).abs() < 1e-4);
    }

    #[test]
    fn empty_summary_has_no_percent() {
        let summary = PortfolioSummary::from_holdings(&[]);
        assert_eq!(summary.total_value, 0.0);
        assert!(summary.gain_loss_percent.is_none());
    }

    #[test]
    fn summary_and_holding_share_camel_case_keys() {
        let holding = Holding::new("AAPL", 1.0, 100.0, StockSnapshot::quote("AAPL", 110.0, 0.0, 0.0));
        let summary = serde_json::to_value(PortfolioSummary::from_holdings(&[holding.clone()])).unwrap();
        assert_eq!(summary["totalValue"], json!(110.0));
        assert_eq!(summary["totalGainLoss"], json!(10.0));
        assert!(summary.get("total_value").is_none());

        let holding = serde_json::to_value(holding).unwrap();
        assert_eq!(holding["averagePrice"], json!(100.0));
    }
}
