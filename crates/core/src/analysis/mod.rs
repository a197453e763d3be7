//! Portfolio analysis: sector allocation, diversification gaps and
//! recommendations, recomputed from scratch for every call.

pub mod analytics;
pub mod catalog;

use crate::domain::analysis::{PortfolioAnalysis, SectorAllocation, StockRecommendation};
use crate::domain::holding::{Holding, StockSnapshot};
use crate::domain::sector::CANONICAL_SECTORS;
use analytics::{AnalyticsGenerator, FormulaAnalytics};
use catalog::{ReferenceCatalog, StaticCatalog};
use std::collections::HashSet;

pub const BACKFILL_REASON: &str =
    "Strong fundamentals with attractive dividend yield or growth potential";

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub max_recommendations: usize,
    /// Allocation percentage below which a canonical sector is underrepresented.
    pub underrepresented_threshold: f64,
    pub top_sector_count: usize,
    /// Fill remaining recommendation slots with any un-held catalog stock.
    pub backfill: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_recommendations: 2,
            underrepresented_threshold: 5.0,
            top_sector_count: 3,
            backfill: true,
        }
    }
}

#[derive(Debug)]
pub struct Analyzer<C = StaticCatalog, G = FormulaAnalytics> {
    catalog: C,
    analytics: G,
    options: AnalyzerOptions,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(StaticCatalog::mocked(), FormulaAnalytics)
    }
}

impl<C: ReferenceCatalog, G: AnalyticsGenerator> Analyzer<C, G> {
    pub fn new(catalog: C, analytics: G) -> Self {
        Self {
            catalog,
            analytics,
            options: AnalyzerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    pub fn analyze(&self, holdings: &[Holding]) -> PortfolioAnalysis {
        let sector_allocation = sector_allocation(holdings);
        let top_sectors = top_sectors(&sector_allocation, self.options.top_sector_count);
        let underrepresented_sectors =
            underrepresented_sectors(&sector_allocation, self.options.underrepresented_threshold);
        let recommendations = self.recommend(holdings, &underrepresented_sectors);

        tracing::debug!(
            holdings = holdings.len(),
            sectors = sector_allocation.len(),
            underrepresented = underrepresented_sectors.len(),
            recommendations = recommendations.len(),
            "portfolio analyzed"
        );

        PortfolioAnalysis {
            sector_allocation,
            top_sectors,
            underrepresented_sectors,
            recommendations,
        }
    }

    fn recommend(&self, holdings: &[Holding], underrepresented: &[String]) -> Vec<StockRecommendation> {
        let max = self.options.max_recommendations;
        let held: HashSet<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
        let mut picked: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(max);

        for sector in underrepresented.iter().take(max) {
            let candidate = self
                .catalog
                .candidates_in_sector(sector)
                .into_iter()
                .find(|s| !held.contains(s.symbol.as_str()) && !picked.contains(&s.symbol));

            if let Some(stock) = candidate {
                picked.insert(stock.symbol.clone());
                out.push(self.recommendation(
                    stock,
                    format!("Adds exposure to the underrepresented {sector} sector"),
                ));
            }
        }

        if self.options.backfill {
            for stock in self.catalog.candidates() {
                if out.len() >= max {
                    break;
                }
                if held.contains(stock.symbol.as_str()) || picked.contains(&stock.symbol) {
                    continue;
                }
                picked.insert(stock.symbol.clone());
                out.push(self.recommendation(stock, BACKFILL_REASON.to_string()));
            }
        }

        out
    }

    fn recommendation(&self, stock: &StockSnapshot, reason: String) -> StockRecommendation {
        StockRecommendation {
            symbol: stock.symbol.clone(),
            reason,
            stats: stock.clone(),
            analytics: self.analytics.generate(stock),
        }
    }
}

/// Percentage of total market value per sector, in first-seen order.
///
/// A portfolio worth nothing still lists its sectors, each at 0%.
pub fn sector_allocation(holdings: &[Holding]) -> SectorAllocation {
    let total_value: f64 = holdings.iter().map(Holding::market_value).sum();
    let mut out = SectorAllocation::new();

    if total_value == 0.0 && !holdings.is_empty() {
        tracing::debug!(holdings = holdings.len(), "portfolio has zero market value; allocation clamped to 0%");
    }

    for holding in holdings {
        let percent = if total_value > 0.0 {
            holding.market_value() / total_value * 100.0
        } else {
            0.0
        };
        out.accumulate(holding.stats.sector_or_unknown(), percent);
    }

    out
}

/// Highest-allocation sectors, descending; ties keep first-seen order.
pub fn top_sectors(allocation: &SectorAllocation, count: usize) -> Vec<String> {
    let mut entries: Vec<(&str, f64)> = allocation.iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
        .into_iter()
        .take(count)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn underrepresented_sectors(allocation: &SectorAllocation, threshold: f64) -> Vec<String> {
    CANONICAL_SECTORS
        .iter()
        .filter(|sector| allocation.get(sector).map_or(true, |pct| pct < threshold))
        .map(|sector| sector.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::holding::StockSnapshot;

    fn holding(symbol: &str, shares: f64, price: f64, sector: Option<&str>) -> Holding {
        let mut stats = StockSnapshot::quote(symbol, price, 0.5, 0.3);
        stats.sector = sector.map(str::to_string);
        Holding::new(symbol, shares, price, stats)
    }

    #[test]
    fn single_technology_holding() {
        let holdings = vec![holding("AAPL", 10.0, 175.43, Some("Technology"))];
        let analysis = Analyzer::default().analyze(&holdings);

        assert_eq!(analysis.sector_allocation.len(), 1);
        assert_eq!(analysis.sector_allocation.get("Technology"), Some(100.0));
        assert_eq!(analysis.top_sectors, vec!["Technology"]);
        assert_eq!(analysis.underrepresented_sectors.len(), 10);
        assert!(!analysis.underrepresented_sectors.contains(&"Technology".to_string()));

        let symbols: Vec<_> = analysis.recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["JNJ", "V"]);
        assert_eq!(
            analysis.recommendations[0].reason,
            "Adds exposure to the underrepresented Healthcare sector"
        );
    }

    #[test]
    fn empty_portfolio_draws_from_canonical_order() {
        let analysis = Analyzer::default().analyze(&[]);
        assert!(analysis.sector_allocation.is_empty());
        assert!(analysis.top_sectors.is_empty());
        assert_eq!(analysis.underrepresented_sectors.len(), CANONICAL_SECTORS.len());
        let symbols: Vec<_> = analysis.recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["NVDA", "JNJ"]);
    }

    #[test]
    fn allocation_sums_to_100_and_unknown_sector_is_bucketed() {
        let holdings = vec![
            holding("AAPL", 3.0, 100.0, Some("Technology")),
            holding("XYZ", 1.0, 50.0, None),
            holding("MSFT", 2.0, 50.0, Some("Technology")),
            holding("JNJ", 5.0, 10.0, Some("Healthcare")),
        ];
        let alloc = sector_allocation(&holdings);

        assert!((alloc.total() - 100.0).abs() < 1e-9);
        let order: Vec<_> = alloc.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["Technology", "Unknown", "Healthcare"]);
        assert!((alloc.get("Technology").unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn top_sectors_descending_with_stable_ties() {
        let mut alloc = SectorAllocation::new();
        alloc.accumulate("Energy", 20.0);
        alloc.accumulate("Utilities", 40.0);
        alloc.accumulate("Healthcare", 20.0);
        alloc.accumulate("Technology", 20.0);

        assert_eq!(top_sectors(&alloc, 3), vec!["Utilities", "Energy", "Healthcare"]);
    }

    #[test]
    fn sector_at_threshold_is_not_underrepresented() {
        let mut alloc = SectorAllocation::new();
        alloc.accumulate("Energy", 5.0);
        alloc.accumulate("Utilities", 4.99);
        alloc.accumulate("Unknown", 90.01);

        let under = underrepresented_sectors(&alloc, 5.0);
        assert!(!under.contains(&"Energy".to_string()));
        assert!(under.contains(&"Utilities".to_string()));
        assert!(!under.contains(&"Unknown".to_string()));
        assert_eq!(under.len(), 10);
    }

    #[test]
    fn zero_price_holding_contributes_zero_percent() {
        let holdings = vec![
            holding("AAPL", 10.0, 100.0, Some("Technology")),
            holding("DEAD", 50.0, 0.0, Some("Energy")),
        ];
        let alloc = sector_allocation(&holdings);
        assert_eq!(alloc.get("Energy"), Some(0.0));
        assert_eq!(alloc.get("Technology"), Some(100.0));
    }

    #[test]
    fn worthless_portfolio_clamps_instead_of_nan() {
        let holdings = vec![holding("A", 0.0, 10.0, Some("Energy")), holding("B", 5.0, 0.0, None)];
        let analysis = Analyzer::default().analyze(&holdings);
        for (_, pct) in analysis.sector_allocation.iter() {
            assert_eq!(pct, 0.0);
        }
        assert_eq!(analysis.underrepresented_sectors.len(), CANONICAL_SECTORS.len());
    }

    #[test]
    fn never_recommends_held_symbols() {
        // Both lots are filed under Energy, so Technology and Healthcare sit at 0%
        // while their first catalog picks (NVDA, JNJ) are already held.
        let holdings = vec![
            holding("NVDA", 1.0, 10.0, Some("Energy")),
            holding("JNJ", 1.0, 10.0, Some("Energy")),
        ];
        let analysis = Analyzer::default().analyze(&holdings);
        let symbols: Vec<&str> = analysis
            .recommendations
            .iter()
            .map(|r| r.symbol.as_str())
            .collect();
        assert_eq!(symbols, ["AMD", "UNH"]);
    }

    #[test]
    fn backfills_when_sector_candidates_run_out() {
        let catalog = StaticCatalog::from_snapshots(vec![
            StockSnapshot::quote("KO", 60.0, 0.2, 0.3).with_sector("Consumer Defensive"),
            StockSnapshot::quote("PG", 158.0, 0.6, 0.4).with_sector("Consumer Defensive"),
        ]);
        let analyzer = Analyzer::new(catalog, FormulaAnalytics);
        let analysis = analyzer.analyze(&[holding("KO", 1.0, 60.0, Some("Consumer Defensive"))]);

        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].symbol, "PG");
        assert_eq!(analysis.recommendations[0].reason, BACKFILL_REASON);
    }

    #[test]
    fn without_backfill_fewer_than_max_is_valid() {
        let analyzer = Analyzer::default().with_options(AnalyzerOptions {
            backfill: false,
            ..AnalyzerOptions::default()
        });
        // First two underrepresented sectors are Consumer Cyclical and Industrials,
        // which the mocked catalog does not cover.
        let holdings = vec![
            holding("A", 1.0, 100.0, Some("Technology")),
            holding("B", 1.0, 100.0, Some("Healthcare")),
            holding("C", 1.0, 100.0, Some("Financial Services")),
        ];
        let analysis = analyzer.analyze(&holdings);
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn repeated_analysis_is_identical_with_formula_analytics() {
        let holdings = vec![
            holding("AAPL", 10.0, 175.43, Some("Technology")),
            holding("XOM", 4.0, 104.0, Some("Energy")),
        ];
        let analyzer = Analyzer::default();
        assert_eq!(analyzer.analyze(&holdings), analyzer.analyze(&holdings));
    }

    #[test]
    fn sampled_analytics_keeps_allocation_stable() {
        let analyzer = Analyzer::new(
            StaticCatalog::mocked(),
            analytics::SampledAnalytics::seeded(42),
        );
        let holdings = vec![holding("AAPL", 10.0, 175.43, Some("Technology"))];
        let a = analyzer.analyze(&holdings);
        let b = analyzer.analyze(&holdings);
        assert_eq!(a.sector_allocation, b.sector_allocation);
        assert_eq!(a.top_sectors, b.top_sectors);
        assert_eq!(a.underrepresented_sectors, b.underrepresented_sectors);
    }
}
