use crate::domain::analysis::{
    Fundamentals, RiskLevel, RiskMetrics, StockAnalytics, TechnicalSignals, Trend,
};
use crate::domain::holding::StockSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

// Earnings yield that maps to a full value score (P/E of 25 or lower reads as 100).
const FAIR_PE: f64 = 25.0;
const NO_EARNINGS_RATIO: f64 = 0.5;
const MARKET_BETA: f64 = 1.0;

pub trait AnalyticsGenerator: Send + Sync {
    fn generate(&self, stock: &StockSnapshot) -> StockAnalytics;
}

/// Closed-form analytics derived from the day's move, P/E and beta.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaAnalytics;

impl AnalyticsGenerator for FormulaAnalytics {
    fn generate(&self, stock: &StockSnapshot) -> StockAnalytics {
        let trend = if stock.change >= 0.0 {
            Trend::Bullish
        } else {
            Trend::Bearish
        };
        let strength = signal_strength(stock.change_percent);
        let value_metric = value_metric(stock.pe_ratio);
        let beta = stock.beta.unwrap_or(MARKET_BETA);

        build(stock, trend, strength, value_metric, stock.pe_ratio, beta)
    }
}

/// Placeholder used while real fundamentals are unavailable.
///
/// When a snapshot lacks P/E or beta, the missing values and the technical
/// signal are sampled from `rng`; output is then non-deterministic unless the
/// RNG is seeded. Complete snapshots go through [`FormulaAnalytics`].
#[derive(Debug)]
pub struct SampledAnalytics<R> {
    rng: Mutex<R>,
}

impl<R: Rng + Send> SampledAnalytics<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl SampledAnalytics<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> AnalyticsGenerator for SampledAnalytics<R> {
    fn generate(&self, stock: &StockSnapshot) -> StockAnalytics {
        if stock.pe_ratio.is_some() && stock.beta.is_some() {
            return FormulaAnalytics.generate(stock);
        }

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let pe = stock
            .pe_ratio
            .unwrap_or_else(|| rng.gen_range(10.0..40.0));
        let beta = stock.beta.unwrap_or_else(|| rng.gen_range(0.0..2.0));
        let trend = if rng.gen_bool(0.7) {
            Trend::Bullish
        } else {
            Trend::Neutral
        };
        let strength = rng.gen_range(60.0..100.0);
        let value_metric = rng.gen_range(50.0..100.0);

        tracing::debug!(symbol = %stock.symbol, pe, beta, "sampled placeholder analytics");
        build(stock, trend, strength, value_metric, Some(pe), beta)
    }
}

pub fn signal_strength(change_percent: f64) -> f64 {
    ((change_percent * 10.0).abs() + 60.0).min(100.0)
}

pub fn value_metric(pe_ratio: Option<f64>) -> f64 {
    let ratio = match pe_ratio {
        Some(pe) if pe > 0.0 => FAIR_PE / pe,
        _ => NO_EARNINGS_RATIO,
    };
    (ratio * 100.0).min(100.0)
}

pub fn risk_level(beta: f64) -> RiskLevel {
    if beta < 1.0 {
        RiskLevel::Low
    } else if beta < 1.5 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

fn build(
    stock: &StockSnapshot,
    trend: Trend,
    strength: f64,
    value_metric: f64,
    pe_ratio: Option<f64>,
    beta: f64,
) -> StockAnalytics {
    let risk_level = risk_level(beta);

    let technical = format!(
        "{} momentum with {strength:.0}% signal strength ({:+.2}% on the day)",
        capitalize(&trend.to_string()),
        stock.change_percent
    );

    let fundamentals = match pe_ratio {
        Some(pe) if pe > 0.0 => {
            let verdict = if value_metric >= 80.0 {
                "attractive"
            } else if value_metric >= 50.0 {
                "fair"
            } else {
                "stretched"
            };
            format!("P/E of {pe:.1} points to {verdict} valuation (value score {value_metric:.0}/100)")
        }
        _ => format!("No positive earnings multiple available (value score {value_metric:.0}/100)"),
    };

    let risk = format!(
        "Beta of {beta:.2} indicates {risk_level} volatility relative to the market"
    );

    StockAnalytics {
        technical_signals: TechnicalSignals {
            trend,
            strength,
            description: technical,
        },
        fundamentals: Fundamentals {
            value_metric,
            description: fundamentals,
        },
        risk_metrics: RiskMetrics {
            risk_level,
            description: risk,
        },
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
