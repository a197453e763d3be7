use anyhow::Context;
use folio_core::analysis::catalog::StaticCatalog;
use folio_core::domain::holding::Holding;
use std::path::Path;

/// Reference catalog from a JSON snapshot list, or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<StaticCatalog> {
    let Some(path) = path else {
        return Ok(StaticCatalog::mocked());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    StaticCatalog::from_json_str(&text)
        .with_context(|| format!("invalid catalog file {}", path.display()))
}

pub fn load_portfolio_file(path: &Path) -> anyhow::Result<Vec<Holding>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read portfolio file {}", path.display()))?;
    parse_portfolio(&text).with_context(|| format!("invalid portfolio file {}", path.display()))
}

fn parse_portfolio(text: &str) -> anyhow::Result<Vec<Holding>> {
    let holdings = serde_json::from_str::<Vec<Holding>>(text)
        .context("portfolio must be a JSON array of holdings")?;

    for holding in &holdings {
        anyhow::ensure!(
            !holding.symbol.trim().is_empty(),
            "holding symbol must be non-empty"
        );
        anyhow::ensure!(
            holding.shares >= 0.0 && holding.average_price >= 0.0,
            "holding {} has negative shares or average price",
            holding.symbol
        );
        if holding.symbol != holding.stats.symbol {
            tracing::warn!(
                symbol = %holding.symbol,
                stats_symbol = %holding.stats.symbol,
                "holding and snapshot symbols differ"
            );
        }
    }

    Ok(holdings)
}
