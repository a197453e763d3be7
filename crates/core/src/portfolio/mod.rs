use crate::analysis::analytics::AnalyticsGenerator;
use crate::analysis::catalog::ReferenceCatalog;
use crate::analysis::Analyzer;
use crate::domain::analysis::PortfolioAnalysis;
use crate::domain::holding::{Holding, PortfolioSummary};
use anyhow::Context;
use std::collections::HashMap;

/// Ordered lots in insertion order. Adding a symbol twice keeps two lots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdings {
    items: Vec<Holding>,
}

impl Holdings {
    pub fn new(items: Vec<Holding>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, holding: Holding) {
        self.items.push(holding);
    }

    /// Drops every lot whose symbol matches exactly. Returns how many were removed.
    pub fn remove_symbol(&mut self, symbol: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|h| h.symbol != symbol);
        before - self.items.len()
    }

    pub fn as_slice(&self) -> &[Holding] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait::async_trait]
pub trait HoldingsRepository: Send + Sync {
    async fn load(&self, owner: &str) -> anyhow::Result<Vec<Holding>>;

    async fn save(&self, owner: &str, holdings: &[Holding]) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl<T: HoldingsRepository + ?Sized> HoldingsRepository for std::sync::Arc<T> {
    async fn load(&self, owner: &str) -> anyhow::Result<Vec<Holding>> {
        (**self).load(owner).await
    }

    async fn save(&self, owner: &str, holdings: &[Holding]) -> anyhow::Result<()> {
        (**self).save(owner, holdings).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryHoldingsRepository {
    inner: tokio::sync::Mutex<HashMap<String, Vec<Holding>>>,
}

impl MemoryHoldingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HoldingsRepository for MemoryHoldingsRepository {
    async fn load(&self, owner: &str) -> anyhow::Result<Vec<Holding>> {
        let guard = self.inner.lock().await;
        Ok(guard.get(owner).cloned().unwrap_or_default())
    }

    async fn save(&self, owner: &str, holdings: &[Holding]) -> anyhow::Result<()> {
        let mut guard = self.inner.lock().await;
        guard.insert(owner.to_string(), holdings.to_vec());
        Ok(())
    }
}

/// One owner's portfolio, written through to its repository on every change.
#[derive(Debug)]
pub struct PortfolioStore<R> {
    repo: R,
    owner: String,
    holdings: Holdings,
}

impl<R: HoldingsRepository> PortfolioStore<R> {
    pub async fn open(repo: R, owner: impl Into<String>) -> anyhow::Result<Self> {
        let owner = owner.into();
        let items = repo
            .load(&owner)
            .await
            .with_context(|| format!("failed to load holdings for {owner}"))?;
        Ok(Self {
            repo,
            owner,
            holdings: Holdings::new(items),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn holdings(&self) -> &[Holding] {
        self.holdings.as_slice()
    }

    pub async fn add(&mut self, holding: Holding) -> anyhow::Result<()> {
        tracing::info!(
            owner = %self.owner,
            symbol = %holding.symbol,
            shares = holding.shares,
            average_price = holding.average_price,
            "holding added"
        );
        self.holdings.push(holding);
        self.persist().await
    }

    pub async fn remove(&mut self, symbol: &str) -> anyhow::Result<()> {
        let removed = self.holdings.remove_symbol(symbol);
        if removed == 0 {
            tracing::debug!(owner = %self.owner, %symbol, "remove: symbol not held");
            return Ok(());
        }
        tracing::info!(owner = %self.owner, %symbol, removed, "holding removed");
        self.persist().await
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_holdings(self.holdings())
    }

    pub fn analyze<C: ReferenceCatalog, G: AnalyticsGenerator>(
        &self,
        analyzer: &Analyzer<C, G>,
    ) -> PortfolioAnalysis {
        analyzer.analyze(self.holdings())
    }

    async fn persist(&self) -> anyhow::Result<()> {
        self.repo
            .save(&self.owner, self.holdings())
            .await
            .with_context(|| format!("failed to save holdings for {}", self.owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::holding::StockSnapshot;
    use std::sync::Arc;

    fn lot(symbol: &str, shares: f64) -> Holding {
        Holding::new(symbol, shares, 100.0, StockSnapshot::quote(symbol, 110.0, 1.0, 0.9))
    }

    #[test]
    fn duplicate_adds_keep_separate_lots() {
        let mut h = Holdings::default();
        h.push(lot("AAPL", 1.0));
        h.push(lot("AAPL", 2.0));
        assert_eq!(h.len(), 2);
        assert_eq!(h.remove_symbol("AAPL"), 2);
        assert!(h.is_empty());
    }

    #[test]
    fn remove_is_case_sensitive_and_absent_is_noop() {
        let mut h = Holdings::new(vec![lot("AAPL", 1.0), lot("MSFT", 1.0), lot("JNJ", 1.0)]);
        let before = h.clone();
        assert_eq!(h.remove_symbol("aapl"), 0);
        assert_eq!(h.remove_symbol("TSLA"), 0);
        assert_eq!(h, before);

        assert_eq!(h.remove_symbol("MSFT"), 1);
        let symbols: Vec<_> = h.as_slice().iter().map(|x| x.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "JNJ"]);
    }

    #[tokio::test]
    async fn store_writes_through_and_reloads() {
        let repo = Arc::new(MemoryHoldingsRepository::new());

        let mut store = PortfolioStore::open(repo.clone(), "randy").await.unwrap();
        assert!(store.holdings().is_empty());
        store.add(lot("AAPL", 10.0)).await.unwrap();
        store.add(lot("JNJ", 5.0)).await.unwrap();
        store.remove("JNJ").await.unwrap();

        let reopened = PortfolioStore::open(repo.clone(), "randy").await.unwrap();
        assert_eq!(reopened.holdings().len(), 1);
        assert_eq!(reopened.holdings()[0].symbol, "AAPL");

        let other = PortfolioStore::open(repo, "someone_else").await.unwrap();
        assert!(other.holdings().is_empty());
    }

    #[tokio::test]
    async fn store_projects_summary_and_analysis() {
        let mut store = PortfolioStore::open(MemoryHoldingsRepository::new(), "randy")
            .await
            .unwrap();
        let mut holding = lot("AAPL", 10.0);
        holding.stats.sector = Some("Technology".to_string());
        store.add(holding).await.unwrap();

        assert_eq!(store.summary().total_value, 1100.0);
        let analysis = store.analyze(&Analyzer::default());
        assert_eq!(analysis.sector_allocation.get("Technology"), Some(100.0));
    }
}
