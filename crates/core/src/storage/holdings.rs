use crate::domain::holding::{Holding, StockSnapshot};
use crate::portfolio::HoldingsRepository;
use anyhow::Context;

/// Holdings table keyed by (owner, position); the snapshot rides along as JSONB.
#[derive(Debug, Clone)]
pub struct PgHoldingsRepository {
    pool: sqlx::PgPool,
}

impl PgHoldingsRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HoldingsRepository for PgHoldingsRepository {
    async fn load(&self, owner: &str) -> anyhow::Result<Vec<Holding>> {
        let rows = sqlx::query_as::<_, (String, f64, f64, serde_json::Value)>(
            "SELECT symbol, shares, average_price, stats \
             FROM portfolio_holdings \
             WHERE owner = $1 \
             ORDER BY position ASC",
        )
        .persistent(false)
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("select portfolio_holdings failed")?;

        let mut out = Vec::with_capacity(rows.len());
        for (symbol, shares, average_price, stats) in rows {
            let stats = serde_json::from_value::<StockSnapshot>(stats).with_context(|| {
                format!("invalid stats JSON in DB for owner={owner}, symbol={symbol}")
            })?;
            out.push(Holding {
                symbol,
                shares,
                average_price,
                stats,
            });
        }
        Ok(out)
    }

    async fn save(&self, owner: &str, holdings: &[Holding]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        sqlx::query("DELETE FROM portfolio_holdings WHERE owner = $1")
            .persistent(false)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .context("delete portfolio_holdings failed")?;

        if !holdings.is_empty() {
            let mut stats = Vec::with_capacity(holdings.len());
            for holding in holdings {
                stats.push(
                    serde_json::to_value(&holding.stats)
                        .with_context(|| format!("failed to encode stats for {}", holding.symbol))?,
                );
            }

            let mut qb = sqlx::QueryBuilder::new(
                "INSERT INTO portfolio_holdings (owner, position, symbol, shares, average_price, stats) ",
            );
            qb.push_values(
                holdings.iter().zip(stats).enumerate(),
                |mut b, (position, (holding, stats))| {
                    b.push_bind(owner)
                        .push_bind(position as i32)
                        .push_bind(&holding.symbol)
                        .push_bind(holding.shares)
                        .push_bind(holding.average_price)
                        .push_bind(stats);
                },
            );
            qb.build()
                .persistent(false)
                .execute(&mut *tx)
                .await
                .context("insert portfolio_holdings failed")?;
        }

        tx.commit().await.context("commit transaction failed")?;

        tracing::debug!(%owner, holdings = holdings.len(), "portfolio_holdings rewritten");
        Ok(())
    }
}
