use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_core::analysis::analytics::{AnalyticsGenerator, FormulaAnalytics, SampledAnalytics};
use folio_core::analysis::catalog::StaticCatalog;
use folio_core::analysis::Analyzer;
use folio_core::domain::analysis::PortfolioAnalysis;
use folio_core::domain::holding::{Holding, PortfolioSummary};
use folio_core::market::alpha_vantage::AlphaVantageClient;
use folio_core::market::history::HistoryRange;
use folio_core::market::MarketDataProvider;
use folio_core::portfolio::PortfolioStore;
use folio_core::storage::holdings::PgHoldingsRepository;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod inputs;

#[derive(Debug, Parser)]
#[command(name = "folio_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a stored or file-based portfolio and print the result as JSON.
    Analyze {
        /// Owner whose holdings are loaded from the database.
        #[arg(long, conflicts_with = "portfolio_file", required_unless_present = "portfolio_file")]
        owner: Option<String>,

        /// JSON array of holdings to analyze instead of the database.
        #[arg(long)]
        portfolio_file: Option<PathBuf>,

        /// JSON array of stock snapshots used as the recommendation catalog.
        #[arg(long)]
        catalog_file: Option<PathBuf>,

        /// Fill missing P/E and beta with sampled placeholder values.
        #[arg(long)]
        sampled_analytics: bool,

        /// Seed for --sampled-analytics; unseeded runs differ between calls.
        #[arg(long, requires = "sampled_analytics")]
        seed: Option<u64>,
    },

    /// Fetch a current snapshot for one symbol.
    Quote { symbol: String },

    /// Fetch closing prices for one symbol.
    History {
        symbol: String,

        /// 1W, 1M, 3M, 6M, 1Y, 5Y or ALL.
        #[arg(long, default_value = "1W")]
        range: HistoryRange,
    },

    /// Search symbols by keyword.
    Search { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args.command, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker command failed");
    }
    result
}

async fn run(command: Command, settings: &folio_core::config::Settings) -> anyhow::Result<()> {
    match command {
        Command::Analyze {
            owner,
            portfolio_file,
            catalog_file,
            sampled_analytics,
            seed,
        } => {
            let holdings = match (&owner, &portfolio_file) {
                (_, Some(path)) => inputs::load_portfolio_file(path)?,
                (Some(owner), None) => load_stored_holdings(settings, owner).await?,
                (None, None) => anyhow::bail!("either --owner or --portfolio-file is required"),
            };
            let catalog = inputs::load_catalog(catalog_file.as_deref())?;

            let output = if sampled_analytics {
                let analytics = match seed {
                    Some(seed) => SampledAnalytics::seeded(seed),
                    None => SampledAnalytics::from_entropy(),
                };
                analysis_report(owner.as_deref(), &holdings, catalog, analytics)
            } else {
                analysis_report(owner.as_deref(), &holdings, catalog, FormulaAnalytics)
            };

            tracing::info!(holdings = holdings.len(), "analysis complete");
            print_json(&output)
        }
        Command::Quote { symbol } => {
            let client = AlphaVantageClient::from_settings(settings)?;
            let snapshot = client
                .fetch_snapshot(&symbol)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_json(&snapshot)
        }
        Command::History { symbol, range } => {
            let client = AlphaVantageClient::from_settings(settings)?;
            let points = client
                .fetch_history(&symbol, range)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            tracing::info!(%symbol, %range, points = points.len(), "history fetched");
            print_json(&points)
        }
        Command::Search { query } => {
            let client = AlphaVantageClient::from_settings(settings)?;
            let results = client
                .search(&query)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_json(&results)
        }
    }
}

async fn load_stored_holdings(
    settings: &folio_core::config::Settings,
    owner: &str,
) -> anyhow::Result<Vec<Holding>> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    folio_core::storage::migrate(&pool).await?;

    let store = PortfolioStore::open(PgHoldingsRepository::new(pool), owner).await?;
    Ok(store.holdings().to_vec())
}

#[derive(Debug, Serialize)]
struct AnalysisReport<'a> {
    owner: Option<&'a str>,
    summary: PortfolioSummary,
    analysis: PortfolioAnalysis,
}

fn analysis_report<'a, G: AnalyticsGenerator>(
    owner: Option<&'a str>,
    holdings: &[Holding],
    catalog: StaticCatalog,
    analytics: G,
) -> AnalysisReport<'a> {
    let analyzer = Analyzer::new(catalog, analytics);
    AnalysisReport {
        owner,
        summary: PortfolioSummary::from_holdings(holdings),
        analysis: analyzer.analyze(holdings),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn init_sentry(settings: &folio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
