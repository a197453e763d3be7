use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::analysis::Analyzer;
use folio_core::auth::credentials::Argon2Verifier;
use folio_core::auth::directory::{MemoryUserDirectory, UserDirectory};
use folio_core::auth::AuthService;
use folio_core::market::alpha_vantage::AlphaVantageClient;
use folio_core::market::MarketDataProvider;
use folio_core::portfolio::{HoldingsRepository, MemoryHoldingsRepository};
use folio_core::storage::holdings::PgHoldingsRepository;
use folio_core::storage::users::PgUserDirectory;

mod error;
mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub holdings: Arc<dyn HoldingsRepository>,
    pub auth: Arc<AuthService<Arc<dyn UserDirectory>, Argon2Verifier>>,
    pub market: Option<Arc<dyn MarketDataProvider>>,
    pub analyzer: Arc<Analyzer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool = connect_db(&settings).await;
    let (holdings, users): (Arc<dyn HoldingsRepository>, Arc<dyn UserDirectory>) = match pool {
        Some(pool) => (
            Arc::new(PgHoldingsRepository::new(pool.clone())),
            Arc::new(PgUserDirectory::new(pool)),
        ),
        None => {
            tracing::warn!("using in-memory portfolio and user storage; data is lost on restart");
            (
                Arc::new(MemoryHoldingsRepository::new()),
                Arc::new(MemoryUserDirectory::new()),
            )
        }
    };

    let market: Option<Arc<dyn MarketDataProvider>> =
        match AlphaVantageClient::from_settings(&settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::error!(error = %e, "market data client unavailable; quote endpoints disabled");
                None
            }
        };

    let state = AppState {
        holdings,
        auth: Arc::new(AuthService::new(users, Argon2Verifier::new())),
        market,
        analyzer: Arc::new(Analyzer::default()),
    };

    let app = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/portfolios/:owner", get(handlers::get_portfolio))
        .route("/portfolios/:owner/holdings", post(handlers::add_holding))
        .route(
            "/portfolios/:owner/holdings/:symbol",
            delete(handlers::remove_holding),
        )
        .route("/portfolios/:owner/analysis", get(handlers::get_analysis))
        .route("/stocks/search", get(handlers::search_stocks))
        .route("/stocks/:symbol", get(handlers::get_stock))
        .route("/stocks/:symbol/history", get(handlers::get_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Any failure here drops the API to in-memory storage instead of refusing to start.
async fn connect_db(settings: &folio_core::config::Settings) -> Option<PgPool> {
    let db_url = match settings.require_database_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            return None;
        }
    };

    let pool = match sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
            return None;
        }
    };

    match folio_core::storage::migrate(&pool).await {
        Ok(()) => Some(pool),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
            None
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
