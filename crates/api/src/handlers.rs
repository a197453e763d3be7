use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use folio_core::auth::AuthState;
use folio_core::domain::analysis::PortfolioAnalysis;
use folio_core::domain::holding::{Holding, PortfolioSummary, StockSnapshot};
use folio_core::market::history::HistoryRange;
use folio_core::market::{MarketDataProvider, PricePoint, SearchResult};
use folio_core::portfolio::PortfolioStore;

use crate::error::ApiError;
use crate::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthState>, ApiError> {
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Please fill in all fields".to_string()));
    }

    state
        .auth
        .signup(&req.username, &req.email, &req.password)
        .await?;
    Ok(Json(AuthState::signed_in(req.username)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthState>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Please enter both username and password".to_string(),
        ));
    }

    if !state.auth.login(&req.username, &req.password).await? {
        return Err(ApiError::Unauthorized("Invalid username or password"));
    }
    Ok(Json(AuthState::signed_in(req.username)))
}

#[derive(Debug, Serialize)]
pub struct PortfolioView {
    owner: String,
    holdings: Vec<Holding>,
    summary: PortfolioSummary,
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<PortfolioView>, ApiError> {
    let store = PortfolioStore::open(state.holdings.clone(), owner).await?;
    Ok(Json(view(&store)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHoldingRequest {
    symbol: String,
    shares: f64,
    average_price: f64,
}

pub async fn add_holding(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(req): Json<AddHoldingRequest>,
) -> Result<Json<PortfolioView>, ApiError> {
    let symbol = validate_lot(&req)?;
    let market = require_market(&state)?;
    let stats = market.fetch_snapshot(&symbol).await?;

    let mut store = PortfolioStore::open(state.holdings.clone(), owner).await?;
    store
        .add(Holding::new(symbol, req.shares, req.average_price, stats))
        .await?;
    Ok(Json(view(&store)))
}

/// Normalized symbol for a well-formed lot; shares and price must be finite and non-negative.
fn validate_lot(req: &AddHoldingRequest) -> Result<String, ApiError> {
    let symbol = req.symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() || !req.shares.is_finite() || !req.average_price.is_finite() {
        return Err(ApiError::BadRequest("Please fill in all fields".to_string()));
    }
    if req.shares < 0.0 || req.average_price < 0.0 {
        return Err(ApiError::BadRequest(
            "Shares and average price cannot be negative".to_string(),
        ));
    }
    Ok(symbol)
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path((owner, symbol)): Path<(String, String)>,
) -> Result<Json<PortfolioView>, ApiError> {
    let mut store = PortfolioStore::open(state.holdings.clone(), owner).await?;
    store.remove(&symbol).await?;
    Ok(Json(view(&store)))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<PortfolioAnalysis>, ApiError> {
    let store = PortfolioStore::open(state.holdings.clone(), owner).await?;
    Ok(Json(store.analyze(&state.analyzer)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
}

pub async fn search_stocks(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let market = require_market(&state)?;
    Ok(Json(market.search(&params.q).await?))
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockSnapshot>, ApiError> {
    let market = require_market(&state)?;
    Ok(Json(market.fetch_snapshot(&symbol).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    range: HistoryRange,
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let market = require_market(&state)?;
    Ok(Json(market.fetch_history(&symbol, params.range).await?))
}

fn require_market(state: &AppState) -> Result<Arc<dyn MarketDataProvider>, ApiError> {
    state
        .market
        .clone()
        .ok_or(ApiError::Unavailable("market data provider is not configured"))
}

fn view<R>(store: &PortfolioStore<R>) -> PortfolioView
where
    R: folio_core::portfolio::HoldingsRepository,
{
    PortfolioView {
        owner: store.owner().to_string(),
        holdings: store.holdings().to_vec(),
        summary: store.summary(),
    }
}
