use crate::config::Settings;
use crate::domain::holding::StockSnapshot;
use crate::domain::sector::normalize_sector;
use crate::market::error::MarketDataError;
use crate::market::history::HistoryRange;
use crate::market::{validate_symbol, MarketDataProvider, PricePoint, SearchResult};
use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 1;
const MAX_RETRIES: u32 = 10;
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Alpha Vantage JSON query API.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retries: u32,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_market_data_api_key()?.to_string();
        let base_url = settings
            .market_data_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings.market_data_retries.unwrap_or(DEFAULT_RETRIES).clamp(1, MAX_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
        })
    }

    async fn query_once(&self, params: &[(&str, &str)]) -> Result<Value, MarketDataError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }

        let text = res
            .text()
            .await
            .map_err(|e| MarketDataError::Network(format!("failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(MarketDataError::Network(format!("HTTP {status}: {text}")));
        }

        let raw = serde_json::from_str::<Value>(&text)
            .map_err(|e| MarketDataError::Decode(format!("{e}: {text}")))?;
        check_throttled(&raw)?;
        Ok(raw)
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, MarketDataError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.query_once(params).await {
                Ok(raw) => return Ok(raw),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    let backoff = retry_backoff(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "market data request failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot, MarketDataError> {
        validate_symbol(symbol)?;

        let quote_params = [("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        let overview_params = [("function", "OVERVIEW"), ("symbol", symbol)];
        let (quote, overview) =
            tokio::join!(self.query(&quote_params), self.query(&overview_params));

        let mut snapshot = parse_global_quote(symbol, &quote?)?;
        match overview {
            Ok(raw) => apply_overview(&mut snapshot, &raw),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "company overview unavailable; fundamentals left empty")
            }
        }
        Ok(snapshot)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        validate_symbol(symbol)?;

        let raw = if range.uses_intraday() {
            self.query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", "30min"),
                ("outputsize", "full"),
            ])
            .await?
        } else {
            self.query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
            ])
            .await?
        };

        parse_time_series(symbol, &raw, range, Utc::now().naive_utc())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let raw = self
            .query(&[("function", "SYMBOL_SEARCH"), ("keywords", query)])
            .await?;
        Ok(parse_search(&raw))
    }
}

fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}

// "Note" is the classic throttle notice. "Information" is shared with invalid-key
// and premium-endpoint notices, so only its rate-limit wording counts as throttling.
fn check_throttled(raw: &Value) -> Result<(), MarketDataError> {
    if raw.get("Note").is_some() {
        return Err(MarketDataError::RateLimited);
    }
    if let Some(info) = raw.get("Information") {
        let message = info.as_str().unwrap_or_default();
        if is_rate_limit_notice(message) {
            return Err(MarketDataError::RateLimited);
        }
        return Err(MarketDataError::Decode(format!("provider notice: {message}")));
    }
    Ok(())
}

fn is_rate_limit_notice(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["rate limit", "call frequency", "requests per", "api call volume"]
        .iter()
        .any(|needle| lower.contains(needle))
}

// Alpha Vantage sends every number as a string; "None" and "-" mean missing.
fn field_f64(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key)?
        .as_str()?
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn field_str(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(str::to_string)
}

pub fn parse_global_quote(symbol: &str, raw: &Value) -> Result<StockSnapshot, MarketDataError> {
    if raw.get("Error Message").is_some() {
        return Err(MarketDataError::NotFound(symbol.to_string()));
    }

    let quote = raw
        .get("Global Quote")
        .filter(|q| q.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;

    let price = field_f64(quote, "05. price")
        .ok_or_else(|| MarketDataError::Decode(format!("quote for {symbol} has no price")))?;
    let day_high = field_f64(quote, "03. high").unwrap_or(price);
    let day_low = field_f64(quote, "04. low").unwrap_or(price);

    Ok(StockSnapshot {
        symbol: symbol.to_string(),
        price,
        change: field_f64(quote, "09. change").unwrap_or(0.0),
        change_percent: field_f64(quote, "10. change percent").unwrap_or(0.0),
        volume: field_f64(quote, "06. volume").map_or(0, |v| v.max(0.0) as u64),
        high_52_week: day_high,
        low_52_week: day_low,
        sector: None,
        industry: None,
        pe_ratio: None,
        dividend_yield: None,
        market_cap: None,
        beta: None,
    })
}

/// Fills fundamentals from an OVERVIEW payload. An empty payload changes nothing.
pub fn apply_overview(snapshot: &mut StockSnapshot, raw: &Value) {
    if raw.get("Symbol").is_none() {
        return;
    }

    snapshot.sector = field_str(raw, "Sector").and_then(|s| normalize_sector(&s));
    snapshot.industry = field_str(raw, "Industry");
    snapshot.pe_ratio = field_f64(raw, "PERatio");
    // Reported as a fraction; snapshots carry percent.
    snapshot.dividend_yield = field_f64(raw, "DividendYield").map(|y| y * 100.0);
    snapshot.market_cap = field_f64(raw, "MarketCapitalization");
    snapshot.beta = field_f64(raw, "Beta");
    if let Some(high) = field_f64(raw, "52WeekHigh") {
        snapshot.high_52_week = high;
    }
    if let Some(low) = field_f64(raw, "52WeekLow") {
        snapshot.low_52_week = low;
    }
}

pub fn parse_search(raw: &Value) -> Vec<SearchResult> {
    let Some(matches) = raw.get("bestMatches").and_then(Value::as_array) else {
        return Vec::new();
    };

    matches
        .iter()
        .filter_map(|m| {
            Some(SearchResult {
                symbol: field_str(m, "1. symbol")?,
                name: field_str(m, "2. name").unwrap_or_default(),
                kind: field_str(m, "3. type").unwrap_or_default(),
                region: field_str(m, "4. region").unwrap_or_default(),
                currency: field_str(m, "8. currency").unwrap_or_default(),
            })
        })
        .collect()
}

pub fn parse_time_series(
    symbol: &str,
    raw: &Value,
    range: HistoryRange,
    end: NaiveDateTime,
) -> Result<Vec<PricePoint>, MarketDataError> {
    let series = raw
        .as_object()
        .and_then(|o| o.iter().find(|(k, _)| k.contains("Time Series")))
        .and_then(|(_, v)| v.as_object())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;

    let mut out = Vec::with_capacity(series.len());
    for (key, bar) in series {
        let timestamp = parse_bar_time(key)
            .ok_or_else(|| MarketDataError::Decode(format!("bad time series key {key:?}")))?;
        if !range.contains(timestamp, end) {
            continue;
        }
        out.push(PricePoint {
            timestamp,
            close: field_f64(bar, "4. close").unwrap_or(0.0),
        });
    }

    out.sort_by_key(|p| p.timestamp);
    Ok(out)
}

fn parse_bar_time(key: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn end() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 27)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_global_quote() {
        let v = json!({
            "Global Quote": {
                "01. symbol": "AAPL",
                "03. high": "176.10",
                "04. low": "172.90",
                "05. price": "175.43",
                "06. volume": "52345678",
                "09. change": "2.11",
                "10. change percent": "1.2174%"
            }
        });

        let snap = parse_global_quote("AAPL", &v).unwrap();
        assert_eq!(snap.price, 175.43);
        assert_eq!(snap.volume, 52_345_678);
        assert!((snap.change_percent - 1.2174).abs() < 1e-9);
        assert!(snap.sector.is_none());
    }

    #[test]
    fn empty_quote_is_not_found() {
        let v = json!({"Global Quote": {}});
        assert_eq!(
            parse_global_quote("ZZZZ", &v),
            Err(MarketDataError::NotFound("ZZZZ".to_string()))
        );
    }

    #[test]
    fn throttle_notes_are_rate_limited() {
        assert_eq!(
            check_throttled(&json!({"Note": "Thank you for using Alpha Vantage!"})),
            Err(MarketDataError::RateLimited)
        );
        assert_eq!(
            check_throttled(&json!({
                "Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
            })),
            Err(MarketDataError::RateLimited)
        );
        assert!(check_throttled(&json!({"Global Quote": {}})).is_ok());
    }

    #[test]
    fn other_information_notices_are_not_rate_limits() {
        let invalid_key = check_throttled(&json!({
            "Information": "The **demo** API key is for demo purposes only. Please claim your free API key."
        }));
        assert!(matches!(invalid_key, Err(MarketDataError::Decode(_))));

        let premium = check_throttled(&json!({
            "Information": "This is a premium endpoint. You may subscribe to any of the premium plans."
        }));
        assert!(matches!(premium, Err(MarketDataError::Decode(_))));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(retry_backoff(1), Duration::from_secs(1));
        assert_eq!(retry_backoff(3), Duration::from_secs(4));
        assert_eq!(retry_backoff(200), Duration::from_secs(1 << MAX_BACKOFF_SHIFT));
    }

    #[test]
    fn overview_fills_fundamentals() {
        let mut snap = StockSnapshot::quote("AAPL", 175.43, 2.11, 1.2);
        let v = json!({
            "Symbol": "AAPL",
            "Sector": "TECHNOLOGY",
            "Industry": "ELECTRONIC COMPUTERS",
            "PERatio": "28.5",
            "DividendYield": "0.0055",
            "MarketCapitalization": "2750000000000",
            "Beta": "1.29",
            "52WeekHigh": "199.62",
            "52WeekLow": "124.17"
        });
        apply_overview(&mut snap, &v);

        assert_eq!(snap.sector.as_deref(), Some("Technology"));
        assert_eq!(snap.pe_ratio, Some(28.5));
        assert!((snap.dividend_yield.unwrap() - 0.55).abs() < 1e-9);
        assert_eq!(snap.beta, Some(1.29));
        assert_eq!(snap.high_52_week, 199.62);
    }

    #[test]
    fn overview_none_values_stay_absent() {
        let mut snap = StockSnapshot::quote("X", 1.0, 0.0, 0.0);
        apply_overview(&mut snap, &json!({"Symbol": "X", "PERatio": "None", "Beta": "-"}));
        assert!(snap.pe_ratio.is_none());
        assert!(snap.beta.is_none());

        apply_overview(&mut snap, &json!({}));
        assert_eq!(snap.high_52_week, 1.0);
    }

    #[test]
    fn parses_search_matches() {
        let v = json!({
            "bestMatches": [
                {
                    "1. symbol": "TSCO",
                    "2. name": "Tractor Supply Company",
                    "3. type": "Equity",
                    "4. region": "United States",
                    "8. currency": "USD"
                },
                {"2. name": "no symbol"}
            ]
        });
        let results = parse_search(&v);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "TSCO");
        assert_eq!(results[0].kind, "Equity");
        assert!(parse_search(&json!({})).is_empty());
    }

    #[test]
    fn daily_series_is_filtered_and_oldest_first() {
        let v = json!({
            "Meta Data": {"2. Symbol": "AAPL"},
            "Time Series (Daily)": {
                "2026-01-27": {"4. close": "175.43"},
                "2026-01-26": {"4. close": "173.32"},
                "2026-01-21": {"4. close": "170.00"},
                "2025-12-01": {"4. close": "160.00"}
            }
        });

        let points = parse_time_series("AAPL", &v, HistoryRange::OneWeek, end()).unwrap();
        let dates: Vec<_> = points.iter().map(|p| p.date().to_string()).collect();
        assert_eq!(dates, vec!["2026-01-21", "2026-01-26", "2026-01-27"]);
        assert_eq!(points[2].close, 175.43);
    }

    #[test]
    fn intraday_keys_parse_with_time() {
        let v = json!({
            "Time Series (30min)": {
                "2026-01-27 16:00:00": {"4. close": "175.43"},
                "2026-01-27 15:30:00": {"4. close": "175.10"}
            }
        });
        let points = parse_time_series("AAPL", &v, HistoryRange::OneMonth, end()).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn missing_series_is_not_found() {
        let v = json!({"Meta Data": {}});
        assert!(matches!(
            parse_time_series("AAPL", &v, HistoryRange::All, end()),
            Err(MarketDataError::NotFound(_))
        ));
    }
}
