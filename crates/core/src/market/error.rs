use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("Invalid stock symbol. Please use uppercase letters only.")]
    InvalidSymbol(String),

    #[error("No data found for symbol {0}")]
    NotFound(String),

    #[error("API rate limit reached. Please try again in a minute.")]
    RateLimited,

    #[error("market data request failed: {0}")]
    Network(String),

    #[error("market data response could not be decoded: {0}")]
    Decode(String),
}

impl MarketDataError {
    /// Text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            MarketDataError::Network(_) | MarketDataError::Decode(_) => {
                "Failed to fetch stock data. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, MarketDataError::Network(_))
    }
}
