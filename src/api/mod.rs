use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

use crate::models::{PriceBar, ReportingPeriod, StatementCategory, StatementEntry};

pub mod kabu_plus_client;
pub mod yahoo_client;
pub use kabu_plus_client::{CsvTable, KabuPlusClient};
pub use yahoo_client::YahooClient;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Simple rate limiter for API requests
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Per-code market data source for the statement and price updaters.
/// Implementations take directory codes and own the mapping to provider
/// symbols; a code the provider has no data for yields an empty result.
#[async_trait::async_trait]
pub trait MarketDataProvider {
    async fn price_history(
        &self,
        code: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ApiError>;

    async fn statement_entries(
        &self,
        code: &str,
        category: StatementCategory,
        period: ReportingPeriod,
    ) -> Result<Vec<StatementEntry>, ApiError>;
}
