use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiError, ApiRateLimiter, MarketDataProvider};
use crate::models::{Config, PriceBar, ReportingPeriod, StatementCategory, StatementEntry};

/// Client for the Yahoo Finance chart and quoteSummary endpoints.
pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limiter: ApiRateLimiter,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

fn series_value<T: Copy>(series: &Option<Vec<Option<T>>>, index: usize) -> Option<T> {
    series
        .as_ref()
        .and_then(|values| values.get(index).copied().flatten())
}

impl YahooClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("kabunav/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.market_api_base_url.trim_end_matches('/').to_string(),
            rate_limiter: ApiRateLimiter::new(config.request_delay_ms),
        })
    }

    /// Map a directory code to the provider's symbol. Listed equities carry
    /// the `.T` exchange suffix; the overview index has its own symbol.
    pub fn provider_symbol(code: &str) -> String {
        if code == "N225" {
            "^N225".to_string()
        } else {
            format!("{}.T", code)
        }
    }

    fn quote_summary_module(
        category: StatementCategory,
        period: ReportingPeriod,
    ) -> (&'static str, &'static str) {
        use ReportingPeriod::*;
        use StatementCategory::*;
        // The financial-statement category is sourced from the income
        // statement module, so both categories share a mapping.
        match (category, period) {
            (Financials | IncomeStatement, Annual) => {
                ("incomeStatementHistory", "incomeStatementHistory")
            }
            (Financials | IncomeStatement, Quarterly) => {
                ("incomeStatementHistoryQuarterly", "incomeStatementHistory")
            }
            (BalanceSheet, Annual) => ("balanceSheetHistory", "balanceSheetStatements"),
            (BalanceSheet, Quarterly) => {
                ("balanceSheetHistoryQuarterly", "balanceSheetStatements")
            }
            (CashFlow, Annual) => ("cashflowStatementHistory", "cashflowStatements"),
            (CashFlow, Quarterly) => {
                ("cashflowStatementHistoryQuarterly", "cashflowStatements")
            }
        }
    }

    /// Flatten one quoteSummary module into long-form statement entries.
    /// Items the provider reports without a value come back as empty objects
    /// and melt to `None`, keeping the period row intact.
    fn melt_statements(
        code: &str,
        payload: &Value,
        module: &str,
        list_key: &str,
    ) -> Result<Vec<StatementEntry>, ApiError> {
        let pointer = format!("/quoteSummary/result/0/{}/{}", module, list_key);
        let statements = match payload.pointer(&pointer) {
            Some(value) => value
                .as_array()
                .ok_or_else(|| ApiError::Shape(format!("{} is not an array", pointer)))?,
            // The module is omitted entirely for codes without statements
            None => return Ok(Vec::new()),
        };

        let mut entries = Vec::new();
        for statement in statements {
            let Some(object) = statement.as_object() else {
                continue;
            };
            let Some(period) = object
                .get("endDate")
                .and_then(|end| end.get("fmt"))
                .and_then(Value::as_str)
                .and_then(|fmt| NaiveDate::parse_from_str(fmt, "%Y-%m-%d").ok())
            else {
                continue;
            };

            for (item, value) in object {
                if item == "endDate" || item == "maxAge" {
                    continue;
                }
                let number = value
                    .get("raw")
                    .and_then(Value::as_f64)
                    .or_else(|| value.as_f64());
                entries.push(StatementEntry {
                    code: code.to_string(),
                    period,
                    item: item.clone(),
                    value: number,
                });
            }
        }
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooClient {
    async fn price_history(
        &self,
        code: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ApiError> {
        self.rate_limiter.wait().await;

        let symbol = Self::provider_symbol(code);
        let period1 = from_date.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = (to_date + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        );

        debug!("Fetching price history for {} ({})", code, symbol);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No chart data for {}", symbol);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: response.status(),
            });
        }

        let payload: ChartResponse = response.json().await?;
        let Some(data) = payload
            .chart
            .result
            .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)))
        else {
            return Ok(Vec::new());
        };

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (index, timestamp) in timestamps.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(*timestamp, 0).map(|dt| dt.date_naive())
            else {
                continue;
            };
            let bar = PriceBar {
                date,
                open: series_value(&quote.open, index),
                high: series_value(&quote.high, index),
                low: series_value(&quote.low, index),
                close: series_value(&quote.close, index),
                volume: series_value(&quote.volume, index),
            };
            // Holiday rows come back with every field null
            if bar.open.is_none() && bar.high.is_none() && bar.low.is_none() && bar.close.is_none()
            {
                continue;
            }
            bars.push(bar);
        }
        Ok(bars)
    }

    async fn statement_entries(
        &self,
        code: &str,
        category: StatementCategory,
        period: ReportingPeriod,
    ) -> Result<Vec<StatementEntry>, ApiError> {
        self.rate_limiter.wait().await;

        let symbol = Self::provider_symbol(code);
        let (module, list_key) = Self::quote_summary_module(category, period);
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, symbol, module
        );

        debug!("Fetching {} for {} ({})", module, code, symbol);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No {} data for {}", module, symbol);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: response.status(),
            });
        }

        let payload: Value = response.json().await?;
        Self::melt_statements(code, &payload, module, list_key)
    }
}
