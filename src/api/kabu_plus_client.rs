use csv::ReaderBuilder;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiError, ApiRateLimiter};
use crate::cursor::Frequency;
use crate::models::Config;

/// Client for the kabu+ CSV feed. Files are organized as
/// `{category}/{frequency}/{category}_{period}.csv` behind HTTP basic auth.
pub struct KabuPlusClient {
    client: Client,
    base_url: String,
    user: String,
    pass: String,
    rate_limiter: ApiRateLimiter,
}

/// One parsed feed file, headers kept as published.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn field<'a>(&self, record: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name)
            .and_then(|index| record.get(index))
            .map(String::as_str)
    }
}

impl KabuPlusClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("kabunav/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.kabu_plus_base_url.trim_end_matches('/').to_string(),
            user: config.kabu_plus_user.clone(),
            pass: config.kabu_plus_pass.clone(),
            rate_limiter: ApiRateLimiter::new(config.request_delay_ms),
        })
    }

    /// Fetch one period file for a feed category. A missing file is a
    /// normal condition (weekends, holidays, not-yet-published periods) and
    /// comes back as `Ok(None)`.
    pub async fn fetch_period(
        &self,
        category: &str,
        frequency: Frequency,
        period_key: &str,
    ) -> Result<Option<CsvTable>, ApiError> {
        self.rate_limiter.wait().await;

        let url = format!(
            "{}/{}/{}/{}_{}.csv",
            self.base_url,
            category,
            frequency.as_str(),
            category,
            period_key
        );

        debug!("Fetching feed file: {}", url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.pass))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: response.status(),
            });
        }

        // Feed files are Shift_JIS and the server sends no charset header
        let text = response.text_with_charset("shift_jis").await?;
        Ok(Some(Self::parse_csv(&text)?))
    }

    fn parse_csv(text: &str) -> Result<CsvTable, ApiError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|header| header.to_string())
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|field| field.to_string()).collect());
        }

        Ok(CsvTable { headers, records })
    }
}
