use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the JPX listed-company directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub code: String,
    pub name: String,
    pub market_segment: MarketSegment,
    pub sector33_code: Option<String>,
    pub sector33_name: Option<String>,
    pub sector17_code: Option<String>,
    pub sector17_name: Option<String>,
}

/// Market segment enumeration (domestic equities only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MarketSegment {
    Prime,
    Standard,
    Growth,
}

impl MarketSegment {
    /// Map a raw segment label from the directory spreadsheet. ETFs, REITs
    /// and foreign listings carry other labels and map to `None`.
    pub fn from_directory_label(label: &str) -> Option<Self> {
        match label.trim() {
            "プライム（内国株式）" => Some(MarketSegment::Prime),
            "スタンダード（内国株式）" => Some(MarketSegment::Standard),
            "グロース（内国株式）" => Some(MarketSegment::Growth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSegment::Prime => "Prime",
            MarketSegment::Standard => "Standard",
            MarketSegment::Growth => "Growth",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Prime" => Some(MarketSegment::Prime),
            "Standard" => Some(MarketSegment::Standard),
            "Growth" => Some(MarketSegment::Growth),
            _ => None,
        }
    }
}

/// Daily price bar for one listed code (or the overview index)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub code: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// One OHLCV bar as returned by the market-data API, before it is tied to
/// a directory code.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// Daily close for one exchange index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub code: String,
    pub name: String,
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Daily per-code investment indicators from the data feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetric {
    pub code: String,
    pub date: NaiveDate,
    /// Millions of yen
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub dividend_yield_forecast: Option<f64>,
    pub dividend_forecast: Option<f64>,
    pub per_forecast: Option<f64>,
    pub pbr_actual: Option<f64>,
    pub eps_forecast: Option<f64>,
    pub bps_actual: Option<f64>,
}

/// Monthly per-code summary results from the data feed. Monetary fields
/// are millions of yen; the fiscal period and announcement date are kept
/// as published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialResult {
    pub code: String,
    pub date: NaiveDate,
    pub fiscal_period: Option<String>,
    pub announced: Option<String>,
    pub revenue: Option<f64>,
    pub operating_income: Option<f64>,
    pub ordinary_income: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub equity: Option<f64>,
    pub capital: Option<f64>,
    pub interest_bearing_debt: Option<f64>,
    pub equity_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub shares_outstanding: Option<f64>,
}

/// One financial-statement line item in long form
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub code: String,
    pub period: NaiveDate,
    pub item: String,
    pub value: Option<f64>,
}

/// Financial-statement category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementCategory {
    Financials,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementCategory {
    pub const ALL: [StatementCategory; 4] = [
        StatementCategory::Financials,
        StatementCategory::BalanceSheet,
        StatementCategory::IncomeStatement,
        StatementCategory::CashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementCategory::Financials => "financials",
            StatementCategory::BalanceSheet => "balance_sheet",
            StatementCategory::IncomeStatement => "income_statement",
            StatementCategory::CashFlow => "cash_flow",
        }
    }

    /// Storage table for this category and reporting period.
    pub fn table_name(&self, period: ReportingPeriod) -> &'static str {
        match (self, period) {
            (StatementCategory::Financials, ReportingPeriod::Annual) => "financials_annual",
            (StatementCategory::Financials, ReportingPeriod::Quarterly) => "financials_quarterly",
            (StatementCategory::BalanceSheet, ReportingPeriod::Annual) => "balance_sheet_annual",
            (StatementCategory::BalanceSheet, ReportingPeriod::Quarterly) => "balance_sheet_quarterly",
            (StatementCategory::IncomeStatement, ReportingPeriod::Annual) => "income_statement_annual",
            (StatementCategory::IncomeStatement, ReportingPeriod::Quarterly) => "income_statement_quarterly",
            (StatementCategory::CashFlow, ReportingPeriod::Annual) => "cash_flow_annual",
            (StatementCategory::CashFlow, ReportingPeriod::Quarterly) => "cash_flow_quarterly",
        }
    }
}

/// Annual or quarterly statement variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportingPeriod {
    Annual,
    Quarterly,
}

/// Fixed lookback windows offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookbackWindow {
    OneYear,
    SixMonths,
    ThreeMonths,
    OneMonth,
    TwoWeeks,
    OneWeek,
}

impl LookbackWindow {
    pub const ALL: [LookbackWindow; 6] = [
        LookbackWindow::OneYear,
        LookbackWindow::SixMonths,
        LookbackWindow::ThreeMonths,
        LookbackWindow::OneMonth,
        LookbackWindow::TwoWeeks,
        LookbackWindow::OneWeek,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LookbackWindow::OneYear => "1 Year",
            LookbackWindow::SixMonths => "6 Months",
            LookbackWindow::ThreeMonths => "3 Months",
            LookbackWindow::OneMonth => "1 Month",
            LookbackWindow::TwoWeeks => "2 Weeks",
            LookbackWindow::OneWeek => "1 Week",
        }
    }

    /// Earliest date covered by this window, counting back from `today`.
    pub fn start_from(&self, today: NaiveDate) -> NaiveDate {
        match self {
            LookbackWindow::OneYear => today - Months::new(12),
            LookbackWindow::SixMonths => today - Months::new(6),
            LookbackWindow::ThreeMonths => today - Months::new(3),
            LookbackWindow::OneMonth => today - Months::new(1),
            LookbackWindow::TwoWeeks => today - Duration::weeks(2),
            LookbackWindow::OneWeek => today - Duration::weeks(1),
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub kabu_plus_user: String,
    pub kabu_plus_pass: String,
    pub kabu_plus_base_url: String,
    pub market_api_base_url: String,
    pub database_path: String,
    pub request_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            kabu_plus_user: std::env::var("KABU_PLUS_USER")
                .map_err(|_| anyhow::anyhow!("KABU_PLUS_USER environment variable required"))?,
            kabu_plus_pass: std::env::var("KABU_PLUS_PASS")
                .map_err(|_| anyhow::anyhow!("KABU_PLUS_PASS environment variable required"))?,
            kabu_plus_base_url: std::env::var("KABU_PLUS_BASE_URL")
                .unwrap_or_else(|_| "https://csvex.com/kabu.plus/csv".to_string()),
            market_api_base_url: std::env::var("MARKET_API_BASE_URL")
                .unwrap_or_else(|_| "https://query2.finance.yahoo.com".to_string()),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "stocks.db".to_string()),
            request_delay_ms: std::env::var("REQUEST_DELAY_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
        })
    }
}
