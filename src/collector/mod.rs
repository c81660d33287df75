pub mod feed;
pub mod prices;
pub mod reshape;
pub mod statements;

use crate::cursor::Frequency;

/// The four feed categories mirrored into local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCategory {
    StockOhlc,
    StockMetrics,
    IndexData,
    FinancialResults,
}

impl FeedCategory {
    pub const ALL: [FeedCategory; 4] = [
        FeedCategory::StockOhlc,
        FeedCategory::StockMetrics,
        FeedCategory::IndexData,
        FeedCategory::FinancialResults,
    ];

    /// Path segment of this category in the feed URL layout.
    pub fn path(&self) -> &'static str {
        match self {
            FeedCategory::StockOhlc => "tosho-stock-ohlc",
            FeedCategory::StockMetrics => "japan-all-stock-data",
            FeedCategory::IndexData => "tosho-index-data",
            FeedCategory::FinancialResults => "japan-all-stock-financial-results",
        }
    }

    /// Storage table this category lands in.
    pub fn table(&self) -> &'static str {
        match self {
            FeedCategory::StockOhlc => "daily_quotes",
            FeedCategory::StockMetrics => "stock_metrics",
            FeedCategory::IndexData => "index_quotes",
            FeedCategory::FinancialResults => "financial_results_monthly",
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            FeedCategory::FinancialResults => Frequency::Monthly,
            _ => Frequency::Daily,
        }
    }
}
