use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::api::{CsvTable, KabuPlusClient};
use crate::collector::{reshape, FeedCategory};
use crate::cursor;
use crate::database::DatabaseManager;
use crate::reference;

/// Initial lookback for an empty feed table.
const FEED_LOOKBACK_YEARS: u32 = 1;

/// Bring all four feed tables up to today.
pub async fn run_feed_update(client: &KabuPlusClient, db: &DatabaseManager) -> Result<usize> {
    let companies = reference::load(db).await?;
    let universe: HashSet<String> = companies.into_iter().map(|company| company.code).collect();
    info!("📋 Universe loaded: {} companies", universe.len());

    let today = Local::now().date_naive();
    let mut total = 0usize;
    for category in FeedCategory::ALL {
        total += update_category(client, db, category, &universe, today).await?;
    }
    Ok(total)
}

/// Walk one category from its resume point up to `today`, storing every
/// period file that exists. Missing files are skipped; any other feed
/// error aborts the run so the cursor never jumps past a gap.
pub async fn update_category(
    client: &KabuPlusClient,
    db: &DatabaseManager,
    category: FeedCategory,
    universe: &HashSet<String>,
    today: NaiveDate,
) -> Result<usize> {
    let frequency = category.frequency();
    let last = db.latest_date(category.table()).await?;
    let mut cursor = cursor::refresh_start(last, frequency, FEED_LOOKBACK_YEARS, today);

    info!("🔄 Updating {} from {}", category.table(), cursor);

    let mut inserted = 0usize;
    while cursor <= today {
        let key = cursor::period_key(cursor, frequency);
        match client.fetch_period(category.path(), frequency, &key).await? {
            Some(table) => {
                let rows = store_period(db, category, &table, universe, cursor).await?;
                info!("  ✅ {}: {} rows", key, rows);
                inserted += rows;
            }
            None => debug!("  ⏭ {}: no file", key),
        }
        cursor = cursor::advance(cursor, frequency);
    }

    info!("✅ {} up to date ({} new rows)", category.table(), inserted);
    Ok(inserted)
}

async fn store_period(
    db: &DatabaseManager,
    category: FeedCategory,
    table: &CsvTable,
    universe: &HashSet<String>,
    period: NaiveDate,
) -> Result<usize> {
    let inserted = match category {
        FeedCategory::StockOhlc => {
            db.insert_daily_quotes(&reshape::reshape_quotes(table, universe, period))
                .await?
        }
        FeedCategory::StockMetrics => {
            db.insert_stock_metrics(&reshape::reshape_metrics(table, universe, period))
                .await?
        }
        FeedCategory::IndexData => {
            db.insert_index_quotes(&reshape::reshape_indices(table, period))
                .await?
        }
        FeedCategory::FinancialResults => {
            db.insert_financial_results(&reshape::reshape_results(table, universe, period))
                .await?
        }
    };
    Ok(inserted)
}
