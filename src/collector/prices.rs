use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::api::MarketDataProvider;
use crate::cursor::{self, Frequency};
use crate::database::DatabaseManager;
use crate::models::{DailyQuote, MarketSegment};
use crate::reference;

/// Initial lookback for a code with no stored history.
const PRICE_LOOKBACK_YEARS: u32 = 5;

/// The market overview index is stored alongside equities under its own
/// code so the dashboard reads a single table.
pub const OVERVIEW_INDEX_CODE: &str = "N225";

pub async fn run_price_update<P: MarketDataProvider>(
    provider: &P,
    db: &DatabaseManager,
) -> Result<usize> {
    let companies = reference::load(db).await?;
    let mut codes: Vec<String> = companies
        .iter()
        .filter(|company| company.market_segment == MarketSegment::Prime)
        .map(|company| company.code.clone())
        .collect();
    if codes.is_empty() {
        bail!("company directory has no Prime companies, run `kabu-plus update` first");
    }
    codes.push(OVERVIEW_INDEX_CODE.to_string());

    info!("📈 Updating price history for {} symbols", codes.len());

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")?
            .progress_chars("#>-"),
    );

    let today = Local::now().date_naive();
    let mut inserted = 0usize;
    for code in &codes {
        pb.set_message(code.clone());
        inserted += update_code(provider, db, code, today).await?;
        pb.inc(1);
    }
    pb.finish_with_message("done");

    info!("✅ Price history up to date ({} new rows)", inserted);
    Ok(inserted)
}

/// Refresh one code from the day after its last stored date. The provider
/// may return the boundary session again on resume, so bars at or before
/// the stored maximum are dropped before insert.
pub async fn update_code<P: MarketDataProvider>(
    provider: &P,
    db: &DatabaseManager,
    code: &str,
    today: NaiveDate,
) -> Result<usize> {
    let last = db.latest_quote_date(code).await?;
    let start = cursor::refresh_start(last, Frequency::Daily, PRICE_LOOKBACK_YEARS, today);
    if start > today {
        return Ok(0);
    }

    let bars = provider.price_history(code, start, today).await?;
    let quotes: Vec<DailyQuote> = bars
        .into_iter()
        .filter(|bar| last.map_or(true, |last| bar.date > last))
        .map(|bar| DailyQuote {
            code: code.to_string(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .collect();

    db.insert_daily_quotes(&quotes).await
}
