use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::api::MarketDataProvider;
use crate::database::DatabaseManager;
use crate::models::{MarketSegment, ReportingPeriod, StatementCategory, StatementEntry};
use crate::pivot::pivot_wide;
use crate::reference;
use crate::translate::translate_frame;

/// Category and period combinations refreshed by one statement run.
pub const COMBINATIONS: [(StatementCategory, ReportingPeriod); 8] = [
    (StatementCategory::Financials, ReportingPeriod::Annual),
    (StatementCategory::BalanceSheet, ReportingPeriod::Annual),
    (StatementCategory::IncomeStatement, ReportingPeriod::Annual),
    (StatementCategory::CashFlow, ReportingPeriod::Annual),
    (StatementCategory::Financials, ReportingPeriod::Quarterly),
    (StatementCategory::BalanceSheet, ReportingPeriod::Quarterly),
    (StatementCategory::IncomeStatement, ReportingPeriod::Quarterly),
    (StatementCategory::CashFlow, ReportingPeriod::Quarterly),
];

/// Refresh every statement table from the market-data provider. Entries are
/// collected across the whole universe first, then each table is pivoted
/// and replaced once, so column sets stay consistent across codes.
pub async fn run_statement_update<P: MarketDataProvider>(
    provider: &P,
    db: &DatabaseManager,
) -> Result<()> {
    let companies = reference::load(db).await?;
    let codes: Vec<String> = companies
        .iter()
        .filter(|company| company.market_segment == MarketSegment::Prime)
        .map(|company| company.code.clone())
        .collect();
    if codes.is_empty() {
        bail!("company directory has no Prime companies, run `kabu-plus update` first");
    }

    info!("📊 Fetching statements for {} Prime companies", codes.len());

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")?
            .progress_chars("#>-"),
    );

    let mut collected: Vec<Vec<StatementEntry>> = vec![Vec::new(); COMBINATIONS.len()];
    for code in &codes {
        pb.set_message(code.clone());
        for (slot, (category, period)) in COMBINATIONS.iter().enumerate() {
            let entries = provider.statement_entries(code, *category, *period).await?;
            collected[slot].extend(entries);
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    for (slot, (category, period)) in COMBINATIONS.iter().enumerate() {
        store_statements(db, *category, *period, &collected[slot]).await?;
    }
    Ok(())
}

async fn store_statements(
    db: &DatabaseManager,
    category: StatementCategory,
    period: ReportingPeriod,
    entries: &[StatementEntry],
) -> Result<()> {
    let table = category.table_name(period);
    let frame = translate_frame(pivot_wide(entries), category);
    db.replace_statement_table(table, &frame).await?;
    info!(
        "✅ {}: {} rows, {} columns",
        table,
        frame.rows.len(),
        frame.columns.len()
    );
    Ok(())
}

/// Re-run the pivot translation over statement tables already in the store,
/// without touching the network. Useful after a dictionary change.
pub async fn run_local_replay(db: &DatabaseManager) -> Result<()> {
    for (category, period) in COMBINATIONS {
        let table = category.table_name(period);
        if !db.table_exists(table).await? {
            warn!("⚠️ {} missing, nothing to replay", table);
            continue;
        }
        let frame = translate_frame(db.read_statement_table(table).await?, category);
        db.replace_statement_table(table, &frame).await?;
        info!("✅ {}: replayed {} rows", table, frame.rows.len());
    }
    Ok(())
}
