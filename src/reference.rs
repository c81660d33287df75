use anyhow::{anyhow, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Local;
use std::io::Cursor;
use tracing::info;

use crate::database::DatabaseManager;
use crate::models::{Company, MarketSegment};

/// Listing spreadsheet published by the exchange, refreshed monthly.
pub const JPX_DIRECTORY_URL: &str =
    "https://www.jpx.co.jp/markets/statistics-equities/misc/tvdivq0000001vg2-att/data_j.xls";

/// Download the exchange listing spreadsheet and swap the stored company
/// directory for its domestic-equity rows.
pub async fn refresh(db: &DatabaseManager) -> Result<usize> {
    info!("🔄 Downloading company directory...");
    let response = reqwest::get(JPX_DIRECTORY_URL).await?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "directory download failed with HTTP {}",
            response.status()
        ));
    }
    let bytes = response.bytes().await?;

    let companies = parse_directory(&bytes)?;
    db.replace_companies(&companies).await?;
    db.set_metadata(
        "directory_last_updated",
        &Local::now().date_naive().to_string(),
    )
    .await?;

    info!("✅ Company directory refreshed: {} companies", companies.len());
    Ok(companies.len())
}

/// Current directory snapshot, ordered by code.
pub async fn load(db: &DatabaseManager) -> Result<Vec<Company>> {
    db.get_companies().await
}

/// Parse the spreadsheet into directory rows, keeping only the three
/// domestic-equity market segments.
pub fn parse_directory(bytes: &[u8]) -> Result<Vec<Company>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(anyhow!("directory spreadsheet has no sheets")),
    };

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("directory spreadsheet is empty"))?
        .iter()
        .map(cell_text)
        .collect();
    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("directory column {} not found", name))
    };

    let code_col = column("コード")?;
    let name_col = column("銘柄名")?;
    let segment_col = column("市場・商品区分")?;
    let sector33_code_col = column("33業種コード")?;
    let sector33_name_col = column("33業種区分")?;
    let sector17_code_col = column("17業種コード")?;
    let sector17_name_col = column("17業種区分")?;

    let mut companies = Vec::new();
    for row in rows {
        let cell = |index: usize| row.get(index).map(cell_text).unwrap_or_default();

        // ETFs, REITs and foreign listings carry other segment labels
        let Some(segment) = MarketSegment::from_directory_label(&cell(segment_col)) else {
            continue;
        };
        let code = cell(code_col);
        if code.is_empty() {
            continue;
        }

        companies.push(Company {
            code,
            name: cell(name_col),
            market_segment: segment,
            sector33_code: optional_text(cell(sector33_code_col)),
            sector33_name: optional_text(cell(sector33_name_col)),
            sector17_code: optional_text(cell(sector17_code_col)),
            sector17_name: optional_text(cell(sector17_name_col)),
        });
    }
    Ok(companies)
}

/// Spreadsheet codes come through as numeric cells; render them without a
/// trailing `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn optional_text(value: String) -> Option<String> {
    if value.is_empty() || value == "-" {
        None
    } else {
        Some(value)
    }
}
