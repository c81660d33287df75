use chrono::NaiveDate;
use std::collections::HashSet;

use crate::api::CsvTable;
use crate::models::{DailyQuote, FinancialResult, IndexQuote, StockMetric};

/// Parse a numeric feed field. The feed publishes missing values as empty
/// strings, "-" or "N/A", and large numbers with comma separators.
pub fn coerce_f64(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("n/a") {
        return None;
    }
    cleaned.parse().ok()
}

pub fn coerce_i64(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("n/a") {
        return None;
    }
    cleaned.parse::<i64>().ok().or_else(|| {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|value| value.fract() == 0.0)
            .map(|value| value as i64)
    })
}

/// Feed files carry dates as `yyyy/mm/dd`, and older archives as plain
/// `yyyymmdd` integers.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim();
    for format in ["%Y/%m/%d", "%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(date);
        }
    }
    None
}

/// The code column is published as `SC` in most files and `コード` in some.
fn record_code<'a>(table: &CsvTable, record: &'a [String]) -> Option<&'a str> {
    table
        .field(record, "SC")
        .or_else(|| table.field(record, "コード"))
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

/// Row date, falling back to the period stamp when the file has no date
/// column (the monthly results archive) or the value does not parse.
fn record_date(table: &CsvTable, record: &[String], period: NaiveDate) -> NaiveDate {
    table
        .field(record, "日付")
        .and_then(parse_feed_date)
        .unwrap_or(period)
}

pub fn reshape_quotes(
    table: &CsvTable,
    universe: &HashSet<String>,
    period: NaiveDate,
) -> Vec<DailyQuote> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let code = record_code(table, record)?;
            if !universe.contains(code) {
                return None;
            }
            Some(DailyQuote {
                code: code.to_string(),
                date: record_date(table, record, period),
                open: table.field(record, "始値").and_then(coerce_f64),
                high: table.field(record, "高値").and_then(coerce_f64),
                low: table.field(record, "安値").and_then(coerce_f64),
                close: table.field(record, "終値").and_then(coerce_f64),
                volume: table.field(record, "出来高").and_then(coerce_i64),
            })
        })
        .collect()
}

pub fn reshape_metrics(
    table: &CsvTable,
    universe: &HashSet<String>,
    period: NaiveDate,
) -> Vec<StockMetric> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let code = record_code(table, record)?;
            if !universe.contains(code) {
                return None;
            }
            let number = |name: &str| table.field(record, name).and_then(coerce_f64);
            Some(StockMetric {
                code: code.to_string(),
                date: record_date(table, record, period),
                market_cap: number("時価総額（百万円）"),
                shares_outstanding: number("発行済株式数"),
                dividend_yield_forecast: number("配当利回り（予想）"),
                dividend_forecast: number("1株配当（予想）"),
                per_forecast: number("PER（予想）"),
                pbr_actual: number("PBR（実績）"),
                eps_forecast: number("EPS（予想）"),
                bps_actual: number("BPS（実績）"),
            })
        })
        .collect()
}

/// Index rows are not filtered against the company directory; indices are
/// not listed companies.
pub fn reshape_indices(table: &CsvTable, period: NaiveDate) -> Vec<IndexQuote> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let code = record_code(table, record)?;
            let name = table
                .field(record, "指数名")
                .map(str::trim)
                .filter(|name| !name.is_empty())?;
            Some(IndexQuote {
                code: code.to_string(),
                name: name.to_string(),
                date: record_date(table, record, period),
                close: table.field(record, "終値").and_then(coerce_f64),
            })
        })
        .collect()
}

pub fn reshape_results(
    table: &CsvTable,
    universe: &HashSet<String>,
    period: NaiveDate,
) -> Vec<FinancialResult> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let code = record_code(table, record)?;
            if !universe.contains(code) {
                return None;
            }
            let text = |name: &str| {
                table
                    .field(record, name)
                    .map(str::trim)
                    .filter(|value| !value.is_empty() && *value != "-")
                    .map(str::to_string)
            };
            let number = |name: &str| table.field(record, name).and_then(coerce_f64);
            Some(FinancialResult {
                code: code.to_string(),
                date: record_date(table, record, period),
                fiscal_period: text("決算期"),
                announced: text("決算発表日（本決算）"),
                revenue: number("売上高（百万円）"),
                operating_income: number("営業利益（百万円）"),
                ordinary_income: number("経常利益（百万円）"),
                net_income: number("当期利益（百万円）"),
                total_assets: number("総資産（百万円）"),
                equity: number("自己資本（百万円）"),
                capital: number("資本金（百万円）"),
                interest_bearing_debt: number("有利子負債（百万円）"),
                equity_ratio: number("自己資本比率"),
                roe: number("ROE"),
                roa: number("ROA"),
                shares_outstanding: number("発行済株式数"),
            })
        })
        .collect()
}
