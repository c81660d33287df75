use chrono::{Datelike, Duration, Months, NaiveDate};

/// Publication cadence of a date-partitioned feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Monthly,
}

impl Frequency {
    /// Path segment in the feed URL template.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// First period to fetch for a table.
///
/// With no persisted rows the start is `lookback_years` back from `today`,
/// pinned to the first of that month. Otherwise it is one period past the
/// stored maximum.
pub fn refresh_start(
    last_persisted: Option<NaiveDate>,
    frequency: Frequency,
    lookback_years: u32,
    today: NaiveDate,
) -> NaiveDate {
    match last_persisted {
        None => first_of_month(today - Months::new(12 * lookback_years)),
        Some(last) => advance(last, frequency),
    }
}

/// Advance the cursor by one period.
pub fn advance(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date + Duration::days(1),
        Frequency::Monthly => first_of_month(date + Months::new(1)),
    }
}

/// File-name key for one period: `yyyymmdd` for daily files, `yyyymm` for
/// monthly files.
pub fn period_key(date: NaiveDate, frequency: Frequency) -> String {
    match frequency {
        Frequency::Daily => date.format("%Y%m%d").to_string(),
        Frequency::Monthly => date.format("%Y%m").to_string(),
    }
}
