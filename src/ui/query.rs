use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tokio::runtime::Runtime;

use crate::collector::prices::OVERVIEW_INDEX_CODE;
use crate::database::DatabaseManager;
use crate::models::LookbackWindow;
use crate::ui::Page;

/// Name prefix of the sector index family charted on the sector page.
const SECTOR_INDEX_PREFIX: &str = "TOPIX-17";

/// A date-indexed set of named series, shaped for charting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesFrame {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<(String, Vec<Option<f64>>)>,
}

impl SeriesFrame {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.series.is_empty()
    }
}

/// Pivot long rows into one column per series, aligned on the union of
/// dates. Dates a series has no row for become gaps.
pub fn pivot_series(rows: Vec<(String, NaiveDate, Option<f64>)>) -> SeriesFrame {
    let mut dates: Vec<NaiveDate> = rows.iter().map(|(_, date, _)| *date).collect();
    dates.sort();
    dates.dedup();

    let index: HashMap<NaiveDate, usize> = dates
        .iter()
        .enumerate()
        .map(|(position, date)| (*date, position))
        .collect();

    let mut series: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for (name, date, value) in rows {
        let column = series
            .entry(name)
            .or_insert_with(|| vec![None; dates.len()]);
        column[index[&date]] = value;
    }

    SeriesFrame {
        dates,
        series: series.into_iter().collect(),
    }
}

/// Rebase every series to 1.0 at its first charted value, so index levels
/// of very different magnitudes share one scale.
pub fn rebase(frame: &mut SeriesFrame) {
    for (_, values) in frame.series.iter_mut() {
        let Some(base) = values.iter().flatten().copied().find(|value| *value != 0.0) else {
            continue;
        };
        for value in values.iter_mut() {
            if let Some(v) = value.as_mut() {
                *v /= base;
            }
        }
    }
}

/// Loads chart series on demand, memoized per page and window. The
/// dashboard redraws on every key press; only the first request for a
/// (page, window) pair touches the store.
pub struct SeriesLoader {
    runtime: Runtime,
    db: DatabaseManager,
    cache: HashMap<(Page, LookbackWindow), SeriesFrame>,
}

impl SeriesLoader {
    pub fn new(database_path: &str) -> Result<Self> {
        let runtime = Runtime::new()?;
        let db = runtime.block_on(DatabaseManager::new(database_path))?;
        Ok(Self {
            runtime,
            db,
            cache: HashMap::new(),
        })
    }

    pub fn load(&mut self, page: Page, window: LookbackWindow) -> Result<SeriesFrame> {
        if let Some(frame) = self.cache.get(&(page, window)) {
            return Ok(frame.clone());
        }

        let since = window.start_from(Local::now().date_naive());
        let frame = match page {
            Page::Overview => {
                let rows = self
                    .runtime
                    .block_on(self.db.quote_closes(&[OVERVIEW_INDEX_CODE.to_string()], since))?;
                pivot_series(rows)
            }
            Page::SectorIndices => {
                let rows = self
                    .runtime
                    .block_on(self.db.index_closes(SECTOR_INDEX_PREFIX, since))?;
                let mut frame = pivot_series(rows);
                rebase(&mut frame);
                frame
            }
            Page::Settings => SeriesFrame::default(),
        };

        self.cache.insert((page, window), frame.clone());
        Ok(frame)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
