use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::StatementEntry;

/// Statement entries pivoted to one row per (code, period) pair.
///
/// `columns` lists every item name in first-seen order. Rows carry only the
/// items that were actually present for their pair, so melting a frame
/// reproduces the long input set exactly; absent cells read as missing when
/// the frame is persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideFrame {
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub code: String,
    pub period: NaiveDate,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Pivot long statement entries to wide form. Duplicate
/// (code, period, item) keys keep the last value seen.
pub fn pivot_wide(entries: &[StatementEntry]) -> WideFrame {
    let mut columns: Vec<String> = Vec::new();
    let mut rows: BTreeMap<(String, NaiveDate), BTreeMap<String, Option<f64>>> = BTreeMap::new();

    for entry in entries {
        if !columns.contains(&entry.item) {
            columns.push(entry.item.clone());
        }
        rows.entry((entry.code.clone(), entry.period))
            .or_default()
            .insert(entry.item.clone(), entry.value);
    }

    WideFrame {
        columns,
        rows: rows
            .into_iter()
            .map(|((code, period), values)| WideRow { code, period, values })
            .collect(),
    }
}

/// Inverse of [`pivot_wide`].
pub fn melt(frame: &WideFrame) -> Vec<StatementEntry> {
    let mut entries = Vec::new();
    for row in &frame.rows {
        for (item, value) in &row.values {
            entries.push(StatementEntry {
                code: row.code.clone(),
                period: row.period,
                item: item.clone(),
                value: *value,
            });
        }
    }
    entries
}
