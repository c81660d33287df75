use anyhow::Result;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use crate::models::{
    Company, DailyQuote, FinancialResult, IndexQuote, MarketSegment, StockMetric,
};
use crate::pivot::{WideFrame, WideRow};

/// SQLite store shared by the batch updaters and the dashboard.
pub struct DatabaseManager {
    pool: SqlitePool,
}

/// Quote an identifier for use in dynamically built SQL. Statement tables
/// carry provider-derived column names, so the quoting is not optional.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl DatabaseManager {
    pub async fn new(database_path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(database_path)
                    .create_if_missing(true),
            )
            .await?;

        // Enable WAL mode for better concurrent access
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        let manager = DatabaseManager { pool };
        manager.init_schema().await?;
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                market_segment TEXT NOT NULL,
                sector33_code TEXT,
                sector33_name TEXT,
                sector17_code TEXT,
                sector17_name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_quotes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                date DATE NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                close REAL,
                volume INTEGER,
                UNIQUE(code, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_quotes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                date DATE NOT NULL,
                close REAL,
                UNIQUE(code, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                date DATE NOT NULL,
                market_cap REAL,
                shares_outstanding REAL,
                dividend_yield_forecast REAL,
                dividend_forecast REAL,
                per_forecast REAL,
                pbr_actual REAL,
                eps_forecast REAL,
                bps_actual REAL,
                UNIQUE(code, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS financial_results_monthly (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                date DATE NOT NULL,
                fiscal_period TEXT,
                announced TEXT,
                revenue REAL,
                operating_income REAL,
                ordinary_income REAL,
                net_income REAL,
                total_assets REAL,
                equity REAL,
                capital REAL,
                interest_bearing_debt REAL,
                equity_ratio REAL,
                roe REAL,
                roa REAL,
                shares_outstanding REAL,
                UNIQUE(code, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    /// Latest persisted date in a feed table, `None` when nothing is stored.
    pub async fn latest_date(&self, table: &str) -> Result<Option<NaiveDate>> {
        if !self.table_exists(table).await? {
            return Ok(None);
        }
        let sql = format!("SELECT MAX(date) as max_date FROM {}", quote_ident(table));
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(row.try_get::<Option<NaiveDate>, _>("max_date")?)
    }

    /// Latest persisted quote date for a single code.
    pub async fn latest_quote_date(&self, code: &str) -> Result<Option<NaiveDate>> {
        let row = sqlx::query("SELECT MAX(date) as max_date FROM daily_quotes WHERE code = ?")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Option<NaiveDate>, _>("max_date")?)
    }

    pub async fn insert_daily_quotes(&self, quotes: &[DailyQuote]) -> Result<usize> {
        let mut inserted = 0usize;
        for quote in quotes {
            let result = sqlx::query(
                r#"
                INSERT INTO daily_quotes (code, date, open, high, low, close, volume)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(code, date) DO NOTHING
                "#,
            )
            .bind(&quote.code)
            .bind(quote.date)
            .bind(quote.open)
            .bind(quote.high)
            .bind(quote.low)
            .bind(quote.close)
            .bind(quote.volume)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    pub async fn insert_index_quotes(&self, quotes: &[IndexQuote]) -> Result<usize> {
        let mut inserted = 0usize;
        for quote in quotes {
            let result = sqlx::query(
                r#"
                INSERT INTO index_quotes (code, name, date, close)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(code, date) DO NOTHING
                "#,
            )
            .bind(&quote.code)
            .bind(&quote.name)
            .bind(quote.date)
            .bind(quote.close)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    pub async fn insert_stock_metrics(&self, metrics: &[StockMetric]) -> Result<usize> {
        let mut inserted = 0usize;
        for metric in metrics {
            let result = sqlx::query(
                r#"
                INSERT INTO stock_metrics (
                    code, date, market_cap, shares_outstanding,
                    dividend_yield_forecast, dividend_forecast,
                    per_forecast, pbr_actual, eps_forecast, bps_actual
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(code, date) DO NOTHING
                "#,
            )
            .bind(&metric.code)
            .bind(metric.date)
            .bind(metric.market_cap)
            .bind(metric.shares_outstanding)
            .bind(metric.dividend_yield_forecast)
            .bind(metric.dividend_forecast)
            .bind(metric.per_forecast)
            .bind(metric.pbr_actual)
            .bind(metric.eps_forecast)
            .bind(metric.bps_actual)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    pub async fn insert_financial_results(&self, results: &[FinancialResult]) -> Result<usize> {
        let mut inserted = 0usize;
        for result_row in results {
            let result = sqlx::query(
                r#"
                INSERT INTO financial_results_monthly (
                    code, date, fiscal_period, announced,
                    revenue, operating_income, ordinary_income, net_income,
                    total_assets, equity, capital, interest_bearing_debt,
                    equity_ratio, roe, roa, shares_outstanding
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(code, date) DO NOTHING
                "#,
            )
            .bind(&result_row.code)
            .bind(result_row.date)
            .bind(&result_row.fiscal_period)
            .bind(&result_row.announced)
            .bind(result_row.revenue)
            .bind(result_row.operating_income)
            .bind(result_row.ordinary_income)
            .bind(result_row.net_income)
            .bind(result_row.total_assets)
            .bind(result_row.equity)
            .bind(result_row.capital)
            .bind(result_row.interest_bearing_debt)
            .bind(result_row.equity_ratio)
            .bind(result_row.roe)
            .bind(result_row.roa)
            .bind(result_row.shares_outstanding)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    /// Swap in a fresh copy of the company directory.
    pub async fn replace_companies(&self, companies: &[Company]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM companies").execute(&mut *tx).await?;
        for company in companies {
            sqlx::query(
                r#"
                INSERT INTO companies (
                    code, name, market_segment,
                    sector33_code, sector33_name, sector17_code, sector17_name
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&company.code)
            .bind(&company.name)
            .bind(company.market_segment.as_str())
            .bind(&company.sector33_code)
            .bind(&company.sector33_name)
            .bind(&company.sector17_code)
            .bind(&company.sector17_name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(companies.len())
    }

    pub async fn get_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query(
            r#"
            SELECT code, name, market_segment,
                   sector33_code, sector33_name, sector17_code, sector17_name
            FROM companies
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Company {
                code: row.get("code"),
                name: row.get("name"),
                market_segment: MarketSegment::parse(&row.get::<String, _>("market_segment"))
                    .unwrap_or(MarketSegment::Standard),
                sector33_code: row.get("sector33_code"),
                sector33_name: row.get("sector33_name"),
                sector17_code: row.get("sector17_code"),
                sector17_name: row.get("sector17_name"),
            })
            .collect())
    }

    /// Replace one statement table with the given wide frame. The table is
    /// rebuilt from scratch inside a transaction so readers never observe a
    /// half-written statement set.
    pub async fn replace_statement_table(&self, table: &str, frame: &WideFrame) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .execute(&mut *tx)
            .await?;

        let mut column_defs = String::from("code TEXT NOT NULL, period DATE NOT NULL");
        for column in &frame.columns {
            column_defs.push_str(&format!(", {} REAL", quote_ident(column)));
        }
        sqlx::query(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(table),
            column_defs
        ))
        .execute(&mut *tx)
        .await?;

        let placeholders = vec!["?"; frame.columns.len() + 2].join(", ");
        let insert_sql = format!("INSERT INTO {} VALUES ({})", quote_ident(table), placeholders);
        for row in &frame.rows {
            let mut query = sqlx::query(&insert_sql).bind(&row.code).bind(row.period);
            for column in &frame.columns {
                query = query.bind(row.values.get(column).copied().flatten());
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Read a statement table back into a wide frame, columns in table order.
    pub async fn read_statement_table(&self, table: &str) -> Result<WideFrame> {
        let info_rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(table)))
            .fetch_all(&self.pool)
            .await?;
        let columns: Vec<String> = info_rows
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .filter(|name| name != "code" && name != "period")
            .collect();

        let rows = sqlx::query(&format!(
            "SELECT * FROM {} ORDER BY code, period",
            quote_ident(table)
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut frame_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = BTreeMap::new();
            for column in &columns {
                values.insert(column.clone(), row.try_get::<Option<f64>, _>(column.as_str())?);
            }
            frame_rows.push(WideRow {
                code: row.get("code"),
                period: row.try_get("period")?,
                values,
            });
        }

        Ok(WideFrame {
            columns,
            rows: frame_rows,
        })
    }

    /// Close series for a set of codes since a cutoff date. An empty code
    /// list short-circuits to an empty result instead of emitting `IN ()`.
    pub async fn quote_closes(
        &self,
        codes: &[String],
        since: NaiveDate,
    ) -> Result<Vec<(String, NaiveDate, Option<f64>)>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; codes.len()].join(", ");
        let sql = format!(
            "SELECT code, date, close FROM daily_quotes WHERE code IN ({}) AND date >= ? ORDER BY date, code",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for code in codes {
            query = query.bind(code);
        }
        let rows = query.bind(since).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.get("code"),
                    row.try_get("date")?,
                    row.try_get("close")?,
                ))
            })
            .collect()
    }

    /// Close series for every index whose name starts with the given prefix.
    pub async fn index_closes(
        &self,
        name_prefix: &str,
        since: NaiveDate,
    ) -> Result<Vec<(String, NaiveDate, Option<f64>)>> {
        let rows = sqlx::query(
            "SELECT name, date, close FROM index_quotes WHERE name LIKE ? AND date >= ? ORDER BY date, name",
        )
        .bind(format!("{}%", name_prefix))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.get("name"),
                    row.try_get("date")?,
                    row.try_get("close")?,
                ))
            })
            .collect()
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {}", quote_ident(table)))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO metadata (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }
}
