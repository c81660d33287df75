//! Statement collection, renaming and the offline replay path

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kabunav::api::YahooClient;
use kabunav::collector::statements;
use kabunav::models::{StatementCategory, StatementEntry};
use kabunav::pivot::pivot_wide;
use kabunav::translate::translate_frame;

use crate::common::{self, market_api};

const MODULES: [(&str, &str, &[(&str, f64)]); 6] = [
    (
        "incomeStatementHistory",
        "incomeStatementHistory",
        &[("totalRevenue", 468000.0), ("netIncome", 36700.0)],
    ),
    (
        "incomeStatementHistoryQuarterly",
        "incomeStatementHistory",
        &[("totalRevenue", 120000.0)],
    ),
    (
        "balanceSheetHistory",
        "balanceSheetStatements",
        &[("totalAssets", 904000.0), ("cash", 88000.0)],
    ),
    (
        "balanceSheetHistoryQuarterly",
        "balanceSheetStatements",
        &[("totalAssets", 910000.0)],
    ),
    (
        "cashflowStatementHistory",
        "cashflowStatements",
        &[("totalCashFromOperatingActivities", 42000.0)],
    ),
    (
        "cashflowStatementHistoryQuarterly",
        "cashflowStatements",
        &[("totalCashFromOperatingActivities", 11000.0)],
    ),
];

async fn mount_statement_mocks(server: &MockServer, symbols: &[&str]) {
    for symbol in symbols {
        for (module, list_key, items) in MODULES {
            Mock::given(method("GET"))
                .and(path(format!("/v10/finance/quoteSummary/{}", symbol)))
                .and(query_param("modules", module))
                .respond_with(ResponseTemplate::new(200).set_body_json(
                    market_api::quote_summary(
                        module,
                        list_key,
                        &[("2024-03-31", items), ("2023-03-31", items)],
                    ),
                ))
                .mount(server)
                .await;
        }
    }
}

fn provider(server: &MockServer) -> YahooClient {
    let config = common::test_config("unused.db", &server.uri());
    YahooClient::new(&config).expect("provider")
}

#[tokio::test]
async fn test_statement_run_fills_all_eight_tables() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;
    db.replace_companies(&common::sample_companies()).await.unwrap();
    mount_statement_mocks(&server, &["1301.T", "7203.T"]).await;

    statements::run_statement_update(&provider(&server), &db)
        .await
        .expect("statement update");

    for (category, period) in statements::COMBINATIONS {
        assert!(db.table_exists(category.table_name(period)).await.unwrap());
    }

    let balance = db.read_statement_table("balance_sheet_annual").await.unwrap();
    assert_eq!(balance.columns, vec!["total_assets", "cash"]);
    // Two Prime codes, two fiscal years each; the Growth and Standard
    // listings from the directory never reach the provider
    assert_eq!(balance.rows.len(), 4);
    assert!(balance.rows.iter().all(|row| row.code == "1301" || row.code == "7203"));
    assert_eq!(
        balance.rows[0].period,
        NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()
    );
    assert_eq!(balance.rows[0].values["total_assets"], Some(904000.0));

    let quarterly = db.read_statement_table("cash_flow_quarterly").await.unwrap();
    assert_eq!(quarterly.columns, vec!["total_cash_from_operating_activities"]);
    assert_eq!(
        quarterly.rows[0].values["total_cash_from_operating_activities"],
        Some(11000.0)
    );
}

#[tokio::test]
async fn test_financials_tables_mirror_income_statement_tables() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;
    db.replace_companies(&common::sample_companies()).await.unwrap();
    mount_statement_mocks(&server, &["1301.T", "7203.T"]).await;

    statements::run_statement_update(&provider(&server), &db)
        .await
        .expect("statement update");

    // Both categories are sourced from the same provider module
    let financials = db.read_statement_table("financials_annual").await.unwrap();
    let income = db.read_statement_table("income_statement_annual").await.unwrap();
    assert_eq!(financials, income);
    assert_eq!(income.columns, vec!["total_revenue", "net_income"]);
}

#[tokio::test]
async fn test_codes_without_statements_are_skipped() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;
    db.replace_companies(&common::sample_companies()).await.unwrap();
    // Only 7203 has statements; 1301 gets the provider's 404
    mount_statement_mocks(&server, &["7203.T"]).await;

    statements::run_statement_update(&provider(&server), &db)
        .await
        .expect("statement update");

    let balance = db.read_statement_table("balance_sheet_annual").await.unwrap();
    assert_eq!(balance.rows.len(), 2);
    assert!(balance.rows.iter().all(|row| row.code == "7203"));
}

#[tokio::test]
async fn test_local_replay_is_lossless() {
    let (_dir, db) = common::test_db().await;

    let period_a = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let period_b = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
    let mut entries = Vec::new();
    for code in ["1301", "7203"] {
        for period in [period_a, period_b] {
            entries.push(StatementEntry {
                code: code.to_string(),
                period,
                item: "totalAssets".to_string(),
                value: Some(904000.0),
            });
            entries.push(StatementEntry {
                code: code.to_string(),
                period,
                item: "cash".to_string(),
                value: None,
            });
        }
    }
    let frame = translate_frame(pivot_wide(&entries), StatementCategory::BalanceSheet);
    db.replace_statement_table("balance_sheet_annual", &frame)
        .await
        .unwrap();

    let before = db.read_statement_table("balance_sheet_annual").await.unwrap();
    // The other seven tables do not exist yet; replay warns and skips them
    statements::run_local_replay(&db).await.expect("replay");
    let after = db.read_statement_table("balance_sheet_annual").await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.columns, vec!["total_assets", "cash"]);
    assert_eq!(after.rows[0].values["cash"], None);
}
