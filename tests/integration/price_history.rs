//! Price backfill through the market-data provider

use chrono::NaiveDate;
use sqlx::Row;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kabunav::api::YahooClient;
use kabunav::collector::prices;
use kabunav::models::DailyQuote;

use crate::common::{self, market_api};

fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).unwrap()
}

fn provider(server: &MockServer) -> YahooClient {
    let config = common::test_config("unused.db", &server.uri());
    YahooClient::new(&config).expect("provider")
}

#[tokio::test]
async fn test_initial_backfill_stores_every_bar() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/1301.T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_api::chart(&[
            (day(2024, 3, 4), 3440.0),
            (day(2024, 3, 5), 3450.0),
        ])))
        .mount(&server)
        .await;

    let inserted = prices::update_code(&provider(&server), &db, "1301", day(2024, 3, 10))
        .await
        .expect("price update");
    assert_eq!(inserted, 2);

    let closes = db
        .quote_closes(&["1301".to_string()], day(2024, 3, 1))
        .await
        .unwrap();
    assert_eq!(closes.len(), 2);
    assert_eq!(closes[0].1, day(2024, 3, 4));
    assert_eq!(closes[1].2, Some(3450.0));
}

#[tokio::test]
async fn test_resume_keeps_stored_boundary_bar() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;

    db.insert_daily_quotes(&[DailyQuote {
        code: "1301".to_string(),
        date: day(2024, 3, 5),
        open: Some(3440.0),
        high: Some(3470.0),
        low: Some(3430.0),
        close: Some(3450.0),
        volume: Some(9000),
    }])
    .await
    .unwrap();

    // The provider replays the last stored session with different numbers;
    // only the newer bar may land
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/1301.T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_api::chart(&[
            (day(2024, 3, 5), 9999.0),
            (day(2024, 3, 6), 3460.0),
        ])))
        .mount(&server)
        .await;

    let inserted = prices::update_code(&provider(&server), &db, "1301", day(2024, 3, 10))
        .await
        .expect("price update");
    assert_eq!(inserted, 1);

    let closes = db
        .quote_closes(&["1301".to_string()], day(2024, 3, 1))
        .await
        .unwrap();
    assert_eq!(closes.len(), 2);
    assert_eq!(closes[0].2, Some(3450.0));
    assert_eq!(closes[1].2, Some(3460.0));
}

#[tokio::test]
async fn test_index_history_is_stored_under_directory_code() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;

    // The caret in ^N225 may reach the server percent-encoded
    Mock::given(method("GET"))
        .and(path_regex(r"^/v8/finance/chart/.*N225$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(market_api::chart(&[(day(2024, 3, 5), 39800.0)])),
        )
        .mount(&server)
        .await;

    let inserted = prices::update_code(
        &provider(&server),
        &db,
        prices::OVERVIEW_INDEX_CODE,
        day(2024, 3, 10),
    )
    .await
    .expect("price update");
    assert_eq!(inserted, 1);

    let row = sqlx::query("SELECT code, close FROM daily_quotes")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("code"), "N225");
    assert_eq!(row.get::<Option<f64>, _>("close"), Some(39800.0));
}

#[tokio::test]
async fn test_unknown_symbol_is_skipped() {
    let (_dir, db) = common::test_db().await;
    let server = MockServer::start().await;

    // No mock mounted: the server answers 404 like the real API does
    // for delisted codes
    let inserted = prices::update_code(&provider(&server), &db, "9997", day(2024, 3, 10))
        .await
        .expect("price update");
    assert_eq!(inserted, 0);
}
