//! Common test utilities and helpers

use tempfile::TempDir;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kabunav::database::DatabaseManager;
use kabunav::models::{Company, Config, MarketSegment};

/// Fresh on-disk database in a temp directory. Keep the returned `TempDir`
/// alive for the duration of the test.
pub async fn test_db() -> (TempDir, DatabaseManager) {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("test.db");
    let db = DatabaseManager::new(db_path.to_str().expect("utf-8 path"))
        .await
        .expect("test database");
    (dir, db)
}

/// Config pointing both upstreams at a mock server, with no request delay.
pub fn test_config(database_path: &str, server_url: &str) -> Config {
    Config {
        kabu_plus_user: "user".to_string(),
        kabu_plus_pass: "pass".to_string(),
        kabu_plus_base_url: server_url.to_string(),
        market_api_base_url: server_url.to_string(),
        database_path: database_path.to_string(),
        request_delay_ms: 0,
    }
}

pub fn company(code: &str, name: &str, segment: MarketSegment) -> Company {
    Company {
        code: code.to_string(),
        name: name.to_string(),
        market_segment: segment,
        sector33_code: Some("50".to_string()),
        sector33_name: Some("水産・農林業".to_string()),
        sector17_code: Some("1".to_string()),
        sector17_name: Some("食品".to_string()),
    }
}

/// Two Prime codes plus one each of the other segments.
pub fn sample_companies() -> Vec<Company> {
    vec![
        company("1301", "極洋", MarketSegment::Prime),
        company("4385", "メルカリ", MarketSegment::Growth),
        company("7203", "トヨタ自動車", MarketSegment::Prime),
        company("9416", "ビジョン", MarketSegment::Standard),
    ]
}

/// Mount one feed CSV under the live layout. Bodies are served as UTF-8
/// with an explicit charset so the client's legacy-encoding default does
/// not apply; unmounted period files 404 like the real feed.
pub async fn mount_feed_file(
    server: &MockServer,
    category: &str,
    frequency: &str,
    period_key: &str,
    body: &str,
) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/{}/{}/{}_{}.csv",
            category, frequency, category, period_key
        )))
        .and(basic_auth("user", "pass"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/csv; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Feed file builders matching the published column layouts.
pub mod feed_files {
    /// OHLC rows: (code, date, close). Open/high/low/volume derive from the
    /// close so tests only spell out what they assert on.
    pub fn ohlc(rows: &[(&str, &str, f64)]) -> String {
        let mut body = String::from("SC,名称,日付,始値,高値,安値,終値,出来高\n");
        for (code, date, close) in rows {
            body.push_str(&format!(
                "{},テスト銘柄,{},{},{},{},{},10000\n",
                code,
                date,
                close - 10.0,
                close + 20.0,
                close - 30.0,
                close
            ));
        }
        body
    }

    /// OHLC file with the two styles of missing numeric field.
    pub fn ohlc_with_gaps(code: &str, date: &str) -> String {
        format!(
            "SC,名称,日付,始値,高値,安値,終値,出来高\n{},テスト銘柄,{},3450,N/A,,3465,-\n",
            code, date
        )
    }

    /// Investment metric rows: (code, date, market cap in millions).
    pub fn metrics(rows: &[(&str, &str, f64)]) -> String {
        let mut body = String::from(
            "SC,名称,日付,時価総額（百万円）,発行済株式数,配当利回り（予想）,1株配当（予想）,PER（予想）,PBR（実績）,EPS（予想）,BPS（実績）\n",
        );
        for (code, date, market_cap) in rows {
            body.push_str(&format!(
                "{},テスト銘柄,{},{},1000000,2.5,86,9.5,0.8,364.9,4320\n",
                code, date, market_cap
            ));
        }
        body
    }

    /// Index rows: (code, name, date, close). Codes here are index codes,
    /// not listed companies.
    pub fn indices(rows: &[(&str, &str, &str, f64)]) -> String {
        let mut body = String::from("SC,指数名,日付,終値\n");
        for (code, name, date, close) in rows {
            body.push_str(&format!("{},{},{},{}\n", code, name, date, close));
        }
        body
    }

    /// Monthly results rows: (code, fiscal period, revenue in millions).
    /// The monthly archive has no date column.
    pub fn results(rows: &[(&str, &str, f64)]) -> String {
        let mut body = String::from(
            "SC,名称,決算期,決算発表日（本決算）,売上高（百万円）,営業利益（百万円）,経常利益（百万円）,当期利益（百万円）,総資産（百万円）,自己資本（百万円）,資本金（百万円）,有利子負債（百万円）,自己資本比率,ROE,ROA,発行済株式数\n",
        );
        for (code, fiscal_period, revenue) in rows {
            body.push_str(&format!(
                "{},テスト銘柄,{},2024/05/08,{},27250,29550,19960,315900,231300,5664,31380,73.2,9.2,6.7,1000000\n",
                code, fiscal_period, revenue
            ));
        }
        body
    }
}

/// Market-data API response builders.
pub mod market_api {
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::{json, Value};

    /// Chart payload with one bar per (date, close) pair.
    pub fn chart(bars: &[(NaiveDate, f64)]) -> Value {
        let timestamps: Vec<i64> = bars
            .iter()
            .map(|(date, _)| date.and_time(NaiveTime::MIN).and_utc().timestamp())
            .collect();
        let closes: Vec<Value> = bars.iter().map(|(_, close)| json!(close)).collect();
        let opens: Vec<Value> = bars.iter().map(|(_, close)| json!(close - 5.0)).collect();
        let highs: Vec<Value> = bars.iter().map(|(_, close)| json!(close + 10.0)).collect();
        let lows: Vec<Value> = bars.iter().map(|(_, close)| json!(close - 15.0)).collect();
        let volumes: Vec<Value> = bars.iter().map(|_| json!(25000i64)).collect();

        json!({
            "chart": {
                "result": [{
                    "meta": {"regularMarketPrice": bars.last().map(|(_, close)| *close)},
                    "timestamp": timestamps,
                    "indicators": {
                        "quote": [{
                            "open": opens,
                            "high": highs,
                            "low": lows,
                            "close": closes,
                            "volume": volumes
                        }]
                    }
                }],
                "error": null
            }
        })
    }

    /// quoteSummary payload with one statement object per period, each
    /// carrying the given (item, value) pairs.
    pub fn quote_summary(
        module: &str,
        list_key: &str,
        statements: &[(&str, &[(&str, f64)])],
    ) -> Value {
        let objects: Vec<Value> = statements
            .iter()
            .map(|(end_date, items)| {
                let mut object = serde_json::Map::new();
                object.insert("maxAge".to_string(), json!(1));
                object.insert("endDate".to_string(), json!({"fmt": end_date}));
                for (item, value) in *items {
                    object.insert(
                        item.to_string(),
                        json!({"raw": value, "fmt": value.to_string()}),
                    );
                }
                Value::Object(object)
            })
            .collect();

        json!({
            "quoteSummary": {
                "result": [{
                    module: {list_key: objects}
                }],
                "error": null
            }
        })
    }
}
