//! Company directory store behavior

use kabunav::models::MarketSegment;

use crate::common::{self, company};

#[tokio::test]
async fn test_replace_companies_swaps_the_directory() {
    let (_dir, db) = common::test_db().await;

    db.replace_companies(&common::sample_companies()).await.unwrap();
    assert_eq!(db.get_companies().await.unwrap().len(), 4);

    // A new listing file replaces the directory wholesale
    let replaced = db
        .replace_companies(&[company("1332", "ニッスイ", MarketSegment::Prime)])
        .await
        .unwrap();
    assert_eq!(replaced, 1);

    let companies = db.get_companies().await.unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].code, "1332");
    assert_eq!(companies[0].sector17_name.as_deref(), Some("食品"));
}

#[tokio::test]
async fn test_companies_come_back_sorted_with_parsed_segments() {
    let (_dir, db) = common::test_db().await;

    let mut scrambled = common::sample_companies();
    scrambled.reverse();
    db.replace_companies(&scrambled).await.unwrap();

    let companies = db.get_companies().await.unwrap();
    let codes: Vec<&str> = companies.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["1301", "4385", "7203", "9416"]);
    assert_eq!(companies[1].market_segment, MarketSegment::Growth);
    assert_eq!(companies[2].market_segment, MarketSegment::Prime);
}

#[tokio::test]
async fn test_metadata_round_trip() {
    let (_dir, db) = common::test_db().await;

    assert_eq!(db.get_metadata("directory_last_updated").await.unwrap(), None);

    db.set_metadata("directory_last_updated", "2024-03-10")
        .await
        .unwrap();
    assert_eq!(
        db.get_metadata("directory_last_updated").await.unwrap().as_deref(),
        Some("2024-03-10")
    );

    db.set_metadata("directory_last_updated", "2024-03-11")
        .await
        .unwrap();
    assert_eq!(
        db.get_metadata("directory_last_updated").await.unwrap().as_deref(),
        Some("2024-03-11")
    );
}
