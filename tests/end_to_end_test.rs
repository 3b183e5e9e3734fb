//! End-to-end tests for tagstat
//!
//! These tests run the whole pipeline against a mock Stack Exchange server:
//! command-line parsing, paginated HTTP fetching, aggregation and the CSV
//! file on disk.

use chrono::{TimeZone, Utc};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tagstat::{
    aggregation::{Aggregator, TagOutcome},
    cli::Cli,
    output::{RunSummary, get_formatter, write_counts},
};
use tagstat_client::StackExchangeClient;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn questions(created: &[i64]) -> serde_json::Value {
    json!(
        created
            .iter()
            .enumerate()
            .map(|(i, ts)| json!({"question_id": i, "creation_date": ts, "title": "q"}))
            .collect::<Vec<_>>()
    )
}

fn noon(month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0)
        .unwrap()
        .timestamp()
}

#[tokio::test]
async fn test_full_run_against_mock_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.3/questions"))
        .and(query_param("tagged", "python"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": questions(&[noon(3, 1), noon(3, 1), noon(3, 4)]),
            "has_more": true,
            "quota_remaining": 120
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2.3/questions"))
        .and(query_param("tagged", "python"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2.3/questions"))
        .and(query_param("tagged", "java"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": questions(&[noon(3, 2), noon(3, 5)]),
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("data").join("counts.csv");
    let api_url = format!("{}/2.3/questions", server.uri());

    let cli = Cli::parse_from([
        "tagstat",
        "--tags",
        "python",
        "java",
        "--grain",
        "week",
        "--api-url",
        api_url.as_str(),
        "--out",
        out.to_str().unwrap(),
    ]);
    let now = Utc.with_ymd_and_hms(2024, 8, 20, 9, 0, 0).unwrap();
    let config = cli.into_config(now).unwrap();

    let client = Arc::new(StackExchangeClient::new(&config.api_url, config.timeout).unwrap());
    let aggregator = Aggregator::new(client, config.window, config.fetch.clone())
        .with_granularity(config.granularity);
    let collection = aggregator.collect(&config.tags, |_| {}).await.unwrap();

    let python = &collection.reports[0];
    assert_eq!(python.fetched, 3);
    assert!(matches!(&python.outcome, TagOutcome::Failed { error } if error.starts_with("HTTP 500")));
    assert_eq!(collection.reports[1].outcome, TagOutcome::Exhausted);

    let rows = write_counts(&config.output, &collection.table).unwrap();
    // 2024-03-01 and 2024-03-02 fall in the week of Monday 2024-02-26
    assert_eq!(rows, 4);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "date,tag,questions_count\n\
         2024-02-26,java,1\n\
         2024-02-26,python,2\n\
         2024-03-04,java,1\n\
         2024-03-04,python,1\n"
    );

    let summary = RunSummary {
        window: &config.window,
        granularity: config.granularity,
        reports: &collection.reports,
        output: &config.output,
        rows,
    };
    let value: serde_json::Value =
        serde_json::from_str(&get_formatter(true, false).format_run(&summary)).unwrap();
    assert_eq!(value["window"]["first_day"], "2024-02-20");
    assert_eq!(value["window"]["last_day"], "2024-06-20");
    assert_eq!(value["tags"][0]["status"], "failed");
    assert_eq!(value["total_questions"], 5);
}

#[tokio::test]
async fn test_window_is_sent_as_epoch_bounds() {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2024, 7, 31, 18, 0, 0).unwrap();

    // 2024-02-29T00:00:00Z .. 2024-07-01T00:00:00Z
    Mock::given(method("GET"))
        .and(query_param("fromdate", "1709164800"))
        .and(query_param("todate", "1719792000"))
        .and(query_param("site", "serverfault"))
        .and(query_param("pagesize", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/2.3/questions", server.uri());
    let cli = Cli::parse_from([
        "tagstat",
        "-t",
        "nginx",
        "--months-from",
        "5",
        "--months-to",
        "1",
        "--site",
        "serverfault",
        "--page-size",
        "30",
        "--api-url",
        api_url.as_str(),
    ]);
    let config = cli.into_config(now).unwrap();

    let client = Arc::new(StackExchangeClient::new(&config.api_url, config.timeout).unwrap());
    let aggregator = Aggregator::new(client, config.window, config.fetch.clone());
    let collection = aggregator.collect(&config.tags, |_| {}).await.unwrap();

    assert_eq!(collection.reports[0].fetched, 0);
    assert_eq!(collection.reports[0].outcome, TagOutcome::Exhausted);
}
