//! Batch coordination, completion ledger and target discovery against a
//! mock API server.

mod common;

use std::path::Path;

use comment_crawler::models::{Target, ThreadKind};
use comment_crawler::pipeline::{run_batch, run_discovery};
use comment_crawler::storage::{CompletionLedger, CsvSink, load_descriptors};
use common::{comment, envelope, root_page, test_config};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAIN: &str = "/x/v2/reply/main";
const FEED: &str = "/x/polymer/web-dynamic/v1/feed/space";

async fn write_descriptors(data_dir: &Path, rows: &str) {
    let dir = data_dir.join("targets");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("list.csv"), format!("commentId,threadKindCode\n{rows}"))
        .await
        .unwrap();
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn test_completed_targets_make_no_requests() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    write_descriptors(tmp.path(), "1,11\n2,17\n").await;
    tokio::fs::write(
        tmp.path().join("completed.log"),
        "1\t11\timage\t2024-01-01T00:00:00+00:00\n",
    )
    .await
    .unwrap();

    Mock::given(method("GET"))
        .and(path(MAIN))
        .and(query_param("oid", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_page(vec![comment(9, 0)])))
        .expect(0)
        .mount(&server)
        .await;
    // Pinned fetch plus one empty page, on the first run only.
    Mock::given(method("GET"))
        .and(path(MAIN))
        .and(query_param("oid", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_page(vec![])))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server);

    let first = run_batch(&config, tmp.path()).await.unwrap();
    assert_eq!(first.total, 2);
    assert_eq!(first.skipped, 1);
    assert_eq!(first.succeeded, 1);
    assert!(first.all_succeeded());

    let second = run_batch(&config, tmp.path()).await.unwrap();
    assert_eq!(second.skipped, 2);
    assert_eq!(second.succeeded, 0);
    assert!(second.all_succeeded());

    let ledger = CompletionLedger::open(tmp.path().join("completed.log"))
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.contains(&Target::new("2", ThreadKind::TextFeed)));
}

#[tokio::test]
async fn test_failed_target_does_not_stop_batch() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    write_descriptors(tmp.path(), "3,17\n4,17\n").await;

    Mock::given(method("GET"))
        .and(path(MAIN))
        .and(query_param("oid", "3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MAIN))
        .and(query_param("oid", "4"))
        .and(query_param("next", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_page(vec![comment(40, 0)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MAIN))
        .and(query_param("oid", "4"))
        .and(query_param("next", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_page(vec![])))
        .mount(&server)
        .await;

    let report = run_batch(&test_config(&server), tmp.path()).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, vec![Target::new("3", ThreadKind::TextFeed)]);
    assert!(!report.all_succeeded());

    let ledger = CompletionLedger::open(tmp.path().join("completed.log"))
        .await
        .unwrap();
    assert!(ledger.contains(&Target::new("4", ThreadKind::TextFeed)));
    assert!(!ledger.contains(&Target::new("3", ThreadKind::TextFeed)));

    let rows = CsvSink::new(tmp.path())
        .read_rows(Path::new("comments/dynamic_4.csv"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_invalid_config_makes_no_requests() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    write_descriptors(tmp.path(), "1,1\n").await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.auth.cookie = "<your cookie>".to_string();

    let err = run_batch(&config, tmp.path()).await.unwrap_err();
    assert!(err.to_string().contains("auth.cookie"));
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_feed_walk_writes_descriptors() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(FEED))
        .and(query_param("host_mid", "42"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "offset": "abc",
            "has_more": true,
            "items": [
                { "basic": { "comment_id_str": "100", "comment_type": 11 } },
                { "basic": { "comment_id_str": "", "comment_type": 0 } }
            ]
        }))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FEED))
        .and(query_param("offset", "abc"))
        .and(query_param("next", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "offset": "",
            "has_more": false,
            "items": [
                { "basic": { "comment_id_str": 200, "comment_type": 17 } }
            ]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_discovery(&test_config(&server), tmp.path(), "42")
        .await
        .unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.written, 2);
    assert_eq!(report.skipped, 1);

    let targets = load_descriptors(&tmp.path().join("targets")).await.unwrap();
    assert_eq!(
        targets,
        vec![
            Target::new("100", ThreadKind::ImageFeed),
            Target::new("200", ThreadKind::TextFeed),
        ]
    );
}

#[tokio::test]
async fn test_feed_walk_fails_on_first_page() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(FEED))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": -352, "message": "risk control", "data": null })),
        )
        .mount(&server)
        .await;

    let result = run_discovery(&test_config(&server), tmp.path(), "42").await;
    assert!(result.is_err());
}
