//! Popular-list sampling against a mock API server.

mod common;

use std::collections::HashSet;

use comment_crawler::models::ThreadKind;
use comment_crawler::pipeline::run_sample;
use comment_crawler::storage::load_descriptors;
use common::{envelope, test_config};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POPULAR: &str = "/x/web-interface/popular";

fn video(aid: u64) -> Value {
    json!({
        "aid": aid,
        "bvid": format!("BV1xx{aid}"),
        "title": format!("video {aid}"),
        "owner": { "name": "uploader" }
    })
}

async fn mount_popular(server: &MockServer, page: u32, list: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(POPULAR))
        .and(query_param("pn", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "list": list }))))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sample_draws_distinct_pool_members() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_popular(&server, 1, (1..=20).map(video).collect()).await;
    mount_popular(&server, 2, (21..=40).map(video).collect()).await;

    let config = test_config(&server);
    let report = run_sample(&config, tmp.path(), 5, 2, None).await.unwrap();

    assert_eq!(report.candidates, 40);
    assert_eq!(report.chosen.len(), 5);
    assert!(report.destination.ends_with("random_5.csv"));

    let targets = load_descriptors(&tmp.path().join("targets")).await.unwrap();
    assert_eq!(targets.len(), 5);
    let ids: HashSet<u64> = targets
        .iter()
        .map(|t| t.object_id.parse().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| (1..=40).contains(id)));
    assert!(targets.iter().all(|t| t.kind == ThreadKind::Primary));
}

#[tokio::test]
async fn test_sample_is_reproducible_with_seed() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(POPULAR))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "list": (1..=20).map(video).collect::<Vec<_>>() }))),
        )
        .mount(&server)
        .await;

    let config = test_config(&server);
    let first = run_sample(&config, tmp.path(), 4, 1, None).await.unwrap();
    let second = run_sample(&config, tmp.path(), 4, 1, None).await.unwrap();

    assert_eq!(first.chosen, second.chosen);
}

#[tokio::test]
async fn test_small_pool_is_taken_whole() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let mut incomplete = video(4);
    incomplete["title"] = json!("");
    mount_popular(&server, 1, vec![video(1), video(2), video(2), incomplete]).await;
    Mock::given(method("GET"))
        .and(path(POPULAR))
        .and(query_param("pn", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -352, "message": "risk control", "data": null
        })))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let report = run_sample(&config, tmp.path(), 10, 2, None).await.unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.chosen.len(), 2);
    assert!(report.destination.ends_with("random_2.csv"));
}

#[tokio::test]
async fn test_empty_pool_is_an_error() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_popular(&server, 1, vec![]).await;

    let config = test_config(&server);
    assert!(run_sample(&config, tmp.path(), 3, 1, None).await.is_err());
    assert!(!tmp.path().join("targets").exists());
}
