//! Integration tests for the full fetch-retry-aggregate pipeline
//!
//! Mixes local file sources (tempfile) with HTTP sources (wiremock) to exercise
//! scheme dispatch, retry cycling and the final summary together.

use roster_common::Locator;
use roster_ingest::config::IngestConfig;
use roster_ingest::fetch::SchemeFetcher;
use roster_ingest::pipeline::{self, run_sources};
use roster_ingest::Termination;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const ROSTER_A: &str = "fname, lname, age\nAda,Lovelace,36\nAlan,Turing,41\nbad,row,x\n";
const ROSTER_B: &str = "fname, lname, age\nGrace,Hopper,85\nKatherine,Johnson,41\n";

fn write_source(dir: &Path, name: &str, body: &str) -> Locator {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    Locator::from_file_path(&path).unwrap()
}

fn fetcher() -> Arc<SchemeFetcher> {
    Arc::new(SchemeFetcher::with_timeout(Duration::from_secs(5)).unwrap())
}

fn config(pool_size: usize, max_cycles: Option<u32>) -> IngestConfig {
    IngestConfig {
        pool_size,
        max_cycles,
        ..IngestConfig::default()
    }
}

#[tokio::test]
async fn test_files_and_http_sources_merge() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROSTER_B))
        .mount(&server)
        .await;

    let sources = vec![
        write_source(dir.path(), "a.csv", ROSTER_A),
        Locator::parse(&format!("{}/b.csv", server.uri())).unwrap(),
    ];

    let report = run_sources(&sources, fetcher(), &config(2, None), CancellationToken::new()).await;

    assert_eq!(report.termination, Termination::Drained);
    assert_eq!(report.cycles, 1);
    assert_eq!(report.succeeded().count(), 2);

    let skipped: usize = report.sources.iter().map(|o| o.skipped()).sum();
    assert_eq!(skipped, 1);

    // ages 36, 41, 85, 41 -> sorted 36 41 41 85, mean 50, median index 2 -> 41
    assert_eq!(report.summary.count, 4);
    assert_eq!(report.summary.mean, Some(50));
    let median = report.summary.median.as_ref().unwrap();
    assert_eq!(median.age, 41);
    assert_eq!(median.users.len(), 2);
}

#[tokio::test]
async fn test_server_errors_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky.csv"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROSTER_B))
        .expect(1)
        .mount(&server)
        .await;

    let sources = vec![Locator::parse(&format!("{}/flaky.csv", server.uri())).unwrap()];

    let report = run_sources(&sources, fetcher(), &config(3, None), CancellationToken::new()).await;

    assert_eq!(report.termination, Termination::Drained);
    assert_eq!(report.cycles, 3);
    assert_eq!(report.summary.count, 2);
    assert_eq!(report.sources.len(), 1);
    assert!(report.sources[0].is_success());
}

#[tokio::test]
async fn test_fatal_sources_excluded_from_summary() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.csv"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sources = vec![
        write_source(dir.path(), "good.csv", ROSTER_B),
        write_source(dir.path(), "bad.csv", "a,b,c\nx,y,1\n"),
        Locator::from_file_path(dir.path().join("missing.csv")).unwrap(),
        Locator::parse(&format!("{}/gone.csv", server.uri())).unwrap(),
    ];

    let report = run_sources(&sources, fetcher(), &config(2, None), CancellationToken::new()).await;

    assert_eq!(report.termination, Termination::Drained);
    assert_eq!(report.cycles, 1);
    assert_eq!(report.sources.len(), 4);
    assert_eq!(report.succeeded().count(), 1);
    assert!(report
        .sources
        .iter()
        .filter(|o| !o.is_success())
        .all(|o| !o.is_retryable()));
    assert_eq!(report.summary.count, 2);
}

#[tokio::test]
async fn test_permanent_server_error_bounded_by_cycle_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let sources = vec![Locator::parse(&format!("{}/down.csv", server.uri())).unwrap()];

    let report = run_sources(&sources, fetcher(), &config(1, Some(4)), CancellationToken::new()).await;

    assert_eq!(report.termination, Termination::CycleLimit);
    assert_eq!(report.cycles, 4);
    assert_eq!(report.summary.count, 0);
    assert_eq!(report.summary.mean, None);
    assert!(report.sources[0].is_retryable());
}

#[tokio::test]
async fn test_run_reads_index() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    write_source(&data, "a.csv", ROSTER_A);
    write_source(&data, "b.csv", ROSTER_B);

    let index = dir.path().join("index.txt");
    std::fs::write(&index, "a.csv\n\nb.csv\n").unwrap();

    let config = IngestConfig {
        index_file: index,
        data_root: data,
        ..IngestConfig::default()
    };

    let report = pipeline::run(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(report.summary.count, 4);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["count"], 4);
    assert_eq!(json["termination"], "drained");
    assert_eq!(json["sources"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_fails_without_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestConfig {
        index_file: dir.path().join("absent.txt"),
        data_root: dir.path().to_path_buf(),
        ..IngestConfig::default()
    };

    assert!(pipeline::run(&config, CancellationToken::new()).await.is_err());
}
