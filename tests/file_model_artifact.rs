//! Model artifact download and caching
//!
//! A wiremock server plays the model hub; artifacts land in a `tempfile`
//! cache directory.

use concierge::backend::ModelArtifact;
use concierge::config::FileModelConfig;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "acme/concierge-GGUF";
const FILE: &str = "concierge-q4.gguf";

fn file_config(server: &MockServer, cache: &TempDir) -> FileModelConfig {
    FileModelConfig {
        enabled: true,
        repo_id: REPO.to_string(),
        filename: FILE.to_string(),
        hub_url: server.uri(),
        cache_dir: cache.path().to_path_buf(),
        ..FileModelConfig::default()
    }
}

fn artifact_route() -> String {
    format!("/{}/resolve/main/{}", REPO, FILE)
}

#[tokio::test]
async fn test_download_writes_artifact_once() {
    let server = MockServer::start().await;
    let cache = TempDir::new().expect("Failed to create temp directory");
    Mock::given(method("GET"))
        .and(path(artifact_route()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"GGUF-model-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = ModelArtifact::from_config(&file_config(&server, &cache)).unwrap();
    assert!(!artifact.is_cached());

    let stored = artifact.fetch().await.expect("download should succeed");
    assert_eq!(fs::read(&stored).unwrap(), b"GGUF-model-bytes");
    assert!(stored.starts_with(cache.path()));
    assert!(artifact.is_cached());

    // Second fetch is served from the cache; the mock expects one hit
    let again = artifact.fetch().await.unwrap();
    assert_eq!(again, stored);
}

#[tokio::test]
async fn test_large_artifact_streams_to_disk_intact() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    let body: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path(artifact_route()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let artifact = ModelArtifact::from_config(&file_config(&server, &cache)).unwrap();
    let stored = artifact.fetch().await.expect("download should succeed");
    assert_eq!(fs::read(&stored).unwrap(), body);
}

#[tokio::test]
async fn test_stalled_hub_fails_after_stall_timeout() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"GGUF".to_vec())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let config = FileModelConfig {
        stall_timeout_seconds: 1,
        ..file_config(&server, &cache)
    };
    let artifact = ModelArtifact::from_config(&config).unwrap();

    let started = Instant::now();
    assert!(artifact.fetch().await.is_err());
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "download hung for {:?}",
        started.elapsed()
    );
    assert!(!artifact.is_cached());
}

#[tokio::test]
async fn test_missing_artifact_leaves_no_partial_file() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let artifact = ModelArtifact::from_config(&file_config(&server, &cache)).unwrap();
    assert!(artifact.fetch().await.is_err());
    assert!(!artifact.is_cached());

    let dir = artifact.path().parent().unwrap();
    let leftovers: Vec<_> = fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}

#[tokio::test]
async fn test_empty_artifact_is_rejected() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let artifact = ModelArtifact::from_config(&file_config(&server, &cache)).unwrap();
    assert!(artifact.fetch().await.is_err());
    assert!(!artifact.is_cached());
}

#[tokio::test]
async fn test_initialize_fails_when_hub_unreachable() {
    use concierge::backend::FileModelBackend;
    use concierge::property::PropertyProfile;
    use std::sync::Arc;

    let cache = TempDir::new().unwrap();
    let config = FileModelConfig {
        enabled: true,
        repo_id: REPO.to_string(),
        filename: FILE.to_string(),
        hub_url: "http://127.0.0.1:9".to_string(),
        cache_dir: cache.path().to_path_buf(),
        ..FileModelConfig::default()
    };

    let result = FileModelBackend::initialize(
        &config,
        Arc::new(PropertyProfile::default()),
        Duration::from_secs(5),
    )
    .await;
    assert!(result.is_err());
}
