//! Integration tests for content retrieval against a mock server.

use core::time::Duration;
use repo_hound_lib::scan::hosting::{ClientSettings, create_provider};
use repo_hound_lib::scan::{
    Candidate, ContentFetcher, FetchSettings, Platform, ReleaseAsset, RepoIdentity, RepositoryDescriptor, RequestTracker, TrackedTopic,
    TreeEntry,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(tracker: &RequestTracker, max_asset_size: u64) -> ContentFetcher {
    ContentFetcher::new(
        FetchSettings {
            file_timeout: Duration::from_secs(5),
            asset_timeout: Duration::from_secs(5),
            max_file_size: 1024,
            max_asset_size,
            fetch_pause: Duration::ZERO,
        },
        tracker.clone(),
    )
    .unwrap()
}

fn repo() -> RepositoryDescriptor {
    RepositoryDescriptor::new(
        RepoIdentity::new(Platform::GitHub, "11"),
        "https://github.com/alice/jiggle",
        "alice",
        "jiggle",
    )
}

fn url(server: &MockServer, tail: &str) -> Url {
    Url::parse(&format!("{}{tail}", server.uri())).unwrap()
}

#[tokio::test]
async fn test_download_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jiggle.exe"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MZ\x90\x00".to_vec()))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let bytes = fetcher(&tracker, 1024)
        .download(&url(&server, "/jiggle.exe"), Duration::from_secs(5), 1024)
        .await;

    assert_eq!(bytes.as_deref(), Some(&b"MZ\x90\x00"[..]));
    assert_eq!(tracker.count(TrackedTopic::Download).issued, 1);
    assert_eq!(tracker.count(TrackedTopic::Download).failed, 0);
}

#[tokio::test]
async fn test_download_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let bytes = fetcher(&tracker, 1024)
        .download(&url(&server, "/missing.exe"), Duration::from_secs(5), 1024)
        .await;

    assert!(bytes.is_none());
    assert_eq!(tracker.count(TrackedTopic::Download).failed, 1);
}

#[tokio::test]
async fn test_download_over_ceiling_is_abandoned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4096]))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let bytes = fetcher(&tracker, 1024)
        .download(&url(&server, "/big.zip"), Duration::from_secs(5), 1024)
        .await;

    assert!(bytes.is_none());
}

#[tokio::test]
async fn test_fetch_asset_uses_asset_ceiling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tool.exe"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7_u8; 2000]))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let provider = create_provider(
        Platform::GitHub,
        None,
        Some(&server.uri()),
        &ClientSettings::new(Duration::from_secs(5), tracker.clone()),
    )
    .unwrap();

    let candidate = Candidate::Asset(ReleaseAsset {
        name: "tool.exe".into(),
        size_bytes: 2000,
        download_url: url(&server, "/v1/tool.exe"),
    });

    let fetched = fetcher(&tracker, 4096)
        .fetch(provider.as_ref(), &repo(), &candidate)
        .await
        .unwrap();
    assert_eq!(fetched.source_label, "alice/jiggle/releases/tool.exe");
    assert_eq!(fetched.bytes.len(), 2000);

    assert!(fetcher(&tracker, 1000).fetch(provider.as_ref(), &repo(), &candidate).await.is_none());
}

#[tokio::test]
async fn test_fetch_file_falls_back_to_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/jiggle/contents/jiggle.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "none",
            "content": "",
            "download_url": format!("{}/raw/jiggle.py", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw/jiggle.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("import pyautogui\n"))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let provider = create_provider(
        Platform::GitHub,
        None,
        Some(&server.uri()),
        &ClientSettings::new(Duration::from_secs(5), tracker.clone()),
    )
    .unwrap();

    let candidate = Candidate::File(TreeEntry::file("jiggle.py", 17));
    let fetched = fetcher(&tracker, 1024)
        .fetch(provider.as_ref(), &repo(), &candidate)
        .await
        .unwrap();

    assert_eq!(fetched.source_label, "alice/jiggle/jiggle.py");
    assert_eq!(fetched.bytes, b"import pyautogui\n");
    assert_eq!(tracker.count(TrackedTopic::File).issued, 1);
    assert_eq!(tracker.count(TrackedTopic::Download).issued, 1);
}

#[tokio::test]
async fn test_fetch_empty_file_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/jiggle/contents/empty.bat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "base64",
            "content": "",
            "download_url": format!("{}/raw/empty.bat", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw/empty.bat"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tracker = RequestTracker::new();
    let provider = create_provider(
        Platform::GitHub,
        None,
        Some(&server.uri()),
        &ClientSettings::new(Duration::from_secs(5), tracker.clone()),
    )
    .unwrap();

    let candidate = Candidate::File(TreeEntry::file("empty.bat", 0));
    let fetched = fetcher(&tracker, 1024).fetch(provider.as_ref(), &repo(), &candidate).await;

    assert!(fetched.is_none());
    assert_eq!(tracker.count(TrackedTopic::File).issued, 1);
}
