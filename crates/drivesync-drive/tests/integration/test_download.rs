//! Integration tests for ranged chunked downloads
//!
//! Verifies the RangeDownload cursor and the fetch use case against a
//! wiremock-based Drive mock:
//! - Multi-chunk media downloads reassembled in order
//! - Empty files (416 Range Not Satisfiable)
//! - Exports served without range support
//! - Failures mid-stream leaving the partial file
//! - Responses that do not continue at the requested offset

use std::sync::Arc;

use drivesync_core::domain::{LocalName, MimeType, RemoteId};
use drivesync_core::ports::IMediaDownload;
use drivesync_core::usecases::FetchContentUseCase;
use drivesync_drive::download::RangeDownload;
use drivesync_drive::provider::GoogleDriveProvider;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn id(value: &str) -> RemoteId {
    RemoteId::new(value.to_string()).unwrap()
}

fn name(value: &str) -> LocalName {
    LocalName::new(value).unwrap()
}

#[tokio::test]
async fn test_range_download_reports_progress_and_total() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_media(&server, "media-001", b"0123456789").await;

    let mut download = RangeDownload::raw(client, &id("media-001"), 4);

    let first = download.next_chunk().await.unwrap();
    assert_eq!(first.data, b"0123");
    assert_eq!(first.progress, 4);
    assert_eq!(first.total, Some(10));
    assert!(!first.done);

    let second = download.next_chunk().await.unwrap();
    assert_eq!(second.data, b"4567");
    assert!(!second.done);

    let third = download.next_chunk().await.unwrap();
    assert_eq!(third.data, b"89");
    assert_eq!(third.progress, 10);
    assert!(third.done);

    // Further calls do not hit the server
    let after = download.next_chunk().await.unwrap();
    assert!(after.data.is_empty());
    assert!(after.done);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_range_download_sends_range_header() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/ranged"))
        .and(header("range", "bytes=0-99"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-2/3")
                .set_body_bytes(b"abc".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut download = RangeDownload::raw(client, &id("ranged"), 100);
    let chunk = download.next_chunk().await.unwrap();

    assert_eq!(chunk.data, b"abc");
    assert!(chunk.done);
}

#[tokio::test]
async fn test_fetch_raw_multi_chunk_file() {
    let (server, client) = common::setup_drive_mock().await;
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    common::mount_media(&server, "large-001", &content).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(GoogleDriveProvider::new(client).with_chunk_size(4096));
    let fetcher = FetchContentUseCase::new(provider, dir.path().join("drive"));

    let written = fetcher
        .fetch_raw(&id("large-001"), &name("large.bin"))
        .await
        .expect("download failed");

    assert_eq!(written, dir.path().join("drive").join("large.bin"));
    assert_eq!(std::fs::read(&written).unwrap(), content);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_raw_empty_file() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_media(&server, "empty-001", &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = FetchContentUseCase::new(
        Arc::new(GoogleDriveProvider::new(client)),
        dir.path(),
    );

    let written = fetcher
        .fetch_raw(&id("empty-001"), &name("empty.txt"))
        .await
        .expect("empty download failed");

    assert_eq!(std::fs::metadata(written).unwrap().len(), 0);
}

#[tokio::test]
async fn test_fetch_exported_ignoring_range() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_export(&server, "sheet-001", "text/csv", b"a,b\n1,2\n").await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = FetchContentUseCase::new(
        Arc::new(GoogleDriveProvider::new(client).with_chunk_size(2)),
        dir.path(),
    );
    let mime = MimeType::new("text/csv".to_string()).unwrap();

    let written = fetcher
        .fetch_exported(&id("sheet-001"), &name("budget"), &mime)
        .await
        .expect("export failed");

    assert_eq!(written, dir.path().join("budget.csv"));
    assert_eq!(std::fs::read_to_string(written).unwrap(), "a,b\n1,2\n");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failure_mid_stream_keeps_partial_file() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/flaky-001"))
        .and(query_param("alt", "media"))
        .respond_with(common::RangedContent::new(b"first-chunk-then-boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/flaky-001"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = FetchContentUseCase::new(
        Arc::new(GoogleDriveProvider::new(client).with_chunk_size(5)),
        dir.path(),
    );

    let err = fetcher
        .fetch_raw(&id("flaky-001"), &name("flaky.bin"))
        .await
        .expect_err("second chunk should fail");

    assert!(format!("{err:#}").contains("Server error"));
    assert_eq!(
        std::fs::read(dir.path().join("flaky.bin")).unwrap(),
        b"first"
    );
}

#[tokio::test]
async fn test_download_not_found() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/gone-001"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": 404, "message": "File not found: gone-001." }
        })))
        .mount(&server)
        .await;

    let mut download = RangeDownload::raw(client, &id("gone-001"), 1024);
    let err = download.next_chunk().await.unwrap_err();

    assert!(format!("{err:#}").contains("Not found: File not found: gone-001."));
}

#[tokio::test]
async fn test_whole_body_after_partial_chunk_is_rejected() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/resent-001"))
        .and(header("range", "bytes=0-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-3/*")
                .set_body_bytes(b"0123".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/resent-001"))
        .and(header("range", "bytes=4-7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"0123456789".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = FetchContentUseCase::new(
        Arc::new(GoogleDriveProvider::new(client).with_chunk_size(4)),
        dir.path(),
    );

    let err = fetcher
        .fetch_raw(&id("resent-001"), &name("resent.bin"))
        .await
        .expect_err("a full body after the first chunk must not be appended");

    assert!(format!("{err:#}").contains("Invalid response"));
    assert_eq!(std::fs::read(dir.path().join("resent.bin")).unwrap(), b"0123");
}

#[tokio::test]
async fn test_partial_chunk_at_wrong_offset_is_rejected() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/shifted-001"))
        .and(header("range", "bytes=0-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-3/10")
                .set_body_bytes(b"0123".to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/shifted-001"))
        .and(header("range", "bytes=4-7"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-3/10")
                .set_body_bytes(b"0123".to_vec()),
        )
        .mount(&server)
        .await;

    let mut download = RangeDownload::raw(client, &id("shifted-001"), 4);
    let first = download.next_chunk().await.unwrap();
    assert_eq!(first.data, b"0123");

    let err = download.next_chunk().await.unwrap_err();
    assert!(format!("{err:#}").contains("Invalid response"));
}
