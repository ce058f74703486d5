//! End-to-end manifest reconciliation against a mock Drive
//!
//! Loads a manifest from disk, resolves and downloads every entry through
//! the real GoogleDriveProvider, and checks what lands in the output
//! directory.

use std::sync::Arc;

use drivesync_core::domain::Manifest;
use drivesync_core::usecases::{
    FetchContentUseCase, ReconcileManifestUseCase, ReconcileSummary, ResolveRemoteIdUseCase,
};
use drivesync_drive::client::DriveClient;
use drivesync_drive::provider::GoogleDriveProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn reconciler(client: DriveClient, output: &std::path::Path) -> ReconcileManifestUseCase {
    let provider = Arc::new(GoogleDriveProvider::new(client).with_chunk_size(8));
    ReconcileManifestUseCase::new(
        ResolveRemoteIdUseCase::new(provider.clone()),
        FetchContentUseCase::new(provider, output),
    )
}

#[tokio::test]
async fn test_manifest_run_exports_and_skips_unresolved() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_export(&server, "abc123", "application/pdf", b"%PDF-1.7 report").await;
    common::mount_list_page(&server, "photo.jpg", None, common::file_list(&[], None)).await;

    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("documents.json");
    std::fs::write(
        &manifest_path,
        r#"{
            "report.pdf": {"id": "abc123", "type": "gapps"},
            "photo.jpg": {}
        }"#,
    )
    .unwrap();
    let output = dir.path().join("drive");

    let manifest = Manifest::load_or_create(&manifest_path).unwrap();
    let summary = reconciler(client, &output).run(&manifest).await.unwrap();

    assert_eq!(summary, ReconcileSummary { fetched: 1, skipped: 1 });
    assert_eq!(
        std::fs::read(output.join("report.pdf.pdf")).unwrap(),
        b"%PDF-1.7 report"
    );
    assert!(!output.join("photo.jpg").exists());
    assert!(!output.join("report.pdf").exists());
}

#[tokio::test]
async fn test_manifest_run_resolves_name_and_downloads_raw() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_list_page(
        &server,
        "photo.jpg",
        None,
        common::file_list(&[("photo-id-1", "photo.jpg")], None),
    )
    .await;
    common::mount_media(&server, "photo-id-1", b"\xFF\xD8\xFF\xE0 jpeg bytes").await;

    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::parse(r#"{"photo.jpg": {}}"#).unwrap();

    let summary = reconciler(client, dir.path()).run(&manifest).await.unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(
        std::fs::read(dir.path().join("photo.jpg")).unwrap(),
        b"\xFF\xD8\xFF\xE0 jpeg bytes"
    );
}

#[tokio::test]
async fn test_manifest_run_with_wrong_type_never_downloads() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/x1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::parse(r#"{"a.bin": {"id": "x1", "type": "folder"}}"#).unwrap();

    let summary = reconciler(client, dir.path()).run(&manifest).await.unwrap();

    assert_eq!(summary, ReconcileSummary { fetched: 0, skipped: 1 });
}

#[tokio::test]
async fn test_empty_manifest_is_created_and_makes_no_requests() {
    let (server, client) = common::setup_drive_mock().await;

    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("documents.json");
    let manifest = Manifest::load_or_create(&manifest_path).unwrap();

    let summary = reconciler(client, &dir.path().join("drive"))
        .run(&manifest)
        .await
        .unwrap();

    assert_eq!(summary, ReconcileSummary::default());
    assert_eq!(std::fs::read_to_string(manifest_path).unwrap().trim(), "{}");
    assert!(server.received_requests().await.unwrap().is_empty());
}
