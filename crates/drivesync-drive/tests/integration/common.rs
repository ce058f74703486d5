//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup for the Drive v3 endpoints.
//! Each helper mounts the necessary mock endpoints; [`setup_drive_mock`]
//! returns a configured DriveClient pointing at the mock server.

use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use drivesync_drive::client::DriveClient;

/// Access token the mocks expect
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a (MockServer, DriveClient) tuple.
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_url(ACCESS_TOKEN, server.uri());
    (server, client)
}

/// Builds a `files.list` response body
pub fn file_list(files: &[(&str, &str)], next_page_token: Option<&str>) -> serde_json::Value {
    let files: Vec<_> = files
        .iter()
        .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
        .collect();
    match next_page_token {
        Some(token) => serde_json::json!({ "files": files, "nextPageToken": token }),
        None => serde_json::json!({ "files": files }),
    }
}

/// Mounts one page of a `files.list` search for `name`.
///
/// `page_token` selects which request the page answers: `None` for the
/// first request, `Some(token)` for the request carrying that token.
pub async fn mount_list_page(
    server: &MockServer,
    name: &str,
    page_token: Option<&str>,
    body: serde_json::Value,
) {
    let mock = Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(query_param("q", format!("name = '{name}'").as_str()))
        .and(query_param("fields", "nextPageToken, files(id, name)"));

    let mock = match page_token {
        Some(token) => mock.and(query_param("pageToken", token)),
        None => mock.and(query_param_is_missing("pageToken")),
    };

    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serves `content` honoring `Range: bytes=a-b` the way Drive media
/// downloads do.
pub struct RangedContent {
    content: Vec<u8>,
}

impl RangedContent {
    pub fn new(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
        }
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

impl Respond for RangedContent {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let len = self.content.len() as u64;
        let range = request
            .headers
            .get("range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_range);

        match range {
            None => ResponseTemplate::new(200).set_body_bytes(self.content.clone()),
            Some((start, _)) if start >= len => ResponseTemplate::new(416)
                .insert_header("Content-Range", format!("bytes */{len}").as_str()),
            Some((start, end)) => {
                let end = end.min(len - 1);
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {start}-{end}/{len}").as_str(),
                    )
                    .set_body_bytes(self.content[start as usize..=end as usize].to_vec())
            }
        }
    }
}

/// Mounts a ranged `alt=media` download for a file ID.
pub async fn mount_media(server: &MockServer, file_id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{file_id}").as_str()))
        .and(query_param("alt", "media"))
        .respond_with(RangedContent::new(content))
        .mount(server)
        .await;
}

/// Mounts a document export; like Drive, it ignores the Range header.
pub async fn mount_export(server: &MockServer, file_id: &str, mime: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{file_id}/export").as_str()))
        .and(query_param("mimeType", mime))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", mime),
        )
        .mount(server)
        .await;
}
