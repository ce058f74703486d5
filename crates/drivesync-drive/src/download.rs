//! Ranged chunked downloads
//!
//! Media is fetched with successive `Range: bytes=<start>-<end>` requests of
//! at most `chunk_size` bytes. Completion is decided from the response:
//!
//! - `206 Partial Content`: the total from `Content-Range` is compared with
//!   the bytes received so far; with an unknown total a short chunk ends it
//! - `200 OK`: the server ignored the range and sent the whole body, which
//!   is only accepted for the first request
//! - `416 Range Not Satisfiable`: nothing (more) to read, i.e. empty content
//!
//! A partial response must start exactly where the previous one ended.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Method, StatusCode};
use tracing::debug;

use drivesync_core::domain::{MimeType, RemoteId};
use drivesync_core::ports::{IMediaDownload, MediaChunk};

use crate::client::{check_status, DriveClient};
use crate::DriveError;

// ============================================================================
// Content-Range parsing
// ============================================================================

/// Parsed `Content-Range` response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// Inclusive byte range of this response, absent for `bytes */<total>`
    pub range: Option<(u64, u64)>,
    /// Full size of the content, absent for `bytes <a>-<b>/*`
    pub total: Option<u64>,
}

/// Parses a `Content-Range` value such as `bytes 0-99/1234`
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let spec = value.trim().strip_prefix("bytes")?.trim_start();
    let (range, total) = spec.split_once('/')?;

    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse().ok()?),
    };

    let range = match range.trim() {
        "*" => None,
        r => {
            let (start, end) = r.split_once('-')?;
            let start: u64 = start.trim().parse().ok()?;
            let end: u64 = end.trim().parse().ok()?;
            if end < start {
                return None;
            }
            Some((start, end))
        }
    };

    if range.is_none() && total.is_none() {
        return None;
    }
    Some(ContentRange { range, total })
}

/// Checks that a successful response continues the download at `start`
///
/// Returns the parsed range of a `206`, or `None` for a whole body.
fn check_continuation(
    status: StatusCode,
    content_range: Option<&str>,
    start: u64,
) -> Result<Option<ContentRange>, DriveError> {
    if status != StatusCode::PARTIAL_CONTENT {
        if start > 0 {
            return Err(DriveError::InvalidResponse(format!(
                "{status} for a range starting at byte {start}"
            )));
        }
        return Ok(None);
    }

    let range = content_range.and_then(parse_content_range).ok_or_else(|| {
        DriveError::InvalidResponse(format!(
            "206 response with unusable Content-Range: {content_range:?}"
        ))
    })?;
    match range.range {
        Some((first, _)) if first == start => Ok(Some(range)),
        _ => Err(DriveError::InvalidResponse(format!(
            "206 response for byte {start} has Content-Range {content_range:?}"
        ))),
    }
}

// ============================================================================
// RangeDownload
// ============================================================================

/// Download cursor issuing one ranged GET per chunk
pub struct RangeDownload {
    client: DriveClient,
    path: String,
    query: Vec<(&'static str, String)>,
    chunk_size: u64,
    progress: u64,
    total: Option<u64>,
    done: bool,
}

impl RangeDownload {
    /// Creates a cursor over `GET <path>?<query>`
    pub fn new(
        client: DriveClient,
        path: impl Into<String>,
        query: Vec<(&'static str, String)>,
        chunk_size: u64,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            query,
            chunk_size: chunk_size.max(1),
            progress: 0,
            total: None,
            done: false,
        }
    }

    /// Download of the stored bytes (`files.get` with `alt=media`)
    pub fn raw(client: DriveClient, id: &RemoteId, chunk_size: u64) -> Self {
        Self::new(
            client,
            format!("/files/{id}"),
            vec![("alt", "media".to_string())],
            chunk_size,
        )
    }

    /// Download of a converted document (`files.export`)
    pub fn export(client: DriveClient, id: &RemoteId, mime: &MimeType, chunk_size: u64) -> Self {
        Self::new(
            client,
            format!("/files/{id}/export"),
            vec![("mimeType", mime.as_str().to_string())],
            chunk_size,
        )
    }

    fn chunk(&self, data: Vec<u8>) -> MediaChunk {
        MediaChunk {
            data,
            progress: self.progress,
            total: self.total,
            done: self.done,
        }
    }
}

#[async_trait]
impl IMediaDownload for RangeDownload {
    async fn next_chunk(&mut self) -> Result<MediaChunk> {
        if self.done {
            return Ok(self.chunk(Vec::new()));
        }

        let start = self.progress;
        let end = start + self.chunk_size - 1;
        debug!("GET {} bytes={start}-{end}", self.path);

        let response = self
            .client
            .request(Method::GET, &self.path)
            .query(&self.query)
            .header(RANGE, format!("bytes={start}-{end}"))
            .send()
            .await
            .context("Failed to send download request")?;

        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            debug!("Range not satisfiable at {start}, content complete");
            self.total = Some(self.progress);
            self.done = true;
            return Ok(self.chunk(Vec::new()));
        }

        let response = check_status(response)
            .await
            .context("Download request returned error status")?;
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok());
        let range = check_continuation(response.status(), content_range, start)?;

        let data = response
            .bytes()
            .await
            .context("Failed to read download response body")?
            .to_vec();
        self.progress += data.len() as u64;

        match range {
            Some(range) => {
                self.total = range.total;
                self.done = match range.total {
                    Some(total) => self.progress >= total,
                    None => (data.len() as u64) < self.chunk_size,
                };
            }
            None => {
                self.total = Some(self.progress);
                self.done = true;
            }
        }

        Ok(self.chunk(data))
    }
}
