//! In-memory port implementations shared by the use case tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::ports::{
    FilePage, IAuthenticator, IDriveProvider, IMediaDownload, ITokenStorage, MediaChunk,
    MediaRequest, RemoteFile, Tokens,
};

// ============================================================================
// Tokens
// ============================================================================

pub fn valid_tokens(access: &str) -> Tokens {
    Tokens {
        access_token: access.to_string(),
        refresh_token: Some(format!("{access}-refresh")),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn expired_tokens(access: &str, refresh: Option<&str>) -> Tokens {
    Tokens {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_at: Utc::now() - Duration::hours(1),
    }
}

// ============================================================================
// MockTokenStorage
// ============================================================================

/// Token storage holding at most one credential in memory
#[derive(Default)]
pub struct MockTokenStorage {
    current: Mutex<Option<Tokens>>,
    corrupt: bool,
    stored: Mutex<Vec<Tokens>>,
    cleared: Mutex<u32>,
}

impl MockTokenStorage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(tokens: Tokens) -> Self {
        Self {
            current: Mutex::new(Some(tokens)),
            ..Self::default()
        }
    }

    /// Storage whose `load` always fails
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<Tokens> {
        self.stored.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) -> u32 {
        *self.cleared.lock().unwrap()
    }
}

impl ITokenStorage for MockTokenStorage {
    fn load(&self) -> Result<Option<Tokens>> {
        if self.corrupt {
            return Err(anyhow!("expected value at line 1 column 1"));
        }
        Ok(self.current.lock().unwrap().clone())
    }

    fn store(&self, tokens: &Tokens) -> Result<()> {
        *self.current.lock().unwrap() = Some(tokens.clone());
        self.stored.lock().unwrap().push(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.current.lock().unwrap() = None;
        *self.cleared.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// MockAuthenticator
// ============================================================================

/// Authenticator returning canned tokens and counting calls
pub struct MockAuthenticator {
    authorize_result: Option<Tokens>,
    refresh_result: Option<Tokens>,
    authorize_calls: Mutex<u32>,
    refresh_calls: Mutex<Vec<String>>,
}

impl MockAuthenticator {
    pub fn new(authorize_result: Option<Tokens>, refresh_result: Option<Tokens>) -> Self {
        Self {
            authorize_result,
            refresh_result,
            authorize_calls: Mutex::new(0),
            refresh_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn authorize_calls(&self) -> u32 {
        *self.authorize_calls.lock().unwrap()
    }

    pub fn refresh_calls(&self) -> Vec<String> {
        self.refresh_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IAuthenticator for MockAuthenticator {
    async fn authorize(&self) -> Result<Tokens> {
        *self.authorize_calls.lock().unwrap() += 1;
        self.authorize_result
            .clone()
            .ok_or_else(|| anyhow!("authorization denied"))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        self.refresh_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        self.refresh_result
            .clone()
            .ok_or_else(|| anyhow!("invalid_grant"))
    }
}

// ============================================================================
// MockDriveProvider
// ============================================================================

/// Drive provider backed by scripted search pages and file contents
#[derive(Default)]
pub struct MockDriveProvider {
    /// Search pages per file name, indexed by page number
    pages: HashMap<String, Vec<FilePage>>,
    /// Content of each file ID, already split into chunks
    contents: HashMap<String, Vec<Vec<u8>>>,
    failing: HashSet<String>,
    list_calls: Mutex<Vec<(String, Option<String>)>>,
    downloads: Mutex<Vec<MediaRequest>>,
}

impl MockDriveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the search results for `name`; page N answers token `pN`
    pub fn with_pages(mut self, name: &str, pages: Vec<Vec<(&str, &str)>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, files)| FilePage {
                files: files
                    .into_iter()
                    .map(|(id, name)| RemoteFile {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
                next_page_token: (index + 1 < count).then(|| format!("p{}", index + 1)),
            })
            .collect();
        self.pages.insert(name.to_string(), pages);
        self
    }

    pub fn with_content(mut self, id: &str, chunks: &[&str]) -> Self {
        self.contents.insert(
            id.to_string(),
            chunks.iter().map(|chunk| chunk.as_bytes().to_vec()).collect(),
        );
        self
    }

    /// Downloads of `id` fail on the first chunk
    pub fn with_failing_download(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<(String, Option<String>)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<MediaRequest> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl IDriveProvider for MockDriveProvider {
    async fn list_files_by_name(&self, name: &str, page_token: Option<&str>) -> Result<FilePage> {
        self.list_calls
            .lock()
            .unwrap()
            .push((name.to_string(), page_token.map(str::to_string)));

        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix('p')
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| anyhow!("unknown page token {token}"))?,
        };

        Ok(self
            .pages
            .get(name)
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_default())
    }

    async fn open_download(&self, request: MediaRequest) -> Result<Box<dyn IMediaDownload>> {
        let id = request.id().as_str().to_string();
        self.downloads.lock().unwrap().push(request);

        Ok(Box::new(MockDownload {
            chunks: self.contents.get(&id).cloned().unwrap_or_default().into(),
            fail: self.failing.contains(&id),
            progress: 0,
        }))
    }
}

struct MockDownload {
    chunks: VecDeque<Vec<u8>>,
    fail: bool,
    progress: u64,
}

#[async_trait]
impl IMediaDownload for MockDownload {
    async fn next_chunk(&mut self) -> Result<MediaChunk> {
        if self.fail {
            return Err(anyhow!("connection reset by peer"));
        }
        let data = self.chunks.pop_front().unwrap_or_default();
        self.progress += data.len() as u64;
        Ok(MediaChunk {
            data,
            progress: self.progress,
            total: None,
            done: self.chunks.is_empty(),
        })
    }
}
