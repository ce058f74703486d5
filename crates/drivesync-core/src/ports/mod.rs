//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IDriveProvider`] - Remote file search and chunked downloads (Google Drive)
//! - [`ITokenStorage`] - Persistence of the OAuth credential
//! - [`IAuthenticator`] - Interactive authorization and token refresh

pub mod credential;
pub mod drive_provider;

pub use credential::{IAuthenticator, ITokenStorage, Tokens};
pub use drive_provider::{
    FilePage, IDriveProvider, IMediaDownload, MediaChunk, MediaRequest, RemoteFile,
};
