//! drivesync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `Manifest`, `EntryDescriptor`, `FetchTarget`, `RemoteId`, `MimeType`
//! - **Use cases** - `AcquireCredentialUseCase`, `ResolveRemoteIdUseCase`,
//!   `FetchContentUseCase`, `ReconcileManifestUseCase`
//! - **Port definitions** - Traits for adapters: `IDriveProvider`, `ITokenStorage`, `IAuthenticator`
//!
//! # Architecture
//!
//! The domain module contains pure data and validation rules with no I/O
//! beyond reading and writing the manifest document.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain types through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
