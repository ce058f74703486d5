//! Configuration module for drivesync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation and defaults. Every section is optional in the
//! file; missing fields take their default value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// OAuth scope granting read-only access to Drive files
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for drivesync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub auth: AuthConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

/// Locations of the files drivesync reads and writes.
///
/// Relative paths are resolved against `base_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory that relative paths are resolved against.
    pub base_dir: PathBuf,
    /// OAuth client configuration downloaded from the Google Cloud console.
    pub client_secret: PathBuf,
    /// Persisted OAuth credential.
    pub token: PathBuf,
    /// Manifest of files to fetch.
    pub manifest: PathBuf,
    /// Directory receiving downloaded content.
    pub output_dir: PathBuf,
}

/// OAuth settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Scopes requested during authorization. Changing them requires a new login.
    pub scopes: Vec<String>,
    /// Address the local redirect listener binds to.
    pub callback_host: String,
    /// Port of the local redirect listener; `0` picks a free port.
    pub callback_port: u16,
    /// Whether to launch the browser automatically.
    pub open_browser: bool,
}

/// Download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Size of each ranged download request (in MiB).
    pub chunk_size_mb: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Optional file that mirrors the console log.
    pub file: Option<PathBuf>,
    /// Log level for the mirror file.
    pub file_level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drivesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("drivesync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            client_secret: PathBuf::from("auth").join("google.json"),
            token: PathBuf::from("auth").join("token.json"),
            manifest: PathBuf::from("documents.json"),
            output_dir: PathBuf::from("drive"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
            callback_host: "127.0.0.1".to_string(),
            callback_port: 0,
            open_browser: true,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { chunk_size_mb: 100 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            file_level: "debug".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

impl Config {
    /// Resolve `path` against `paths.base_dir` unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.base_dir.join(path)
        }
    }

    /// Absolute-or-base-relative path of the OAuth client configuration.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve(&self.paths.client_secret)
    }

    /// Path of the persisted credential.
    pub fn token_path(&self) -> PathBuf {
        self.resolve(&self.paths.token)
    }

    /// Path of the manifest document.
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.paths.manifest)
    }

    /// Directory receiving downloads.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_dir)
    }

    /// Chunk size for ranged downloads, in bytes.
    pub fn chunk_size_bytes(&self) -> u64 {
        self.transfer.chunk_size_mb.saturating_mul(1024 * 1024)
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.chunk_size_mb"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level` and `logging.file_level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- paths ---
        let paths = [
            ("paths.client_secret", &self.paths.client_secret),
            ("paths.token", &self.paths.token),
            ("paths.manifest", &self.paths.manifest),
            ("paths.output_dir", &self.paths.output_dir),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            }
        }
        if self.paths.client_secret == self.paths.token {
            errors.push(ValidationError {
                field: "paths.token".into(),
                message: "must differ from paths.client_secret".into(),
            });
        }

        // --- auth ---
        if self.auth.scopes.is_empty() {
            errors.push(ValidationError {
                field: "auth.scopes".into(),
                message: "at least one scope is required".into(),
            });
        }
        if self.auth.callback_host.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.callback_host".into(),
                message: "must not be empty".into(),
            });
        }

        // --- transfer ---
        if self.transfer.chunk_size_mb == 0 {
            errors.push(ValidationError {
                field: "transfer.chunk_size_mb".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        for (field, level) in [
            ("logging.level", &self.logging.level),
            ("logging.file_level", &self.logging.file_level),
        ] {
            if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!(
                        "invalid level '{}'; valid options: {}",
                        level,
                        VALID_LOG_LEVELS.join(", ")
                    ),
                });
            }
        }

        errors
    }
}
