// Error taxonomy for the dashboard
//
// Four families with different blast radii:
// - ConfigError: fatal at startup, aborts widget construction
// - CacheError: surfaced to the cache's caller; priming failures propagate,
//   periodic refresh failures are logged by the worker and retried
// - FetchError: HTTP-level failures, wrapped into CacheError by the
//   specialized caches
// - RenderError: widget-internal, isolated inside Widget::refresh so a
//   broken widget freezes on its last good frame instead of killing the loop

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems. All of these abort startup (or a hot reload)
/// rather than constructing a partially-usable widget.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("widget '{widget}' is missing required field '{field}'")]
    MissingField { widget: String, field: String },

    #[error("widget '{widget}' has an invalid region: {reason}")]
    InvalidRegion { widget: String, reason: String },

    #[error("widget '{a}' overlaps widget '{b}'; overlapping regions are not supported")]
    OverlappingRegions { a: String, b: String },

    #[error("duplicate widget name '{0}'")]
    DuplicateName(String),

    #[error("skin size {skin_width}x{skin_height} does not match screen size {screen_width}x{screen_height}")]
    SkinSizeMismatch {
        skin_width: u32,
        skin_height: u32,
        screen_width: u32,
        screen_height: u32,
    },

    #[error("invalid color literal '{0}' (expected '#rrggbb')")]
    InvalidColor(String),

    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Cache subsystem failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory {path}: {source}")]
    DirectoryCreate { path: PathBuf, source: io::Error },

    /// The backing file exists and is fresh but its content does not
    /// deserialize. Deliberately distinct from a miss: callers must be able
    /// to tell "no data" from "bad data".
    #[error("cache entry {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cache I/O failure on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid cache argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// HTTP fetch failures, produced by `net::http_get` and the cache refresh
/// hooks built on it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} returned unexpected content type '{content_type}'")]
    ContentType { url: String, content_type: String },
}

/// Rendering failures. These never cross the widget boundary; Widget::refresh
/// logs them and keeps the previous frame on screen.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("display backend error: {0}")]
    Backend(#[from] io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
