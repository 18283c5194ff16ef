use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the install and remove pipelines. Each one ends up as an alert.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("catalog unavailable ({}): {reason}", .path.display())]
    CatalogUnavailable { path: PathBuf, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unsupported checksum format: {checksum:?}")]
    UnsupportedChecksum { checksum: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Remove(#[from] RemoveError),

    #[error("registry unavailable: {0}")]
    Registry(#[source] io::Error),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[error("download of {url} failed: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

#[derive(Debug, Error)]
pub enum FetchCause {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, FetchCause::Cancelled)
    }
}

#[derive(Debug, Error)]
#[error("extracting {} into {} failed: {source}", .archive.display(), .dest.display())]
pub struct InstallError {
    pub archive: PathBuf,
    pub dest: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error)]
#[error("removing {} failed{}: {source}", .path.display(), partial_note(.partial))]
pub struct RemoveError {
    pub path: PathBuf,
    /// Set when the payload tree was already deleted before this failure.
    pub partial: bool,
    #[source]
    pub source: io::Error,
}

fn partial_note(partial: &bool) -> &'static str {
    if *partial { " (partially removed)" } else { "" }
}
