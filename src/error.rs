use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MarkerError {
    #[error("PhyloPic connection failed: {0}")]
    Network(String),

    #[error("PhyloPic request failed: {0}")]
    Http(String),

    #[error("PhyloPic returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode PhyloPic response: {0}")]
    Decode(String),

    #[error("failed to parse silhouette SVG {path}: {message}")]
    Parse { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("no image UUID in resource path: {0}")]
    MissingImageId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no marker was produced ({failed} result(s) failed)")]
    #[diagnostic(help("set RUST_LOG=debug to see the requests that were made"))]
    NoMarkers { failed: usize },
}

impl MarkerError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            MarkerError::Network(err.to_string())
        } else {
            MarkerError::Http(err.to_string())
        }
    }
}
