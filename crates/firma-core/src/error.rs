//! Error types for firma-core
//!
//! Remote failures never show up here: the client folds them into the
//! response envelope. These cover local work only.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Local document encode/decode failures
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Could not read document {}: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not deliver {filename}: {reason}")]
    Decoding {
        filename: String,
        #[source]
        reason: DecodeFailure,
    },
}

impl CodecError {
    pub(crate) fn decoding(filename: &str, reason: impl Into<DecodeFailure>) -> Self {
        CodecError::Decoding {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("content is not valid base64 ({0})")]
    Base64(#[from] base64::DecodeError),

    #[error("write failed ({0})")]
    Io(#[from] io::Error),
}

/// Invalid client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid timeout '{0}': expected whole seconds")]
    InvalidTimeout(String),

    #[error("HTTP client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}
