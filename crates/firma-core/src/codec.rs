//! Document codec
//!
//! Documents travel as standard base64 inside JSON bodies. Encoding reads a
//! local file; decoding hands the bytes to a [`DocumentSink`], which decides
//! where the file ends up.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{debug, info};

use crate::error::{CodecError, DecodeFailure};

/// Longest filename (in characters) a sink will write
pub const MAX_FILENAME_CHARS: usize = 200;

/// Read a file fully and return its base64 payload
pub async fn encode_file(path: &Path) -> Result<String, CodecError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CodecError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Encoded document");
    Ok(encode_bytes(&bytes))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Drop a `data:<mime>;base64,` prefix, leaving only the payload
pub fn strip_data_uri(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => trimmed,
    }
}

/// Decode base64 content and deliver it through `sink` as `filename`
pub async fn decode(
    text: &str,
    filename: &str,
    sink: &dyn DocumentSink,
) -> Result<PathBuf, CodecError> {
    let bytes = BASE64
        .decode(strip_data_uri(text))
        .map_err(|e| CodecError::decoding(filename, e))?;

    sink.deliver(filename, bytes).await
}

/// Final destination for decoded documents
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Materialize `bytes` locally and report where they went
    async fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, CodecError>;
}

/// Writes delivered documents into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a document named `filename` would be written to
    pub fn target_for(&self, filename: &str) -> PathBuf {
        ensure_pdf_extension(&self.dir.join(sanitize_filename(filename)))
    }
}

#[async_trait]
impl DocumentSink for DirectorySink {
    async fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, CodecError> {
        let target = self.target_for(filename);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CodecError::decoding(filename, DecodeFailure::Io(e)))?;
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| CodecError::decoding(filename, DecodeFailure::Io(e)))?;

        info!(path = %target.display(), bytes = bytes.len(), "Saved document");
        Ok(target)
    }
}

/// Make a service- or user-supplied name safe to use as a single file name.
///
/// Path separators and reserved characters become `_`, control characters
/// are removed, surrounding whitespace and dots are trimmed, and the result
/// is capped at [`MAX_FILENAME_CHARS`]. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => Some('_'),
            '\0'..='\x1f' | '\x7f' => None,
            c => Some(c),
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');

    // Cut on a char boundary
    let limited = match trimmed.char_indices().nth(MAX_FILENAME_CHARS) {
        Some((end_idx, _)) => &trimmed[..end_idx],
        None => trimmed,
    };

    if limited.is_empty() {
        "document.pdf".to_string()
    } else {
        limited.to_string()
    }
}

/// Append `.pdf` unless the name already ends in it (case-insensitive).
///
/// Dots already in the name are kept: `Lease 2024.01.15` becomes
/// `Lease 2024.01.15.pdf`.
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    let has_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if has_pdf {
        return path.to_path_buf();
    }

    let mut name = path.as_os_str().to_os_string();
    name.push(".pdf");
    PathBuf::from(name)
}
