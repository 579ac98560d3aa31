//! Remote client for the signature service.
//!
//! Every operation resolves to an envelope. Transport failures, HTTP error
//! statuses and undecodable bodies are folded into `success: false` with an
//! error string picked in this order:
//!
//! 1. the `error` field of a structured error body,
//! 2. the raw transport/decode error message,
//! 3. the operation's fallback message.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use shared_types::{ApiResponse, DownloadResponse, SignatureRequest, SignatureRequestRecord};

use crate::config::ClientConfig;
use crate::error::ConfigError;

pub const CREATE_FAILED: &str = "Failed to create signature request";
pub const LIST_FAILED: &str = "Failed to fetch signature requests";
pub const FETCH_FAILED: &str = "Failed to fetch signature request";
pub const DOWNLOAD_FAILED: &str = "Failed to download document";
pub const AUDIT_FAILED: &str = "Failed to fetch audit trail";
pub const HEALTH_FAILED: &str = "Service unavailable";

/// Operations offered by the signature service
#[async_trait]
pub trait SignatureService: Send + Sync {
    /// POST /firma
    async fn create_signature_request(
        &self,
        request: &SignatureRequest,
    ) -> ApiResponse<SignatureRequestRecord>;

    /// GET /firma; `data` is always `Some`, empty on failure
    async fn list_signature_requests(&self) -> ApiResponse<Vec<SignatureRequestRecord>>;

    /// GET /firma/{id}
    async fn get_signature_request(&self, id: &str) -> ApiResponse<SignatureRequestRecord>;

    /// GET /firma/{id}/download
    async fn download_signed_document(&self, id: &str) -> DownloadResponse;

    /// GET /firma/{id}/audit
    async fn get_audit_trail(&self, id: &str) -> ApiResponse<Value>;

    /// GET /firma/health
    async fn health_check(&self) -> ApiResponse<String>;
}

/// Why a single exchange failed, before it is folded into an envelope
#[derive(Debug, Error)]
enum DispatchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("service responded with {status}")]
    Status {
        status: StatusCode,
        error: Option<String>,
    },

    #[error("{0}")]
    Decode(String),

    #[error("cannot build URL for {0}")]
    Url(String),
}

impl DispatchError {
    fn into_message(self, fallback: &str) -> String {
        let message = match self {
            DispatchError::Status {
                error: Some(error), ..
            } => error,
            DispatchError::Status { error: None, .. } => String::new(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// reqwest-backed [`SignatureService`]
#[derive(Debug, Clone)]
pub struct HttpSignatureClient {
    client: Client,
    base_url: Url,
}

impl HttpSignatureClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        info!(base_url = %base_url, "Signature service client initialized");
        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DispatchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DispatchError::Url(segments.join("/")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn dispatch<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<R, DispatchError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        info!(method = %method, path = %path, "Dispatching request");

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(method = %method, path = %path, error = %e, "Request failed");
            DispatchError::Transport(e)
        })?;

        let status = response.status();
        info!(method = %method, path = %path, status = status.as_u16(), "Response received");

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error = structured_error(&bytes);
            error!(status = status.as_u16(), error = ?error, "Service returned an error status");
            return Err(DispatchError::Status { status, error });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(path = %path, error = %e, "Response body could not be decoded");
            DispatchError::Decode(e.to_string())
        })
    }

    async fn get<R: DeserializeOwned>(&self, segments: &[&str]) -> Result<R, DispatchError> {
        self.dispatch::<(), R>(Method::GET, segments, None).await
    }
}

/// `error` string field of a JSON error body, if there is one
fn structured_error(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .filter(|e| !e.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl SignatureService for HttpSignatureClient {
    async fn create_signature_request(
        &self,
        request: &SignatureRequest,
    ) -> ApiResponse<SignatureRequestRecord> {
        let payload = request.prepared_for_transport();
        self.dispatch(Method::POST, &["firma"], Some(&payload))
            .await
            .unwrap_or_else(|e| ApiResponse::failure(e.into_message(CREATE_FAILED)))
    }

    async fn list_signature_requests(&self) -> ApiResponse<Vec<SignatureRequestRecord>> {
        let mut response: ApiResponse<Vec<SignatureRequestRecord>> = self
            .get(&["firma"])
            .await
            .unwrap_or_else(|e| ApiResponse::failure(e.into_message(LIST_FAILED)));
        response.data.get_or_insert_with(Vec::new);
        response
    }

    async fn get_signature_request(&self, id: &str) -> ApiResponse<SignatureRequestRecord> {
        self.get(&["firma", id])
            .await
            .unwrap_or_else(|e| ApiResponse::failure(e.into_message(FETCH_FAILED)))
    }

    async fn download_signed_document(&self, id: &str) -> DownloadResponse {
        self.get(&["firma", id, "download"])
            .await
            .unwrap_or_else(|e| DownloadResponse::failure(e.into_message(DOWNLOAD_FAILED)))
    }

    async fn get_audit_trail(&self, id: &str) -> ApiResponse<Value> {
        self.get(&["firma", id, "audit"])
            .await
            .unwrap_or_else(|e| ApiResponse::failure(e.into_message(AUDIT_FAILED)))
    }

    async fn health_check(&self) -> ApiResponse<String> {
        self.get(&["firma", "health"])
            .await
            .unwrap_or_else(|e| ApiResponse::failure(e.into_message(HEALTH_FAILED)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> HttpSignatureClient {
        HttpSignatureClient::new(&ClientConfig::new(base)).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://localhost:8080/api");
        let url = client.endpoint(&["firma", "abc123", "download"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/firma/abc123/download");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = client("http://localhost:8080/api/");
        let url = client.endpoint(&["firma"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/firma");
    }

    #[test]
    fn test_endpoint_encodes_id_as_single_segment() {
        let client = client("http://localhost:8080/api");
        let url = client.endpoint(&["firma", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/api/firma/a%2Fb%20c");
    }

    #[test]
    fn test_structured_error_wins() {
        let err = DispatchError::Status {
            status: StatusCode::BAD_REQUEST,
            error: structured_error(br#"{"success":false,"error":"invalid phone"}"#),
        };
        assert_eq!(err.into_message(CREATE_FAILED), "invalid phone");
    }

    #[test]
    fn test_status_without_body_uses_fallback() {
        let err = DispatchError::Status {
            status: StatusCode::BAD_GATEWAY,
            error: structured_error(b"<html>Bad Gateway</html>"),
        };
        assert_eq!(err.into_message(LIST_FAILED), LIST_FAILED);
    }

    #[test]
    fn test_decode_error_keeps_raw_message() {
        let err = DispatchError::Decode("expected value at line 1 column 1".to_string());
        assert_eq!(
            err.into_message(FETCH_FAILED),
            "expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_structured_error_ignores_non_string_and_blank() {
        assert_eq!(structured_error(br#"{"error": 42}"#), None);
        assert_eq!(structured_error(br#"{"error": "  "}"#), None);
        assert_eq!(structured_error(br#"{"message": "nope"}"#), None);
    }
}
