use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outbound signature request, as submitted to the signature service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<String>, // Provider UI hint, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub content: String, // Base64 encoded PDF
    pub members: Vec<Signer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
}

impl SignatureRequest {
    /// Copy of this request with every out-of-range sign removed from every member
    pub fn prepared_for_transport(&self) -> Self {
        let mut prepared = self.clone();
        for member in &mut prepared.members {
            member.retain_valid_signs();
        }
        prepared
    }
}

/// A person required to sign the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String, // International prefix expected, e.g. "+39..."
    pub signs: Vec<SignPosition>,
}

impl Signer {
    /// Drop every sign placed on a page below 1, keeping the order of the rest
    pub fn retain_valid_signs(&mut self) {
        self.signs.retain(SignPosition::is_valid_page);
    }
}

/// Where a signer's mark goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPosition {
    pub page: i32, // 1-based
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>, // Bounding box "x1,y1,x2,y2"; None = service default placement
}

impl SignPosition {
    pub fn new(page: i32) -> Self {
        Self {
            page,
            position: None,
        }
    }

    pub fn at(page: i32, position: impl Into<String>) -> Self {
        Self {
            page,
            position: Some(position.into()),
        }
    }

    pub fn is_valid_page(&self) -> bool {
        self.page >= 1
    }
}

/// Completion callback, forwarded verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub field: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Signature request as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequestRecord {
    pub id: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<SignerStatus>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
}

/// Per-signer progress, owned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerStatus {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub sign_link: String,
}

/// Lifecycle state of a signature request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Created,
    Started,
    Finished,
    Refused,
    Expired,
    RequestFailed,
    FileValidationFailed,
    Error,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 8] = [
        RequestStatus::Created,
        RequestStatus::Started,
        RequestStatus::Finished,
        RequestStatus::Refused,
        RequestStatus::Expired,
        RequestStatus::RequestFailed,
        RequestStatus::FileValidationFailed,
        RequestStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Created => "created",
            RequestStatus::Started => "started",
            RequestStatus::Finished => "finished",
            RequestStatus::Refused => "refused",
            RequestStatus::Expired => "expired",
            RequestStatus::RequestFailed => "request_failed",
            RequestStatus::FileValidationFailed => "file_validation_failed",
            RequestStatus::Error => "error",
        }
    }

    /// The service will not move the request any further
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Created | RequestStatus::Started)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown request status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn signer_with_pages(pages: &[i32]) -> Signer {
        Signer {
            firstname: "Mario".to_string(),
            lastname: "Rossi".to_string(),
            email: "mario@example.com".to_string(),
            phone: "+39123456789".to_string(),
            signs: pages.iter().copied().map(SignPosition::new).collect(),
        }
    }

    // ============================================================
    // Wire format
    // ============================================================

    #[test]
    fn test_request_omits_absent_optionals() {
        let request = SignatureRequest {
            filename: Some("doc.pdf".to_string()),
            content: "JVBERi0=".to_string(),
            members: vec![Signer {
                signs: vec![SignPosition::at(1, "10,15,45,35")],
                ..signer_with_pages(&[])
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "filename": "doc.pdf",
                "content": "JVBERi0=",
                "members": [{
                    "firstname": "Mario",
                    "lastname": "Rossi",
                    "email": "mario@example.com",
                    "phone": "+39123456789",
                    "signs": [{ "page": 1, "position": "10,15,45,35" }]
                }]
            })
        );
    }

    #[test]
    fn test_record_uses_camel_case_fields() {
        let record: SignatureRequestRecord = serde_json::from_value(json!({
            "id": "abc123",
            "filename": "doc.pdf",
            "status": "file_validation_failed",
            "downloadLink": "https://example.com/d/abc123",
            "callbackStatus": "sent",
            "members": [{
                "firstname": "Mario",
                "lastname": "Rossi",
                "email": "mario@example.com",
                "phone": "+39123456789",
                "status": "pending",
                "createdAt": "2024-05-01T10:00:00",
                "updatedAt": "2024-05-01T10:00:00",
                "signLink": "https://example.com/s/1"
            }]
        }))
        .unwrap();

        assert_eq!(record.status, RequestStatus::FileValidationFailed);
        assert_eq!(
            record.download_link.as_deref(),
            Some("https://example.com/d/abc123")
        );
        assert_eq!(record.members[0].sign_link, "https://example.com/s/1");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<SignatureRequestRecord>(json!({
            "id": "x",
            "filename": "doc.pdf",
            "status": "archived",
            "members": []
        }));
        assert!(result.is_err());
    }

    // ============================================================
    // Status
    // ============================================================

    #[test]
    fn test_status_display_matches_wire_name() {
        for status in RequestStatus::ALL {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, json!(status.to_string()));
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_only_created_and_started_are_in_flight() {
        let in_flight: Vec<_> = RequestStatus::ALL
            .into_iter()
            .filter(|s| !s.is_terminal())
            .collect();
        assert_eq!(
            in_flight,
            vec![RequestStatus::Created, RequestStatus::Started]
        );
    }

    #[test]
    fn test_parse_unknown_status() {
        assert_eq!(
            "pending".parse::<RequestStatus>(),
            Err(ParseStatusError("pending".to_string()))
        );
    }

    // ============================================================
    // Sign filtering
    // ============================================================

    #[test]
    fn test_prepared_request_drops_non_positive_pages() {
        let request = SignatureRequest {
            content: "JVBERi0=".to_string(),
            members: vec![signer_with_pages(&[0, 2, -1, 1])],
            ..Default::default()
        };

        let prepared = request.prepared_for_transport();
        let pages: Vec<i32> = prepared.members[0].signs.iter().map(|s| s.page).collect();
        assert_eq!(pages, vec![2, 1]);
        // Original is left alone
        assert_eq!(request.members[0].signs.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_valid_signs_preserved_in_order(pages in proptest::collection::vec(-5i32..20, 0..30)) {
            let mut signer = signer_with_pages(&pages);
            signer.retain_valid_signs();

            let kept: Vec<i32> = signer.signs.iter().map(|s| s.page).collect();
            let expected: Vec<i32> = pages.iter().copied().filter(|p| *p >= 1).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
