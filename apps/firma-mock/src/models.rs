//! Request validation and simulated service behaviour

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_types::{RequestStatus, SignatureRequest, SignatureRequestRecord, SignerStatus};

use crate::error::MockError;

/// Host used for generated sign and download links
pub const MOCK_LINK_BASE: &str = "https://mock.firma.local";

lazy_static! {
    /// E.164: leading '+', no leading zero, at most 15 digits
    static ref PHONE_PATTERN: Regex = Regex::new(r"^\+[1-9]\d{1,14}$").unwrap();
}

/// Shape checks the real service performs before accepting a request
pub fn validate_request(request: &SignatureRequest) -> Result<(), MockError> {
    if request.content.trim().is_empty() {
        return Err(MockError::InvalidRequest("PDF content is required".into()));
    }
    if request.members.is_empty() {
        return Err(MockError::InvalidRequest(
            "At least one member is required".into(),
        ));
    }
    if request.members.iter().any(|m| m.signs.is_empty()) {
        return Err(MockError::InvalidRequest(
            "Each member must have at least one signature position".into(),
        ));
    }
    if let Some(member) = request
        .members
        .iter()
        .find(|m| !PHONE_PATTERN.is_match(&m.phone))
    {
        tracing::debug!(email = %member.email, "Rejected phone number");
        return Err(MockError::InvalidRequest(
            "Phone must include international prefix starting with '+'".into(),
        ));
    }
    Ok(())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Service-side timestamp format (local date-time, second precision)
pub fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Record for a freshly accepted request
pub fn new_record(request: SignatureRequest) -> SignatureRequestRecord {
    let now = timestamp();
    let members = request
        .members
        .into_iter()
        .map(|member| SignerStatus {
            firstname: member.firstname,
            lastname: member.lastname,
            email: member.email,
            phone: member.phone,
            status: "pending".to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
            sign_link: format!("{}/sign/{}", MOCK_LINK_BASE, Uuid::new_v4()),
        })
        .collect();

    let filename = request
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| format!("fes_{}.pdf", Utc::now().timestamp_millis()));

    SignatureRequestRecord {
        id: Uuid::new_v4().to_string(),
        filename,
        title: request.title,
        description: request.description,
        members,
        status: RequestStatus::Created,
        download_link: None,
        callback_status: None,
        callback: request.callback,
    }
}

/// Viewing a new request starts it, and the first signer signs
pub fn advance_on_view(record: &mut SignatureRequestRecord) {
    if record.status == RequestStatus::Created {
        record.status = RequestStatus::Started;
        if let Some(first) = record.members.first_mut() {
            first.status = "signed".to_string();
            first.updated_at = timestamp();
        }
    }
}

/// Downloading completes the request for every signer
pub fn complete_on_download(record: &mut SignatureRequestRecord) {
    let now = timestamp();
    record.status = RequestStatus::Finished;
    record.download_link = Some(format!("{}/download/{}", MOCK_LINK_BASE, record.id));
    for member in &mut record.members {
        member.status = "signed".to_string();
        member.updated_at = now.clone();
    }
}

/// Opaque audit payload for a record
pub fn audit_trail(record: &SignatureRequestRecord) -> Value {
    let created_at = record
        .members
        .first()
        .map(|m| m.created_at.clone())
        .unwrap_or_else(timestamp);

    let mut events = vec![json!({ "timestamp": created_at, "event": "Request created" })];
    if record.status != RequestStatus::Created {
        events.push(json!({ "timestamp": timestamp(), "event": "Email sent to signers" }));
    }
    if record.status == RequestStatus::Finished {
        events.push(json!({ "timestamp": timestamp(), "event": "Document signed by all members" }));
    }

    json!({
        "requestId": record.id,
        "filename": record.filename,
        "status": record.status,
        "createdAt": created_at,
        "events": events,
        "mockData": true,
    })
}

/// Minimal one-page PDF standing in for the signed document
pub fn signed_pdf(id: &str) -> Vec<u8> {
    let stream = format!("BT\n/F1 12 Tf\n100 700 Td\n(MOCK SIGNED DOCUMENT {}) Tj\nET\n", id);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 595 842] >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Times-Roman >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_start = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.extend_from_slice(xref.as_bytes());
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    pdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{SignPosition, Signer};

    fn request() -> SignatureRequest {
        SignatureRequest {
            title: Some("Contract".to_string()),
            content: "JVBERi0xLjQ=".to_string(),
            members: vec![Signer {
                firstname: "Mario".to_string(),
                lastname: "Rossi".to_string(),
                email: "mario@example.com".to_string(),
                phone: "+39123456789".to_string(),
                signs: vec![SignPosition::new(1)],
            }],
            ..Default::default()
        }
    }

    fn rejection(request: &SignatureRequest) -> String {
        validate_request(request).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_validation_messages() {
        let mut blank = request();
        blank.content = "  ".to_string();
        assert_eq!(rejection(&blank), "PDF content is required");

        let mut nobody = request();
        nobody.members.clear();
        assert_eq!(rejection(&nobody), "At least one member is required");

        let mut unplaced = request();
        unplaced.members[0].signs.clear();
        assert_eq!(
            rejection(&unplaced),
            "Each member must have at least one signature position"
        );

        let mut local_phone = request();
        local_phone.members[0].phone = "3331234567".to_string();
        assert_eq!(
            rejection(&local_phone),
            "Phone must include international prefix starting with '+'"
        );
    }

    #[test]
    fn test_new_record_defaults() {
        let mut req = request();
        req.filename = None;
        let record = new_record(req);

        assert_eq!(record.status, RequestStatus::Created);
        assert!(record.filename.starts_with("fes_"));
        assert_eq!(record.title.as_deref(), Some("Contract"));
        assert_eq!(record.members[0].status, "pending");
        assert!(record.members[0].sign_link.starts_with(MOCK_LINK_BASE));
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_view_advances_only_from_created() {
        let mut record = new_record(request());
        advance_on_view(&mut record);
        assert_eq!(record.status, RequestStatus::Started);
        assert_eq!(record.members[0].status, "signed");

        record.status = RequestStatus::Refused;
        advance_on_view(&mut record);
        assert_eq!(record.status, RequestStatus::Refused);
    }

    #[test]
    fn test_download_completes_request() {
        let mut record = new_record(request());
        complete_on_download(&mut record);

        assert_eq!(record.status, RequestStatus::Finished);
        assert_eq!(
            record.download_link,
            Some(format!("{}/download/{}", MOCK_LINK_BASE, record.id))
        );
        assert!(record.members.iter().all(|m| m.status == "signed"));
    }

    #[test]
    fn test_audit_trail_tracks_progress() {
        let mut record = new_record(request());
        assert_eq!(audit_trail(&record)["events"].as_array().unwrap().len(), 1);

        complete_on_download(&mut record);
        let trail = audit_trail(&record);
        assert_eq!(trail["events"].as_array().unwrap().len(), 3);
        assert_eq!(trail["status"], "finished");
        assert_eq!(trail["requestId"], record.id.as_str());
    }

    #[test]
    fn test_signed_pdf_structure() {
        let pdf = signed_pdf("abc123");
        let text = String::from_utf8(pdf.clone()).unwrap();

        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("MOCK SIGNED DOCUMENT abc123"));

        // startxref points at the xref table
        let start: usize = text
            .lines()
            .skip_while(|l| *l != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[start..].starts_with("xref"));
    }
}
