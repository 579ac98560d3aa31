//! Plain-text rendering of store snapshots

use std::fmt::Write;

use firma_core::{RequestStatus, SignatureRequestRecord};

/// One line per request: id, status, filename, signer count
pub fn request_table(requests: &[SignatureRequestRecord]) -> String {
    if requests.is_empty() {
        return "No signature requests.\n".to_string();
    }

    let mut out = format!("{:<38} {:<24} {:>7}  {}\n", "ID", "STATUS", "SIGNERS", "FILE");
    for record in requests {
        let _ = writeln!(
            out,
            "{:<38} {:<24} {:>7}  {}",
            record.id,
            record.status,
            record.members.len(),
            record.filename
        );
    }
    out
}

/// Full view of a single request
pub fn request_detail(record: &SignatureRequestRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Request   {}", record.id);
    let _ = writeln!(out, "Status    {}{}", record.status, progress_hint(record.status));
    let _ = writeln!(out, "File      {}", record.filename);
    if let Some(title) = &record.title {
        let _ = writeln!(out, "Title     {}", title);
    }
    if let Some(description) = &record.description {
        let _ = writeln!(out, "About     {}", description);
    }
    if let Some(link) = &record.download_link {
        let _ = writeln!(out, "Download  {}", link);
    }
    if let Some(callback) = &record.callback_status {
        let _ = writeln!(out, "Callback  {}", callback);
    }

    let _ = writeln!(out, "Signers");
    for member in &record.members {
        let _ = writeln!(
            out,
            "  - {} {} <{}> {} [{}]",
            member.firstname, member.lastname, member.email, member.phone, member.status
        );
        if !member.sign_link.is_empty() {
            let _ = writeln!(out, "    {}", member.sign_link);
        }
    }
    out
}

fn progress_hint(status: RequestStatus) -> &'static str {
    if status.is_terminal() {
        ""
    } else {
        " (in progress)"
    }
}
