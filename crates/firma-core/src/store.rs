//! Request store: the client-side orchestrator for signature requests.
//!
//! Holds the known requests, the one currently open, a shared `loading`
//! flag and the last error. Every action follows the same steps:
//!
//! 1. `loading = true`, `error = None`
//! 2. call the signature service
//! 3. on success apply the action's effect, on failure record the error
//! 4. `loading = false`
//!
//! State lives in a `watch` channel so a front end can subscribe and
//! re-render on every change. Actions take `&self` and may overlap; the
//! `loading` flag is shared, so whichever action finishes last decides
//! its final value.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shared_types::{ApiResponse, SignatureRequest, SignatureRequestRecord};

use crate::client::{
    SignatureService, CREATE_FAILED, DOWNLOAD_FAILED, FETCH_FAILED, LIST_FAILED,
};
use crate::codec::{self, DocumentSink};

/// Snapshot of everything the store holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Unique by id. Most recent first after a create; service order after a refresh
    pub requests: Vec<SignatureRequestRecord>,
    pub current_request: Option<SignatureRequestRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    FetchAll,
    FetchOne,
    Download,
}

impl Operation {
    fn fallback_error(self) -> &'static str {
        match self {
            Operation::Create => CREATE_FAILED,
            Operation::FetchAll => LIST_FAILED,
            Operation::FetchOne => FETCH_FAILED,
            Operation::Download => DOWNLOAD_FAILED,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::FetchAll => "fetch_all",
            Operation::FetchOne => "fetch_one",
            Operation::Download => "download",
        };
        f.write_str(name)
    }
}

pub struct RequestStore {
    service: Arc<dyn SignatureService>,
    sink: Arc<dyn DocumentSink>,
    state: watch::Sender<StoreState>,
}

impl RequestStore {
    pub fn new(service: Arc<dyn SignatureService>, sink: Arc<dyn DocumentSink>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            service,
            sink,
            state,
        }
    }

    /// Receiver that is notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Current state, cloned
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Submit a request; on success it is prepended to `requests` and opened.
    ///
    /// A missing filename is replaced with `firma_<unix-millis>.pdf` and a
    /// data-URI prefix on `content` is stripped before sending.
    pub async fn create_request(&self, request: SignatureRequest) -> Option<SignatureRequestRecord> {
        self.begin(Operation::Create);
        self.submit(request).await
    }

    /// Like [`create_request`](Self::create_request), with `content` read from `path`.
    ///
    /// An unreadable file ends the operation with `error` set; nothing is sent.
    pub async fn create_request_from_file(
        &self,
        path: impl AsRef<Path>,
        mut request: SignatureRequest,
    ) -> Option<SignatureRequestRecord> {
        self.begin(Operation::Create);

        match codec::encode_file(path.as_ref()).await {
            Ok(content) => {
                request.content = content;
                self.submit(request).await
            }
            Err(e) => {
                self.fail(Operation::Create, e.to_string());
                None
            }
        }
    }

    async fn submit(&self, mut request: SignatureRequest) -> Option<SignatureRequestRecord> {
        let needs_filename = request
            .filename
            .as_deref()
            .map_or(true, |name| name.trim().is_empty());
        if needs_filename {
            request.filename = Some(default_filename());
        }
        request.content = codec::strip_data_uri(&request.content).to_string();

        match self.service.create_signature_request(&request).await {
            ApiResponse {
                success: true,
                data: Some(record),
                ..
            } => {
                info!(id = %record.id, status = %record.status, "Signature request created");
                self.state.send_modify(|state| {
                    state.requests.retain(|r| r.id != record.id);
                    state.requests.insert(0, record.clone());
                    state.current_request = Some(record.clone());
                    state.loading = false;
                });
                self.finished(Operation::Create);
                Some(record)
            }
            response => {
                self.fail(
                    Operation::Create,
                    response.error_or(Operation::Create.fallback_error()),
                );
                None
            }
        }
    }

    /// Replace `requests` with the service's full list
    pub async fn fetch_all_requests(&self) {
        self.begin(Operation::FetchAll);

        let response = self.service.list_signature_requests().await;
        if response.success {
            let requests = unique_by_id(response.data.unwrap_or_default());
            debug!(count = requests.len(), "Fetched signature requests");
            self.state.send_modify(|state| {
                state.requests = requests;
                state.loading = false;
            });
            self.finished(Operation::FetchAll);
        } else {
            self.fail(
                Operation::FetchAll,
                response.error_or(Operation::FetchAll.fallback_error()),
            );
        }
    }

    /// Open one request and refresh its entry in `requests`
    pub async fn fetch_request_by_id(&self, id: &str) {
        self.begin(Operation::FetchOne);

        match self.service.get_signature_request(id).await {
            ApiResponse {
                success: true,
                data: Some(record),
                ..
            } => {
                debug!(id = %record.id, status = %record.status, "Fetched signature request");
                self.state.send_modify(|state| {
                    for existing in state.requests.iter_mut().filter(|r| r.id == record.id) {
                        *existing = record.clone();
                    }
                    state.current_request = Some(record);
                    state.loading = false;
                });
                self.finished(Operation::FetchOne);
            }
            response => {
                self.fail(
                    Operation::FetchOne,
                    response.error_or(Operation::FetchOne.fallback_error()),
                );
            }
        }
    }

    /// Fetch the signed document and deliver it as `filename`.
    ///
    /// Leaves `requests` and `current_request` alone. Returns where the
    /// file was delivered.
    pub async fn download_document(&self, id: &str, filename: &str) -> Option<PathBuf> {
        self.begin(Operation::Download);

        let response = self.service.download_signed_document(id).await;
        if !response.success || response.content.is_empty() {
            self.fail(
                Operation::Download,
                response.error_or(Operation::Download.fallback_error()),
            );
            return None;
        }

        match codec::decode(&response.content, filename, self.sink.as_ref()).await {
            Ok(path) => {
                info!(id, path = %path.display(), "Signed document delivered");
                self.state.send_modify(|state| state.loading = false);
                self.finished(Operation::Download);
                Some(path)
            }
            Err(e) => {
                self.fail(Operation::Download, e.to_string());
                None
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Point the detail view at `request` (or close it); no network call
    pub fn set_current_request(&self, request: Option<SignatureRequestRecord>) {
        self.state
            .send_modify(|state| state.current_request = request);
    }

    fn begin(&self, operation: Operation) {
        debug!(%operation, "Operation started");
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn finished(&self, operation: Operation) {
        debug!(%operation, "Operation finished");
    }

    fn fail(&self, operation: Operation, message: String) {
        warn!(%operation, error = %message, "Operation failed");
        self.state.send_modify(|state| {
            state.error = Some(message);
            state.loading = false;
        });
    }
}

/// First occurrence of each id, in the order given
fn unique_by_id(records: Vec<SignatureRequestRecord>) -> Vec<SignatureRequestRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

fn default_filename() -> String {
    format!("firma_{}.pdf", Utc::now().timestamp_millis())
}
