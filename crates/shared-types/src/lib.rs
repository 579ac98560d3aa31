pub mod envelope;
pub mod types;

pub use envelope::{ApiResponse, DownloadResponse};
pub use types::{
    Callback, ParseStatusError, RequestStatus, SignPosition, SignatureRequest,
    SignatureRequestRecord, Signer, SignerStatus,
};
