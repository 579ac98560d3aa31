//! Signature request lifecycle core
//!
//! This crate provides the client side of the signing workflow:
//! - [`codec`]: base64 document encoding and local delivery
//! - [`client`]: typed calls to the signature service, always resolved to an envelope
//! - [`store`]: the request store front ends drive and observe
//!
//! Front ends should only talk to [`RequestStore`]; the client and codec are
//! public so a store can be assembled with different transports or sinks.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod store;

pub use client::{HttpSignatureClient, SignatureService};
pub use codec::{DirectorySink, DocumentSink};
pub use config::ClientConfig;
pub use error::{CodecError, ConfigError, DecodeFailure};
pub use store::{RequestStore, StoreState};

// Re-export the wire model so front ends need a single dependency
pub use shared_types::{
    ApiResponse, Callback, DownloadResponse, RequestStatus, SignPosition, SignatureRequest,
    SignatureRequestRecord, Signer, SignerStatus,
};
