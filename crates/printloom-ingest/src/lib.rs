//! # Printloom Ingest
//!
//! Turns raw uploaded files into placed, deduplicated scene objects without
//! racing concurrent uploads: type/size validation before any decode, one
//! correlation ticket per file with a bounded safety deadline, stale
//! completion discard, and content-digest duplicate suppression.

pub mod decode;
pub mod pipeline;
pub mod validate;

pub use decode::{decode, DecodedUpload};
pub use pipeline::{
    complete, placement_for, IngestOutcome, PlacementContext, UploadTicket, UploadTracker,
    PLACEMENT_FILL, UPLOAD_TIMEOUT,
};
pub use validate::{validate, UploadError, UploadKind, UploadRequest, MAX_UPLOAD_BYTES};
