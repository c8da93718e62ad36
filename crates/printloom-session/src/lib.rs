//! # Printloom Session
//!
//! The session orchestrator: wires the scene model, history recorder,
//! drawing surface, ingestion pipeline, and persistence boundaries into one
//! modal editing session with auto-save, variant switching, and the terminal
//! apply step.

pub mod error;
pub mod session;
pub mod telemetry;

pub use error::SessionError;
pub use session::{
    EditorSession, SessionConfig, SessionState, TextInput, UploadOutcome, VariantData,
    VariantLoad, AUTOSAVE_INTERVAL,
};
pub use telemetry::{LogTelemetry, RecordingTelemetry, Telemetry, TelemetryEvent};
