//! # Printloom I/O
//!
//! The wire side of the design canvas: the versioned JSON envelope a design
//! serializes to, the per-variant template/mask record the host's product
//! data source supplies, and the persistence boundary traits the session
//! orchestrator hands finished designs to.

pub mod format;
pub mod store;
pub mod variant;

pub use format::{FormatError, SerializedScene, FORMAT_VERSION};
pub use store::{AssetFetcher, DesignStore, FileFetcher, FileStore, StoreError};
pub use variant::{VariantError, VariantRecord};
