use thiserror::Error;

use printloom_ingest::UploadError;
use printloom_io::{FormatError, StoreError, VariantError};
use printloom_render::{AssetError, PreviewError, SurfaceError};

/// Session-level error taxonomy.
///
/// Configuration errors ([`SessionError::Surface`]) are fatal to
/// initialization. Validation, decode, and timeout errors are recoverable
/// and reported inline; the scene is reset defensively before any of them
/// surface. Auto-save failures never appear here; they are logged and
/// swallowed inside the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error("variant load failed: {0}")]
    LoadFailed(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("text content is required")]
    EmptyText,

    #[error("a font family, size, and color are required")]
    IncompleteTextStyle,

    #[error("add at least one image or text before applying the design")]
    EmptyDesign,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error("design session is closed")]
    Closed,
}
