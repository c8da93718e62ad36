use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-file upload ceiling. Enforced before any decode is attempted.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Image formats accepted into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl UploadKind {
    pub fn mime(&self) -> &'static str {
        match self {
            UploadKind::Jpeg => "image/jpeg",
            UploadKind::Png => "image/png",
            UploadKind::Gif => "image/gif",
            UploadKind::Webp => "image/webp",
        }
    }

    fn from_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(UploadKind::Jpeg),
            image::ImageFormat::Png => Some(UploadKind::Png),
            image::ImageFormat::Gif => Some(UploadKind::Gif),
            image::ImageFormat::WebP => Some(UploadKind::Webp),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{name:?} is {size} bytes, over the {limit}-byte upload limit")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("{name:?} is not a supported image type (jpeg, png, gif, webp)")]
    UnsupportedType { name: String },

    #[error("could not decode {name:?}: {source}")]
    DecodeFailed {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{name:?} decoded to an image with no usable pixels")]
    EmptyImage { name: String },

    #[error("upload of {name:?} timed out before the image finished decoding")]
    TimedOut { name: String },
}

/// One file handed to the ingestion entry point.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    /// The type the host declared (e.g. from the file input). Advisory only;
    /// the sniffed magic bytes decide.
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            declared_type: None,
            bytes,
        }
    }
}

/// Gate a file on size and sniffed type. Rejections are descriptive and
/// happen before the file enters the pipeline.
pub fn validate(request: &UploadRequest) -> Result<UploadKind, UploadError> {
    if request.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            name: request.file_name.clone(),
            size: request.bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    image::guess_format(&request.bytes)
        .ok()
        .and_then(UploadKind::from_format)
        .ok_or_else(|| UploadError::UnsupportedType {
            name: request.file_name.clone(),
        })
}
