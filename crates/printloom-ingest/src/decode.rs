use image::RgbaImage;

use printloom_core::SourceDigest;

use crate::validate::{self, UploadError, UploadKind, UploadRequest};

/// A fully decoded upload, ready for placement.
#[derive(Debug, Clone)]
pub struct DecodedUpload {
    pub file_name: String,
    pub kind: UploadKind,
    pub byte_len: usize,
    pub width: u32,
    pub height: u32,
    pub digest: SourceDigest,
    pub pixels: RgbaImage,
}

/// Validate and decode one upload. A decode that "succeeds" with zero
/// dimensions is reported as a failure, since it is indistinguishable from one.
pub fn decode(request: &UploadRequest) -> Result<DecodedUpload, UploadError> {
    let kind = validate::validate(request)?;
    let pixels = image::load_from_memory(&request.bytes)
        .map_err(|source| UploadError::DecodeFailed {
            name: request.file_name.clone(),
            source,
        })?
        .to_rgba8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(UploadError::EmptyImage {
            name: request.file_name.clone(),
        });
    }
    Ok(DecodedUpload {
        file_name: request.file_name.clone(),
        kind,
        byte_len: request.bytes.len(),
        width,
        height,
        digest: SourceDigest::of_bytes(&request.bytes),
        pixels,
    })
}
