use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VariantError {
    #[error("malformed variant record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("variant record is missing the {0} url")]
    MissingUrl(&'static str),
}

/// The template/mask pair a product variant contributes to the canvas.
///
/// The host's product data source stores this as camelCase JSON
/// (`{"baseImage": ..., "alphaMask": ...}`); malformed JSON is a hard
/// failure that aborts the variant load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub base_image: String,
    pub alpha_mask: String,
}

impl VariantRecord {
    pub fn from_json(json: &str) -> Result<Self, VariantError> {
        let record: Self = serde_json::from_str(json)?;
        if record.base_image.is_empty() {
            return Err(VariantError::MissingUrl("baseImage"));
        }
        if record.alpha_mask.is_empty() {
            return Err(VariantError::MissingUrl("alphaMask"));
        }
        Ok(record)
    }
}
