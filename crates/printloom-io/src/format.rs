use serde::{Deserialize, Serialize};
use thiserror::Error;

use printloom_core::SceneSnapshot;

/// Current design format version. Bumped on any incompatible schema change.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported design format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// The wire form of a design: a versioned envelope around a scene snapshot
/// plus the surface geometry it was authored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedScene {
    pub version: u32,
    pub surface_width: f64,
    pub surface_height: f64,
    pub snapshot: SceneSnapshot,
}

impl SerializedScene {
    pub fn new(surface_width: f64, surface_height: f64, snapshot: SceneSnapshot) -> Self {
        Self {
            version: FORMAT_VERSION,
            surface_width,
            surface_height,
            snapshot,
        }
    }

    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let scene: Self = serde_json::from_str(json)?;
        if scene.version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: scene.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printloom_core::{Color, Placement, Point, Scene, SceneObject, TextObject};

    fn sample_snapshot() -> SceneSnapshot {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::text(
            TextObject {
                content: "Hello".to_string(),
                font_family: "Inter".to_string(),
                font_size: 48.0,
                fill: Color::new(20, 30, 40),
            },
            Placement::at(Point::new(210.0, 210.0)),
        ));
        SceneSnapshot::capture(&scene)
    }

    #[test]
    fn test_envelope_roundtrip() {
        let design = SerializedScene::new(420.0, 420.0, sample_snapshot());
        let json = design.to_json().unwrap();
        let back = SerializedScene::from_json(&json).unwrap();
        assert_eq!(design, back);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut design = SerializedScene::new(420.0, 420.0, sample_snapshot());
        design.version = 99;
        let json = serde_json::to_string(&design).unwrap();
        let err = SerializedScene::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnsupportedVersion { found: 99, .. }
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            SerializedScene::from_json("{not json").unwrap_err(),
            FormatError::Json(_)
        ));
    }
}
