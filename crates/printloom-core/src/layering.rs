//! The layer arbiter: restores the three-band stacking order from arbitrary
//! flat object lists and keeps user-content reordering inside its band.
//!
//! The live [`Scene`](crate::scene::Scene) holds the bands explicitly, so the
//! invariant is true by construction there. Normalization is still needed
//! whenever a scene is rebuilt from a flat serialized form, where entry order
//! is not guaranteed.

use log::warn;

use crate::object::{FixedLayer, FixedLayerRole, ObjectId, SceneObject};

/// One owned entry of a flattened scene, bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntry {
    Fixed(FixedLayer),
    Object(SceneObject),
}

/// The three bands of a normalized scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bands {
    pub template: Option<FixedLayer>,
    pub user_content: Vec<SceneObject>,
    pub mask: Option<FixedLayer>,
}

/// Partition a flat entry list into template / user content / mask.
///
/// The first template and first mask encountered win; duplicates are dropped
/// with a warning. User-content objects keep their relative order. Applying
/// `normalize` to the flattened output of a previous `normalize` yields the
/// same bands.
pub fn normalize(entries: Vec<SceneEntry>) -> Bands {
    let mut bands = Bands::default();
    for entry in entries {
        match entry {
            SceneEntry::Fixed(layer) => match layer.role {
                FixedLayerRole::Template => {
                    if bands.template.is_some() {
                        warn!("dropping extra template layer during normalization");
                    } else {
                        bands.template = Some(layer);
                    }
                }
                FixedLayerRole::Mask => {
                    if bands.mask.is_some() {
                        warn!("dropping extra mask layer during normalization");
                    } else {
                        bands.mask = Some(layer);
                    }
                }
            },
            SceneEntry::Object(obj) => bands.user_content.push(obj),
        }
    }
    bands
}

impl Bands {
    /// Flatten back to render order: template, user content, mask.
    pub fn into_entries(self) -> Vec<SceneEntry> {
        let mut entries = Vec::with_capacity(self.user_content.len() + 2);
        if let Some(t) = self.template {
            entries.push(SceneEntry::Fixed(t));
        }
        entries.extend(self.user_content.into_iter().map(SceneEntry::Object));
        if let Some(m) = self.mask {
            entries.push(SceneEntry::Fixed(m));
        }
        entries
    }
}

/// Move a user-content object one step toward the mask. Clamped: the topmost
/// user object stays strictly below the mask.
pub fn bring_forward(objects: &mut [SceneObject], id: ObjectId) -> bool {
    match objects.iter().position(|o| o.id == id) {
        Some(i) if i + 1 < objects.len() => {
            objects.swap(i, i + 1);
            true
        }
        _ => false,
    }
}

/// Move a user-content object one step toward the template. Clamped: the
/// bottommost user object stays strictly above the template.
pub fn send_backward(objects: &mut [SceneObject], id: ObjectId) -> bool {
    match objects.iter().position(|o| o.id == id) {
        Some(i) if i > 0 => {
            objects.swap(i, i - 1);
            true
        }
        _ => false,
    }
}
