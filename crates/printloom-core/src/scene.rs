use serde::{Deserialize, Serialize};

use crate::layering::{self, Bands, SceneEntry};
use crate::object::{FixedLayer, FixedLayerRole, ObjectId, SceneObject, SourceDigest};

/// A borrowed view of one stacked entry, bottom to top.
#[derive(Debug, Clone, Copy)]
pub enum StackEntry<'a> {
    Fixed(&'a FixedLayer),
    Object(&'a SceneObject),
}

/// The complete drawing-surface state: two fixed layers sandwiching the
/// user-content band. The stacking invariant (template bottommost, mask
/// topmost, user content strictly between) holds by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    template: Option<FixedLayer>,
    mask: Option<FixedLayer>,
    user_content: Vec<SceneObject>,
    selected: Option<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a scene from a flat entry list of unspecified order.
    pub fn from_entries(entries: Vec<SceneEntry>) -> Self {
        let Bands {
            template,
            user_content,
            mask,
        } = layering::normalize(entries);
        Self {
            template,
            mask,
            user_content,
            selected: None,
        }
    }

    // ── Fixed layers ─────────────────────────────────────────────────

    pub fn set_template(&mut self, layer: FixedLayer) {
        debug_assert!(layer.role == FixedLayerRole::Template);
        self.template = Some(layer);
    }

    pub fn set_mask(&mut self, layer: FixedLayer) {
        debug_assert!(layer.role == FixedLayerRole::Mask);
        self.mask = Some(layer);
    }

    pub fn template(&self) -> Option<&FixedLayer> {
        self.template.as_ref()
    }

    pub fn mask(&self) -> Option<&FixedLayer> {
        self.mask.as_ref()
    }

    pub fn template_mut(&mut self) -> Option<&mut FixedLayer> {
        self.template.as_mut()
    }

    pub fn mask_mut(&mut self) -> Option<&mut FixedLayer> {
        self.mask.as_mut()
    }

    // ── User content ─────────────────────────────────────────────────

    /// Add a user-content object above all existing user content and select
    /// it. The mask stays topmost by construction.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.user_content.push(object);
        self.selected = Some(id);
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.user_content.iter().position(|o| o.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.user_content.remove(index))
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.user_content.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.user_content.iter_mut().find(|o| o.id == id)
    }

    pub fn user_content(&self) -> &[SceneObject] {
        &self.user_content
    }

    pub fn user_count(&self) -> usize {
        self.user_content.len()
    }

    pub fn has_user_content(&self) -> bool {
        !self.user_content.is_empty()
    }

    /// Replace the entire user band, preserving the given order.
    pub fn set_user_content(&mut self, objects: Vec<SceneObject>) {
        self.selected = None;
        self.user_content = objects;
    }

    /// Whether any selectable image on the scene has this source digest.
    pub fn contains_source(&self, digest: &SourceDigest) -> bool {
        self.user_content
            .iter()
            .any(|o| o.source_digest() == Some(digest))
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn select(&mut self, id: ObjectId) -> bool {
        if self.user_content.iter().any(|o| o.id == id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.selected
    }

    // ── Stacking ─────────────────────────────────────────────────────

    /// Move an object one step toward the mask, clamped inside the band.
    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        layering::bring_forward(&mut self.user_content, id)
    }

    /// Move an object one step toward the template, clamped inside the band.
    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        layering::send_backward(&mut self.user_content, id)
    }

    /// Render order: template, user content, mask.
    pub fn flatten(&self) -> Vec<StackEntry<'_>> {
        let mut entries = Vec::with_capacity(self.user_content.len() + 2);
        if let Some(t) = &self.template {
            entries.push(StackEntry::Fixed(t));
        }
        entries.extend(self.user_content.iter().map(StackEntry::Object));
        if let Some(m) = &self.mask {
            entries.push(StackEntry::Fixed(m));
        }
        entries
    }

    /// Owned flat entry list, for normalization round-trips.
    pub fn to_entries(&self) -> Vec<SceneEntry> {
        let mut entries = Vec::with_capacity(self.user_content.len() + 2);
        if let Some(t) = &self.template {
            entries.push(SceneEntry::Fixed(t.clone()));
        }
        entries.extend(self.user_content.iter().cloned().map(SceneEntry::Object));
        if let Some(m) = &self.mask {
            entries.push(SceneEntry::Fixed(m.clone()));
        }
        entries
    }

    /// Total stacked object count, fixed layers included.
    pub fn len(&self) -> usize {
        self.user_content.len()
            + usize::from(self.template.is_some())
            + usize::from(self.mask.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the user band but keep the fixed layers.
    pub fn clear_user_content(&mut self) {
        self.user_content.clear();
        self.selected = None;
    }

    /// Release every object, fixed layers included.
    pub fn clear(&mut self) {
        self.template = None;
        self.mask = None;
        self.user_content.clear();
        self.selected = None;
    }
}
