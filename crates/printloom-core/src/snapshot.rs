use serde::{Deserialize, Serialize};

use crate::layering::SceneEntry;
use crate::object::{ObjectId, SceneObject};
use crate::scene::Scene;

/// An immutable serialized capture of the user-content band, taken for the
/// history stack and for persistence.
///
/// Fixed layers are deliberately excluded: template and mask belong to the
/// active variant and are re-added on every restore, so history can never
/// resurrect a stale template after a variant switch. Volatile render caches
/// never enter the snapshot; only identity, content, and placement do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub objects: Vec<SceneObject>,
    pub selected: Option<ObjectId>,
}

impl SceneSnapshot {
    /// Capture the current user band.
    pub fn capture(scene: &Scene) -> Self {
        Self {
            objects: scene.user_content().to_vec(),
            selected: scene.selected_id(),
        }
    }

    pub fn has_user_content(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Scene {
    /// Full scene replacement from a snapshot: keep the current fixed layers,
    /// rebuild the user band from the snapshot, and re-normalize, because
    /// the snapshot's entry order is not guaranteed to satisfy the
    /// invariant.
    pub fn restore(&mut self, snapshot: &SceneSnapshot) {
        let mut entries: Vec<SceneEntry> = Vec::with_capacity(snapshot.objects.len() + 2);
        if let Some(t) = self.template() {
            entries.push(SceneEntry::Fixed(t.clone()));
        }
        if let Some(m) = self.mask() {
            entries.push(SceneEntry::Fixed(m.clone()));
        }
        entries.extend(snapshot.objects.iter().cloned().map(SceneEntry::Object));

        *self = Scene::from_entries(entries);
        if let Some(id) = snapshot.selected {
            self.select(id);
        }
    }
}
