use log::debug;

use crate::snapshot::SceneSnapshot;

/// Maximum retained history depth. Older entries are evicted from the front.
pub const MAX_HISTORY: usize = 50;

/// What multi-step operation the session is currently inside of.
///
/// The typed replacement for the source's ambient mutable flags: programmatic
/// scene rebuilds (a restore, a reorder mid-flight, a design load) must not
/// commit history entries of their own, or undo would undo the undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Ingesting,
    Restoring,
    Reordering,
    LoadingDesign,
}

impl EditPhase {
    /// Only direct user actions, committed from the idle phase, record history.
    pub fn suppresses_history(self) -> bool {
        !matches!(self, EditPhase::Idle)
    }
}

/// Linear undo/redo over full scene snapshots: a flat entry list plus a
/// cursor. No branching: committing while undone discards everything past
/// the cursor.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<SceneSnapshot>,
    /// Index of the entry matching the live scene. Meaningless while empty.
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot, truncating any redo tail first. Returns whether the
    /// entry was recorded; commits are suppressed outside the idle phase.
    pub fn commit(&mut self, snapshot: SceneSnapshot, phase: EditPhase) -> bool {
        if phase.suppresses_history() {
            debug!("history commit suppressed during {phase:?}");
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Undo is blocked when no prior entry contains user content: stepping
    /// back into a blank design would leave the scene in a state the editor
    /// has no use for.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
            && self.entries[..self.cursor]
                .iter()
                .any(SceneSnapshot::has_user_content)
    }

    /// Redo is a no-op at the newest entry.
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Step the cursor back and return the snapshot to restore.
    pub fn undo(&mut self) -> Option<&SceneSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step the cursor forward and return the snapshot to restore.
    pub fn redo(&mut self) -> Option<&SceneSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// The entry matching the live scene.
    pub fn current(&self) -> Option<&SceneSnapshot> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
