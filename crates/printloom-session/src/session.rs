//! The session orchestrator: one modal editing session over one design.
//!
//! Owns the scene, history, surface, asset store, and upload tracker, and
//! wires them to the host-provided persistence and asset boundaries. All
//! mutating operations run to completion before returning; asynchronous
//! decode completions and timer expiry enter through [`EditorSession::finish_upload`]
//! and [`EditorSession::tick`], which keeps every interleaving testable.

use std::time::{Duration, Instant};

use log::{error, info, warn};

use printloom_core::spatial::HitIndex;
use printloom_core::{
    Color, EditPhase, FixedLayer, FixedLayerRole, History, ObjectId, Placement, Point, Scene,
    SceneObject, SceneSnapshot, TextObject, UploadId,
};
use printloom_ingest::{
    DecodedUpload, IngestOutcome, PlacementContext, UploadError, UploadRequest, UploadTracker,
};
use printloom_io::{AssetFetcher, DesignStore, SerializedScene, VariantRecord};
use printloom_render::{
    encode_png, render_preview, AssetStore, ContainerSize, RenderFrame, Surface,
};

use crate::error::SessionError;
use crate::telemetry::{Telemetry, TelemetryEvent};

/// Cadence of the periodic auto-save.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Whether the session is accepting edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Outcome of the active variant's template/mask load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantLoad {
    NotLoaded,
    Loaded,
    Failed,
}

/// Host-supplied parameters for opening a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub product_id: String,
    /// Measured size of the mount element. `None` is a fatal configuration
    /// error; there is nothing to retry.
    pub container: Option<ContainerSize>,
}

/// A variant id plus its raw `{baseImage, alphaMask}` record.
#[derive(Debug, Clone)]
pub struct VariantData {
    pub id: String,
    pub record_json: String,
}

/// Form fields for a new text object. All required.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub fill: Color,
}

/// What happened to one finished upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Placed(ObjectId),
    /// Identical source already on the scene; silently discarded.
    Duplicate,
    /// Completion arrived after its ticket was reset; discarded.
    Stale,
}

pub struct EditorSession<S: DesignStore, F: AssetFetcher> {
    product_id: String,
    variant_id: Option<String>,
    scene: Scene,
    history: History,
    surface: Surface,
    assets: AssetStore,
    uploads: UploadTracker,
    phase: EditPhase,
    state: SessionState,
    variant_load: VariantLoad,
    store: S,
    fetcher: F,
    telemetry: Box<dyn Telemetry>,
    last_autosave: Instant,
}

impl<S: DesignStore, F: AssetFetcher> EditorSession<S, F> {
    /// Open an editing session. Mount failure is fatal; a failed variant
    /// load is logged and surfaced via [`EditorSession::variant_load`] while
    /// the session stays open and empty.
    pub fn open(
        config: SessionConfig,
        store: S,
        fetcher: F,
        telemetry: Box<dyn Telemetry>,
        variant: Option<VariantData>,
        preserved: Option<&SerializedScene>,
        now: Instant,
    ) -> Result<Self, SessionError> {
        let surface = Surface::mount(config.container)?;
        let mut session = Self {
            product_id: config.product_id,
            variant_id: None,
            scene: Scene::new(),
            history: History::new(),
            surface,
            assets: AssetStore::new(),
            uploads: UploadTracker::new(),
            phase: EditPhase::Idle,
            state: SessionState::Open,
            variant_load: VariantLoad::NotLoaded,
            store,
            fetcher,
            telemetry,
            last_autosave: now,
        };

        if let Some(variant) = variant {
            if let Err(e) = session.load_variant(&variant.id, &variant.record_json, preserved) {
                warn!("session opened without a variant: {e}");
            }
        } else if let Some(preserved) = preserved {
            session.restore_preserved(preserved);
        }

        if session.history.is_empty() {
            session.commit_history();
        }
        info!("design session opened for product {:?}", session.product_id);
        Ok(session)
    }

    // ── Variant loading ──────────────────────────────────────────────

    /// Load (or switch to) a variant's template/mask pair. Both images must
    /// decode before the pair is placed; either failure aborts the load and
    /// leaves the previous fixed layers untouched. User content survives a
    /// variant switch.
    pub fn load_variant(
        &mut self,
        variant_id: &str,
        record_json: &str,
        preserved: Option<&SerializedScene>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        let record = match VariantRecord::from_json(record_json) {
            Ok(record) => record,
            Err(e) => {
                self.variant_load = VariantLoad::Failed;
                error!("variant {variant_id:?} has a malformed record: {e}");
                return Err(e.into());
            }
        };

        let (template, mask) = match self.fetch_fixed_layers(&record) {
            Ok(pair) => pair,
            Err(e) => {
                self.variant_load = VariantLoad::Failed;
                error!("variant {variant_id:?} failed to load: {e}");
                return Err(e);
            }
        };

        self.scene.set_template(template);
        self.scene.set_mask(mask);
        self.surface.set_clip_from_mask(self.scene.mask());
        self.variant_id = Some(variant_id.to_string());
        self.variant_load = VariantLoad::Loaded;

        if let Some(preserved) = preserved {
            self.restore_preserved(preserved);
        }
        Ok(())
    }

    /// Fetch and decode both fixed-layer images. Nothing is placed unless
    /// both succeed.
    fn fetch_fixed_layers(
        &mut self,
        record: &VariantRecord,
    ) -> Result<(FixedLayer, FixedLayer), SessionError> {
        let base_bytes = self.fetcher.fetch(&record.base_image)?;
        let (bw, bh) = self.assets.insert_bytes(&record.base_image, &base_bytes)?;
        let mask_bytes = self.fetcher.fetch(&record.alpha_mask)?;
        let (mw, mh) = self.assets.insert_bytes(&record.alpha_mask, &mask_bytes)?;

        let mut template = FixedLayer::new(FixedLayerRole::Template, &record.base_image, bw, bh);
        template.placement = self.fit_placement(bw, bh);
        let mut mask = FixedLayer::new(FixedLayerRole::Mask, &record.alpha_mask, mw, mh);
        mask.placement = self.fit_placement(mw, mh);
        Ok((template, mask))
    }

    /// Center a fixed layer and scale it to fit inside the surface.
    fn fit_placement(&self, width: u32, height: u32) -> Placement {
        let side = self.surface.design_side();
        let scale = (side / f64::from(width.max(1))).min(side / f64::from(height.max(1)));
        Placement::at(self.surface.center()).with_scale(scale)
    }

    /// Rebuild the user band from a preserved design without generating
    /// history entries.
    fn restore_preserved(&mut self, design: &SerializedScene) {
        self.phase = EditPhase::LoadingDesign;
        self.scene.restore(&design.snapshot);
        self.phase = EditPhase::Idle;
        info!(
            "restored {} preserved object(s)",
            self.scene.user_count()
        );
    }

    // ── Text ─────────────────────────────────────────────────────────

    /// Create a styled text object at the default anchor, select it, and
    /// record history. Empty content is a validation error, not a silent
    /// no-op.
    pub fn add_text(&mut self, input: &TextInput) -> Result<ObjectId, SessionError> {
        self.ensure_open()?;
        if input.content.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }
        if input.font_family.trim().is_empty() || input.font_size <= 0.0 {
            return Err(SessionError::IncompleteTextStyle);
        }

        let object = SceneObject::text(
            TextObject {
                content: input.content.clone(),
                font_family: input.font_family.clone(),
                font_size: input.font_size,
                fill: input.fill,
            },
            Placement::at(self.surface.anchor()),
        );
        let id = self.scene.add_object(object);
        self.commit_history();
        self.telemetry.record(TelemetryEvent::TextAdded {
            length: input.content.chars().count(),
            font: input.font_family.clone(),
            size: input.font_size,
        });
        Ok(id)
    }

    // ── Uploads ──────────────────────────────────────────────────────

    /// Validate a file and issue its correlation ticket. Oversized or
    /// wrong-type files never enter the pipeline.
    pub fn begin_upload(
        &mut self,
        request: &UploadRequest,
        now: Instant,
    ) -> Result<UploadId, SessionError> {
        self.ensure_open()?;
        printloom_ingest::validate(request)?;
        Ok(self.uploads.begin(&request.file_name, now))
    }

    /// Apply one decode completion. Placements commit history and emit
    /// telemetry; duplicates and stale completions are quiet no-ops;
    /// failures reset ingestion state before surfacing.
    pub fn finish_upload(
        &mut self,
        id: UploadId,
        decoded: Result<DecodedUpload, UploadError>,
    ) -> Result<UploadOutcome, SessionError> {
        self.ensure_open()?;
        let ctx = PlacementContext {
            surface_shorter_side: self.surface.shorter_side(),
            anchor: self.surface.anchor(),
        };

        self.phase = EditPhase::Ingesting;
        let result = printloom_ingest::complete(&mut self.uploads, id, decoded, &mut self.scene, &ctx);
        self.phase = EditPhase::Idle;

        match result {
            Ok(IngestOutcome::Placed {
                object_id,
                digest,
                pixels,
                file_name,
                file_size,
                file_type,
            }) => {
                self.assets.insert_decoded(digest.as_str(), pixels);
                self.commit_history();
                self.telemetry.record(TelemetryEvent::ImageAdded {
                    file_size,
                    file_type,
                });
                info!("placed upload {file_name:?}");
                Ok(UploadOutcome::Placed(object_id))
            }
            Ok(IngestOutcome::Duplicate { .. }) => Ok(UploadOutcome::Duplicate),
            Ok(IngestOutcome::Stale { .. }) => Ok(UploadOutcome::Stale),
            Err(e) => Err(e.into()),
        }
    }

    /// Validate, decode, and place a batch. Files are independent: one
    /// rejection does not stop the rest.
    pub fn upload_files(
        &mut self,
        files: &[UploadRequest],
        now: Instant,
    ) -> Vec<Result<UploadOutcome, SessionError>> {
        files
            .iter()
            .map(|request| {
                let id = self.begin_upload(request, now)?;
                let decoded = printloom_ingest::decode(request);
                self.finish_upload(id, decoded)
            })
            .collect()
    }

    /// In-flight upload count. Zero whenever no decode is outstanding.
    pub fn uploads_in_flight(&self) -> usize {
        self.uploads.active_count()
    }

    /// Propagate a container resize to the surface. Placements live in
    /// design space, so zoom rescaling keeps every object (fixed layers
    /// included) visually consistent without touching the scene.
    pub fn handle_resize(&mut self, container: ContainerSize) -> f64 {
        self.surface.handle_resize(container)
    }

    // ── Timers ───────────────────────────────────────────────────────

    /// Drive time-based behavior: expire stuck uploads (surfaced as timeout
    /// errors) and run the periodic auto-save. Empty designs are never
    /// persisted; store failures are logged and swallowed.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionError> {
        let mut surfaced = Vec::new();
        if self.state != SessionState::Open {
            return surfaced;
        }

        for ticket in self.uploads.take_expired(now) {
            warn!("upload {:?} timed out", ticket.file_name);
            surfaced.push(SessionError::Upload(UploadError::TimedOut {
                name: ticket.file_name,
            }));
        }

        if now.saturating_duration_since(self.last_autosave) >= AUTOSAVE_INTERVAL {
            self.last_autosave = now;
            if self.scene.has_user_content() {
                let variant = self.variant_id.clone().unwrap_or_default();
                match self.serialize_design() {
                    Ok(design) => {
                        if let Err(e) = self.store.autosave(&design, &self.product_id, &variant) {
                            warn!("autosave failed (ignored): {e}");
                        }
                    }
                    Err(e) => warn!("autosave serialization failed (ignored): {e}"),
                }
            }
        }
        surfaced
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous history entry via full scene replacement.
    pub fn undo(&mut self) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore_snapshot(&snapshot);
        true
    }

    /// Restore the next history entry via full scene replacement.
    pub fn redo(&mut self) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore_snapshot(&snapshot);
        true
    }

    fn restore_snapshot(&mut self, snapshot: &SceneSnapshot) {
        self.phase = EditPhase::Restoring;
        self.scene.restore(snapshot);
        self.phase = EditPhase::Idle;
    }

    fn commit_history(&mut self) -> bool {
        self.history
            .commit(SceneSnapshot::capture(&self.scene), self.phase)
    }

    // ── Object manipulation ──────────────────────────────────────────

    /// Move a user object one step toward the mask. Clamped to the band.
    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        self.reorder(id, true)
    }

    /// Move a user object one step toward the template. Clamped to the band.
    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        self.reorder(id, false)
    }

    fn reorder(&mut self, id: ObjectId, forward: bool) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        self.phase = EditPhase::Reordering;
        let moved = if forward {
            self.scene.bring_forward(id)
        } else {
            self.scene.send_backward(id)
        };
        self.phase = EditPhase::Idle;
        if moved {
            self.commit_history();
        }
        moved
    }

    /// Update a user object's placement (the end of a drag/scale/rotate
    /// gesture) and record history.
    pub fn update_placement(&mut self, id: ObjectId, placement: Placement) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        match self.scene.object_mut(id) {
            Some(object) => {
                object.placement = placement;
                self.commit_history();
                true
            }
            None => false,
        }
    }

    /// Remove a user object and record history.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        if self.scene.remove_object(id).is_some() {
            self.commit_history();
            true
        } else {
            false
        }
    }

    /// Hit-test a click and update the selection. Fixed layers are never
    /// selectable.
    pub fn select_at(&mut self, point: Point) -> Option<ObjectId> {
        let index = HitIndex::from_scene(&self.scene);
        match index.pick(&point) {
            Some(id) => {
                self.scene.select(id);
                Some(id)
            }
            None => {
                self.scene.deselect();
                None
            }
        }
    }

    // ── Apply / teardown ─────────────────────────────────────────────

    /// Serialize the current design against the surface it was authored on.
    pub fn serialize_design(&self) -> Result<SerializedScene, SessionError> {
        let side = self.surface.design_side();
        Ok(SerializedScene::new(
            side,
            side,
            SceneSnapshot::capture(&self.scene),
        ))
    }

    /// The terminal apply step: render the flattened preview, serialize the
    /// scene, hand both to the store, and close. Rejected with a
    /// user-visible error when no user content exists; the session stays
    /// open.
    pub fn apply(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !self.scene.has_user_content() {
            return Err(SessionError::EmptyDesign);
        }
        let preview = render_preview(&self.scene, &self.surface, &self.assets);
        let png = encode_png(&preview)?;
        let design = self.serialize_design()?;
        self.store.apply_design(&design, &png)?;
        info!("design applied for product {:?}", self.product_id);
        self.close();
        Ok(())
    }

    /// Tear down without saving.
    pub fn close(&mut self) {
        self.scene.clear();
        self.history.clear();
        self.uploads.clear();
        self.assets.clear();
        self.surface.clear_clip_bounds();
        self.state = SessionState::Closed;
        info!("design session closed");
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Open {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn variant_load(&self) -> VariantLoad {
        self.variant_load
    }

    pub fn variant_id(&self) -> Option<&str> {
        self.variant_id.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Frame data for a host canvas.
    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame::build(&self.scene, &self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::RecordingTelemetry;
    use printloom_core::{FixedLayerRole, StackEntry};
    use printloom_io::StoreError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::rc::Rc;

    // ── Boundary fakes ───────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct MemoryStore {
        autosaves: Rc<RefCell<Vec<(String, String)>>>,
        applied: Rc<RefCell<Option<(String, Vec<u8>)>>>,
        fail_autosave: bool,
    }

    impl DesignStore for MemoryStore {
        fn autosave(
            &mut self,
            design: &SerializedScene,
            product_id: &str,
            _variant_id: &str,
        ) -> Result<(), StoreError> {
            if self.fail_autosave {
                return Err(StoreError::NotFound("backend down".to_string()));
            }
            self.autosaves
                .borrow_mut()
                .push((product_id.to_string(), design.to_json().unwrap()));
            Ok(())
        }

        fn apply_design(
            &mut self,
            design: &SerializedScene,
            preview_png: &[u8],
        ) -> Result<(), StoreError> {
            *self.applied.borrow_mut() =
                Some((design.to_json().unwrap(), preview_png.to_vec()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryFetcher {
        files: HashMap<String, Vec<u8>>,
    }

    impl AssetFetcher for MemoryFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, StoreError> {
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(url.to_string()))
        }
    }

    fn png_bytes(w: u32, h: u32, seed: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([seed, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn fetcher_with_variant() -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::default();
        fetcher.files.insert("A.png".to_string(), png_bytes(8, 8, 1));
        fetcher.files.insert("B.png".to_string(), png_bytes(8, 8, 2));
        fetcher
    }

    fn config() -> SessionConfig {
        SessionConfig {
            product_id: "mug-11oz".to_string(),
            container: Some(ContainerSize::new(1000.0, 800.0)),
        }
    }

    fn variant() -> VariantData {
        VariantData {
            id: "red-large".to_string(),
            record_json: r#"{"baseImage": "A.png", "alphaMask": "B.png"}"#.to_string(),
        }
    }

    fn text_input(content: &str) -> TextInput {
        TextInput {
            content: content.to_string(),
            font_family: "Inter".to_string(),
            font_size: 48.0,
            fill: Color::new(20, 20, 20),
        }
    }

    fn open_with_variant(
        store: MemoryStore,
        telemetry: RecordingTelemetry,
    ) -> EditorSession<MemoryStore, MemoryFetcher> {
        EditorSession::open(
            config(),
            store,
            fetcher_with_variant(),
            Box::new(telemetry),
            Some(variant()),
            None,
            Instant::now(),
        )
        .unwrap()
    }

    // ── Scenarios ────────────────────────────────────────────────────

    #[test]
    fn test_open_places_template_then_mask() {
        let session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        assert_eq!(session.variant_load(), VariantLoad::Loaded);
        assert_eq!(session.scene().len(), 2);

        let scene = session.scene();
        let flat = scene.flatten();
        assert!(matches!(flat[0], StackEntry::Fixed(l) if l.role == FixedLayerRole::Template));
        assert!(matches!(flat[1], StackEntry::Fixed(l) if l.role == FixedLayerRole::Mask));
        assert!(session.surface().clip_bounds().is_some());
    }

    #[test]
    fn test_missing_container_is_fatal() {
        let result = EditorSession::open(
            SessionConfig {
                product_id: "mug".to_string(),
                container: None,
            },
            MemoryStore::default(),
            MemoryFetcher::default(),
            Box::new(RecordingTelemetry::new()),
            None,
            None,
            Instant::now(),
        );
        assert!(matches!(result, Err(SessionError::Surface(_))));
    }

    #[test]
    fn test_add_text_then_apply() {
        let store = MemoryStore::default();
        let telemetry = RecordingTelemetry::new();
        let mut session = open_with_variant(store.clone(), telemetry.clone());

        let id = session.add_text(&text_input("Hello")).unwrap();
        assert_eq!(session.scene().len(), 3);
        let flat = session.scene().flatten();
        assert!(matches!(flat[1], StackEntry::Object(o) if o.id == id));

        session.apply().unwrap();
        assert!(store.applied.borrow().is_some());
        assert_eq!(session.state(), SessionState::Closed);

        let events = telemetry.events();
        assert!(matches!(
            events[0],
            TelemetryEvent::TextAdded { length: 5, .. }
        ));
    }

    #[test]
    fn test_apply_rejects_empty_design() {
        let store = MemoryStore::default();
        let mut session = open_with_variant(store.clone(), RecordingTelemetry::new());

        let err = session.apply().unwrap_err();
        assert!(matches!(err, SessionError::EmptyDesign));
        assert_eq!(session.state(), SessionState::Open);
        assert!(store.applied.borrow().is_none());
    }

    #[test]
    fn test_oversized_upload_rejected_before_decode() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let oversized = UploadRequest::new("big.png", vec![0u8; 6 * 1024 * 1024]);

        let results = session.upload_files(&[oversized], Instant::now());
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            SessionError::Upload(UploadError::TooLarge { .. })
        ));
        assert_eq!(session.scene().len(), 2);
        assert_eq!(session.uploads_in_flight(), 0);
    }

    #[test]
    fn test_duplicate_upload_suppressed_end_to_end() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let bytes = png_bytes(16, 16, 9);
        let files = [
            UploadRequest::new("photo.png", bytes.clone()),
            UploadRequest::new("photo-copy.png", bytes),
        ];

        let results = session.upload_files(&files, Instant::now());
        assert!(matches!(results[0], Ok(UploadOutcome::Placed(_))));
        assert!(matches!(results[1], Ok(UploadOutcome::Duplicate)));
        assert_eq!(session.scene().user_count(), 1);
    }

    #[test]
    fn test_upload_placement_uses_clip_anchor_and_fill() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let results =
            session.upload_files(&[UploadRequest::new("p.png", png_bytes(100, 50, 3))], Instant::now());
        let Ok(UploadOutcome::Placed(id)) = results[0] else {
            panic!("expected placement");
        };

        let object = session.scene().object(id).unwrap();
        let anchor = session.surface().anchor();
        assert!((object.placement.center.x - anchor.x).abs() < 1e-10);
        let expected_scale = session.surface().shorter_side() * 0.8 / 100.0;
        assert!((object.placement.scale - expected_scale).abs() < 1e-10);
    }

    #[test]
    fn test_undo_redo_roundtrip_through_session() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        session.add_text(&text_input("one")).unwrap();
        session.add_text(&text_input("two")).unwrap();
        assert!(session.can_undo());

        assert!(session.undo());
        assert_eq!(session.scene().user_count(), 1);
        assert!(session.can_redo());

        assert!(session.redo());
        assert_eq!(session.scene().user_count(), 2);
        assert!(!session.can_redo());
    }

    #[test]
    fn test_undo_blocked_at_empty_design() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        session.add_text(&text_input("only")).unwrap();

        // The only prior entry is the blank baseline.
        assert!(!session.can_undo());
        assert!(!session.undo());
        assert_eq!(session.scene().user_count(), 1);
    }

    #[test]
    fn test_new_action_discards_redo_tail() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        session.add_text(&text_input("one")).unwrap();
        session.add_text(&text_input("two")).unwrap();
        session.undo();
        assert!(session.can_redo());

        session.add_text(&text_input("three")).unwrap();
        assert!(!session.can_redo());
    }

    #[test]
    fn test_autosave_skips_empty_design() {
        let store = MemoryStore::default();
        let mut session = open_with_variant(store.clone(), RecordingTelemetry::new());
        let later = Instant::now() + Duration::from_secs(31);
        session.tick(later);
        assert!(store.autosaves.borrow().is_empty());
    }

    #[test]
    fn test_autosave_persists_user_content_and_swallows_failures() {
        let store = MemoryStore::default();
        let mut session = open_with_variant(store.clone(), RecordingTelemetry::new());
        session.add_text(&text_input("keep me")).unwrap();

        let later = Instant::now() + Duration::from_secs(31);
        session.tick(later);
        assert_eq!(store.autosaves.borrow().len(), 1);

        // A failing store never surfaces during editing.
        let failing = MemoryStore {
            fail_autosave: true,
            ..MemoryStore::default()
        };
        let mut session = open_with_variant(failing, RecordingTelemetry::new());
        session.add_text(&text_input("still editing")).unwrap();
        let errors = session.tick(Instant::now() + Duration::from_secs(31));
        assert!(errors.is_empty());
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn test_tick_surfaces_upload_timeouts() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let now = Instant::now();
        let request = UploadRequest::new("slow.png", png_bytes(4, 4, 5));
        session.begin_upload(&request, now).unwrap();
        assert_eq!(session.uploads_in_flight(), 1);

        let errors = session.tick(now + Duration::from_secs(11));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            SessionError::Upload(UploadError::TimedOut { .. })
        ));
        assert_eq!(session.uploads_in_flight(), 0);
    }

    #[test]
    fn test_stale_completion_after_timeout_is_discarded() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let now = Instant::now();
        let request = UploadRequest::new("late.png", png_bytes(4, 4, 6));
        let id = session.begin_upload(&request, now).unwrap();

        session.tick(now + Duration::from_secs(11));
        let decoded = printloom_ingest::decode(&request);
        let outcome = session.finish_upload(id, decoded).unwrap();
        assert_eq!(outcome, UploadOutcome::Stale);
        assert_eq!(session.scene().user_count(), 0);
    }

    #[test]
    fn test_malformed_variant_record_surfaces_load_failure() {
        let session = EditorSession::open(
            config(),
            MemoryStore::default(),
            fetcher_with_variant(),
            Box::new(RecordingTelemetry::new()),
            Some(VariantData {
                id: "broken".to_string(),
                record_json: "{baseImage".to_string(),
            }),
            None,
            Instant::now(),
        )
        .unwrap();
        assert_eq!(session.variant_load(), VariantLoad::Failed);
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.scene().len(), 0);
    }

    #[test]
    fn test_missing_mask_asset_fails_whole_load() {
        let mut fetcher = MemoryFetcher::default();
        fetcher.files.insert("A.png".to_string(), png_bytes(8, 8, 1));
        // B.png deliberately absent.
        let session = EditorSession::open(
            config(),
            MemoryStore::default(),
            fetcher,
            Box::new(RecordingTelemetry::new()),
            Some(variant()),
            None,
            Instant::now(),
        )
        .unwrap();
        assert_eq!(session.variant_load(), VariantLoad::Failed);
        // Neither fixed layer was placed.
        assert_eq!(session.scene().len(), 0);
    }

    #[test]
    fn test_preserved_design_restored_without_history_entries() {
        let mut donor = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        donor.add_text(&text_input("carry me over")).unwrap();
        let preserved = donor.serialize_design().unwrap();

        let session = EditorSession::open(
            config(),
            MemoryStore::default(),
            fetcher_with_variant(),
            Box::new(RecordingTelemetry::new()),
            Some(variant()),
            Some(&preserved),
            Instant::now(),
        )
        .unwrap();
        assert_eq!(session.scene().user_count(), 1);
        // The restore itself must not be undoable.
        assert!(!session.can_undo());
    }

    #[test]
    fn test_reorder_commits_history_and_clamps() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let a = session.add_text(&text_input("a")).unwrap();
        let b = session.add_text(&text_input("b")).unwrap();

        assert!(!session.bring_forward(b));
        assert!(session.send_backward(b));
        let flat = session.scene().flatten();
        assert!(matches!(flat[1], StackEntry::Object(o) if o.id == b));
        assert!(matches!(flat[2], StackEntry::Object(o) if o.id == a));

        // The reorder is undoable as a single step.
        assert!(session.undo());
        let flat = session.scene().flatten();
        assert!(matches!(flat[1], StackEntry::Object(o) if o.id == a));
    }

    #[test]
    fn test_select_at_picks_topmost_user_object() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let id = session.add_text(&text_input("clickable")).unwrap();
        let anchor = session.surface().anchor();

        assert_eq!(session.select_at(anchor), Some(id));
        assert_eq!(session.select_at(Point::new(-50.0, -50.0)), None);
        assert_eq!(session.scene().selected_id(), None);
    }

    #[test]
    fn test_update_placement_is_undoable() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        session.add_text(&text_input("anchor me")).unwrap();
        let id = session.add_text(&text_input("drag me")).unwrap();
        let original = session.scene().object(id).unwrap().placement;

        let mut moved = original;
        moved.center = Point::new(original.center.x + 40.0, original.center.y);
        assert!(session.update_placement(id, moved));
        assert!(session.undo());

        let restored = session.scene().object(id).unwrap().placement;
        assert!((restored.center.x - original.center.x).abs() < 1e-10);
    }

    #[test]
    fn test_resize_preserves_design_space() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        let id = session.add_text(&text_input("steady")).unwrap();
        let before = session.scene().object(id).unwrap().placement.center;
        let design_before = session.surface().design_side();

        session.handle_resize(ContainerSize::new(500.0, 600.0));
        let after = session.scene().object(id).unwrap().placement.center;
        assert!((before.x - after.x).abs() < 1e-10);
        assert!((session.surface().design_side() - design_before).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        assert!(matches!(
            session.add_text(&text_input("   ")).unwrap_err(),
            SessionError::EmptyText
        ));
        assert_eq!(session.scene().user_count(), 0);
    }

    #[test]
    fn test_closed_session_rejects_edits() {
        let mut session = open_with_variant(MemoryStore::default(), RecordingTelemetry::new());
        session.close();
        assert!(matches!(
            session.add_text(&text_input("too late")).unwrap_err(),
            SessionError::Closed
        ));
        assert!(!session.undo());
    }
}
