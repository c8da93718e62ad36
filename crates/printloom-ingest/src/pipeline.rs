//! The ingestion state machine: one correlation ticket per in-flight file,
//! a bounded safety deadline, stale-completion discard, and duplicate
//! suppression.
//!
//! Decode itself is the suspension point: the host may run it wherever it
//! likes and deliver the result through [`complete`]. Everything before and
//! after the decode is synchronous scene mutation.

use std::time::{Duration, Instant};

use image::RgbaImage;
use log::{debug, info, warn};

use printloom_core::{
    ImageObject, ImageSource, ObjectId, Placement, Point, Scene, SceneObject, SourceDigest,
    UploadId,
};

use crate::decode::DecodedUpload;
use crate::validate::{UploadError, UploadKind};

/// Safety deadline for one file's decode. Bounds worst-case UI lockup from a
/// hung decode; the late result itself is discarded, not cancelled.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// New images are scaled so the larger dimension fits this fraction of the
/// surface's shorter side.
pub const PLACEMENT_FILL: f64 = 0.8;

/// One in-flight decode: correlation id plus its start instant.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub id: UploadId,
    pub file_name: String,
    pub started_at: Instant,
}

/// Tracks in-flight uploads by correlation id, one ticket per file.
#[derive(Debug)]
pub struct UploadTracker {
    active: Vec<UploadTicket>,
    timeout: Duration,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::with_timeout(UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            active: Vec::new(),
            timeout,
        }
    }

    /// Issue a fresh correlation id for a file. A ticket stuck past its
    /// deadline from an earlier call is force-evicted first; a stuck flag
    /// must never permanently block future uploads.
    pub fn begin(&mut self, file_name: &str, now: Instant) -> UploadId {
        for stuck in self.take_expired(now) {
            warn!(
                "force-resetting stuck upload {} ({:?})",
                stuck.id, stuck.file_name
            );
        }
        let ticket = UploadTicket {
            id: uuid::Uuid::new_v4(),
            file_name: file_name.to_string(),
            started_at: now,
        };
        let id = ticket.id;
        self.active.push(ticket);
        id
    }

    /// Remove and return every ticket past its deadline.
    pub fn take_expired(&mut self, now: Instant) -> Vec<UploadTicket> {
        let timeout = self.timeout;
        let mut expired = Vec::new();
        self.active.retain(|ticket| {
            if now.saturating_duration_since(ticket.started_at) >= timeout {
                expired.push(ticket.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn is_active(&self, id: UploadId) -> bool {
        self.active.iter().any(|t| t.id == id)
    }

    /// Clear a ticket on completion (the per-file safety timer).
    pub fn finish(&mut self, id: UploadId) -> Option<UploadTicket> {
        let index = self.active.iter().position(|t| t.id == id)?;
        Some(self.active.remove(index))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Surface geometry the pipeline places new content against.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext {
    pub surface_shorter_side: f64,
    pub anchor: Point,
}

/// Scale a new image so its larger dimension fills [`PLACEMENT_FILL`] of the
/// surface's shorter side, centered on the anchor.
pub fn placement_for(width: u32, height: u32, ctx: &PlacementContext) -> Placement {
    let larger = f64::from(width.max(height)).max(1.0);
    let scale = ctx.surface_shorter_side * PLACEMENT_FILL / larger;
    Placement::at(ctx.anchor).with_scale(scale)
}

/// What happened to one completed decode.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The image was placed, selected, and stacked into the user band.
    Placed {
        object_id: ObjectId,
        digest: SourceDigest,
        pixels: RgbaImage,
        file_name: String,
        file_size: usize,
        file_type: UploadKind,
    },
    /// An identical source already exists on the scene; nothing was added.
    /// This is the expected outcome for a repeat upload, not an error.
    Duplicate { file_name: String },
    /// The completion arrived after its ticket was reset and was discarded.
    Stale { id: UploadId },
}

/// Apply one decode completion to the scene.
///
/// The ticket is cleared whatever the result. Failure paths must leave no
/// partial state behind, because every reachable scene has to be a valid,
/// continuable one.
pub fn complete(
    tracker: &mut UploadTracker,
    id: UploadId,
    decoded: Result<DecodedUpload, UploadError>,
    scene: &mut Scene,
    ctx: &PlacementContext,
) -> Result<IngestOutcome, UploadError> {
    if !tracker.is_active(id) {
        debug!("discarding stale upload completion {id}");
        return Ok(IngestOutcome::Stale { id });
    }
    tracker.finish(id);

    let decoded = decoded?;
    if decoded.width == 0 || decoded.height == 0 {
        return Err(UploadError::EmptyImage {
            name: decoded.file_name,
        });
    }

    if scene.contains_source(&decoded.digest) {
        info!(
            "suppressing duplicate upload {:?} ({})",
            decoded.file_name, decoded.digest
        );
        return Ok(IngestOutcome::Duplicate {
            file_name: decoded.file_name,
        });
    }

    let placement = placement_for(decoded.width, decoded.height, ctx);
    let object = SceneObject::image(
        ImageObject {
            source: ImageSource::Upload {
                file_name: decoded.file_name.clone(),
                digest: decoded.digest.clone(),
            },
            natural_width: decoded.width,
            natural_height: decoded.height,
            upload_id: Some(id),
        },
        placement,
    );
    let object_id = scene.add_object(object);

    Ok(IngestOutcome::Placed {
        object_id,
        digest: decoded.digest,
        pixels: decoded.pixels,
        file_name: decoded.file_name,
        file_size: decoded.byte_len,
        file_type: decoded.kind,
    })
}
