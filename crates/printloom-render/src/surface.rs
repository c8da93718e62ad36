use serde::{Deserialize, Serialize};
use thiserror::Error;

use printloom_core::{FixedLayer, Point, Rect};

/// Smallest surface side ever produced, regardless of container.
pub const MIN_SIDE: f64 = 300.0;
/// Containers narrower than this use the narrow sizing rule.
pub const NARROW_BREAKPOINT: f64 = 768.0;
/// Horizontal padding subtracted from narrow containers.
pub const NARROW_GUTTER: f64 = 32.0;
/// Cap for the narrow rule.
pub const NARROW_MAX_SIDE: f64 = 560.0;
/// Fraction of the container width taken on wide viewports.
pub const WIDE_FRACTION: f64 = 0.6;
/// Floor for the wide rule.
pub const WIDE_MIN_SIDE: f64 = 420.0;
/// Cap for the wide rule; growth stops here on very large viewports.
pub const WIDE_MAX_SIDE: f64 = 900.0;

/// Measured size of the element the surface mounts into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Error, Debug)]
pub enum SurfaceError {
    /// No container element to mount in. This is a configuration error of
    /// the embedding page, not a runtime condition; initialization aborts.
    #[error("no container element to mount the drawing surface in")]
    MissingContainer,
}

/// The drawing surface: current pixel size plus the zoom factor mapping
/// design coordinates to pixels.
///
/// Object placements live in *design space*, fixed at mount time. Resizes
/// change the pixel size and zoom together, so positions stay visually
/// consistent without rewriting any placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    clip_bounds: Option<Rect>,
}

fn fit_side(container: ContainerSize) -> f64 {
    if container.width < NARROW_BREAKPOINT {
        (container.width - NARROW_GUTTER).clamp(MIN_SIDE, NARROW_MAX_SIDE)
    } else {
        (container.width * WIDE_FRACTION).clamp(WIDE_MIN_SIDE, WIDE_MAX_SIDE)
    }
}

impl Surface {
    /// Allocate a square surface sized to the container. Fails when no
    /// container measurement exists. Unrecoverable, not retried.
    pub fn mount(container: Option<ContainerSize>) -> Result<Self, SurfaceError> {
        let container = container.ok_or(SurfaceError::MissingContainer)?;
        let side = fit_side(container);
        Ok(Self {
            width: side,
            height: side,
            zoom: 1.0,
            clip_bounds: None,
        })
    }

    /// Side length of design space. Constant across resizes.
    pub fn design_side(&self) -> f64 {
        self.width / self.zoom
    }

    /// Center of design space: the default anchor when no clip bounds exist.
    pub fn center(&self) -> Point {
        let side = self.design_side();
        Point::new(side / 2.0, side / 2.0)
    }

    pub fn shorter_side(&self) -> f64 {
        self.design_side()
    }

    /// Recompute the pixel size for a new container measurement and rescale
    /// zoom proportionally. Returns the applied pixel ratio.
    pub fn handle_resize(&mut self, container: ContainerSize) -> f64 {
        let design = self.design_side();
        let side = fit_side(container);
        let ratio = side / self.width;
        self.width = side;
        self.height = side;
        self.zoom = side / design;
        ratio
    }

    // ── Clip bounds ──────────────────────────────────────────────────

    /// Read the mask's placed bounding box and store it as the clip bounds.
    /// Silently a no-op without a mask. Not re-derived if the mask later
    /// moves.
    pub fn set_clip_from_mask(&mut self, mask: Option<&FixedLayer>) {
        if let Some(mask) = mask {
            self.clip_bounds = Some(mask.bounds());
        }
    }

    pub fn clip_bounds(&self) -> Option<Rect> {
        self.clip_bounds
    }

    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    /// Default anchor for newly placed content: clip-bounds center when
    /// available, surface center otherwise.
    pub fn anchor(&self) -> Point {
        self.clip_bounds
            .map(|r| r.center())
            .unwrap_or_else(|| self.center())
    }
}
