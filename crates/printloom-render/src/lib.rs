//! # Printloom Render
//!
//! The visual side of the design canvas: the drawing-surface controller
//! (container-driven sizing, zoom rescale, clip bounds), serializable render
//! frames a host canvas consumes, the decoded-pixel asset store, and the
//! flattened raster preview produced at apply time.

pub mod assets;
pub mod frame;
pub mod preview;
pub mod surface;

pub use assets::{AssetError, AssetStore};
pub use frame::{RenderEntry, RenderFrame, RenderSource};
pub use preview::{encode_png, render_preview, FontLibrary, PreviewError};
pub use surface::{ContainerSize, Surface, SurfaceError};
