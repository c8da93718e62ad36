//! # Printloom Core
//!
//! Scene model for the layered design canvas: a fixed product template and a
//! fixed clipping mask sandwiching the user-content band, with linear
//! undo/redo over scene snapshots and R-tree hit-testing for selection.
//!
//! This crate is the heart of the Printloom engine. It holds no pixels and
//! performs no I/O.

pub mod geometry;
pub mod history;
pub mod layering;
pub mod object;
pub mod scene;
pub mod snapshot;
pub mod spatial;

pub use geometry::{Point, Rect};
pub use history::{EditPhase, History, MAX_HISTORY};
pub use object::{
    Color, FixedLayer, FixedLayerRole, ImageObject, ImageSource, ObjectId, ObjectKind, Placement,
    SceneObject, SourceDigest, TextObject, UploadId,
};
pub use scene::{Scene, StackEntry};
pub use snapshot::SceneSnapshot;
