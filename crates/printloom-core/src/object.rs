use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};

/// Unique identifier of a placeable object.
pub type ObjectId = Uuid;

/// Identity of one ingestion attempt. A decode completion that arrives after
/// its upload session was reset carries an id the tracker no longer knows,
/// and is discarded instead of applied.
pub type UploadId = Uuid;

/// Content digest identifying an uploaded image source. Two uploads with the
/// same bytes are the same source regardless of file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDigest(String);

impl SourceDigest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an image's pixels came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageSource {
    /// A remote or host-resolved URL (template and mask layers).
    Url(String),
    /// A user upload, identified by its content digest.
    Upload {
        file_name: String,
        digest: SourceDigest,
    },
}

impl ImageSource {
    /// Key under which the decoded pixels are stored.
    pub fn cache_key(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Upload { digest, .. } => digest.as_str().to_string(),
        }
    }

    pub fn digest(&self) -> Option<&SourceDigest> {
        match self {
            ImageSource::Url(_) => None,
            ImageSource::Upload { digest, .. } => Some(digest),
        }
    }
}

/// RGB fill color for text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self { r: 0, g: 0, b: 0 }
    }
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_rgba8(&self, opacity: f64) -> [u8; 4] {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        [self.r, self.g, self.b, a]
    }
}

/// Center-anchored placement of an object on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub center: Point,
    /// Uniform scale applied to the object's natural size.
    pub scale: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            center: Point::new(0.0, 0.0),
            scale: 1.0,
            rotation_deg: 0.0,
            opacity: 1.0,
        }
    }
}

impl Placement {
    pub fn at(center: Point) -> Self {
        Self {
            center,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Axis-aligned bounds of a natural-size rectangle under this placement.
    pub fn bounds(&self, natural_width: f64, natural_height: f64) -> Rect {
        let hw = natural_width * self.scale / 2.0;
        let hh = natural_height * self.scale / 2.0;
        let rad = self.rotation_deg.to_radians();
        let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
        let ex = hw * cos + hh * sin;
        let ey = hw * sin + hh * cos;
        Rect::from_center(self.center, ex * 2.0, ey * 2.0)
    }
}

/// An image placed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub source: ImageSource,
    pub natural_width: u32,
    pub natural_height: u32,
    /// Correlation id of the ingestion attempt that produced this object.
    pub upload_id: Option<UploadId>,
}

/// A styled text block placed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub fill: Color,
}

impl TextObject {
    /// Coarse natural extent used for bounds and hit-testing. Real glyph
    /// metrics only exist in the preview renderer; this estimate keeps the
    /// core model font-free.
    pub fn estimated_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.content.lines().collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let line_count = lines.len().max(1);
        (
            longest as f64 * self.font_size * 0.6,
            line_count as f64 * self.font_size * 1.2,
        )
    }
}

/// The tagged union of everything a user can place on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Image(ImageObject),
    Text(TextObject),
}

/// A user-content object: the only mutable band of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub placement: Placement,
}

impl SceneObject {
    pub fn image(image: ImageObject, placement: Placement) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ObjectKind::Image(image),
            placement,
        }
    }

    pub fn text(text: TextObject, placement: Placement) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ObjectKind::Text(text),
            placement,
        }
    }

    pub fn natural_size(&self) -> (f64, f64) {
        match &self.kind {
            ObjectKind::Image(img) => (f64::from(img.natural_width), f64::from(img.natural_height)),
            ObjectKind::Text(text) => text.estimated_size(),
        }
    }

    /// Axis-aligned bounds of the placed object.
    pub fn bounds(&self) -> Rect {
        let (w, h) = self.natural_size();
        self.placement.bounds(w, h)
    }

    pub fn source_digest(&self) -> Option<&SourceDigest> {
        match &self.kind {
            ObjectKind::Image(img) => img.source.digest(),
            ObjectKind::Text(_) => None,
        }
    }
}

/// Which fixed slot a non-selectable layer occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedLayerRole {
    /// The product template, always bottommost.
    Template,
    /// The clipping mask, always topmost.
    Mask,
}

/// A fixed layer: template or mask. Never selectable, never user content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedLayer {
    pub role: FixedLayerRole,
    pub source: ImageSource,
    pub natural_width: u32,
    pub natural_height: u32,
    pub placement: Placement,
}

impl FixedLayer {
    pub fn new(role: FixedLayerRole, url: &str, natural_width: u32, natural_height: u32) -> Self {
        Self {
            role,
            source: ImageSource::Url(url.to_string()),
            natural_width,
            natural_height,
            placement: Placement::default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.placement
            .bounds(f64::from(self.natural_width), f64::from(self.natural_height))
    }
}
