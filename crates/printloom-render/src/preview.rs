//! Flattened raster preview for the apply step.
//!
//! Renders the scene bands bottom-to-top into one RGBA image at design-space
//! resolution and encodes it as PNG. Text objects are rasterized into an
//! offscreen buffer with real glyph outlines, then composited through the
//! same transform path as images, so scale/rotation/opacity behave uniformly
//! across object kinds.

use std::collections::HashMap;
use std::io::Cursor;

use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use log::warn;
use thiserror::Error;

use printloom_core::{ObjectKind, Placement, Scene, StackEntry, TextObject};

use crate::assets::AssetStore;
use crate::surface::Surface;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("preview encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Discovers and caches font faces for text rasterization.
///
/// Faces are resolved by family name with a sans-serif fallback. A host with
/// no usable fonts degrades gracefully: text objects are skipped with a
/// warning and the preview still renders.
pub struct FontLibrary {
    db: fontdb::Database,
    cache: HashMap<String, Option<FontVec>>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self {
            db,
            cache: HashMap::new(),
        }
    }

    fn load(&mut self, family: &str) -> Option<&FontVec> {
        if !self.cache.contains_key(family) {
            let query = fontdb::Query {
                families: &[fontdb::Family::Name(family), fontdb::Family::SansSerif],
                ..fontdb::Query::default()
            };
            let loaded = self.db.query(&query).and_then(|id| {
                self.db
                    .with_face_data(id, |data, index| {
                        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
                    })
                    .flatten()
            });
            if loaded.is_none() {
                warn!("no usable font face for family {family:?}; text will be skipped");
            }
            self.cache.insert(family.to_string(), loaded);
        }
        self.cache.get(family).and_then(|f| f.as_ref())
    }
}

/// Render the flattened scene to an RGBA image at design-space resolution.
pub fn render_preview(scene: &Scene, surface: &Surface, assets: &AssetStore) -> RgbaImage {
    let side = surface.design_side().round().max(1.0) as u32;
    let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]));
    let mut fonts = FontLibrary::new();

    for entry in scene.flatten() {
        match entry {
            StackEntry::Fixed(layer) => {
                let key = layer.source.cache_key();
                match assets.get(&key) {
                    Some(pixels) => composite(&mut canvas, pixels, &layer.placement),
                    None => warn!("fixed layer asset {key:?} missing from store; skipped"),
                }
            }
            StackEntry::Object(object) => match &object.kind {
                ObjectKind::Image(img) => {
                    let key = img.source.cache_key();
                    match assets.get(&key) {
                        Some(pixels) => composite(&mut canvas, pixels, &object.placement),
                        None => warn!("image asset {key:?} missing from store; skipped"),
                    }
                }
                ObjectKind::Text(text) => {
                    if let Some(buffer) = rasterize_text(text, &mut fonts) {
                        composite(&mut canvas, &buffer, &object.placement);
                    }
                }
            },
        }
    }
    canvas
}

/// Encode the preview image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, PreviewError> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

// ── Compositing ──────────────────────────────────────────────────────

/// Draw `src` onto `canvas` under a center-anchored placement, sampling the
/// source bilinearly through the inverse transform.
fn composite(canvas: &mut RgbaImage, src: &RgbaImage, placement: &Placement) {
    let (src_w, src_h) = (src.width() as f64, src.height() as f64);
    if src_w == 0.0 || src_h == 0.0 || placement.scale <= 0.0 {
        return;
    }

    let target = placement.bounds(src_w, src_h);
    let x0 = target.left.floor().max(0.0) as u32;
    let y0 = target.top.floor().max(0.0) as u32;
    let x1 = (target.right().ceil() as i64).clamp(0, i64::from(canvas.width())) as u32;
    let y1 = (target.bottom().ceil() as i64).clamp(0, i64::from(canvas.height())) as u32;

    let rad = placement.rotation_deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    let opacity = placement.opacity.clamp(0.0, 1.0);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = f64::from(x) + 0.5 - placement.center.x;
            let dy = f64::from(y) + 0.5 - placement.center.y;
            // Inverse rotation, then inverse scale, into source pixels.
            let u = (cos * dx + sin * dy) / placement.scale + src_w / 2.0;
            let v = (-sin * dx + cos * dy) / placement.scale + src_h / 2.0;
            if u < 0.0 || v < 0.0 || u >= src_w || v >= src_h {
                continue;
            }
            let [sr, sg, sb, sa] = sample_bilinear(src, u, v);
            let sa = f64::from(sa) / 255.0 * opacity;
            if sa <= 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(x, y);
            let da = f64::from(dst[3]) / 255.0;
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                continue;
            }
            for (channel, s) in [sr, sg, sb].into_iter().enumerate() {
                let d = f64::from(dst[channel]);
                let blended = (f64::from(s) * sa + d * da * (1.0 - sa)) / out_a;
                dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn sample_bilinear(src: &RgbaImage, u: f64, v: f64) -> [u8; 4] {
    let max_x = src.width() - 1;
    let max_y = src.height() - 1;
    let fx = (u - 0.5).max(0.0);
    let fy = (v - 0.5).max(0.0);
    let x0 = (fx.floor() as u32).min(max_x);
    let y0 = (fy.floor() as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let tx = fx - fx.floor();
    let ty = fy - fy.floor();

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f64::from(p00[c]) * (1.0 - tx) + f64::from(p10[c]) * tx;
        let bottom = f64::from(p01[c]) * (1.0 - tx) + f64::from(p11[c]) * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round() as u8;
    }
    out
}

// ── Text rasterization ───────────────────────────────────────────────

/// Rasterize a text object at its font size into a tight RGBA buffer.
/// Returns `None` when no usable font face exists.
fn rasterize_text(text: &TextObject, fonts: &mut FontLibrary) -> Option<RgbaImage> {
    let font = fonts.load(&text.font_family)?;
    let scale = PxScale::from(text.font_size as f32);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();

    // Lay out every glyph relative to the block's top-left corner.
    let mut glyphs: Vec<Glyph> = Vec::new();
    let mut block_w: f32 = 0.0;
    let mut line_count = 0u32;
    for (line_idx, line) in text.content.lines().enumerate() {
        line_count += 1;
        let baseline = line_idx as f32 * line_height + ascent;
        let mut caret: f32 = 0.0;
        for ch in line.chars() {
            let id = scaled.glyph_id(ch);
            glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
        }
        block_w = block_w.max(caret);
    }
    if glyphs.is_empty() {
        return None;
    }

    let block_h = line_count as f32 * line_height;
    let buf_w = block_w.ceil().max(1.0) as u32;
    let buf_h = block_h.ceil().max(1.0) as u32;
    let mut buffer = RgbaImage::from_pixel(buf_w, buf_h, Rgba([0, 0, 0, 0]));

    let fill = text.fill;
    for glyph in glyphs {
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= buf_w as i32 || py >= buf_h as i32 {
                    return;
                }
                let pixel = buffer.get_pixel_mut(px as u32, py as u32);
                let alpha = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
                if alpha > pixel[3] {
                    *pixel = Rgba([fill.r, fill.g, fill.b, alpha]);
                }
            });
        }
    }
    Some(buffer)
}
