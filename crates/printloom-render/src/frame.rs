use serde::{Deserialize, Serialize};

use printloom_core::{Color, ObjectId, ObjectKind, Point, Scene, StackEntry};

use crate::surface::Surface;

/// What a frame entry draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderSource {
    Image {
        /// Key into the asset store for the decoded pixels.
        key: String,
        natural_width: u32,
        natural_height: u32,
    },
    Text {
        content: String,
        font_family: String,
        font_size: f64,
        fill: Color,
    },
}

/// One stacked drawable, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEntry {
    /// Present for user content, absent for the fixed layers.
    pub object_id: Option<ObjectId>,
    pub source: RenderSource,
    pub center: Point,
    pub scale: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub selectable: bool,
}

/// Complete frame data a host canvas consumes: the scene bands flattened in
/// fixed order, plus the surface geometry and selection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub entries: Vec<RenderEntry>,
    pub selection: Option<ObjectId>,
}

impl RenderFrame {
    pub fn build(scene: &Scene, surface: &Surface) -> Self {
        let entries = scene
            .flatten()
            .into_iter()
            .map(|entry| match entry {
                StackEntry::Fixed(layer) => RenderEntry {
                    object_id: None,
                    source: RenderSource::Image {
                        key: layer.source.cache_key(),
                        natural_width: layer.natural_width,
                        natural_height: layer.natural_height,
                    },
                    center: layer.placement.center,
                    scale: layer.placement.scale,
                    rotation_deg: layer.placement.rotation_deg,
                    opacity: layer.placement.opacity,
                    selectable: false,
                },
                StackEntry::Object(object) => RenderEntry {
                    object_id: Some(object.id),
                    source: match &object.kind {
                        ObjectKind::Image(img) => RenderSource::Image {
                            key: img.source.cache_key(),
                            natural_width: img.natural_width,
                            natural_height: img.natural_height,
                        },
                        ObjectKind::Text(text) => RenderSource::Text {
                            content: text.content.clone(),
                            font_family: text.font_family.clone(),
                            font_size: text.font_size,
                            fill: text.fill,
                        },
                    },
                    center: object.placement.center,
                    scale: object.placement.scale,
                    rotation_deg: object.placement.rotation_deg,
                    opacity: object.placement.opacity,
                    selectable: true,
                },
            })
            .collect();

        Self {
            width: surface.width,
            height: surface.height,
            zoom: surface.zoom,
            entries,
            selection: scene.selected_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ContainerSize;
    use printloom_core::{FixedLayer, FixedLayerRole, Placement, SceneObject, TextObject};

    #[test]
    fn test_frame_orders_bands_and_flags_selectable() {
        let mut scene = Scene::new();
        scene.set_template(FixedLayer::new(FixedLayerRole::Template, "base.png", 400, 400));
        scene.set_mask(FixedLayer::new(FixedLayerRole::Mask, "mask.png", 400, 400));
        let id = scene.add_object(SceneObject::text(
            TextObject {
                content: "Hello".to_string(),
                font_family: "Inter".to_string(),
                font_size: 48.0,
                fill: Color::default(),
            },
            Placement::at(Point::new(200.0, 200.0)),
        ));

        let surface = Surface::mount(Some(ContainerSize::new(1000.0, 800.0))).unwrap();
        let frame = RenderFrame::build(&scene, &surface);

        assert_eq!(frame.entries.len(), 3);
        assert!(!frame.entries[0].selectable);
        assert!(frame.entries[1].selectable);
        assert!(!frame.entries[2].selectable);
        assert_eq!(frame.entries[1].object_id, Some(id));
        assert_eq!(frame.selection, Some(id));
        assert!(matches!(
            &frame.entries[0].source,
            RenderSource::Image { key, .. } if key == "base.png"
        ));
    }
}
