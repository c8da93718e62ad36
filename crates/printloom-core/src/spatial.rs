use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::{Point, Rect};
use crate::object::ObjectId;
use crate::scene::Scene;

/// An entry in the R-tree hit-test index, referencing a user-content object.
#[derive(Debug, Clone)]
pub struct HitEntry {
    pub object_id: ObjectId,
    /// Position within the user band; higher means closer to the mask.
    pub stack_index: usize,
    /// Placed axis-aligned bounds of the object.
    pub bounds: Rect,
}

impl RTreeObject for HitEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.left, self.bounds.top],
            [self.bounds.right(), self.bounds.bottom()],
        )
    }
}

impl PointDistance for HitEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.envelope().contains_point(point)
    }
}

/// Point-query index over the user band, used for click-to-select. Fixed
/// layers are never indexed; they are not selectable.
pub struct HitIndex {
    tree: RTree<HitEntry>,
}

impl HitIndex {
    /// Build the index from the scene's current user content.
    pub fn from_scene(scene: &Scene) -> Self {
        let entries: Vec<HitEntry> = scene
            .user_content()
            .iter()
            .enumerate()
            .map(|(stack_index, object)| HitEntry {
                object_id: object.id,
                stack_index,
                bounds: object.bounds(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// The topmost user object whose bounds contain the point.
    pub fn pick(&self, point: &Point) -> Option<ObjectId> {
        self.tree
            .locate_all_at_point(&[point.x, point.y])
            .max_by_key(|e| e.stack_index)
            .map(|e| e.object_id)
    }

    /// All user objects intersecting the given rectangle, bottom to top.
    pub fn objects_in(&self, region: &Rect) -> Vec<ObjectId> {
        let envelope = AABB::from_corners(
            [region.left, region.top],
            [region.right(), region.bottom()],
        );
        let mut hits: Vec<&HitEntry> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .collect();
        hits.sort_by_key(|e| e.stack_index);
        hits.iter().map(|e| e.object_id).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Color, Placement, SceneObject, TextObject};

    fn text_at(x: f64, y: f64) -> SceneObject {
        SceneObject::text(
            TextObject {
                content: "hit".to_string(),
                font_family: "Inter".to_string(),
                font_size: 40.0,
                fill: Color::default(),
            },
            Placement::at(Point::new(x, y)),
        )
    }

    #[test]
    fn test_pick_prefers_topmost() {
        let mut scene = Scene::new();
        let lower = scene.add_object(text_at(100.0, 100.0));
        let upper = scene.add_object(text_at(100.0, 100.0));

        let index = HitIndex::from_scene(&scene);
        assert_eq!(index.pick(&Point::new(100.0, 100.0)), Some(upper));
        assert_ne!(index.pick(&Point::new(100.0, 100.0)), Some(lower));
    }

    #[test]
    fn test_pick_misses_outside_bounds() {
        let mut scene = Scene::new();
        scene.add_object(text_at(100.0, 100.0));
        let index = HitIndex::from_scene(&scene);
        assert_eq!(index.pick(&Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_objects_in_region() {
        let mut scene = Scene::new();
        let near = scene.add_object(text_at(50.0, 50.0));
        scene.add_object(text_at(400.0, 400.0));

        let index = HitIndex::from_scene(&scene);
        let hits = index.objects_in(&Rect::new(0.0, 0.0, 120.0, 120.0));
        assert_eq!(hits, vec![near]);
    }
}
