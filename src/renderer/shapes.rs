//! Shape generation for 2D primitives
//!
//! Everything here produces plain triangle lists (three `Vec2` per triangle)
//! in world space, ready for whatever backend the host draws with.

use glam::Vec2;
use std::f32::consts::PI;

use crate::sim::{Drawable, Shape};

/// Segments used for circles and rings
pub const CIRCLE_SEGMENTS: u32 = 24;

/// Triangles for a filled circle
pub fn circle(center: Vec2, radius: f32, segments: u32) -> Vec<Vec2> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(center);
        vertices.push(center + Vec2::from_angle(theta1) * radius);
        vertices.push(center + Vec2::from_angle(theta2) * radius);
    }

    vertices
}

/// Triangles for a ring (hollow circle)
pub fn ring(center: Vec2, inner_radius: f32, outer_radius: f32, segments: u32) -> Vec<Vec2> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let dir1 = Vec2::from_angle((i as f32 / segments as f32) * 2.0 * PI);
        let dir2 = Vec2::from_angle(((i + 1) as f32 / segments as f32) * 2.0 * PI);

        let inner1 = center + dir1 * inner_radius;
        let outer1 = center + dir1 * outer_radius;
        let inner2 = center + dir2 * inner_radius;
        let outer2 = center + dir2 * outer_radius;

        // Two triangles per segment
        vertices.extend([inner1, outer1, inner2]);
        vertices.extend([inner2, outer1, outer2]);
    }

    vertices
}

/// Fan-triangulate a local-space outline placed at `center`, rotated by `rotation`
pub fn polygon(center: Vec2, rotation: f32, outline: &[Vec2]) -> Vec<Vec2> {
    if outline.len() < 3 {
        return Vec::new();
    }
    let turn = Vec2::from_angle(rotation);
    let world: Vec<Vec2> = outline.iter().map(|p| center + turn.rotate(*p)).collect();

    let mut vertices = Vec::with_capacity(world.len() * 3);
    for i in 0..world.len() {
        vertices.push(center);
        vertices.push(world[i]);
        vertices.push(world[(i + 1) % world.len()]);
    }
    vertices
}

/// Axis-aligned quad of side `size` centered on `center`, rotated by `rotation`
pub fn quad(center: Vec2, size: f32, rotation: f32) -> Vec<Vec2> {
    let half = size / 2.0;
    let turn = Vec2::from_angle(rotation);
    let [a, b, c, d] = [
        Vec2::new(-half, -half),
        Vec2::new(half, -half),
        Vec2::new(half, half),
        Vec2::new(-half, half),
    ]
    .map(|p| center + turn.rotate(p));
    vec![a, b, c, c, d, a]
}

/// World-space triangles for a drawable. Text gets no geometry.
pub fn tessellate(drawable: &Drawable) -> Vec<Vec2> {
    match &drawable.shape {
        Shape::Circle { radius } => circle(drawable.pos, *radius, CIRCLE_SEGMENTS),
        // Thin band just inside the effect radius
        Shape::Ring { radius } => ring(
            drawable.pos,
            (radius - 4.0).max(0.0),
            *radius,
            CIRCLE_SEGMENTS * 2,
        ),
        Shape::Polygon { points } => polygon(drawable.pos, drawable.rotation, points),
        Shape::Sprite { size, .. } => quad(drawable.pos, *size, drawable.rotation),
        Shape::Cell { size } => quad(drawable.pos, *size, 0.0),
        Shape::Text { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EntityCategory, Hsba};

    fn drawable(shape: Shape) -> Drawable {
        Drawable {
            category: EntityCategory::Hazard,
            shape,
            pos: Vec2::new(10.0, 20.0),
            rotation: 0.0,
            color: Hsba::new(0.0, 0.0, 100.0, 1.0),
            text: None,
        }
    }

    #[test]
    fn test_circle_vertices_on_radius() {
        let center = Vec2::new(5.0, 5.0);
        let vertices = circle(center, 3.0, 8);
        assert_eq!(vertices.len(), 24);
        for tri in vertices.chunks(3) {
            assert_eq!(tri[0], center);
            assert!((tri[1].distance(center) - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ring_has_two_triangles_per_segment() {
        assert_eq!(ring(Vec2::ZERO, 1.0, 2.0, 10).len(), 60);
    }

    #[test]
    fn test_polygon_rotates_about_center() {
        let outline = [Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(-1.0, 0.0)];
        let vertices = polygon(Vec2::new(2.0, 2.0), PI / 2.0, &outline);
        assert_eq!(vertices.len(), 9);
        assert!((vertices[1] - Vec2::new(2.0, 3.0)).length() < 1e-5);
        assert!(polygon(Vec2::ZERO, 0.0, &outline[..2]).is_empty());
    }

    #[test]
    fn test_tessellate_by_shape() {
        assert_eq!(
            tessellate(&drawable(Shape::Circle { radius: 4.0 })).len(),
            (CIRCLE_SEGMENTS * 3) as usize
        );
        assert_eq!(tessellate(&drawable(Shape::Cell { size: 36.0 })).len(), 6);
        assert!(tessellate(&drawable(Shape::Text { size: 16.0 })).is_empty());
        let quad = tessellate(&drawable(Shape::Sprite {
            name: "dave".to_string(),
            size: 10.0,
        }));
        assert_eq!(quad[0], Vec2::new(5.0, 15.0));
    }
}
