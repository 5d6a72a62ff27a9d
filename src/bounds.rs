/*
 * Bounds Module
 *
 * Axis-aligned boxes used for the world bounds and for every octree node.
 * Containment is inclusive on both corners, so an agent sitting exactly on
 * the world boundary is still indexed.
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Aabb {
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.lower).all() && point.cmple(self.upper).all()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.lower + self.upper) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.upper - self.lower
    }

    /// Point of the box closest to `point` (the point itself when inside).
    #[inline]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.lower, self.upper)
    }

    #[inline]
    pub fn distance_squared_to(&self, point: Vec3) -> f32 {
        self.closest_point(point).distance_squared(point)
    }

    // Octant index: bit 0 = upper x half, bit 1 = upper y half, bit 2 = upper z half.
    // Points on the midpoint plane go to the upper half.
    #[inline]
    pub fn octant_of(&self, point: Vec3) -> usize {
        let mid = self.center();
        (point.x >= mid.x) as usize | ((point.y >= mid.y) as usize) << 1 | ((point.z >= mid.z) as usize) << 2
    }

    pub fn octant(&self, index: usize) -> Aabb {
        let mid = self.center();
        let pick = |bit: usize, low: f32, mid: f32, high: f32| {
            if index & bit != 0 {
                (mid, high)
            } else {
                (low, mid)
            }
        };
        let (x0, x1) = pick(1, self.lower.x, mid.x, self.upper.x);
        let (y0, y1) = pick(2, self.lower.y, mid.y, self.upper.y);
        let (z0, z1) = pick(4, self.lower.z, mid.z, self.upper.z);
        Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }

    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower.cmple(self.upper).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn boundary_points_are_contained() {
        let b = unit_box();
        assert!(b.contains(Vec3::new(1.0, -1.0, 0.0)));
        assert!(!b.contains(Vec3::new(1.0001, 0.0, 0.0)));
    }

    #[test]
    fn octants_tile_the_parent() {
        let b = unit_box();
        let total: f32 = (0..8).map(|i| {
            let s = b.octant(i).size();
            s.x * s.y * s.z
        }).sum();
        assert!((total - 8.0).abs() < 1e-5);

        for i in 0..8 {
            let child = b.octant(i);
            assert_eq!(b.octant_of(child.center()), i);
        }
    }

    #[test]
    fn closest_point_distance_is_zero_inside() {
        let b = unit_box();
        assert_eq!(b.distance_squared_to(Vec3::new(0.2, 0.3, -0.4)), 0.0);
        assert!((b.distance_squared_to(Vec3::new(3.0, 0.0, 0.0)) - 4.0).abs() < 1e-6);
    }
}
