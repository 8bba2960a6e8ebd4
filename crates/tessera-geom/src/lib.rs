//! Small geometry types shared by the meshing crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn distance_sq(self, other: Vec3) -> f32 {
        (self - other).length_sq()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    /// Component-wise product.
    #[inline]
    pub fn scale(self, s: Vec3) -> Vec3 {
        Vec3::new(self.x * s.x, self.y * s.y, self.z * s.z)
    }

    #[inline]
    pub fn min(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[inline]
    pub fn max(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<NodePos> for Vec3 {
    #[inline]
    fn from(p: NodePos) -> Self {
        Vec3::new(p.x as f32, p.y as f32, p.z as f32)
    }
}

/// Integer node position or direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct NodePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl NodePos {
    pub const ZERO: NodePos = NodePos::new(0, 0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared length; 1 for the six unit face directions.
    #[inline]
    pub fn length_sq(self) -> i32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

impl Add for NodePos {
    type Output = NodePos;
    #[inline]
    fn add(self, rhs: NodePos) -> NodePos {
        NodePos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for NodePos {
    type Output = NodePos;
    #[inline]
    fn sub(self, rhs: NodePos) -> NodePos {
        NodePos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for NodePos {
    type Output = NodePos;
    #[inline]
    fn neg(self) -> NodePos {
        NodePos::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<i32> for NodePos {
    type Output = NodePos;
    #[inline]
    fn mul(self, rhs: i32) -> NodePos {
        NodePos::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<(i32, i32, i32)> for NodePos {
    fn from(v: (i32, i32, i32)) -> Self {
        Self::new(v.0, v.1, v.2)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any `include` call will snap to.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn translated(&self, by: Vec3) -> Aabb {
        Aabb::new(self.min + by, self.max + by)
    }
}

/// Sphere that encloses everything passed to `include` relative to a fixed center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius_sq: f32,
}

impl BoundingSphere {
    #[inline]
    pub fn around(center: Vec3) -> Self {
        Self {
            center,
            radius_sq: 0.0,
        }
    }

    #[inline]
    pub fn include(&mut self, p: Vec3) {
        let d = self.center.distance_sq(p);
        if d > self.radius_sq {
            self.radius_sq = d;
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius_sq.sqrt()
    }
}

/// Oriented plane `normal · p = normal · origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub origin: Vec3,
}

impl Plane {
    /// Plane through a triangle; `None` when the triangle is degenerate.
    pub fn from_triangle(a: Vec3, b: Vec3, c: Vec3) -> Option<Plane> {
        let n = (b - a).cross(c - a);
        let len = n.length();
        if len <= f32::EPSILON {
            return None;
        }
        Some(Plane {
            normal: n / len,
            origin: a,
        })
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p - self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_box_snaps_to_first_point() {
        let mut b = Aabb::EMPTY;
        assert!(b.is_empty());
        b.include(Vec3::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, b.max);
        b.include(Vec3::new(-1.0, 4.0, 3.0));
        assert_eq!(b.center(), Vec3::new(0.0, 3.0, 3.0));
    }

    #[test]
    fn degenerate_triangle_has_no_plane() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 1.0, 1.0);
        assert!(Plane::from_triangle(a, b, b * 2.0).is_none());
    }

    #[test]
    fn plane_side_follows_winding() {
        let p = Plane::from_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!(p.signed_distance(Vec3::new(0.3, 0.3, 2.0)) > 0.0);
        assert!(p.signed_distance(Vec3::new(0.3, 0.3, -2.0)) < 0.0);
    }

    proptest! {
        #[test]
        fn node_pos_neg_is_additive_inverse(p in any::<(i16, i16, i16)>()) {
            let p = NodePos::new(p.0 as i32, p.1 as i32, p.2 as i32);
            prop_assert_eq!(p + -p, NodePos::ZERO);
            prop_assert_eq!(p - p, NodePos::ZERO);
            prop_assert_eq!(p * 2, p + p);
        }

        #[test]
        fn sphere_contains_included_points(
            pts in proptest::collection::vec((-1e3f32..1e3, -1e3f32..1e3, -1e3f32..1e3), 1..32)
        ) {
            let mut s = BoundingSphere::around(Vec3::ZERO);
            for (x, y, z) in &pts {
                s.include(Vec3::new(*x, *y, *z));
            }
            for (x, y, z) in pts {
                let d = Vec3::new(x, y, z).length();
                prop_assert!(d <= s.radius() * (1.0 + 1e-5) + 1e-3);
            }
        }
    }
}
