// Core types shared across the simulation.
//
// Defines the float vector used for disk centers, rim nodes and ring
// positions (`Vec3`), and the compact integer handles that replace every
// position-equality lookup: `DiskId`, `NavNodeId`, `NavEdgeId`, `RingId`.
// All derive `Serialize`/`Deserialize` for save/load.
//
// The world is laid out on the XZ plane. Y is height above the disk plane
// and is informational only: adjacency, heuristics and ring movement all
// measure in XZ.
//
// **Critical constraint: determinism.** Handles are sequential integers
// assigned in registry/construction order. Never compare `Vec3` values to
// decide identity; compare handles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A point or direction in world space, in meters.
///
/// Right-handed: X east, Y up, Z south.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A point on the disk plane (y = 0).
    pub const fn on_plane(x: f32, z: f32) -> Self {
        Self::new(x, 0.0, z)
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Distance ignoring height.
    pub fn distance_xz(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// The horizontal component (y dropped to zero).
    pub fn xz(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Angle in radians between two directions, in [0, PI]. Zero if either
    /// vector is zero.
    pub fn angle_to(self, other: Self) -> f32 {
        let denom = self.length() * other.length();
        if denom == 0.0 {
            return 0.0;
        }
        // Rounding can push the cosine a hair outside [-1, 1].
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Whether the two points coincide in XZ.
    pub fn same_xz(self, other: Self) -> bool {
        self.x == other.x && self.z == other.z
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Compact handles
// ---------------------------------------------------------------------------

macro_rules! compact_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

compact_id!(/// Index of a disk in the registry.
DiskId);
compact_id!(/// Index of a rim node in the nav graph.
NavNodeId);
compact_id!(/// Index of a directed edge in the nav graph.
NavEdgeId);
compact_id!(/// Identifier of a wandering ring.
RingId);

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn distance_xz_ignores_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, -4.0, 4.0);
        assert_eq!(a.distance_xz(b), 5.0);
        assert!(a.distance(b) > 5.0);
    }

    #[test]
    fn normalized_zero_is_none() {
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(0.0, 0.0, 2.0).normalized().unwrap();
        assert_eq!(n, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn angle_between_axes() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let z = Vec3::new(0.0, 0.0, 5.0);
        assert!((x.angle_to(z) - FRAC_PI_2).abs() < 1e-6);
        assert!((x.angle_to(x * -1.0) - PI).abs() < 1e-6);
        assert_eq!(x.angle_to(x * 3.0), 0.0);
    }

    #[test]
    fn angle_to_zero_vector_is_zero() {
        assert_eq!(Vec3::new(1.0, 0.0, 0.0).angle_to(Vec3::ZERO), 0.0);
    }

    #[test]
    fn same_xz_ignores_height() {
        assert!(Vec3::new(1.0, 2.0, 3.0).same_xz(Vec3::new(1.0, -7.0, 3.0)));
        assert!(!Vec3::new(1.0, 0.0, 3.0).same_xz(Vec3::new(1.0, 0.0, 3.5)));
    }

    #[test]
    fn compact_id_display_and_order() {
        assert_eq!(NavNodeId(4).to_string(), "NavNodeId(4)");
        assert!(DiskId(1) < DiskId(2));
        assert_eq!(RingId(9).index(), 9);
    }
}
