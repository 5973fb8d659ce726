//! Cartesian positions, ZYX Euler rotations and boxes.
//!
//! The coordinate convention is x to the front, y to the left and z to the
//! top. Azimuth is counted counter-clockwise from the x-axis, elevation
//! upwards from the x-y plane.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Helpers on [`DVec3`] used throughout the acoustic model.
pub trait PosExt {
    /// Build a position from spherical coordinates (radius, azimuth, elevation).
    fn from_sphere(r: f64, az: f64, el: f64) -> Self;
    /// Squared norm, clamped to 1e-10 to avoid divisions by zero.
    fn norm2(&self) -> f64;
    /// Euclidean norm (based on the clamped squared norm).
    fn norm(&self) -> f64;
    /// Norm of the projection to the x-y plane.
    fn norm_xy(&self) -> f64;
    /// Azimuth in radians.
    fn azim(&self) -> f64;
    /// Elevation in radians.
    fn elev(&self) -> f64;
    /// Unit vector pointing in the same direction.
    fn normal(&self) -> Self;
    /// Rotate around the z-axis.
    fn rot_z(self, a: f64) -> Self;
    /// Rotate around the y-axis.
    fn rot_y(self, a: f64) -> Self;
    /// Rotate around the x-axis.
    fn rot_x(self, a: f64) -> Self;
    /// True if all components are positive.
    fn has_volume(&self) -> bool;
    /// Volume of the box spanned by this size vector.
    fn box_volume(&self) -> f64;
    /// Surface area of the box spanned by this size vector.
    fn box_area(&self) -> f64;
}

impl PosExt for DVec3 {
    fn from_sphere(r: f64, az: f64, el: f64) -> Self {
        DVec3::new(
            r * az.cos() * el.cos(),
            r * az.sin() * el.cos(),
            r * el.sin(),
        )
    }

    fn norm2(&self) -> f64 {
        self.length_squared().max(1e-10)
    }

    fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    fn norm_xy(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn azim(&self) -> f64 {
        self.y.atan2(self.x)
    }

    fn elev(&self) -> f64 {
        self.z.atan2(self.norm_xy())
    }

    fn normal(&self) -> Self {
        *self * (1.0 / self.norm())
    }

    fn rot_z(self, a: f64) -> Self {
        if a == 0.0 {
            return self;
        }
        let (s, c) = a.sin_cos();
        DVec3::new(c * self.x - s * self.y, c * self.y + s * self.x, self.z)
    }

    fn rot_y(self, a: f64) -> Self {
        if a == 0.0 {
            return self;
        }
        let (s, c) = a.sin_cos();
        DVec3::new(c * self.x + s * self.z, self.y, c * self.z - s * self.x)
    }

    fn rot_x(self, a: f64) -> Self {
        if a == 0.0 {
            return self;
        }
        let (s, c) = a.sin_cos();
        DVec3::new(self.x, c * self.y - s * self.z, c * self.z + s * self.y)
    }

    fn has_volume(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.z > 0.0
    }

    fn box_volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    fn box_area(&self) -> f64 {
        2.0 * (self.x * self.y + self.x * self.z + self.y * self.z)
    }
}

/// ZYX Euler angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    /// Rotation around the z-axis (yaw).
    pub z: f64,
    /// Rotation around the y-axis (pitch).
    pub y: f64,
    /// Rotation around the x-axis (roll).
    pub x: f64,
}

impl Euler {
    /// Identity rotation.
    pub const ZERO: Self = Self {
        z: 0.0,
        y: 0.0,
        x: 0.0,
    };

    /// Create from z, y and x angles in radians.
    pub fn new(z: f64, y: f64, x: f64) -> Self {
        Self { z, y, x }
    }

    /// Create from z, y and x angles in degrees.
    pub fn from_degrees(z: f64, y: f64, x: f64) -> Self {
        Self::new(z * crate::DEG2RAD, y * crate::DEG2RAD, x * crate::DEG2RAD)
    }

    /// Rotation which points the x-axis towards `pos` (no roll).
    pub fn from_direction(pos: DVec3) -> Self {
        let y = -pos.z.atan2(pos.x);
        let p = pos.rot_y(-y);
        Self {
            z: p.y.atan2(p.x),
            y,
            x: 0.0,
        }
    }

    /// Apply the rotation to a point (z first, then y, then x).
    pub fn rotate(&self, p: DVec3) -> DVec3 {
        p.rot_z(self.z).rot_y(self.y).rot_x(self.x)
    }

    /// Apply the inverse rotation to a point.
    pub fn rotate_inverse(&self, p: DVec3) -> DVec3 {
        p.rot_x(-self.x).rot_y(-self.y).rot_z(-self.z)
    }
}

// Component-wise arithmetic is exact for single-axis rotations only.
impl Add for Euler {
    type Output = Euler;
    fn add(self, o: Euler) -> Euler {
        Euler::new(self.z + o.z, self.y + o.y, self.x + o.x)
    }
}

impl AddAssign for Euler {
    fn add_assign(&mut self, o: Euler) {
        *self = *self + o;
    }
}

impl Sub for Euler {
    type Output = Euler;
    fn sub(self, o: Euler) -> Euler {
        Euler::new(self.z - o.z, self.y - o.y, self.x - o.x)
    }
}

impl Neg for Euler {
    type Output = Euler;
    fn neg(self) -> Euler {
        Euler::new(-self.z, -self.y, -self.x)
    }
}

impl Mul<f64> for Euler {
    type Output = Euler;
    fn mul(self, s: f64) -> Euler {
        Euler::new(self.z * s, self.y * s, self.x * s)
    }
}

/// Rotation matrix, row major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotMat {
    /// Matrix rows.
    pub m: [[f64; 3]; 3],
}

impl Default for RotMat {
    fn default() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

impl RotMat {
    /// Matrix of an Euler rotation (x-y-z intrinsic, matching the stored angles).
    pub fn from_euler(e: &Euler) -> Self {
        let (sx, cx) = e.x.sin_cos();
        let (sy, cy) = e.y.sin_cos();
        let (sz, cz) = e.z.sin_cos();
        Self {
            m: [
                [cy * cz, -cy * sz, sy],
                [cx * sz + sx * sy * cz, cx * cz - sx * sy * sz, -sx * cy],
                [sx * sz - cx * sy * cz, sx * cz + cx * sy * sz, cx * cy],
            ],
        }
    }

    /// Recover the Euler angles.
    pub fn to_euler(&self) -> Euler {
        let m = &self.m;
        let x = (-m[1][2]).atan2(m[2][2]);
        let m13sq = m[0][2] * m[0][2];
        let y = if m13sq < 0.9999999 {
            m[0][2].atan2((1.0 - m13sq).sqrt())
        } else {
            std::f64::consts::FRAC_PI_2.copysign(m[0][2])
        };
        let z = (-m[0][1]).atan2(m[0][0]);
        Euler { z, y, x }
    }

    /// Multiply a vector.
    pub fn apply(&self, p: DVec3) -> DVec3 {
        let m = &self.m;
        DVec3::new(
            p.x * m[0][0] + p.y * m[0][1] + p.z * m[0][2],
            p.x * m[1][0] + p.y * m[1][1] + p.z * m[1][2],
            p.x * m[2][0] + p.y * m[2][1] + p.z * m[2][2],
        )
    }
}

/// Axis-aligned box in its own coordinate system, placed by centre and orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shoebox {
    /// Centre position.
    pub center: DVec3,
    /// Edge lengths.
    pub size: DVec3,
    /// Orientation of the box axes.
    pub orientation: Euler,
}

impl Shoebox {
    /// Create a new box.
    pub fn new(center: DVec3, size: DVec3, orientation: Euler) -> Self {
        Self {
            center,
            size,
            orientation,
        }
    }

    /// Vector from `p` to the nearest point of the box (zero inside).
    pub fn next_point(&self, p: DVec3) -> DVec3 {
        let local = self.orientation.rotate_inverse(p - self.center);
        let half = self.size * 0.5;
        let clamp = |v: f64, h: f64| {
            if v > h {
                v - h
            } else if v < -h {
                v + h
            } else {
                0.0
            }
        };
        DVec3::new(
            clamp(local.x, half.x),
            clamp(local.y, half.y),
            clamp(local.z, half.z),
        )
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.size.box_volume()
    }

    /// Box surface area.
    pub fn area(&self) -> f64 {
        self.size.box_area()
    }
}

/// Distance between two points.
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).length()
}
