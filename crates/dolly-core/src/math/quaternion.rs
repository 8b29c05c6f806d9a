// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Unit quaternions for camera orientation.

use super::{Mat3, Vec3, EPSILON};
use std::ops::{Add, Mul, Neg};

/// A rotation stored as `(x, y, z, w)`, where `[x, y, z]` is the vector part
/// and `w` the scalar part.
///
/// Only unit quaternions represent rotations. Every constructor except
/// [`Quaternion::new`] returns a normalized value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Quaternion {
    /// Vector part, X.
    pub x: f32,
    /// Vector part, Y.
    pub y: f32,
    /// Vector part, Z.
    pub z: f32,
    /// Scalar part, `cos(angle / 2)` for a unit quaternion.
    pub w: f32,
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Wraps raw components. The result is not normalized.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `angle_radians` around `axis`.
    ///
    /// A zero-length axis yields the identity.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let Some(axis) = axis.try_normalize() else {
            return Self::IDENTITY;
        };
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// Converts an orthonormal rotation matrix into a quaternion.
    ///
    /// The input must already be a pure rotation; scale or shear in `m`
    /// produces a meaningless result.
    pub fn from_rotation_matrix(m: &Mat3) -> Self {
        let (m00, m10, m20) = (m.cols[0].x, m.cols[0].y, m.cols[0].z);
        let (m01, m11, m21) = (m.cols[1].x, m.cols[1].y, m.cols[1].z);
        let (m02, m12, m22) = (m.cols[2].x, m.cols[2].y, m.cols[2].z);

        // euclideanspace.com, matrixToQuaternion. Pick the largest diagonal
        // term so the divisor never approaches zero.
        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = 2.0 * (trace + 1.0).sqrt();
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Calculates the squared length of the quaternion.
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.dot(*self)
    }

    /// Returns the quaternion scaled to unit length.
    /// A near-zero quaternion normalizes to the identity.
    pub fn normalize(&self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > EPSILON {
            *self * (1.0 / mag_sq.sqrt())
        } else {
            Self::IDENTITY
        }
    }

    /// Computes the 4D dot product of two quaternions.
    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Returns the rotation angle, in radians, that takes `self` onto `other`.
    pub fn angle_to(&self, other: Self) -> f32 {
        2.0 * self.dot(other).abs().min(1.0).acos()
    }

    /// Spherical linear interpolation along the shorter arc.
    ///
    /// `t` is **not** clamped: values outside `[0, 1]` keep turning at the
    /// same angular speed past either endpoint. Nearly identical inputs fall
    /// back to a normalized linear blend.
    pub fn slerp(start: Self, end: Self, t: f32) -> Self {
        let mut cos_theta = start.dot(end);
        let mut end = end;

        // q and -q are the same rotation; flip to take the short way round.
        if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            end = -end;
        }

        if cos_theta > 1.0 - EPSILON {
            return (start * (1.0 - t) + end * t).normalize();
        }

        let theta = cos_theta.acos();
        let inv_sin = 1.0 / theta.sin();
        let scale_start = ((1.0 - t) * theta).sin() * inv_sin;
        let scale_end = (t * theta).sin() * inv_sin;
        start * scale_start + end * scale_end
    }
}

impl Default for Quaternion {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Add<Quaternion> for Quaternion {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Mul<f32> for Quaternion {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar, self.w * scalar)
    }
}

impl Neg for Quaternion {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}
