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

//! Linear algebra needed to move a camera along a two-keyframe path.
//!
//! Matrices are column-major and act on column vectors. The render engine on the
//! other side of the wire stores the same 16 numbers as row vectors, so a
//! column-major flatten of a [`Mat4`] is exactly the engine's row-major layout,
//! with the translation in elements 12..14.
//!
//! All angular functions in this module operate in **radians**, unless
//! explicitly specified otherwise.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// The factor to convert radians to degrees (180.0 / PI).
pub const RAD_TO_DEG: f32 = 180.0 / PI;

pub mod affine_transform;
pub mod matrix;
pub mod quaternion;
pub mod vector;

pub use self::affine_transform::{AffineTransform, Decomposed, DegenerateAxis};
pub use self::matrix::{Mat3, Mat4};
pub use self::quaternion::Quaternion;
pub use self::vector::{Vec3, Vec4};

/// Converts an angle from radians to degrees.
///
/// # Examples
///
/// ```
/// use dolly_core::math::{radians_to_degrees, PI};
/// assert_eq!(radians_to_degrees(PI), 180.0);
/// ```
#[inline]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * RAD_TO_DEG
}

/// Linear interpolation between two scalars. `t` is not clamped.
///
/// # Examples
///
/// ```
/// use dolly_core::math::lerp;
/// assert_eq!(lerp(5.0, 15.0, 0.5), 10.0);
/// assert_eq!(lerp(5.0, 15.0, 1.5), 20.0);
/// ```
#[inline]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

/// Performs an approximate equality comparison using the module's default [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
