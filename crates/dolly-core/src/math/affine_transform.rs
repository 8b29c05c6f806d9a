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

//! Affine camera transforms and their decomposition into translation,
//! rotation and scale.

use crate::math::{Mat3, Mat4, Quaternion, Vec3, Vec4};
use std::fmt;

/// A basis column of a transform had no usable direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateAxis {
    /// Index (0..3) of the offending basis column.
    pub column: usize,
}

impl fmt::Display for DegenerateAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "basis column {} has zero or non-finite length",
            self.column
        )
    }
}

impl std::error::Error for DegenerateAxis {}

/// The parts of an [`AffineTransform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposed {
    /// Position, taken from the fourth column.
    pub translation: Vec3,
    /// Orientation built from the normalized basis columns.
    pub rotation: Quaternion,
    /// Length of each basis column.
    pub scale: Vec3,
}

/// A 4x4 matrix known to describe an affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct AffineTransform(pub Mat4);

impl AffineTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Composes `translation * rotation * scale`.
    ///
    /// ```rust
    /// use dolly_core::math::{AffineTransform, Quaternion, Vec3};
    ///
    /// let t = AffineTransform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quaternion::IDENTITY, Vec3::ONE);
    /// assert_eq!(t.translation(), Vec3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn from_trs(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        let r = Mat3::from_quat(rotation);
        Self(Mat4::from_cols(
            Vec4::from_vec3(r.cols[0] * scale.x, 0.0),
            Vec4::from_vec3(r.cols[1] * scale.y, 0.0),
            Vec4::from_vec3(r.cols[2] * scale.z, 0.0),
            Vec4::from_vec3(translation, 1.0),
        ))
    }

    /// Returns the underlying matrix.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        self.0
    }

    /// Returns the translation component.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.0.cols[3].truncate()
    }

    /// Returns the three basis columns scaled to unit length.
    ///
    /// Each column is normalized on its own; no Gram-Schmidt pass is applied,
    /// so a sheared input stays sheared.
    pub fn normalized_basis(&self) -> Result<Mat3, DegenerateAxis> {
        let basis = Mat3::from_mat4(&self.0);
        let mut cols = [Vec3::ZERO; 3];
        for (column, (out, axis)) in cols.iter_mut().zip(basis.cols).enumerate() {
            *out = axis.try_normalize().ok_or(DegenerateAxis { column })?;
        }
        Ok(Mat3 { cols })
    }

    /// Splits the transform into translation, rotation and per-axis scale.
    pub fn decompose(&self) -> Result<Decomposed, DegenerateAxis> {
        let basis = Mat3::from_mat4(&self.0);
        let rotation = Quaternion::from_rotation_matrix(&self.normalized_basis()?);
        Ok(Decomposed {
            translation: self.translation(),
            rotation,
            scale: Vec3::new(
                basis.cols[0].length(),
                basis.cols[1].length(),
                basis.cols[2].length(),
            ),
        })
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Mat4> for AffineTransform {
    #[inline]
    fn from(matrix: Mat4) -> Self {
        Self(matrix)
    }
}

impl From<AffineTransform> for Mat4 {
    #[inline]
    fn from(transform: AffineTransform) -> Self {
        transform.0
    }
}
