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

//! Euler angle readout for display.

use crate::math::{radians_to_degrees, Mat3, FRAC_PI_2};
use std::fmt;

/// Above this magnitude the forward coefficient is treated as gimbal lock.
const GIMBAL_LOCK_THRESHOLD: f32 = 0.999;

/// Pitch, yaw and roll in **degrees**, about the X, Y and Z axes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    /// Rotation about the X axis.
    pub pitch: f32,
    /// Rotation about the Y axis.
    pub yaw: f32,
    /// Rotation about the Z axis.
    pub roll: f32,
}

impl EulerAngles {
    /// Reads Euler angles out of a pure rotation matrix.
    ///
    /// When the yaw reaches ±90° the roll is pinned to zero and the remaining
    /// rotation is reported as pitch.
    pub fn from_rotation(m: &Mat3) -> Self {
        let [c0, c1, c2] = m.cols;
        let forward = c0.z;

        let (pitch, yaw, roll) = if forward < -GIMBAL_LOCK_THRESHOLD {
            (c1.x.atan2(c2.x), FRAC_PI_2, 0.0)
        } else if forward > GIMBAL_LOCK_THRESHOLD {
            ((-c1.x).atan2(-c2.x), -FRAC_PI_2, 0.0)
        } else {
            let inv = 1.0 / (1.0 - forward * forward).sqrt();
            (
                (c1.z * inv).atan2(c2.z * inv),
                -forward.asin(),
                (c0.y * inv).atan2(c0.x * inv),
            )
        };

        Self {
            pitch: radians_to_degrees(pitch),
            yaw: radians_to_degrees(yaw),
            roll: radians_to_degrees(roll),
        }
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch {:.2}° yaw {:.2}° roll {:.2}°",
            self.pitch, self.yaw, self.roll
        )
    }
}
