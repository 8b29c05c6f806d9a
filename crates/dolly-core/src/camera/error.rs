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

//! Errors raised while building or sampling a camera path.

use super::KeyframeSlot;
use std::fmt;

/// An error related to keyframe validation or camera path sampling.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// A keyframe's rotation basis has a column that cannot be normalized.
    DegenerateRotation {
        /// The keyframe that holds the bad transform.
        slot: KeyframeSlot,
        /// Index of the zero-length or non-finite basis column.
        column: usize,
    },
    /// The interpolation parameter was NaN or infinite.
    NonFiniteTime {
        /// The rejected parameter.
        t: f32,
    },
    /// A frame timing was built with zero total frames.
    ZeroFrameCount,
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DegenerateRotation { slot, column } => write!(
                f,
                "Keyframe {slot} has a degenerate rotation: basis column {column} has zero or non-finite length"
            ),
            CameraError::NonFiniteTime { t } => {
                write!(f, "Interpolation parameter must be finite, got {t}")
            }
            CameraError::ZeroFrameCount => {
                write!(f, "Total frame count must be greater than zero")
            }
        }
    }
}

impl std::error::Error for CameraError {}
