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

//! Camera keyframes and the interpolator that walks between them.
//!
//! A camera path has exactly two [`Keyframe`]s. Workers ask for a frame number;
//! the [`FrameTiming`] turns it into a normalized time and the
//! [`KeyframeInterpolator`] produces the camera pose for that instant.

mod error;
mod euler;
mod interpolator;
mod keyframe;

pub use self::error::CameraError;
pub use self::euler::EulerAngles;
pub use self::interpolator::{CameraSample, FrameTiming, KeyframeInterpolator, DEFAULT_FRAME_STEP};
pub use self::keyframe::{Keyframe, KeyframeSlot};
