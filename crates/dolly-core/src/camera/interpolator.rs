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

//! Two-keyframe camera path sampling.

use super::{CameraError, Keyframe, KeyframeSlot};
use crate::math::{lerp, AffineTransform, Decomposed, Mat4, Quaternion, Vec3};

/// Frames advanced per unit of normalized time numerator. A path sampled at
/// frame `f` sits at `t = f * DEFAULT_FRAME_STEP / total_frames`.
pub const DEFAULT_FRAME_STEP: u32 = 3;

/// Maps frame numbers onto the interpolation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    total_frames: u32,
    frame_step: u32,
}

impl FrameTiming {
    /// Creates a timing for `total_frames` frames.
    ///
    /// Returns [`CameraError::ZeroFrameCount`] if `total_frames` is zero.
    pub fn new(total_frames: u32, frame_step: u32) -> Result<Self, CameraError> {
        if total_frames == 0 {
            return Err(CameraError::ZeroFrameCount);
        }
        Ok(Self {
            total_frames,
            frame_step,
        })
    }

    /// The configured frame count.
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// The multiplier applied to the frame number.
    pub fn frame_step(&self) -> u32 {
        self.frame_step
    }

    /// Returns `frame * frame_step / total_frames`, computed in `f32`.
    ///
    /// The result is not clamped. With the default step, frames past a third
    /// of the total already sample beyond the end keyframe.
    pub fn normalized_time(&self, frame: i64) -> f32 {
        frame as f32 * self.frame_step as f32 / self.total_frames as f32
    }
}

/// The camera state at one point along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Interpolated camera-to-world transform.
    pub transform: Mat4,
    /// Interpolated focus distance.
    pub focus_distance: f64,
}

/// Blends between a start and an end [`Keyframe`].
///
/// Rotation follows a shortest-arc slerp, translation and focus distance a
/// linear blend. None of them clamp `t`, so sampling outside `[0, 1]`
/// continues the motion past either keyframe. Scale is taken from the start
/// keyframe and is never blended.
#[derive(Debug, Clone, Default)]
pub struct KeyframeInterpolator {
    keyframes: [Keyframe; 2],
}

impl KeyframeInterpolator {
    /// Creates an interpolator between `start` and `end`.
    ///
    /// Both keyframes must decompose into a usable rotation.
    pub fn new(start: Keyframe, end: Keyframe) -> Result<Self, CameraError> {
        let path = Self {
            keyframes: [start, end],
        };
        path.validate()?;
        Ok(path)
    }

    /// Returns the keyframe in `slot`.
    #[inline]
    pub fn get(&self, slot: KeyframeSlot) -> &Keyframe {
        &self.keyframes[slot.index()]
    }

    /// Overwrites the keyframe in `slot`.
    ///
    /// A keyframe whose rotation cannot be recovered is rejected and the
    /// previous one is kept.
    pub fn set(&mut self, slot: KeyframeSlot, keyframe: Keyframe) -> Result<(), CameraError> {
        decompose_keyframe(&keyframe, slot)?;
        log::debug!(
            "Keyframe {slot} set, focus distance {:.3}",
            keyframe.focus_distance
        );
        self.keyframes[slot.index()] = keyframe;
        Ok(())
    }

    /// Both keyframes in slot order.
    pub fn keyframes(&self) -> &[Keyframe; 2] {
        &self.keyframes
    }

    /// Checks that both keyframes decompose cleanly.
    pub fn validate(&self) -> Result<(), CameraError> {
        for slot in KeyframeSlot::ALL {
            self.decompose(slot)?;
        }
        Ok(())
    }

    /// Samples the path at normalized time `t`.
    ///
    /// # Errors
    ///
    /// * [`CameraError::NonFiniteTime`] if `t` is NaN or infinite.
    /// * [`CameraError::DegenerateRotation`] if either keyframe has a basis
    ///   column that cannot be normalized.
    pub fn sample(&self, t: f32) -> Result<CameraSample, CameraError> {
        if !t.is_finite() {
            return Err(CameraError::NonFiniteTime { t });
        }

        let start = self.decompose(KeyframeSlot::Start)?;
        let end = self.decompose(KeyframeSlot::End)?;

        let rotation = Quaternion::slerp(start.rotation, end.rotation, t);
        let translation = Vec3::lerp(start.translation, end.translation, t);
        let transform = AffineTransform::from_trs(translation, rotation, start.scale).to_matrix();

        let focus_distance = lerp(
            self.get(KeyframeSlot::Start).focus_distance,
            self.get(KeyframeSlot::End).focus_distance,
            f64::from(t),
        );

        log::trace!("Sampled camera path at t = {t}");
        Ok(CameraSample {
            transform,
            focus_distance,
        })
    }

    /// Samples the path at `frame` using `timing` to compute `t`.
    pub fn sample_frame(
        &self,
        frame: i64,
        timing: &FrameTiming,
    ) -> Result<CameraSample, CameraError> {
        self.sample(timing.normalized_time(frame))
    }

    fn decompose(&self, slot: KeyframeSlot) -> Result<Decomposed, CameraError> {
        decompose_keyframe(self.get(slot), slot)
    }
}

fn decompose_keyframe(keyframe: &Keyframe, slot: KeyframeSlot) -> Result<Decomposed, CameraError> {
    AffineTransform(keyframe.transform)
        .decompose()
        .map_err(|e| CameraError::DegenerateRotation {
            slot,
            column: e.column,
        })
}
