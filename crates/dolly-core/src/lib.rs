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

//! # Dolly Core
//!
//! Foundational crate for the render farm: the math primitives, the two-keyframe
//! camera interpolator, and the contracts the farm expects from a render engine.

#![warn(missing_docs)]

pub mod camera;
pub mod engine;
pub mod math;

pub use camera::{
    CameraError, CameraSample, EulerAngles, FrameTiming, Keyframe, KeyframeInterpolator,
    KeyframeSlot, DEFAULT_FRAME_STEP,
};
pub use engine::{EngineObserver, FrameSink, RawImage, RenderEngine, SceneInfo};
