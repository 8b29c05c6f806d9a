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

//! Contracts between the farm and the renderer that hosts it.
//!
//! The farm never renders anything itself. It drives a [`RenderEngine`]'s
//! camera, listens to it through an [`EngineObserver`], and hands finished
//! preview buffers to a [`FrameSink`].

use crate::math::Mat4;
use anyhow::{ensure, Result};
use std::path::PathBuf;

/// The camera and scene surface of a renderer.
///
/// Methods take `&self`; implementations are expected to synchronize
/// internally since the farm calls them from its network tasks.
pub trait RenderEngine: Send + Sync {
    /// Returns the current camera-to-world transform.
    fn camera_transform(&self) -> Mat4;

    /// Moves the camera.
    fn set_camera_transform(&self, transform: Mat4);

    /// Returns the current focus distance of the camera lens.
    fn focus_distance(&self) -> f64;

    /// Sets the focus distance of the camera lens.
    fn set_focus_distance(&self, distance: f64);

    /// Path of the scene file currently loaded, shipped to workers verbatim.
    fn scene_path(&self) -> PathBuf;
}

/// Metadata about a freshly loaded scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInfo {
    /// Where the scene was loaded from.
    pub path: PathBuf,
}

/// A decoded RGBA8 image produced by a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl RawImage {
    /// Wraps an RGBA8 buffer, checking that its size matches the dimensions.
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        ensure!(
            pixels.len() == expected,
            "RGBA8 buffer of {}x{} needs {} bytes, got {}",
            width,
            height,
            expected,
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Callbacks a renderer issues while it works.
///
/// `pass` names the render pass that produced the event.
pub trait EngineObserver: Send + Sync {
    /// A scene finished loading.
    fn on_scene_loaded(&self, scene: &SceneInfo);

    /// A render pass produced an image.
    fn on_image(&self, pass: &str, image: &RawImage);

    /// A render pass failed.
    fn on_error(&self, pass: &str, message: &str);

    /// A render pass advanced. `progress` is a fraction in `[0, 1]`.
    fn on_progress(&self, pass: &str, progress: f32);
}

/// Destination for preview images.
pub trait FrameSink: Send + Sync {
    /// Consumes one image from `pass`.
    fn present(&self, pass: &str, image: &RawImage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_checks_length() {
        assert!(RawImage::rgba8(2, 2, vec![0; 16]).is_ok());
        let err = RawImage::rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("needs 16 bytes"));
    }
}
