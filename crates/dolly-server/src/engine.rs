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

//! A render engine stand-in that owns a scene file and a camera, nothing else.

use anyhow::{bail, Result};
use dolly_core::math::Mat4;
use dolly_core::RenderEngine;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Scene file extensions the farm accepts.
pub const SCENE_EXTENSIONS: [&str; 3] = ["bsz", "bsa", "bsx"];

/// Rejects files that are not scene files or do not exist.
pub fn validate_scene_path(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if SCENE_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => bail!(
            "'{}' is not a scene file (expected one of .{})",
            path.display(),
            SCENE_EXTENSIONS.join(", .")
        ),
    }
    if !path.is_file() {
        bail!("Scene file '{}' does not exist", path.display());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Camera {
    transform: Mat4,
    focus_distance: f64,
}

/// Headless engine: the camera moves, nothing is drawn.
#[derive(Debug)]
pub struct SceneFileEngine {
    scene: PathBuf,
    camera: Mutex<Camera>,
}

impl SceneFileEngine {
    /// Creates an engine for `scene` with the camera at the origin.
    pub fn new(scene: impl Into<PathBuf>) -> Self {
        Self {
            scene: scene.into(),
            camera: Mutex::new(Camera {
                transform: Mat4::IDENTITY,
                focus_distance: 1.0,
            }),
        }
    }

    // The camera is plain data, so a panic elsewhere cannot leave it torn.
    fn camera(&self) -> MutexGuard<'_, Camera> {
        self.camera.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderEngine for SceneFileEngine {
    fn camera_transform(&self) -> Mat4 {
        self.camera().transform
    }

    fn set_camera_transform(&self, transform: Mat4) {
        self.camera().transform = transform;
    }

    fn focus_distance(&self) -> f64 {
        self.camera().focus_distance
    }

    fn set_focus_distance(&self, distance: f64) {
        self.camera().focus_distance = distance;
    }

    fn scene_path(&self) -> PathBuf {
        self.scene.clone()
    }
}
