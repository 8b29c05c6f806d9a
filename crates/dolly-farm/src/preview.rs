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

//! Local camera-path preview, independent of the farm.

use crate::coordinator::DispatchCoordinator;
use crate::error::FarmResult;
use dolly_core::KeyframeSlot;
use std::sync::Arc;
use std::time::Duration;

/// Pause between preview ticks when playing back in real time.
pub const PREVIEW_FRAME_DELAY: Duration = Duration::from_millis(500);

/// What a [`PreviewPlayer::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    /// The player is stopped; nothing changed.
    Idle,
    /// The engine camera moved to this frame.
    Playing(u32),
    /// The last frame was passed; the camera sits on the end keyframe.
    Finished,
}

/// Walks the engine camera along the path one frame per tick.
///
/// Unlike dispatch, preview samples at `t = frame / total_frames`, so it
/// covers exactly the stretch between the two keyframes.
pub struct PreviewPlayer {
    coordinator: Arc<DispatchCoordinator>,
    frame: u32,
    playing: bool,
    selected: KeyframeSlot,
}

impl PreviewPlayer {
    /// Creates a stopped player at frame 0 with the start keyframe selected.
    pub fn new(coordinator: Arc<DispatchCoordinator>) -> Self {
        Self {
            coordinator,
            frame: 0,
            playing: false,
            selected: KeyframeSlot::Start,
        }
    }

    /// Starts playback from the current frame.
    pub fn start(&mut self) {
        self.playing = true;
        self.selected = KeyframeSlot::Start;
        log::info!("Preview started at frame {}", self.frame);
    }

    /// Stops playback and puts the camera back on the start keyframe.
    pub fn stop(&mut self) -> FarmResult<()> {
        self.playing = false;
        self.select(KeyframeSlot::Start)
    }

    /// Selects `slot` for editing and jumps the camera to it.
    pub fn select(&mut self, slot: KeyframeSlot) -> FarmResult<()> {
        self.selected = slot;
        self.coordinator.jump_to_keyframe(slot)
    }

    /// Advances one frame.
    pub fn tick(&mut self) -> FarmResult<PreviewStatus> {
        if !self.playing {
            return Ok(PreviewStatus::Idle);
        }

        let total = self.coordinator.timing().total_frames();
        self.frame += 1;
        if self.frame > total {
            self.frame = 0;
            self.playing = false;
            self.select(KeyframeSlot::End)?;
            log::info!("Preview finished");
            return Ok(PreviewStatus::Finished);
        }

        let t = self.frame as f32 / total as f32;
        let sample = self.coordinator.sample_at(t)?;
        self.coordinator.apply(&sample);
        log::debug!("Preview frame {} (t = {t:.3})", self.frame);
        Ok(PreviewStatus::Playing(self.frame))
    }

    /// Whether the player is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The current preview frame.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// The keyframe slot GUI edits apply to.
    pub fn selected(&self) -> KeyframeSlot {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use crate::switch::FarmSwitch;
    use dolly_core::math::{Mat4, Vec3};
    use dolly_core::{FrameTiming, Keyframe, RenderEngine};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubEngine {
        camera: Mutex<(Mat4, f64)>,
    }

    impl RenderEngine for StubEngine {
        fn camera_transform(&self) -> Mat4 {
            self.camera.lock().unwrap().0
        }
        fn set_camera_transform(&self, transform: Mat4) {
            self.camera.lock().unwrap().0 = transform;
        }
        fn focus_distance(&self) -> f64 {
            self.camera.lock().unwrap().1
        }
        fn set_focus_distance(&self, distance: f64) {
            self.camera.lock().unwrap().1 = distance;
        }
        fn scene_path(&self) -> PathBuf {
            PathBuf::from("scene.bsz")
        }
    }

    fn player(total: u32) -> (Arc<StubEngine>, PreviewPlayer) {
        let engine = Arc::new(StubEngine::default());
        let coord = Arc::new(DispatchCoordinator::new(
            engine.clone(),
            Arc::new(NullSink),
            FrameTiming::new(total, 3).unwrap(),
            FarmSwitch::default(),
        ));
        coord
            .set_keyframe(KeyframeSlot::Start, Keyframe::new(Mat4::IDENTITY, 0.0))
            .unwrap();
        coord
            .set_keyframe(
                KeyframeSlot::End,
                Keyframe::new(Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)), 4.0),
            )
            .unwrap();
        (engine, PreviewPlayer::new(coord))
    }

    #[test]
    fn test_idle_until_started() {
        let (_, mut p) = player(4);
        assert_eq!(p.tick().unwrap(), PreviewStatus::Idle);
        assert_eq!(p.frame(), 0);
    }

    #[test]
    fn test_plays_through_and_lands_on_end_keyframe() {
        let (engine, mut p) = player(4);
        p.start();
        for frame in 1..=4 {
            assert_eq!(p.tick().unwrap(), PreviewStatus::Playing(frame));
            assert_eq!(engine.focus_distance(), f64::from(frame));
        }
        assert_eq!(p.tick().unwrap(), PreviewStatus::Finished);
        assert!(!p.is_playing());
        assert_eq!(p.frame(), 0);
        assert_eq!(p.selected(), KeyframeSlot::End);
        assert_eq!(engine.camera_transform().cols[3].x, 4.0);
    }

    #[test]
    fn test_stop_returns_to_start_keyframe() {
        let (engine, mut p) = player(4);
        p.start();
        p.tick().unwrap();
        p.stop().unwrap();
        assert!(!p.is_playing());
        assert_eq!(engine.camera_transform(), Mat4::IDENTITY);
        assert_eq!(engine.focus_distance(), 0.0);
    }
}
