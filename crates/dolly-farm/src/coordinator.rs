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

//! The single owner of dispatch state.
//!
//! Keyframes, the frame counter and the ledger live behind one lock held for
//! exactly one operation. The command channel, the image channel, the GUI
//! caller and the renderer's callbacks all go through [`DispatchCoordinator`].

use crate::error::{FarmError, FarmResult};
use crate::ledger::{FrameAssignment, WorkerLedger};
use crate::protocol::{Command, CommandReply, RouterRequest};
use crate::scene::{read_scene, scene_checksum};
use crate::switch::FarmSwitch;
use dolly_core::{
    CameraSample, EngineObserver, FrameSink, FrameTiming, Keyframe, KeyframeInterpolator,
    KeyframeSlot, RawImage, RenderEngine, SceneInfo,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// A read-only view of the dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchState {
    /// Last frame handed out, `-1` before the first one.
    pub current_frame: i64,
    /// Configured number of frames.
    pub total_frames: i64,
    /// Whether farm mode is on.
    pub farm_enabled: bool,
}

impl DispatchState {
    /// Whether scene and checksum requests are now answered with standby.
    pub fn is_exhausted(&self) -> bool {
        self.current_frame >= self.total_frames
    }
}

#[derive(Debug)]
struct Dispatch {
    path: KeyframeInterpolator,
    current_frame: i64,
    ledger: WorkerLedger,
    progress: f32,
}

/// Coordinates frame dispatch between workers, the GUI and the renderer.
///
/// The coordinator calls into the [`RenderEngine`] while holding its lock.
/// Engines must therefore not hold their own locks while invoking
/// [`EngineObserver`] callbacks on it.
pub struct DispatchCoordinator {
    engine: Arc<dyn RenderEngine>,
    sink: Arc<dyn FrameSink>,
    timing: FrameTiming,
    switch: FarmSwitch,
    state: Mutex<Dispatch>,
}

impl DispatchCoordinator {
    /// Creates a coordinator with identity keyframes and nothing dispatched.
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        sink: Arc<dyn FrameSink>,
        timing: FrameTiming,
        switch: FarmSwitch,
    ) -> Self {
        let state = Dispatch {
            path: KeyframeInterpolator::default(),
            current_frame: -1,
            ledger: WorkerLedger::new(timing.total_frames()),
            progress: 0.0,
        };
        Self {
            engine,
            sink,
            timing,
            switch,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> FarmResult<MutexGuard<'_, Dispatch>> {
        self.state.lock().map_err(|_| FarmError::Poisoned)
    }

    /// The farm-mode switch.
    pub fn switch(&self) -> &FarmSwitch {
        &self.switch
    }

    /// The frame-to-time mapping.
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    /// The scene file workers download.
    pub fn scene_path(&self) -> PathBuf {
        self.engine.scene_path()
    }

    // --- Worker requests ---

    /// Answers one command-port request.
    ///
    /// Errors are fatal to the command channel.
    pub fn handle(&self, request: &RouterRequest) -> FarmResult<CommandReply> {
        match &request.command {
            Command::FetchScene => {
                if self.dispatch_state()?.is_exhausted() {
                    return Ok(CommandReply::Standby);
                }
                Ok(CommandReply::Scene(read_scene(&self.scene_path())?))
            }
            Command::ReadyImage => Ok(CommandReply::CurrentFrame(self.lock()?.current_frame)),
            Command::GetFragment => self.next_fragment(&request.worker_id()),
            Command::Checksum(text) => {
                log::debug!("Checksum requested with '{text}'");
                if self.dispatch_state()?.is_exhausted() {
                    return Ok(CommandReply::Standby);
                }
                Ok(CommandReply::Checksum(scene_checksum(&self.scene_path())?))
            }
        }
    }

    /// Advances the frame counter and hands the new frame to `worker_id`.
    ///
    /// The counter moves even when the answer is standby, so it never
    /// decreases and never repeats a frame.
    pub fn next_fragment(&self, worker_id: &str) -> FarmResult<CommandReply> {
        let mut state = self.lock()?;
        state.current_frame += 1;
        let frame = state.current_frame;
        if frame > i64::from(self.timing.total_frames()) {
            log::debug!("Worker {worker_id} asked for work past the last frame");
            return Ok(CommandReply::Standby);
        }

        let sample = state.path.sample_frame(frame, &self.timing)?;
        self.apply(&sample);
        state.ledger.assign(frame, worker_id);
        log::info!(
            "Frame {frame} -> worker {worker_id} (t = {:.3}, focus {:.3})",
            self.timing.normalized_time(frame),
            sample.focus_distance
        );
        Ok(CommandReply::Fragment {
            frame,
            transform: sample.transform,
        })
    }

    /// Records that the image for `frame` arrived. Returns `false` for frames
    /// the ledger does not know.
    pub fn mark_image_received(&self, frame: i64) -> FarmResult<bool> {
        Ok(self.lock()?.ledger.mark_received(frame))
    }

    // --- GUI-facing operations ---

    /// Copies the engine's live camera into `slot`.
    pub fn capture_keyframe(&self, slot: KeyframeSlot) -> FarmResult<()> {
        let keyframe = Keyframe::new(self.engine.camera_transform(), self.engine.focus_distance());
        self.set_keyframe(slot, keyframe)
    }

    /// Replaces the keyframe in `slot`. Degenerate poses are rejected.
    pub fn set_keyframe(&self, slot: KeyframeSlot, keyframe: Keyframe) -> FarmResult<()> {
        self.lock()?.path.set(slot, keyframe)?;
        Ok(())
    }

    /// Returns the keyframe in `slot`.
    pub fn keyframe(&self, slot: KeyframeSlot) -> FarmResult<Keyframe> {
        Ok(*self.lock()?.path.get(slot))
    }

    /// Moves the engine camera to the keyframe in `slot`.
    pub fn jump_to_keyframe(&self, slot: KeyframeSlot) -> FarmResult<()> {
        let keyframe = self.keyframe(slot)?;
        self.engine.set_camera_transform(keyframe.transform);
        self.engine.set_focus_distance(keyframe.focus_distance);
        Ok(())
    }

    /// Camera state for `frame`, without touching the engine or the counter.
    pub fn sample_frame(&self, frame: i64) -> FarmResult<CameraSample> {
        Ok(self.lock()?.path.sample_frame(frame, &self.timing)?)
    }

    /// Camera state at normalized time `t`.
    pub fn sample_at(&self, t: f32) -> FarmResult<CameraSample> {
        Ok(self.lock()?.path.sample(t)?)
    }

    /// Pushes a sample into the engine camera.
    pub fn apply(&self, sample: &CameraSample) {
        self.engine.set_camera_transform(sample.transform);
        self.engine.set_focus_distance(sample.focus_distance);
    }

    /// A copy of the ledger, ordered by frame.
    pub fn ledger_snapshot(&self) -> FarmResult<Vec<FrameAssignment>> {
        Ok(self.lock()?.ledger.entries())
    }

    /// Frames whose images have arrived.
    pub fn completed_frames(&self) -> FarmResult<usize> {
        Ok(self.lock()?.ledger.completed_count())
    }

    /// Counter and switch state.
    pub fn dispatch_state(&self) -> FarmResult<DispatchState> {
        let current_frame = self.lock()?.current_frame;
        Ok(DispatchState {
            current_frame,
            total_frames: i64::from(self.timing.total_frames()),
            farm_enabled: self.switch.is_enabled(),
        })
    }

    /// Last progress fraction reported by the renderer.
    pub fn progress(&self) -> FarmResult<f32> {
        Ok(self.lock()?.progress)
    }
}

impl EngineObserver for DispatchCoordinator {
    fn on_scene_loaded(&self, scene: &SceneInfo) {
        log::info!("Scene loaded from '{}'", scene.path.display());
        for slot in KeyframeSlot::ALL {
            if let Err(e) = self.capture_keyframe(slot) {
                log::error!("Could not initialise keyframe {slot} from the scene camera: {e}");
            }
        }
    }

    fn on_image(&self, pass: &str, image: &RawImage) {
        if let Err(e) = self.sink.present(pass, image) {
            log::error!("Failed to present image from pass '{pass}': {e:#}");
        }
    }

    fn on_error(&self, pass: &str, message: &str) {
        log::error!("Render pass '{pass}' failed: {message}");
    }

    fn on_progress(&self, pass: &str, progress: f32) {
        log::trace!("Pass '{pass}' at {:.1}%", progress * 100.0);
        match self.lock() {
            Ok(mut state) => state.progress = progress.clamp(0.0, 1.0),
            Err(e) => log::error!("Dropping progress update: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use dolly_core::math::{AffineTransform, Mat4, Quaternion, Vec3, Vec4, FRAC_PI_2};
    use std::io::Write;

    #[derive(Default)]
    struct StubEngine {
        camera: Mutex<(Mat4, f64)>,
        scene: PathBuf,
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
            self.scene.clone()
        }
    }

    fn coordinator(engine: Arc<StubEngine>, total: u32) -> DispatchCoordinator {
        DispatchCoordinator::new(
            engine,
            Arc::new(NullSink),
            FrameTiming::new(total, 3).unwrap(),
            FarmSwitch::new(true),
        )
    }

    fn request(command: Command) -> RouterRequest {
        RouterRequest {
            peer_id: b"worker-1".to_vec(),
            command,
            payload: Vec::new(),
        }
    }

    fn yawed_end() -> Keyframe {
        Keyframe::new(
            AffineTransform::from_trs(
                Vec3::new(10.0, 0.0, 0.0),
                Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2),
                Vec3::ONE,
            )
            .to_matrix(),
            15.0,
        )
    }

    #[test]
    fn test_fragments_then_standby() {
        let coord = coordinator(Arc::new(StubEngine::default()), 3);
        let mut frames = Vec::new();
        for _ in 0..6 {
            match coord.handle(&request(Command::GetFragment)).unwrap() {
                CommandReply::Fragment { frame, .. } => frames.push(frame),
                CommandReply::Standby => frames.push(-100),
                other => panic!("unexpected reply {other:?}"),
            }
        }
        assert_eq!(frames, vec![0, 1, 2, 3, -100, -100]);
        assert_eq!(coord.dispatch_state().unwrap().current_frame, 5);
    }

    #[test]
    fn test_fragment_moves_engine_and_fills_ledger() {
        let engine = Arc::new(StubEngine::default());
        let coord = coordinator(engine.clone(), 10);
        coord
            .set_keyframe(KeyframeSlot::Start, Keyframe::new(Mat4::IDENTITY, 5.0))
            .unwrap();
        coord.set_keyframe(KeyframeSlot::End, yawed_end()).unwrap();

        for _ in 0..6 {
            coord.next_fragment("worker-1").unwrap();
        }
        // Frame 5: t = 1.5.
        assert_eq!(engine.focus_distance(), 20.0);
        assert!((engine.camera_transform().cols[3].x - 15.0).abs() < 1e-4);

        let ledger = coord.ledger_snapshot().unwrap();
        assert_eq!(ledger[5].worker_id, "worker-1");
        assert!(ledger[5].started_at > 0);
        assert_eq!(ledger[6].worker_id, crate::ledger::NOT_ASSIGNED);
    }

    #[test]
    fn test_ready_image_reports_current_frame() {
        let coord = coordinator(Arc::new(StubEngine::default()), 10);
        assert_eq!(
            coord.handle(&request(Command::ReadyImage)).unwrap(),
            CommandReply::CurrentFrame(-1)
        );
        coord.next_fragment("w").unwrap();
        assert_eq!(
            coord.handle(&request(Command::ReadyImage)).unwrap(),
            CommandReply::CurrentFrame(0)
        );
    }

    #[test]
    fn test_scene_and_checksum_until_exhausted() {
        let mut scene = tempfile::NamedTempFile::new().unwrap();
        scene.write_all(b"scene-bytes").unwrap();
        let engine = Arc::new(StubEngine {
            scene: scene.path().to_path_buf(),
            ..Default::default()
        });
        let coord = coordinator(engine, 2);

        assert_eq!(
            coord.handle(&request(Command::FetchScene)).unwrap(),
            CommandReply::Scene(b"scene-bytes".to_vec())
        );
        assert!(matches!(
            coord.handle(&request(Command::Checksum("x".into()))).unwrap(),
            CommandReply::Checksum(hex) if hex.len() == 64
        ));

        // Frames 0 and 1 dispatched: counter reaches 1, still below 2.
        coord.next_fragment("w").unwrap();
        coord.next_fragment("w").unwrap();
        assert!(matches!(
            coord.handle(&request(Command::FetchScene)).unwrap(),
            CommandReply::Scene(_)
        ));

        // Frame 2 is still handed out, but scene requests now stand by.
        assert!(matches!(
            coord.next_fragment("w").unwrap(),
            CommandReply::Fragment { frame: 2, .. }
        ));
        assert_eq!(
            coord.handle(&request(Command::FetchScene)).unwrap(),
            CommandReply::Standby
        );
        assert_eq!(
            coord.handle(&request(Command::Checksum("x".into()))).unwrap(),
            CommandReply::Standby
        );
    }

    #[test]
    fn test_missing_scene_is_fatal() {
        let engine = Arc::new(StubEngine {
            scene: PathBuf::from("/definitely/not/here.bsz"),
            ..Default::default()
        });
        let coord = coordinator(engine, 2);
        assert!(matches!(
            coord.handle(&request(Command::FetchScene)),
            Err(FarmError::SceneRead { .. })
        ));
    }

    #[test]
    fn test_scene_loaded_captures_both_keyframes() {
        let engine = Arc::new(StubEngine::default());
        let pose = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        engine.set_camera_transform(pose);
        engine.set_focus_distance(7.5);

        let coord = coordinator(engine.clone(), 10);
        coord.on_scene_loaded(&SceneInfo {
            path: PathBuf::from("scene.bsz"),
        });
        for slot in KeyframeSlot::ALL {
            assert_eq!(coord.keyframe(slot).unwrap(), Keyframe::new(pose, 7.5));
        }
    }

    #[test]
    fn test_degenerate_keyframe_is_rejected() {
        let coord = coordinator(Arc::new(StubEngine::default()), 10);
        let mut broken = Mat4::IDENTITY;
        broken.cols[2] = Vec4::ZERO;
        let err = coord
            .set_keyframe(KeyframeSlot::End, Keyframe::new(broken, 1.0))
            .unwrap_err();
        assert!(matches!(err, FarmError::Camera(_)));
        assert_eq!(coord.keyframe(KeyframeSlot::End).unwrap(), Keyframe::default());
    }

    #[test]
    fn test_jump_to_keyframe_moves_engine() {
        let engine = Arc::new(StubEngine::default());
        let coord = coordinator(engine.clone(), 10);
        coord.set_keyframe(KeyframeSlot::End, yawed_end()).unwrap();
        coord.jump_to_keyframe(KeyframeSlot::End).unwrap();
        assert_eq!(engine.camera_transform(), yawed_end().transform);
        assert_eq!(engine.focus_distance(), 15.0);
    }

    #[test]
    fn test_progress_is_stored() {
        let coord = coordinator(Arc::new(StubEngine::default()), 10);
        coord.on_progress("beauty", 0.25);
        assert_eq!(coord.progress().unwrap(), 0.25);
    }
}
