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

use anyhow::Result;
use approx::assert_relative_eq;
use dolly_core::math::{Mat4, Vec3};
use dolly_core::{FrameTiming, Keyframe, KeyframeSlot, RenderEngine};
use dolly_farm::protocol::{FragmentReply, SceneReply};
use dolly_farm::scene::scene_checksum;
use dolly_farm::{
    CommandChannel, DispatchCoordinator, FarmClient, FarmError, FarmResult, FarmSwitch,
    ImageChannel, ImageUploader, NullSink,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use zeromq::{DealerSocket, ReqSocket, Socket, SocketSend, ZmqMessage};

// --- Test Setup: an engine that only tracks its camera ---
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

const SCENE_BYTES: &[u8] = b"BSZ scene payload";

struct Farm {
    dir: TempDir,
    coordinator: Arc<DispatchCoordinator>,
    switch: FarmSwitch,
}

impl Farm {
    fn new(total_frames: u32, enabled: bool) -> Result<Self> {
        let dir = tempdir()?;
        let scene = dir.path().join("scene.bsz");
        std::fs::write(&scene, SCENE_BYTES)?;

        let engine = Arc::new(StubEngine {
            camera: Mutex::new((Mat4::IDENTITY, 1.0)),
            scene,
        });
        let switch = FarmSwitch::new(enabled);
        let coordinator = Arc::new(DispatchCoordinator::new(
            engine,
            Arc::new(NullSink),
            FrameTiming::new(total_frames, 3)?,
            switch.clone(),
        ));
        coordinator.set_keyframe(
            KeyframeSlot::End,
            Keyframe::new(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)), 1.0),
        )?;
        Ok(Self {
            dir,
            coordinator,
            switch,
        })
    }

    fn scene_path(&self) -> PathBuf {
        self.dir.path().join("scene.bsz")
    }

    fn output_dir(&self) -> &Path {
        self.dir.path()
    }

    async fn spawn_command_channel(&self) -> Result<(SocketAddr, JoinHandle<FarmResult<()>>)> {
        let channel = CommandChannel::bind(localhost(), self.coordinator.clone()).await?;
        let addr = channel.local_addr();
        Ok((addr, tokio::spawn(channel.run())))
    }

    async fn spawn_image_channel(&self) -> Result<(SocketAddr, JoinHandle<FarmResult<()>>)> {
        let channel =
            ImageChannel::bind(localhost(), self.coordinator.clone(), self.output_dir()).await?;
        let addr = channel.local_addr();
        Ok((addr, tokio::spawn(channel.run())))
    }
}

fn localhost() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

fn endpoint(addr: SocketAddr) -> String {
    format!("tcp://{addr}")
}

/// Waits for a channel's run loop to end and returns how it ended.
async fn channel_exit(handle: JoinHandle<FarmResult<()>>) -> Result<FarmResult<()>> {
    Ok(tokio::time::timeout(Duration::from_secs(5), handle).await??)
}
// ---

#[tokio::test]
async fn test_fragments_are_issued_once_each_then_standby() -> Result<()> {
    let farm = Farm::new(4, true)?;
    let (addr, _channel) = farm.spawn_command_channel().await?;
    let mut client = FarmClient::connect(addr).await?;

    assert_eq!(client.ready_image().await?, -1);

    for expected in 0..=4 {
        match client.get_fragment().await? {
            FragmentReply::Assigned { frame, transform } => {
                assert_eq!(frame, expected);
                let x = 10.0 * (frame as f32 * 3.0 / 4.0);
                assert_relative_eq!(transform.cols[3].x, x, epsilon = 1e-4);
            }
            FragmentReply::Standby => panic!("frame {expected} was not issued"),
        }
    }
    assert_eq!(client.get_fragment().await?, FragmentReply::Standby);
    assert_eq!(client.get_fragment().await?, FragmentReply::Standby);

    // The counter keeps moving past the end, one step per request.
    assert_eq!(client.ready_image().await?, 6);
    Ok(())
}

#[tokio::test]
async fn test_scene_and_checksum_until_exhausted() -> Result<()> {
    let farm = Farm::new(2, true)?;
    let (addr, _channel) = farm.spawn_command_channel().await?;
    let mut client = FarmClient::connect(addr).await?;

    assert_eq!(
        client.fetch_scene().await?,
        SceneReply::Scene(SCENE_BYTES.to_vec())
    );
    let expected = scene_checksum(&farm.scene_path())?;
    assert_eq!(client.checksum("checksum").await?, Some(expected.clone()));

    // Frames 0 and 1: the counter sits below the total, scene still served.
    client.get_fragment().await?;
    client.get_fragment().await?;
    assert_eq!(client.checksum("sha").await?, Some(expected));

    // Frame 2 reaches the total.
    client.get_fragment().await?;
    assert_eq!(client.fetch_scene().await?, SceneReply::Standby);
    assert_eq!(client.checksum("checksum").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_replies_follow_worker_identity() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, _channel) = farm.spawn_command_channel().await?;
    let mut alpha = FarmClient::connect(addr).await?;
    let mut beta = FarmClient::connect(addr).await?;

    let first = alpha.get_fragment().await?;
    let second = beta.get_fragment().await?;
    let third = alpha.get_fragment().await?;
    assert!(matches!(first, FragmentReply::Assigned { frame: 0, .. }));
    assert!(matches!(second, FragmentReply::Assigned { frame: 1, .. }));
    assert!(matches!(third, FragmentReply::Assigned { frame: 2, .. }));

    // Each session keeps the identity the router gave it.
    let ledger = farm.coordinator.ledger_snapshot()?;
    assert!(!ledger[0].worker_id.is_empty());
    assert_eq!(ledger[0].worker_id, ledger[2].worker_id);
    assert_ne!(ledger[0].worker_id, ledger[1].worker_id);
    assert!(!ledger[3].is_assigned());
    Ok(())
}

#[tokio::test]
async fn test_requests_wait_while_farm_is_off() -> Result<()> {
    let farm = Farm::new(10, false)?;
    let (addr, _channel) = farm.spawn_command_channel().await?;
    let mut client = FarmClient::connect(addr).await?;

    let mut pending = tokio::spawn(async move { client.get_fragment().await });
    let early = tokio::time::timeout(Duration::from_millis(200), &mut pending).await;
    assert!(early.is_err(), "request was answered while the farm was off");
    assert_eq!(farm.coordinator.dispatch_state()?.current_frame, -1);

    farm.switch.enable();
    let reply = tokio::time::timeout(Duration::from_secs(5), pending).await???;
    assert!(matches!(reply, FragmentReply::Assigned { frame: 0, .. }));
    Ok(())
}

#[tokio::test]
async fn test_request_arriving_after_switch_off_is_held() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, _channel) = farm.spawn_command_channel().await?;
    let mut client = FarmClient::connect(addr).await?;

    // The loop is already waiting on the socket when farm mode goes off.
    assert!(matches!(
        client.get_fragment().await?,
        FragmentReply::Assigned { frame: 0, .. }
    ));
    farm.switch.disable();

    let mut pending = tokio::spawn(async move { client.get_fragment().await });
    let early = tokio::time::timeout(Duration::from_millis(200), &mut pending).await;
    assert!(early.is_err(), "request was answered after the farm went off");
    assert_eq!(farm.coordinator.dispatch_state()?.current_frame, 0);

    farm.switch.enable();
    let reply = tokio::time::timeout(Duration::from_secs(5), pending).await???;
    assert!(matches!(reply, FragmentReply::Assigned { frame: 1, .. }));
    Ok(())
}

#[tokio::test]
async fn test_request_without_command_frame_stops_command_channel() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, channel) = farm.spawn_command_channel().await?;

    // A lone empty frame reads as a delimiter with nothing after it.
    let mut dealer = DealerSocket::new();
    dealer.connect(&endpoint(addr)).await?;
    dealer.send(ZmqMessage::from(Vec::<u8>::new())).await?;

    let exit = channel_exit(channel).await?;
    assert!(matches!(exit, Err(FarmError::MalformedRequest(_))), "{exit:?}");
    assert_eq!(farm.coordinator.dispatch_state()?.current_frame, -1);
    Ok(())
}

#[tokio::test]
async fn test_non_zmtp_peer_does_not_stop_command_channel() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, channel) = farm.spawn_command_channel().await?;

    let mut stray = TcpStream::connect(addr).await?;
    stray.write_all(b"GET / HTTP/1.1\r\nHost: farm\r\n\r\n").await?;
    drop(stray);

    let mut client = FarmClient::connect(addr).await?;
    assert!(matches!(
        client.get_fragment().await?,
        FragmentReply::Assigned { frame: 0, .. }
    ));
    assert!(!channel.is_finished());
    Ok(())
}

// Multi-threaded so the ledger read races the channel task if the
// acknowledgement ever goes out before the ledger is updated.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_uploaded_image_is_written_and_recorded() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, _channel) = farm.spawn_image_channel().await?;
    let mut uploader = ImageUploader::connect(addr).await?;

    let png: Vec<u8> = (0..100).collect();
    uploader.upload("7", &png).await?;

    assert_eq!(std::fs::read(farm.output_dir().join("7.png"))?, png);
    let ledger = farm.coordinator.ledger_snapshot()?;
    assert!(ledger[7].finished_at.is_some());
    assert_eq!(farm.coordinator.completed_frames()?, 1);
    Ok(())
}

#[tokio::test]
async fn test_upload_with_unsafe_name_stops_image_channel() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, channel) = farm.spawn_image_channel().await?;
    let mut uploader = ImageUploader::connect(addr).await?;

    // The channel stops on the bad request, so the upload is never answered.
    let upload = tokio::spawn(async move { uploader.upload("../escape", b"png").await });

    let exit = channel_exit(channel).await?;
    assert!(matches!(exit, Err(FarmError::MalformedRequest(_))), "{exit:?}");
    assert!(!farm.output_dir().join("../escape.png").exists());
    upload.abort();
    Ok(())
}

#[tokio::test]
async fn test_upload_with_extra_frame_stops_image_channel() -> Result<()> {
    let farm = Farm::new(10, true)?;
    let (addr, channel) = farm.spawn_image_channel().await?;

    let mut req = ReqSocket::new();
    req.connect(&endpoint(addr)).await?;
    let mut upload = ZmqMessage::from(b"3".to_vec());
    upload.push_back(b"png".to_vec().into());
    upload.push_back(b"trailing".to_vec().into());
    req.send(upload).await?;

    let exit = channel_exit(channel).await?;
    assert!(matches!(exit, Err(FarmError::MalformedRequest(_))), "{exit:?}");
    assert!(!farm.output_dir().join("3.png").exists());
    assert!(farm.coordinator.ledger_snapshot()?[3].finished_at.is_none());
    Ok(())
}
