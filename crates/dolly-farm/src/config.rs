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

//! Farm settings, read from an optional `Farm.toml`.

use crate::error::{FarmError, FarmResult};
use dolly_core::math::Mat4;
use dolly_core::{FrameTiming, Keyframe, DEFAULT_FRAME_STEP};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Default port for work dispatch.
pub const DEFAULT_COMMAND_PORT: u16 = 8799;
/// Default port for finished images.
pub const DEFAULT_IMAGE_PORT: u16 = 8800;
/// Default number of frames on the camera path.
pub const DEFAULT_TOTAL_FRAMES: u32 = 10;

/// A keyframe as written in the config file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct KeyframeConfig {
    /// 16 numbers in the render engine's row-major order.
    pub transform: [f32; 16],
    /// Focus distance at this keyframe.
    pub focus_distance: f64,
}

impl KeyframeConfig {
    /// Converts into a core [`Keyframe`].
    pub fn to_keyframe(&self) -> Keyframe {
        Keyframe::new(Mat4::from_cols_array(&self.transform), self.focus_distance)
    }
}

/// Optional keyframes that replace the ones captured from the engine.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct KeyframesConfig {
    /// Keyframe 0.
    pub start: Option<KeyframeConfig>,
    /// Keyframe 1.
    pub end: Option<KeyframeConfig>,
}

/// Represents the structure of the `Farm.toml` file.
///
/// Every field is optional in the file; missing ones take their default.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FarmConfig {
    /// Address both ports bind to.
    pub host: IpAddr,
    /// Port of the command channel.
    pub command_port: u16,
    /// Port of the image channel.
    pub image_port: u16,
    /// Last frame index is `total_frames`; the ledger pre-populates `0..total_frames`.
    pub total_frames: u32,
    /// Multiplier in `t = frame * frame_step / total_frames`.
    pub frame_step: u32,
    /// Scene file shipped to workers.
    pub scene: Option<PathBuf>,
    /// Directory receiving `<frame>.png` files.
    pub output_dir: PathBuf,
    /// Where local preview images are written, if anywhere.
    pub preview_path: Option<PathBuf>,
    /// Whether dispatch starts enabled.
    pub farm_enabled: bool,
    /// Keyframe overrides.
    pub keyframes: KeyframesConfig,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            command_port: DEFAULT_COMMAND_PORT,
            image_port: DEFAULT_IMAGE_PORT,
            total_frames: DEFAULT_TOTAL_FRAMES,
            frame_step: DEFAULT_FRAME_STEP,
            scene: None,
            output_dir: PathBuf::from("."),
            preview_path: None,
            farm_enabled: false,
            keyframes: KeyframesConfig::default(),
        }
    }
}

impl FarmConfig {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> FarmResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| FarmError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the config at `path`.
    pub fn load(path: &Path) -> FarmResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FarmError::config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            FarmError::Config(msg) => {
                FarmError::config(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> FarmResult<Self> {
        if path.exists() {
            log::info!("Loading farm configuration from '{}'", path.display());
            Self::load(path)
        } else {
            log::info!(
                "No '{}' found. Using default configuration.",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Checks values that would make the farm unusable.
    pub fn validate(&self) -> FarmResult<()> {
        if self.total_frames == 0 {
            return Err(FarmError::config("total_frames must be greater than zero"));
        }
        if self.command_port != 0 && self.command_port == self.image_port {
            return Err(FarmError::config(format!(
                "command and image ports must differ, both are {}",
                self.command_port
            )));
        }
        Ok(())
    }

    /// Socket address of the command channel.
    pub fn command_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.command_port)
    }

    /// Socket address of the image channel.
    pub fn image_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.image_port)
    }

    /// Frame-to-time mapping for this config.
    pub fn timing(&self) -> FarmResult<FrameTiming> {
        Ok(FrameTiming::new(self.total_frames, self.frame_step)?)
    }
}
