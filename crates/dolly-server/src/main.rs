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

//! Headless farm server: loads a scene, then hands its camera path out to
//! render workers.
//!
//! Run with: dolly-server <scene.bsz> [-p port]

mod console;
mod engine;

use anyhow::{Context, Result};
use clap::Parser;
use console::Console;
use dolly_core::{EngineObserver, FrameSink, KeyframeSlot, SceneInfo};
use dolly_farm::{
    CommandChannel, DispatchCoordinator, FarmConfig, FarmSwitch, ImageChannel, NullSink,
    PngFrameSink,
};
use engine::{validate_scene_path, SceneFileEngine};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "dolly-server", version, about)]
struct Cli {
    /// Scene file to distribute (.bsz, .bsa or .bsx). Falls back to the config.
    scene: Option<PathBuf>,

    /// Port of the command channel.
    #[arg(short, long)]
    port: Option<u16>,

    /// Port of the image channel.
    #[arg(long)]
    image_port: Option<u16>,

    /// Address to bind both channels to.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Farm configuration file.
    #[arg(long, default_value = "Farm.toml")]
    config: PathBuf,

    /// Start with work dispatch enabled.
    #[arg(long, default_value_t = false)]
    farm: bool,

    /// Directory for received frames.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of frames on the camera path.
    #[arg(long)]
    frames: Option<u32>,

    /// Write renderer preview images to this PNG.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Do not read operator commands from stdin.
    #[arg(long, default_value_t = false)]
    no_console: bool,
}

impl Cli {
    /// Loads the config file and lays the flags over it.
    fn into_config(self) -> Result<(FarmConfig, bool)> {
        let mut config = FarmConfig::load_or_default(&self.config)?;
        if let Some(scene) = self.scene {
            config.scene = Some(scene);
        }
        if let Some(port) = self.port {
            config.command_port = port;
        }
        if let Some(port) = self.image_port {
            config.image_port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(frames) = self.frames {
            config.total_frames = frames;
        }
        if let Some(preview) = self.preview {
            config.preview_path = Some(preview);
        }
        config.farm_enabled |= self.farm;
        config.validate()?;
        Ok((config, !self.no_console))
    }
}

async fn run(config: FarmConfig, interactive: bool) -> Result<()> {
    let scene = config
        .scene
        .clone()
        .context("No scene file given on the command line or in the config")?;
    validate_scene_path(&scene)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    let engine = Arc::new(SceneFileEngine::new(&scene));
    let sink: Arc<dyn FrameSink> = match &config.preview_path {
        Some(path) => Arc::new(PngFrameSink::new(path)),
        None => Arc::new(NullSink),
    };
    let coordinator = Arc::new(DispatchCoordinator::new(
        engine.clone(),
        sink,
        config.timing()?,
        FarmSwitch::new(config.farm_enabled),
    ));

    coordinator.on_scene_loaded(&SceneInfo { path: scene });
    let overrides = [
        (KeyframeSlot::Start, &config.keyframes.start),
        (KeyframeSlot::End, &config.keyframes.end),
    ];
    for (slot, keyframe) in overrides {
        if let Some(keyframe) = keyframe {
            coordinator
                .set_keyframe(slot, keyframe.to_keyframe())
                .with_context(|| format!("Keyframe {slot} in the config is unusable"))?;
            log::info!("Keyframe {slot} taken from the config");
        }
    }
    coordinator.jump_to_keyframe(KeyframeSlot::Start)?;

    let commands = CommandChannel::bind(config.command_addr(), coordinator.clone()).await?;
    let images =
        ImageChannel::bind(config.image_addr(), coordinator.clone(), &config.output_dir).await?;
    log::info!(
        "Farm ready: {} frames, dispatch {}",
        config.total_frames,
        if config.farm_enabled { "on" } else { "off" }
    );

    let console = Console::new(coordinator, engine);
    tokio::select! {
        result = commands.run() => result.context("Command channel stopped"),
        result = images.run() => result.context("Image channel stopped"),
        result = console.run(), if interactive => result,
        result = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
            result.context("Failed to listen for Ctrl-C")
        }
    }
}

#[tokio::main]
async fn main() {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let outcome = match Cli::parse().into_config() {
        Ok((config, interactive)) => run(config, interactive).await,
        Err(e) => Err(e),
    };
    if let Err(e) = outcome {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
