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

//! Line-based operator console on stdin.
//!
//! Stands in for the GUI: it toggles farm mode, edits keyframes, plays the
//! preview and prints the ledger.

use anyhow::{anyhow, bail, Result};
use dolly_core::math::AffineTransform;
use dolly_core::{EulerAngles, KeyframeSlot, RenderEngine};
use dolly_farm::ledger::unix_now;
use dolly_farm::{DispatchCoordinator, PreviewPlayer, PREVIEW_FRAME_DELAY};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  farm on|off|toggle   enable, disable or flip work dispatch
  key 0|1              select a keyframe and move the camera to it
  capture [0|1]        store the camera in a keyframe (default: selected)
  play | stop          run or stop the local preview
  camera               print the camera position and angles
  status               print dispatch counters
  ledger               print frame assignments
  quit";

/// What to do with the farm switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmAction {
    /// Turn dispatch on.
    On,
    /// Turn dispatch off.
    Off,
    /// Flip dispatch.
    Toggle,
}

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Farm(FarmAction),
    Select(KeyframeSlot),
    Capture(Option<KeyframeSlot>),
    Play,
    Stop,
    Camera,
    Status,
    Ledger,
    Help,
    Quit,
}

fn parse_slot(word: &str) -> Result<KeyframeSlot> {
    word.parse::<usize>()
        .ok()
        .and_then(KeyframeSlot::from_index)
        .ok_or_else(|| anyhow!("'{word}' is not a keyframe, use 0 or 1"))
}

impl ConsoleCommand {
    /// Parses one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            ["farm", "on"] => Self::Farm(FarmAction::On),
            ["farm", "off"] => Self::Farm(FarmAction::Off),
            ["farm"] | ["farm", "toggle"] => Self::Farm(FarmAction::Toggle),
            ["key", slot] => Self::Select(parse_slot(slot)?),
            ["capture"] => Self::Capture(None),
            ["capture", slot] => Self::Capture(Some(parse_slot(slot)?)),
            ["play"] => Self::Play,
            ["stop"] => Self::Stop,
            ["camera"] => Self::Camera,
            ["status"] => Self::Status,
            ["ledger"] => Self::Ledger,
            ["help"] | ["?"] => Self::Help,
            ["quit"] | ["exit"] => Self::Quit,
            _ => bail!("Unknown command '{}', type 'help'", line.trim()),
        };
        Ok(Some(command))
    }
}

/// Operator session over the coordinator and the engine camera.
pub struct Console {
    coordinator: Arc<DispatchCoordinator>,
    engine: Arc<dyn RenderEngine>,
    player: PreviewPlayer,
}

impl Console {
    /// Creates a console with the preview stopped.
    pub fn new(coordinator: Arc<DispatchCoordinator>, engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            player: PreviewPlayer::new(coordinator.clone()),
            coordinator,
            engine,
        }
    }

    /// Reads commands until `quit`. End of input leaves the server running.
    ///
    /// The preview advances on its own timer, so commands keep being read
    /// while it plays.
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = true;
        let mut ticker = tokio::time::interval(PREVIEW_FRAME_DELAY);
        println!("{HELP}");
        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => match line? {
                    Some(line) => match ConsoleCommand::parse(&line) {
                        Ok(Some(ConsoleCommand::Quit)) => return Ok(()),
                        Ok(Some(command)) => {
                            if let Err(e) = self.execute(command) {
                                log::error!("{e:#}");
                            }
                            if command == ConsoleCommand::Play {
                                ticker.reset();
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{e}"),
                    },
                    None => {
                        input_open = false;
                        log::info!("Console input closed; serving until interrupted");
                    }
                },
                _ = ticker.tick(), if self.player.is_playing() => self.advance_preview(),
                else => std::future::pending::<()>().await,
            }
        }
    }

    fn advance_preview(&mut self) {
        if let Err(e) = self.player.tick() {
            log::error!("Preview stopped: {e}");
            if let Err(e) = self.player.stop() {
                log::error!("{e}");
            }
        }
    }

    /// Runs one command. `play` only starts the preview; [`Console::run`]
    /// drives it.
    pub fn execute(&mut self, command: ConsoleCommand) -> Result<()> {
        match command {
            ConsoleCommand::Farm(action) => {
                let switch = self.coordinator.switch();
                match action {
                    FarmAction::On => switch.enable(),
                    FarmAction::Off => switch.disable(),
                    FarmAction::Toggle => {
                        switch.toggle();
                    }
                }
            }
            ConsoleCommand::Select(slot) => {
                self.player.select(slot)?;
                println!("Keyframe {slot} selected");
            }
            ConsoleCommand::Capture(slot) => {
                let slot = slot.unwrap_or(self.player.selected());
                self.coordinator.capture_keyframe(slot)?;
                println!("Camera stored in keyframe {slot}");
            }
            ConsoleCommand::Play => self.player.start(),
            ConsoleCommand::Stop => self.player.stop()?,
            ConsoleCommand::Camera => println!("{}", self.describe_camera()?),
            ConsoleCommand::Status => {
                let state = self.coordinator.dispatch_state()?;
                println!(
                    "farm {} | frame {} of {} | {} images received | render {:.0}%",
                    if state.farm_enabled { "on" } else { "off" },
                    state.current_frame,
                    state.total_frames,
                    self.coordinator.completed_frames()?,
                    self.coordinator.progress()? * 100.0
                );
            }
            ConsoleCommand::Ledger => {
                let now = unix_now();
                println!("{:>6}  {:<38} {:>8}", "frame", "worker", "elapsed");
                for row in self.coordinator.ledger_snapshot()? {
                    let done = if row.finished_at.is_some() { " done" } else { "" };
                    println!(
                        "{:>6}  {:<38} {:>7}s{done}",
                        row.frame,
                        row.worker_id,
                        row.elapsed_secs(now)
                    );
                }
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }

    fn describe_camera(&self) -> Result<String> {
        let transform = AffineTransform(self.engine.camera_transform());
        let basis = transform.normalized_basis()?;
        let position = transform.translation();
        Ok(format!(
            "position ({:.3}, {:.3}, {:.3}) | {} | focus {:.3}",
            position.x,
            position.y,
            position.z,
            EulerAngles::from_rotation(&basis),
            self.engine.focus_distance()
        ))
    }
}
