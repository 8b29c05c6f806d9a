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

//! # Dolly Farm
//!
//! Hands out the frames of a two-keyframe camera path to render workers and
//! collects the images they send back.
//!
//! A [`DispatchCoordinator`] owns the path, the frame counter and the
//! [`WorkerLedger`]. Two network channels sit in front of it: the
//! [`CommandChannel`] answers work and scene requests, the [`ImageChannel`]
//! stores finished frames. A [`FarmSwitch`] pauses dispatch without dropping
//! connected workers.

#![warn(missing_docs)]

pub mod client;
pub mod command_channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod image_channel;
pub mod ledger;
pub mod preview;
pub mod protocol;
pub mod scene;
pub mod sink;
pub mod switch;
pub mod transport;

pub use client::{FarmClient, ImageUploader};
pub use command_channel::CommandChannel;
pub use config::FarmConfig;
pub use coordinator::{DispatchCoordinator, DispatchState};
pub use error::{FarmError, FarmResult};
pub use image_channel::ImageChannel;
pub use ledger::{FrameAssignment, WorkerLedger};
pub use preview::{PreviewPlayer, PreviewStatus, PREVIEW_FRAME_DELAY};
pub use sink::{NullSink, PngFrameSink};
pub use switch::FarmSwitch;
