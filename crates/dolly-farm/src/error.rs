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

//! Error taxonomy for the farm's channels and coordinator.

use dolly_core::CameraError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Convenience result type used across the farm crate.
pub type FarmResult<T> = Result<T, FarmError>;

/// Everything that can stop a farm channel.
///
/// Apart from [`FarmError::Camera`] raised by GUI-facing calls, these are
/// fatal to the loop that returns them.
#[derive(thiserror::Error, Debug)]
pub enum FarmError {
    /// The ZeroMQ socket failed to send or receive.
    #[error("transport error: {0}")]
    Zmq(#[from] zeromq::ZmqError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: SocketAddr,
        /// The underlying bind failure.
        #[source]
        source: zeromq::ZmqError,
    },

    /// A request did not have the frame layout its channel expects.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The scene file could not be read.
    #[error("cannot read scene file '{}': {source}", path.display())]
    SceneRead {
        /// The scene file path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A rendered frame could not be written to disk.
    #[error("cannot write frame image '{}': {source}", path.display())]
    FrameWrite {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Camera path sampling or keyframe validation failed.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// The configuration file is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The other end of an internal queue or socket went away.
    #[error("{0} disconnected")]
    Disconnected(&'static str),

    /// The shared dispatch state was poisoned by a panicking holder.
    #[error("dispatch state lock poisoned")]
    Poisoned,
}

impl FarmError {
    /// Build a [`FarmError::MalformedRequest`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Build a [`FarmError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
