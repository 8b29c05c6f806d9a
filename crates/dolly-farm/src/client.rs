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

//! Worker-side connections to a running farm.
//!
//! Workers and tests use these to talk to the two channels; the server does
//! not need them.

use crate::error::{FarmError, FarmResult};
use crate::protocol::command::{GET_FRAGMENT, GET_SCENE, READY_IMAGE};
use crate::protocol::reply::text_reply;
use crate::protocol::{FragmentReply, Message, SceneReply, IMAGE_OK};
use crate::transport::{into_frames, tcp_endpoint, to_message};
use std::net::SocketAddr;
use zeromq::{DealerSocket, ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// A worker session on the command port, speaking as a `DEALER`.
///
/// The router assigns the session a random identity when it connects.
pub struct FarmClient {
    socket: DealerSocket,
}

impl FarmClient {
    /// Connects to the command port at `addr`.
    pub async fn connect(addr: SocketAddr) -> FarmResult<Self> {
        let mut socket = DealerSocket::new();
        socket.connect(&tcp_endpoint(addr)).await?;
        Ok(Self { socket })
    }

    /// Sends one raw command and returns the reply payload, without the
    /// empty delimiter frame.
    pub async fn request(&mut self, command: &str) -> FarmResult<Message> {
        self.socket.send(ZmqMessage::from(command.to_string())).await?;
        let mut frames = into_frames(self.socket.recv().await?);
        match frames.first() {
            Some(delimiter) if delimiter.is_empty() => {
                frames.remove(0);
                Ok(frames)
            }
            _ => Err(FarmError::malformed("reply is missing its delimiter frame")),
        }
    }

    /// Downloads the scene file.
    pub async fn fetch_scene(&mut self) -> FarmResult<SceneReply> {
        SceneReply::from_frames(self.request(GET_SCENE).await?)
    }

    /// The last frame the server handed out, `-1` before the first.
    pub async fn ready_image(&mut self) -> FarmResult<i64> {
        let frames = self.request(READY_IMAGE).await?;
        let text = text_reply(&frames)?
            .ok_or_else(|| FarmError::malformed("readyImage answered standby"))?;
        text.parse()
            .map_err(|_| FarmError::malformed(format!("'{text}' is not a frame index")))
    }

    /// Asks for the next frame to render.
    pub async fn get_fragment(&mut self) -> FarmResult<FragmentReply> {
        FragmentReply::from_frames(&self.request(GET_FRAGMENT).await?)
    }

    /// Asks for the scene checksum. Any command text the server does not
    /// recognise is treated as a checksum request. `None` means standby.
    pub async fn checksum(&mut self, command: &str) -> FarmResult<Option<String>> {
        text_reply(&self.request(command).await?)
    }
}

/// A worker session on the image port, speaking as a `REQ`.
pub struct ImageUploader {
    socket: ReqSocket,
}

impl ImageUploader {
    /// Connects to the image port at `addr`.
    pub async fn connect(addr: SocketAddr) -> FarmResult<Self> {
        let mut socket = ReqSocket::new();
        socket.connect(&tcp_endpoint(addr)).await?;
        Ok(Self { socket })
    }

    /// Uploads the encoded image for frame `id` and waits for the
    /// acknowledgement.
    pub async fn upload(&mut self, id: &str, png: &[u8]) -> FarmResult<()> {
        let request = to_message(vec![id.as_bytes().to_vec(), png.to_vec()])?;
        self.socket.send(request).await?;
        let reply = into_frames(self.socket.recv().await?);
        match text_reply(&reply)? {
            Some(ack) if ack == IMAGE_OK => Ok(()),
            other => Err(FarmError::malformed(format!(
                "unexpected upload acknowledgement {other:?}"
            ))),
        }
    }
}
