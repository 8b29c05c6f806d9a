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

//! Strict request-reply endpoint for the image port.

use super::{bind, into_frames, to_message};
use crate::error::{FarmError, FarmResult};
use crate::protocol::Message;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend};

/// A request waiting for its reply.
///
/// The socket takes no further request until [`PendingRequest::reply`] is
/// called. Dropping the request without replying shuts the endpoint down.
#[derive(Debug)]
pub struct PendingRequest {
    frames: Message,
    responder: oneshot::Sender<Message>,
}

impl PendingRequest {
    /// Moves the request frames out, leaving the request empty.
    pub fn take_frames(&mut self) -> Message {
        std::mem::take(&mut self.frames)
    }

    /// Sends the reply and lets the socket take its next request.
    pub fn reply<F: Into<Vec<u8>>>(self, frames: impl IntoIterator<Item = F>) {
        let frames = frames.into_iter().map(Into::into).collect();
        if self.responder.send(frames).is_err() {
            log::warn!("Reply socket closed before the reply was sent");
        }
    }
}

/// A many-peer `REP` endpoint: exactly one request is in flight at a time and
/// each peer waits for its reply before sending the next request.
pub struct ReplyTransport {
    local_addr: SocketAddr,
    inbound: flume::Receiver<FarmResult<PendingRequest>>,
    socket_task: JoinHandle<()>,
}

impl ReplyTransport {
    /// Binds `addr` and starts accepting peers.
    pub async fn bind(addr: SocketAddr) -> FarmResult<Self> {
        let mut socket = RepSocket::new();
        let local_addr = bind(&mut socket, addr).await?;
        let (tx, inbound) = flume::unbounded();
        let socket_task = tokio::spawn(pump(socket, tx));
        Ok(Self {
            local_addr,
            inbound,
            socket_task,
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the next request from any peer.
    pub async fn recv(&self) -> FarmResult<PendingRequest> {
        self.inbound
            .recv_async()
            .await
            .map_err(|_| FarmError::Disconnected("reply socket"))?
    }
}

impl Drop for ReplyTransport {
    fn drop(&mut self) {
        self.socket_task.abort();
    }
}

async fn pump(mut socket: RepSocket, inbound: flume::Sender<FarmResult<PendingRequest>>) {
    loop {
        let frames = match socket.recv().await {
            Ok(message) => into_frames(message),
            Err(e) => {
                let _ = inbound.send(Err(e.into()));
                return;
            }
        };

        let (responder, reply) = oneshot::channel();
        if inbound.send(Ok(PendingRequest { frames, responder })).is_err() {
            return;
        }
        let Ok(reply) = reply.await else {
            log::debug!("Request dropped without a reply; closing the image socket");
            return;
        };
        let sent = match to_message(reply) {
            Ok(message) => socket.send(message).await.map_err(FarmError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            log::warn!("Failed to send reply: {e}");
        }
    }
}
