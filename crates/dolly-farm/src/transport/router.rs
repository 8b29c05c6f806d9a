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

//! Identity-routed endpoint for the command port.

use super::{bind, into_frames, to_message};
use crate::error::{FarmError, FarmResult};
use crate::protocol::{Command, Message, RouterRequest};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use zeromq::{RouterSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// A many-peer endpoint that tags each request with its sender's identity
/// and routes replies back by that identity.
///
/// Requests from all peers are interleaved in arrival order. Both `DEALER`
/// peers, which send `[command, ...]`, and `REQ` peers, which send
/// `["", command, ...]`, are understood.
pub struct RouterTransport {
    local_addr: SocketAddr,
    inbound: flume::Receiver<FarmResult<RouterRequest>>,
    outbox: flume::Sender<ZmqMessage>,
    socket_task: JoinHandle<()>,
}

impl RouterTransport {
    /// Binds `addr` and starts accepting peers.
    pub async fn bind(addr: SocketAddr) -> FarmResult<Self> {
        let mut socket = RouterSocket::new();
        let local_addr = bind(&mut socket, addr).await?;
        let (tx, inbound) = flume::unbounded();
        let (outbox, replies) = flume::unbounded();
        let socket_task = tokio::spawn(pump(socket, tx, replies));
        Ok(Self {
            local_addr,
            inbound,
            outbox,
            socket_task,
        })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the next request from any peer.
    ///
    /// Errors are fatal: the socket failed, or a peer sent a request with no
    /// command frame.
    pub async fn recv(&self) -> FarmResult<RouterRequest> {
        self.inbound
            .recv_async()
            .await
            .map_err(|_| FarmError::Disconnected("router socket"))?
    }

    /// Routes `envelope` to a peer.
    ///
    /// The first frame is the peer identity and is consumed by the socket; the
    /// remaining frames, normally an empty delimiter and the payload, go out
    /// as is. Replies to peers that have gone away are dropped.
    pub fn send(&self, envelope: Message) -> FarmResult<()> {
        self.outbox
            .send(to_message(envelope)?)
            .map_err(|_| FarmError::Disconnected("router socket"))
    }
}

impl Drop for RouterTransport {
    fn drop(&mut self) {
        self.socket_task.abort();
    }
}

/// Splits `[identity, ("",) command, payload...]` into a request.
///
/// One leading empty frame is taken as the `REQ` delimiter.
fn parse_request(frames: Message) -> FarmResult<RouterRequest> {
    let mut frames = frames.into_iter();
    let peer_id = frames
        .next()
        .ok_or_else(|| FarmError::malformed("request has no identity frame"))?;
    let mut rest: Vec<Vec<u8>> = frames.collect();
    if rest.first().is_some_and(Vec::is_empty) {
        rest.remove(0);
    }
    if rest.is_empty() {
        return Err(FarmError::malformed(format!(
            "request from {} has no command frame",
            RouterRequest::display_identity(&peer_id)
        )));
    }
    let command = Command::from_wire(&rest.remove(0));
    Ok(RouterRequest {
        peer_id,
        command,
        payload: rest,
    })
}

async fn pump(
    mut socket: RouterSocket,
    inbound: flume::Sender<FarmResult<RouterRequest>>,
    replies: flume::Receiver<ZmqMessage>,
) {
    loop {
        tokio::select! {
            received = socket.recv() => {
                let request = received
                    .map_err(FarmError::from)
                    .and_then(|message| parse_request(into_frames(message)));
                let fatal = request.is_err();
                if inbound.send(request).is_err() || fatal {
                    return;
                }
            }
            reply = replies.recv_async() => {
                let Ok(reply) = reply else {
                    return;
                };
                if let Err(e) = socket.send(reply).await {
                    log::warn!("Dropping reply: {e}");
                }
            }
        }
    }
}
