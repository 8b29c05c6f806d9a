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

//! ZeroMQ endpoints for the two farm ports.
//!
//! Each endpoint owns its `zeromq` socket inside a background task. The task
//! pushes requests into a `flume` queue that a single consumer drains, so the
//! owner of an endpoint handles one exchange at a time no matter how many
//! workers are connected.

mod responder;
mod router;

pub use self::responder::{PendingRequest, ReplyTransport};
pub use self::router::RouterTransport;

use crate::error::{FarmError, FarmResult};
use crate::protocol::Message;
use std::net::SocketAddr;
use zeromq::{Endpoint, Socket, ZmqMessage};

/// The `tcp://` endpoint string for `addr`.
pub(crate) fn tcp_endpoint(addr: SocketAddr) -> String {
    format!("tcp://{addr}")
}

/// Binds `socket` to `addr` and returns the address actually bound.
pub(crate) async fn bind<S: Socket>(socket: &mut S, addr: SocketAddr) -> FarmResult<SocketAddr> {
    let endpoint = socket
        .bind(&tcp_endpoint(addr))
        .await
        .map_err(|source| FarmError::Bind { addr, source })?;
    let local_addr = socket_addr(&endpoint)?;
    log::info!("Listening on {endpoint}");
    Ok(local_addr)
}

fn socket_addr(endpoint: &Endpoint) -> FarmResult<SocketAddr> {
    let text = endpoint.to_string();
    text.strip_prefix("tcp://")
        .and_then(|addr| addr.parse().ok())
        .ok_or_else(|| FarmError::config(format!("bound endpoint '{text}' is not a TCP address")))
}

/// Copies a received message into owned frames.
pub(crate) fn into_frames(message: ZmqMessage) -> Message {
    message.into_vec().into_iter().map(|frame| frame.to_vec()).collect()
}

/// Builds a message from owned frames. A message needs at least one frame.
pub(crate) fn to_message(frames: Message) -> FarmResult<ZmqMessage> {
    let mut frames = frames.into_iter();
    let first = frames
        .next()
        .ok_or_else(|| FarmError::malformed("cannot send a message with no frames"))?;
    let mut message = ZmqMessage::from(first);
    for frame in frames {
        message.push_back(frame.into());
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_survive_message_conversion() {
        let frames: Message = vec![b"id".to_vec(), Vec::new(), b"payload".to_vec()];
        let message = to_message(frames.clone()).unwrap();
        assert_eq!(message.len(), 3);
        assert_eq!(into_frames(message), frames);
    }

    #[test]
    fn test_empty_message_is_refused() {
        assert!(matches!(
            to_message(Vec::new()),
            Err(FarmError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_ipv6_endpoint_parses() {
        let addr: SocketAddr = "[::1]:8799".parse().unwrap();
        assert_eq!(tcp_endpoint(addr), "tcp://[::1]:8799");
    }
}
