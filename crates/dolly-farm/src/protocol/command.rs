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

//! Requests accepted on the command port.

use std::fmt;
use uuid::Uuid;

/// Wire name of the scene download request.
pub const GET_SCENE: &str = "getBsz";
/// Wire name of the current-frame query.
pub const READY_IMAGE: &str = "readyImage";
/// Wire name of the work request.
pub const GET_FRAGMENT: &str = "getFragment";

/// A command sent by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download the scene file.
    FetchScene,
    /// Ask which frame was dispatched last.
    ReadyImage,
    /// Claim the next frame.
    GetFragment,
    /// Any other string. Answered with the scene checksum; the text itself is
    /// kept only for logging.
    Checksum(String),
}

impl Command {
    /// Decodes a command frame. Every input maps to some command.
    pub fn from_wire(raw: &[u8]) -> Self {
        match raw {
            b"getBsz" => Command::FetchScene,
            b"readyImage" => Command::ReadyImage,
            b"getFragment" => Command::GetFragment,
            other => Command::Checksum(String::from_utf8_lossy(other).into_owned()),
        }
    }

    /// The string a client sends for this command.
    pub fn as_wire(&self) -> &str {
        match self {
            Command::FetchScene => GET_SCENE,
            Command::ReadyImage => READY_IMAGE,
            Command::GetFragment => GET_FRAGMENT,
            Command::Checksum(text) => text,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One request pulled off the command port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterRequest {
    /// Routing identity of the peer that sent it.
    pub peer_id: Vec<u8>,
    /// The decoded command frame.
    pub command: Command,
    /// Any frames after the command.
    pub payload: Vec<Vec<u8>>,
}

impl RouterRequest {
    /// The peer identity as text, for logging and the ledger.
    pub fn worker_id(&self) -> String {
        Self::display_identity(&self.peer_id)
    }

    /// Renders a routing identity as text.
    ///
    /// Printable ASCII identities are shown as they are. Sixteen opaque bytes,
    /// the shape of an identity the socket assigns itself, read as a UUID.
    /// Anything else is shown in hex.
    pub fn display_identity(identity: &[u8]) -> String {
        if !identity.is_empty() && identity.iter().all(u8::is_ascii_graphic) {
            return String::from_utf8_lossy(identity).into_owned();
        }
        match Uuid::from_slice(identity) {
            Ok(id) => id.hyphenated().to_string(),
            Err(_) => identity.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_commands_decode() {
        assert_eq!(Command::from_wire(b"getBsz"), Command::FetchScene);
        assert_eq!(Command::from_wire(b"readyImage"), Command::ReadyImage);
        assert_eq!(Command::from_wire(b"getFragment"), Command::GetFragment);
    }

    #[test]
    fn test_everything_else_is_checksum() {
        assert_eq!(
            Command::from_wire(b"sha?"),
            Command::Checksum("sha?".into())
        );
        // Case matters.
        assert_eq!(
            Command::from_wire(b"GETBSZ"),
            Command::Checksum("GETBSZ".into())
        );
        assert_eq!(Command::from_wire(b""), Command::Checksum(String::new()));
    }

    #[test]
    fn test_identity_rendering() {
        assert_eq!(RouterRequest::display_identity(b"render-07"), "render-07");

        let id = Uuid::new_v4();
        assert_eq!(
            RouterRequest::display_identity(id.as_bytes()),
            id.hyphenated().to_string()
        );

        assert_eq!(RouterRequest::display_identity(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(RouterRequest::display_identity(b""), "");
    }
}
