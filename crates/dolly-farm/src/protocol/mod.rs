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

//! The farm's wire protocol: commands and replies carried in multipart
//! ZeroMQ messages.

pub mod command;
pub mod reply;

pub use self::command::{Command, RouterRequest};
pub use self::reply::{
    format_transform, parse_transform, CommandReply, FragmentReply, SceneReply, IMAGE_OK, STANDBY,
};

/// A multipart message, one `Vec<u8>` per frame.
pub type Message = Vec<Vec<u8>>;
