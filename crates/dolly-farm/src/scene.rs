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

//! Scene file access for the command channel.
//!
//! The file is read fresh on every request so workers always get what is on
//! disk now.

use crate::error::{FarmError, FarmResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

fn scene_error(path: &Path) -> impl FnOnce(std::io::Error) -> FarmError + '_ {
    move |source| FarmError::SceneRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads the whole scene file.
pub fn read_scene(path: &Path) -> FarmResult<Vec<u8>> {
    std::fs::read(path).map_err(scene_error(path))
}

/// SHA-256 of the scene file as 64 uppercase hex digits.
pub fn scene_checksum(path: &Path) -> FarmResult<String> {
    let mut file = File::open(path).map_err(scene_error(path))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(scene_error(path))?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect())
}
