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

//! The image port: finished frames come back here.

use crate::coordinator::DispatchCoordinator;
use crate::error::{FarmError, FarmResult};
use crate::protocol::IMAGE_OK;
use crate::transport::{PendingRequest, ReplyTransport};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Checks that a frame identifier is safe to use as a file stem.
pub fn validate_image_id(id: &str) -> FarmResult<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
        || Path::new(id).is_absolute();
    if bad {
        return Err(FarmError::malformed(format!(
            "'{id}' is not a valid frame identifier"
        )));
    }
    Ok(())
}

/// Receives rendered frames and writes them to the output directory.
pub struct ImageChannel {
    coordinator: Arc<DispatchCoordinator>,
    transport: ReplyTransport,
    output_dir: PathBuf,
}

impl ImageChannel {
    /// Binds the image port. Files land in `output_dir`.
    pub async fn bind(
        addr: SocketAddr,
        coordinator: Arc<DispatchCoordinator>,
        output_dir: impl Into<PathBuf>,
    ) -> FarmResult<Self> {
        let transport = ReplyTransport::bind(addr).await?;
        Ok(Self {
            coordinator,
            transport,
            output_dir: output_dir.into(),
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Serves uploads until a fatal error.
    pub async fn run(self) -> FarmResult<()> {
        log::info!(
            "Image channel serving on {}, writing to '{}'",
            self.local_addr(),
            self.output_dir.display()
        );
        loop {
            let request = self.transport.recv().await?;
            self.store(request)?;
        }
    }

    /// Handles one upload: write, record in the ledger, then acknowledge.
    ///
    /// The ledger is updated before the reply goes out, so a worker that has
    /// its acknowledgement can rely on the frame being marked received.
    fn store(&self, mut request: PendingRequest) -> FarmResult<()> {
        let frames: [Vec<u8>; 2] = request.take_frames().try_into().map_err(|f: Vec<_>| {
            FarmError::malformed(format!("image upload has {} frames, expected 2", f.len()))
        })?;
        let [id, png] = frames;
        let id = String::from_utf8(id)
            .map_err(|_| FarmError::malformed("frame identifier is not UTF-8"))?;
        validate_image_id(&id)?;

        let path = self.output_dir.join(format!("{id}.png"));
        std::fs::write(&path, &png).map_err(|source| FarmError::FrameWrite {
            path: path.clone(),
            source,
        })?;
        log::info!("Frame '{id}' ({} bytes) saved to '{}'", png.len(), path.display());

        match id.parse::<i64>() {
            Ok(frame) => {
                self.coordinator.mark_image_received(frame)?;
            }
            Err(_) => log::warn!("Image '{id}' does not name a frame; ledger not updated"),
        }
        request.reply([IMAGE_OK]);
        Ok(())
    }
}
