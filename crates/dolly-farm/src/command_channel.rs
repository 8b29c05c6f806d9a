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

//! The command port: scene downloads, work assignment and status queries.

use crate::coordinator::DispatchCoordinator;
use crate::error::FarmResult;
use crate::transport::RouterTransport;
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves worker commands on a router endpoint.
pub struct CommandChannel {
    coordinator: Arc<DispatchCoordinator>,
    transport: RouterTransport,
}

impl CommandChannel {
    /// Binds the command port.
    pub async fn bind(addr: SocketAddr, coordinator: Arc<DispatchCoordinator>) -> FarmResult<Self> {
        let transport = RouterTransport::bind(addr).await?;
        Ok(Self {
            coordinator,
            transport,
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Serves requests until a fatal error.
    ///
    /// While farm mode is off the loop parks on the switch and requests pile
    /// up in the transport queue.
    pub async fn run(self) -> FarmResult<()> {
        log::info!("Command channel serving on {}", self.local_addr());
        loop {
            self.serve_one().await?;
        }
    }

    /// Waits for farm mode, then handles exactly one request.
    ///
    /// The switch is checked again once a request is in hand. A request that
    /// arrives just as farm mode is turned off is held until it comes back on.
    pub async fn serve_one(&self) -> FarmResult<()> {
        let switch = self.coordinator.switch();
        switch.wait_enabled().await;
        let request = self.transport.recv().await?;
        if !switch.is_enabled() {
            log::info!(
                "Farm mode went off; holding '{}' from {}",
                request.command,
                request.worker_id()
            );
            switch.wait_enabled().await;
        }
        log::debug!(
            "Worker {} sent '{}' at frame {}",
            request.worker_id(),
            request.command,
            self.coordinator.dispatch_state()?.current_frame
        );

        let reply = self.coordinator.handle(&request)?;
        let mut envelope = vec![request.peer_id, Vec::new()];
        envelope.extend(reply.into_frames());
        self.transport.send(envelope)
    }
}
