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

//! The farm-mode on/off signal.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared switch that gates work dispatch.
///
/// Clones share the same state. The command loop parks in
/// [`FarmSwitch::wait_enabled`] while the switch is off instead of polling.
#[derive(Debug, Clone)]
pub struct FarmSwitch {
    state: Arc<watch::Sender<bool>>,
}

impl FarmSwitch {
    /// Creates a switch in the given state.
    pub fn new(enabled: bool) -> Self {
        let (state, _) = watch::channel(enabled);
        Self {
            state: Arc::new(state),
        }
    }

    /// Turns farm mode on, waking the command loop.
    pub fn enable(&self) {
        self.set(true);
    }

    /// Turns farm mode off. A request already being handled completes.
    pub fn disable(&self) {
        self.set(false);
    }

    /// Flips the switch and returns the new state.
    pub fn toggle(&self) -> bool {
        let mut now = false;
        self.state.send_modify(|on| {
            *on = !*on;
            now = *on;
        });
        log::info!("Farm mode {}", if now { "enabled" } else { "disabled" });
        now
    }

    /// Current state.
    pub fn is_enabled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves immediately if the switch is on, otherwise once it turns on.
    pub async fn wait_enabled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|on| *on).await;
    }

    fn set(&self, enabled: bool) {
        let previous = self.state.send_replace(enabled);
        if previous != enabled {
            log::info!("Farm mode {}", if enabled { "enabled" } else { "disabled" });
        }
    }
}

impl Default for FarmSwitch {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_toggle_flips_state() {
        let switch = FarmSwitch::default();
        assert!(!switch.is_enabled());
        assert!(switch.toggle());
        assert!(switch.is_enabled());
        assert!(!switch.toggle());
    }

    #[test]
    fn test_clones_share_state() {
        let a = FarmSwitch::new(false);
        let b = a.clone();
        a.enable();
        assert!(b.is_enabled());
        b.disable();
        assert!(!a.is_enabled());
    }

    #[tokio::test]
    async fn test_wait_blocks_until_enabled() {
        let switch = FarmSwitch::new(false);
        let waiter = tokio::spawn({
            let switch = switch.clone();
            async move { switch.wait_enabled().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        switch.enable();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_on() {
        let switch = FarmSwitch::new(true);
        timeout(Duration::from_millis(100), switch.wait_enabled())
            .await
            .unwrap();
    }
}
