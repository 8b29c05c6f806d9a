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

//! Per-frame record of which worker rendered what, and when.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Worker id shown for frames nobody has claimed yet.
pub const NOT_ASSIGNED: &str = "not assigned";

/// Seconds since the Unix epoch, or zero if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAssignment {
    /// The frame index.
    pub frame: i64,
    /// Identity of the worker that claimed the frame.
    pub worker_id: String,
    /// Unix seconds when the frame was handed out, `0` while unassigned.
    pub started_at: u64,
    /// Unix seconds when the frame's image arrived.
    pub finished_at: Option<u64>,
}

impl FrameAssignment {
    fn unassigned(frame: i64) -> Self {
        Self {
            frame,
            worker_id: NOT_ASSIGNED.to_string(),
            started_at: 0,
            finished_at: None,
        }
    }

    /// Whether a worker has claimed this frame.
    pub fn is_assigned(&self) -> bool {
        self.started_at != 0
    }

    /// Seconds spent on this frame as seen at `now`.
    ///
    /// Finished frames report their total render time, running frames the
    /// time so far, unassigned frames zero.
    pub fn elapsed_secs(&self, now: u64) -> u64 {
        if !self.is_assigned() {
            return 0;
        }
        self.finished_at
            .unwrap_or(now)
            .saturating_sub(self.started_at)
    }
}

/// In-memory table of frame assignments.
///
/// Purely observational: nothing in the dispatch path reads it back.
#[derive(Debug, Clone, Default)]
pub struct WorkerLedger {
    rows: BTreeMap<i64, FrameAssignment>,
}

impl WorkerLedger {
    /// Creates a ledger with unassigned rows for frames `0..frames`.
    pub fn new(frames: u32) -> Self {
        let rows = (0..i64::from(frames))
            .map(|frame| (frame, FrameAssignment::unassigned(frame)))
            .collect();
        Self { rows }
    }

    /// Records that `worker_id` took `frame` just now.
    pub fn assign(&mut self, frame: i64, worker_id: &str) {
        self.assign_at(frame, worker_id, unix_now());
    }

    /// Records that `worker_id` took `frame` at `started_at`.
    ///
    /// Frames outside the pre-populated range get a fresh row.
    pub fn assign_at(&mut self, frame: i64, worker_id: &str, started_at: u64) {
        let row = self
            .rows
            .entry(frame)
            .or_insert_with(|| FrameAssignment::unassigned(frame));
        row.worker_id = worker_id.to_string();
        row.started_at = started_at;
        row.finished_at = None;
        log::debug!("Frame {frame} assigned to worker {worker_id}");
    }

    /// Records that the image for `frame` arrived just now.
    ///
    /// Returns `false` if the ledger has no row for `frame`.
    pub fn mark_received(&mut self, frame: i64) -> bool {
        self.mark_received_at(frame, unix_now())
    }

    /// Records that the image for `frame` arrived at `finished_at`.
    pub fn mark_received_at(&mut self, frame: i64, finished_at: u64) -> bool {
        match self.rows.get_mut(&frame) {
            Some(row) => {
                row.finished_at = Some(finished_at);
                true
            }
            None => {
                log::warn!("Image received for frame {frame}, which has no ledger entry");
                false
            }
        }
    }

    /// Returns the row for `frame`.
    pub fn get(&self, frame: i64) -> Option<&FrameAssignment> {
        self.rows.get(&frame)
    }

    /// A snapshot of every row, ordered by frame.
    pub fn entries(&self) -> Vec<FrameAssignment> {
        self.rows.values().cloned().collect()
    }

    /// Number of frames whose image has arrived.
    pub fn completed_count(&self) -> usize {
        self.rows
            .values()
            .filter(|row| row.finished_at.is_some())
            .count()
    }

    /// Number of rows in the ledger.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the ledger has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
