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

use crate::math::Mat4;
use std::fmt;

/// One of the two endpoints of a camera path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyframeSlot {
    /// Keyframe 0, where the path begins.
    Start,
    /// Keyframe 1, where the path ends.
    End,
}

impl KeyframeSlot {
    /// Both slots, in index order.
    pub const ALL: [KeyframeSlot; 2] = [KeyframeSlot::Start, KeyframeSlot::End];

    /// Returns the slot's array index (0 or 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            KeyframeSlot::Start => 0,
            KeyframeSlot::End => 1,
        }
    }

    /// Maps an index back to a slot. Anything other than 0 or 1 is `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(KeyframeSlot::Start),
            1 => Some(KeyframeSlot::End),
            _ => None,
        }
    }
}

impl fmt::Display for KeyframeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// A camera pose plus focus distance, pinned at one end of the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Camera-to-world transform: rotation, translation and uniform scale.
    pub transform: Mat4,
    /// Distance from the camera to the focal plane, in scene units.
    pub focus_distance: f64,
}

impl Keyframe {
    /// Creates a keyframe from a transform and focus distance.
    pub fn new(transform: Mat4, focus_distance: f64) -> Self {
        Self {
            transform,
            focus_distance,
        }
    }
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_round_trip() {
        for slot in KeyframeSlot::ALL {
            assert_eq!(KeyframeSlot::from_index(slot.index()), Some(slot));
        }
        assert_eq!(KeyframeSlot::from_index(2), None);
    }
}
