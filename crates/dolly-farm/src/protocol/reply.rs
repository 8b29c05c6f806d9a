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

//! Replies sent on the command port and their client-side decoding.

use crate::error::{FarmError, FarmResult};
use dolly_core::math::Mat4;

/// Sent instead of work once the path is exhausted.
pub const STANDBY: &str = "standby";
/// Header frame preceding the scene bytes.
pub const SENDING_SCENE: &str = "Sending .bsz";
/// Acknowledgement on the image port.
pub const IMAGE_OK: &str = "ok";

/// Renders a camera transform as 16 space-separated numbers.
///
/// The order is the column-major flatten of the matrix, which is the
/// row-major layout of the render engine, with translation in slots 12..14.
pub fn format_transform(transform: &Mat4) -> String {
    transform
        .to_cols_array()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the output of [`format_transform`].
pub fn parse_transform(text: &str) -> FarmResult<Mat4> {
    let mut values = [0.0_f32; 16];
    let mut tokens = text.split_whitespace();
    for (i, slot) in values.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| FarmError::malformed(format!("transform has only {i} values")))?;
        *slot = token
            .parse()
            .map_err(|_| FarmError::malformed(format!("bad transform value '{token}'")))?;
    }
    if tokens.next().is_some() {
        return Err(FarmError::malformed("transform has more than 16 values"));
    }
    Ok(Mat4::from_cols_array(&values))
}

/// Trailer frame closing a fragment reply.
pub fn fragment_trailer(frame: i64) -> String {
    format!("ee: {frame}")
}

/// What the server answers to a command, before framing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// Nothing left to do.
    Standby,
    /// The raw scene file.
    Scene(Vec<u8>),
    /// The last dispatched frame index, `-1` before the first dispatch.
    CurrentFrame(i64),
    /// A frame assignment.
    Fragment {
        /// The frame to render.
        frame: i64,
        /// Camera transform for that frame.
        transform: Mat4,
    },
    /// Uppercase hex SHA-256 of the scene file.
    Checksum(String),
}

impl CommandReply {
    /// The payload frames, without routing envelope.
    pub fn into_frames(self) -> Vec<Vec<u8>> {
        match self {
            CommandReply::Standby => vec![STANDBY.into()],
            CommandReply::Scene(bytes) => vec![SENDING_SCENE.into(), bytes],
            CommandReply::CurrentFrame(frame) => vec![frame.to_string().into_bytes()],
            CommandReply::Fragment { frame, transform } => vec![
                frame.to_string().into_bytes(),
                format_transform(&transform).into_bytes(),
                fragment_trailer(frame).into_bytes(),
            ],
            CommandReply::Checksum(hex) => vec![hex.into_bytes()],
        }
    }
}

fn frame_text(frame: &[u8]) -> FarmResult<&str> {
    std::str::from_utf8(frame).map_err(|_| FarmError::malformed("reply frame is not UTF-8"))
}

fn is_standby(frames: &[Vec<u8>]) -> bool {
    matches!(frames, [only] if only == STANDBY.as_bytes())
}

/// A decoded answer to `getFragment`.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentReply {
    /// The server handed out a frame.
    Assigned {
        /// Frame index.
        frame: i64,
        /// Camera transform to render with.
        transform: Mat4,
    },
    /// The path is exhausted.
    Standby,
}

impl FragmentReply {
    /// Decodes the payload frames of a fragment reply.
    pub fn from_frames(frames: &[Vec<u8>]) -> FarmResult<Self> {
        if is_standby(frames) {
            return Ok(FragmentReply::Standby);
        }
        let [frame, transform, trailer] = frames else {
            return Err(FarmError::malformed(format!(
                "fragment reply has {} frames, expected 3",
                frames.len()
            )));
        };
        let frame: i64 = frame_text(frame)?
            .parse()
            .map_err(|_| FarmError::malformed("fragment frame index is not a number"))?;
        if frame_text(trailer)? != fragment_trailer(frame) {
            return Err(FarmError::malformed("fragment trailer does not match frame"));
        }
        Ok(FragmentReply::Assigned {
            frame,
            transform: parse_transform(frame_text(transform)?)?,
        })
    }
}

/// A decoded answer to `getBsz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneReply {
    /// The scene file bytes.
    Scene(Vec<u8>),
    /// The path is exhausted.
    Standby,
}

impl SceneReply {
    /// Decodes the payload frames of a scene reply.
    pub fn from_frames(mut frames: Vec<Vec<u8>>) -> FarmResult<Self> {
        if is_standby(&frames) {
            return Ok(SceneReply::Standby);
        }
        let has_header =
            matches!(frames.as_slice(), [header, _] if header == SENDING_SCENE.as_bytes());
        if !has_header {
            return Err(FarmError::malformed("unexpected scene reply"));
        }
        Ok(SceneReply::Scene(frames.swap_remove(1)))
    }
}

/// Decodes a single-frame text reply (`readyImage`, checksum), mapping
/// `"standby"` to `None`.
pub fn text_reply(frames: &[Vec<u8>]) -> FarmResult<Option<String>> {
    if is_standby(frames) {
        return Ok(None);
    }
    match frames {
        [only] => Ok(Some(frame_text(only)?.to_string())),
        _ => Err(FarmError::malformed(format!(
            "expected a single-frame reply, got {} frames",
            frames.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dolly_core::math::{AffineTransform, Quaternion, Vec3};

    #[test]
    fn test_transform_text_puts_translation_last() {
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, -1.5));
        let text = format_transform(&m);
        let values: Vec<&str> = text.split(' ').collect();
        assert_eq!(values.len(), 16);
        assert_eq!(&values[12..], &["10", "0", "-1.5", "1"]);
    }

    #[test]
    fn test_transform_text_parses_back_exactly() {
        let m = AffineTransform::from_trs(
            Vec3::new(1.25, -3.0, 8.0),
            Quaternion::from_axis_angle(Vec3::new(0.3, 1.0, 0.2), 0.9),
            Vec3::ONE,
        )
        .to_matrix();
        assert_eq!(parse_transform(&format_transform(&m)).unwrap(), m);
    }

    #[test]
    fn test_parse_transform_rejects_wrong_count() {
        assert!(parse_transform("1 2 3").is_err());
        let seventeen = vec!["0"; 17].join(" ");
        assert!(parse_transform(&seventeen).is_err());
        assert!(parse_transform(&vec!["x"; 16].join(" ")).is_err());
    }

    #[test]
    fn test_fragment_reply_frames() {
        let frames = CommandReply::Fragment {
            frame: 4,
            transform: Mat4::IDENTITY,
        }
        .into_frames();
        assert_eq!(frames[0], b"4");
        assert_eq!(frames[2], b"ee: 4");
        assert_eq!(
            FragmentReply::from_frames(&frames).unwrap(),
            FragmentReply::Assigned {
                frame: 4,
                transform: Mat4::IDENTITY
            }
        );
    }

    #[test]
    fn test_standby_decodes_everywhere() {
        let frames = CommandReply::Standby.into_frames();
        assert_eq!(FragmentReply::from_frames(&frames).unwrap(), FragmentReply::Standby);
        assert_eq!(SceneReply::from_frames(frames.clone()).unwrap(), SceneReply::Standby);
        assert_eq!(text_reply(&frames).unwrap(), None);
    }

    #[test]
    fn test_scene_reply_has_header() {
        let frames = CommandReply::Scene(vec![1, 2, 3]).into_frames();
        assert_eq!(frames[0], SENDING_SCENE.as_bytes());
        assert_eq!(
            SceneReply::from_frames(frames).unwrap(),
            SceneReply::Scene(vec![1, 2, 3])
        );
    }
}
