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

//! [`FrameSink`] implementations for preview images.

use anyhow::{anyhow, Context, Result};
use dolly_core::{FrameSink, RawImage};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Writes every presented image to one PNG file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct PngFrameSink {
    path: PathBuf,
}

impl PngFrameSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for PngFrameSink {
    fn present(&self, pass: &str, image: &RawImage) -> Result<()> {
        let buffer = RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", image.width, image.height))?;
        buffer
            .save(&self.path)
            .with_context(|| format!("Failed to write preview to '{}'", self.path.display()))?;
        log::debug!(
            "Pass '{pass}' preview {}x{} written to '{}'",
            image.width,
            image.height,
            self.path.display()
        );
        Ok(())
    }
}

/// Discards every image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&self, pass: &str, image: &RawImage) -> Result<()> {
        log::trace!("Dropping {}x{} image from pass '{pass}'", image.width, image.height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_sink_writes_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PngFrameSink::new(dir.path().join("preview.png"));
        let pixels: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();
        let image = RawImage::rgba8(2, 3, pixels.clone()).unwrap();

        sink.present("beauty", &image).unwrap();

        let decoded = image::open(sink.path()).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 3));
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_png_sink_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PngFrameSink::new(dir.path().join("missing").join("preview.png"));
        let image = RawImage::rgba8(1, 1, vec![0; 4]).unwrap();
        assert!(sink.present("beauty", &image).is_err());
    }
}
