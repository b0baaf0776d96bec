/// Decoded pixel buffers handed to the transfer engine.

use std::path::Path;
use crate::error::{Error, Result};

/// Tightly packed RGBA8 pixels, row-major, top row first.
///
/// Only built through [`ImageData::new`], [`ImageData::solid`] or
/// [`load_rgba8`], so the payload always holds `width * height` texels:
///
/// ```compile_fail
/// use tandem_engine::tandem::resource::ImageData;
/// let image = ImageData { width: 2, height: 2, pixels: vec![0; 4] };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    /// Wrap raw pixels, checking that the buffer holds `width * height` RGBA8 texels
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "Image has zero extent ({}x{})", width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "Image {}x{} needs {} bytes, got {}", width, height, expected, pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// 1x1 image of a single color (the default texture)
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Size of the pixel payload in bytes
    pub fn byte_size(&self) -> u64 {
        self.pixels.len() as u64
    }
}

/// Decode an image file (PNG, JPEG) into RGBA8
pub fn load_rgba8(path: &Path) -> Result<ImageData> {
    let decoded = image::open(path)
        .map_err(|e| Error::LoadFailed(format!("{}: {}", path.display(), e)))?
        .into_rgba8();
    let (width, height) = decoded.dimensions();
    ImageData::new(width, height, decoded.into_raw())
}

#[cfg(test)]
#[path = "image_data_tests.rs"]
mod tests;
