use std::fmt::Display;

use crate::error::{CbError, Result};

/// Pixel layout of a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorMode {
    /// One byte per pixel, `0` is black and anything else white.
    Bilevel,
    /// One byte per pixel.
    Grayscale,
    /// One palette index per pixel. The palette holds RGB triples.
    Palette(Vec<u8>),
    /// Three bytes per pixel.
    Rgb,
    /// Four bytes per pixel.
    Cmyk,
}

impl ColorMode {
    /// Bytes per pixel in a [`Raster`].
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorMode::Bilevel | ColorMode::Grayscale | ColorMode::Palette(_) => 1,
            ColorMode::Rgb => 3,
            ColorMode::Cmyk => 4,
        }
    }
}

impl Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Bilevel => write!(f, "bilevel"),
            ColorMode::Grayscale => write!(f, "grayscale"),
            ColorMode::Palette(p) => write!(f, "palette ({} colors)", p.len() / 3),
            ColorMode::Rgb => write!(f, "RGB"),
            ColorMode::Cmyk => write!(f, "CMYK"),
        }
    }
}

/// A decoded frame ready to be put on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    /// Rows top to bottom, no padding.
    pub pixels: Vec<u8>,
    /// DPI of this frame. Falls back to the document resolution.
    pub resolution: Option<f64>,
}

impl Raster {
    pub fn new(width: u32, height: u32, mode: ColorMode, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(mode.bytes_per_pixel()));
        if width == 0 || height == 0 || expected != Some(pixels.len()) {
            return Err(CbError::UnsupportedPixelFormat(format!(
                "{} bytes do not make a {}x{} {} image",
                pixels.len(),
                width,
                height,
                mode
            )));
        }
        if let ColorMode::Palette(palette) = &mode {
            if palette.is_empty() || palette.len() % 3 != 0 || palette.len() > 768 {
                return Err(CbError::UnsupportedPixelFormat(format!(
                    "palette of {} bytes",
                    palette.len()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            mode,
            pixels,
            resolution: None,
        })
    }

    pub fn with_resolution(mut self, dpi: f64) -> Self {
        self.resolution = Some(dpi);
        self
    }
}
