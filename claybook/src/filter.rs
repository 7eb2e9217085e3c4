//! Stream filters for image data and the policy that picks one per
//! [`ColorMode`].

use std::{borrow::Cow, io::Write};

use flate2::{write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};

use crate::{
    codec,
    error::{CbError, Result},
    raster::{ColorMode, Raster},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    Dct,
    AsciiHex,
    Flate,
    RunLength,
}

impl Filter {
    /// Name of the filter as it appears in `/Filter`.
    pub fn name(self) -> &'static [u8] {
        match self {
            Filter::Dct => b"DCTDecode",
            Filter::AsciiHex => b"ASCIIHexDecode",
            Filter::Flate => b"FlateDecode",
            Filter::RunLength => b"RunLengthDecode",
        }
    }

    /// Filter for `mode`, honoring an optional override.
    ///
    /// Palette images always use ASCIIHex.
    pub fn select(mode: &ColorMode, preferred: Option<Filter>) -> Filter {
        match (mode, preferred) {
            (ColorMode::Palette(_), _) => Filter::AsciiHex,
            (_, Some(filter)) => filter,
            (_, None) => Filter::Dct,
        }
    }
}

/// Filtered sample data of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub filter: Filter,
    pub bits_per_component: u8,
    /// Samples are stored as `255 - value` and need an inverting `/Decode`.
    pub inverted: bool,
    pub data: Vec<u8>,
}

/// Encode the samples of `raster` with `filter`. `quality` only matters for
/// DCT.
pub fn encode(raster: &Raster, filter: Filter, quality: u8) -> Result<EncodedImage> {
    log::trace!(
        "encode {}x{} {} image with {:?}",
        raster.width,
        raster.height,
        raster.mode,
        filter
    );

    let (data, bits_per_component) = match filter {
        Filter::Dct => dct(raster, quality)?,
        Filter::AsciiHex => {
            let (samples, bits_per_component) = samples(raster);
            let mut hex = hex::encode_upper(samples).into_bytes();
            hex.push(b'>');
            (hex, bits_per_component)
        }
        Filter::Flate => {
            let (samples, bits_per_component) = samples(raster);
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&samples)?;
            (encoder.finish()?, bits_per_component)
        }
        Filter::RunLength => {
            let (samples, bits_per_component) = samples(raster);
            (aw_runlength::encode(&samples), bits_per_component)
        }
    };

    Ok(EncodedImage {
        filter,
        bits_per_component,
        inverted: filter == Filter::Dct && raster.mode == ColorMode::Cmyk,
        data,
    })
}

/// Baseline JPEG. Bilevel goes through the grayscale path but keeps
/// declaring one bit per component.
fn dct(raster: &Raster, quality: u8) -> Result<(Vec<u8>, u8)> {
    let (width, height) = (raster.width, raster.height);
    match &raster.mode {
        ColorMode::Bilevel => {
            let gray: Vec<u8> = raster.pixels.iter().map(|&p| if p == 0 { 0 } else { 255 }).collect();
            Ok((codec::encode_jpeg(&gray, width, height, true, quality)?, 1))
        }
        ColorMode::Grayscale => Ok((codec::encode_jpeg(&raster.pixels, width, height, true, quality)?, 8)),
        ColorMode::Rgb => Ok((codec::encode_jpeg(&raster.pixels, width, height, false, quality)?, 8)),
        ColorMode::Cmyk => Ok((codec::encode_cmyk_jpeg(&raster.pixels, width, height, quality)?, 8)),
        other => Err(CbError::UnsupportedPixelFormat(format!(
            "{} images cannot be DCT encoded",
            other
        ))),
    }
}

/// Uncompressed samples and their bit depth.
fn samples(raster: &Raster) -> (Cow<'_, [u8]>, u8) {
    match raster.mode {
        ColorMode::Bilevel => (Cow::Owned(pack_bits(&raster.pixels, raster.width as usize)), 1),
        _ => (Cow::Borrowed(&raster.pixels[..]), 8),
    }
}

/// One bit per pixel, most significant bit first, rows padded to whole
/// bytes. Non-zero pixels become `1` (white).
fn pack_bits(pixels: &[u8], width: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() / 8 + 1);
    for row in pixels.chunks(width.max(1)) {
        for byte in row.chunks(8) {
            let mut packed = 0u8;
            for (i, &p) in byte.iter().enumerate() {
                if p != 0 {
                    packed |= 0x80 >> i;
                }
            }
            out.push(packed);
        }
    }
    out
}
