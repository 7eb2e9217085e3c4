//! Glue to the `image` crate: decoding sources with an explicit truncation
//! tolerance, turning decoded images into [`Raster`]s and baseline JPEG
//! encoding.
//!
//! Without the `codec` feature only the error paths remain.

use serde::{Deserialize, Serialize};

#[cfg(feature = "codec")]
pub(crate) use self::imp::*;
use crate::error::CbError;
#[cfg(not(feature = "codec"))]
use crate::error::Result;

/// How a single decode treats input that ends early.
///
/// Passed to each decode call; there is no process-wide switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodeTolerance {
    /// Premature end of data is an error.
    #[default]
    Strict,
    /// Keep whatever was decoded before the data ended. Missing pixels stay
    /// black.
    Truncated,
}

pub(crate) const CODEC: &str = "image codec (enable the `codec` feature)";

pub(crate) fn missing_codec() -> CbError {
    CbError::MissingOptionalDependency(CODEC)
}

#[cfg(not(feature = "codec"))]
pub(crate) fn encode_jpeg(_pixels: &[u8], _width: u32, _height: u32, _gray: bool, _quality: u8) -> Result<Vec<u8>> {
    Err(missing_codec())
}

#[cfg(not(feature = "codec"))]
pub(crate) fn encode_cmyk_jpeg(_pixels: &[u8], _width: u32, _height: u32, _quality: u8) -> Result<Vec<u8>> {
    Err(missing_codec())
}

#[cfg(feature = "codec")]
mod imp {
    use std::{fs::File, io, io::BufReader, path::Path};

    use image::{
        codecs::{gif::GifDecoder, jpeg::JpegEncoder, png::PngDecoder, webp::WebPDecoder},
        error::{ImageFormatHint, LimitError, LimitErrorKind, UnsupportedError, UnsupportedErrorKind},
        AnimationDecoder, ColorType, DynamicImage, ExtendedColorType, Frames, ImageBuffer, ImageDecoder, ImageError,
        ImageFormat, ImageReader, ImageResult,
    };

    use super::DecodeTolerance;
    use crate::{
        config::ColorPolicy,
        error::{CbError, Result},
        raster::{ColorMode, Raster},
    };

    const TRUNCATION_HINTS: [&str; 5] = ["eof", "end of", "truncated", "no more bytes", "premature"];

    /// Whether `err` says the data stream ended before the image did.
    pub(crate) fn is_truncation(err: &ImageError) -> bool {
        if let ImageError::IoError(io) = err {
            if io.kind() == io::ErrorKind::UnexpectedEof {
                return true;
            }
        }
        let message = err.to_string().to_ascii_lowercase();
        TRUNCATION_HINTS.iter().any(|hint| message.contains(hint))
    }

    fn reader(path: &Path) -> io::Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path)?))
    }

    /// Whether `path` holds more than a still image: any GIF, an APNG or a
    /// WebP with an animation chunk.
    ///
    /// A PNG or WebP whose header cannot be read counts as still; decoding it
    /// reports the actual error.
    pub(crate) fn is_animation(path: &Path) -> ImageResult<bool> {
        let animated = match ImageReader::open(path)?.with_guessed_format()?.format() {
            Some(ImageFormat::Gif) => return Ok(true),
            Some(ImageFormat::Png) => PngDecoder::new(reader(path)?).and_then(|decoder| decoder.is_apng()),
            Some(ImageFormat::WebP) => WebPDecoder::new(reader(path)?).map(|decoder| decoder.has_animation()),
            _ => return Ok(false),
        };
        Ok(animated.unwrap_or_else(|err| {
            log::debug!("{} treated as a still image: {}", path.display(), err);
            false
        }))
    }

    /// Frames of `path`, for any format [`is_animation`] accepts.
    fn frames(path: &Path) -> ImageResult<Frames<'static>> {
        match ImageReader::open(path)?.with_guessed_format()?.format() {
            Some(ImageFormat::Png) => Ok(PngDecoder::new(reader(path)?)?.apng()?.into_frames()),
            Some(ImageFormat::WebP) => Ok(WebPDecoder::new(reader(path)?)?.into_frames()),
            _ => Ok(GifDecoder::new(reader(path)?)?.into_frames()),
        }
    }

    /// Decode a still image.
    pub(crate) fn decode(path: &Path, tolerance: DecodeTolerance) -> ImageResult<DynamicImage> {
        let decoder = ImageReader::open(path)?.with_guessed_format()?.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();
        let len = usize::try_from(decoder.total_bytes())
            .map_err(|_| ImageError::Limits(LimitError::from_kind(LimitErrorKind::InsufficientMemory)))?;

        let mut buf = vec![0; len];
        match decoder.read_image(&mut buf) {
            Ok(()) => {}
            Err(err) if tolerance == DecodeTolerance::Truncated && is_truncation(&err) => {
                log::debug!("keeping partial pixels of {}: {}", path.display(), err);
            }
            Err(err) => return Err(err),
        }

        from_raw(width, height, color, buf).ok_or_else(|| {
            ImageError::Unsupported(UnsupportedError::from_format_and_kind(
                ImageFormatHint::Unknown,
                UnsupportedErrorKind::Color(color.into()),
            ))
        })
    }

    fn words(buf: &[u8]) -> Vec<u16> {
        buf.chunks_exact(2).map(|c| u16::from_ne_bytes([c[0], c[1]])).collect()
    }

    fn floats(buf: &[u8]) -> Vec<f32> {
        buf.chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Decoder output as a [`DynamicImage`]. Samples wider than a byte are in
    /// native byte order.
    fn from_raw(width: u32, height: u32, color: ColorType, buf: Vec<u8>) -> Option<DynamicImage> {
        Some(match color {
            ColorType::L8 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, buf)?),
            ColorType::La8 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(width, height, buf)?),
            ColorType::Rgb8 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, buf)?),
            ColorType::Rgba8 => DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, buf)?),
            ColorType::L16 => DynamicImage::ImageLuma16(ImageBuffer::from_raw(width, height, words(&buf))?),
            ColorType::La16 => DynamicImage::ImageLumaA16(ImageBuffer::from_raw(width, height, words(&buf))?),
            ColorType::Rgb16 => DynamicImage::ImageRgb16(ImageBuffer::from_raw(width, height, words(&buf))?),
            ColorType::Rgba16 => DynamicImage::ImageRgba16(ImageBuffer::from_raw(width, height, words(&buf))?),
            ColorType::Rgb32F => DynamicImage::ImageRgb32F(ImageBuffer::from_raw(width, height, floats(&buf))?),
            ColorType::Rgba32F => DynamicImage::ImageRgba32F(ImageBuffer::from_raw(width, height, floats(&buf))?),
            _ => return None,
        })
    }

    /// Map a decoded image onto a [`ColorMode`].
    ///
    /// `Strict` accepts gray and RGB (16 bit samples are reduced to 8 bit)
    /// and reports everything else as unsupported. `ConvertToRgb` turns
    /// every image into RGB.
    pub(crate) fn to_raster(image: DynamicImage, policy: ColorPolicy) -> Result<Raster> {
        let (width, height) = (image.width(), image.height());
        let (mode, pixels) = match (policy, image) {
            (ColorPolicy::ConvertToRgb, image) => (ColorMode::Rgb, image.to_rgb8().into_raw()),
            (ColorPolicy::Strict, DynamicImage::ImageLuma8(buf)) => (ColorMode::Grayscale, buf.into_raw()),
            (ColorPolicy::Strict, image @ DynamicImage::ImageLuma16(_)) => {
                (ColorMode::Grayscale, image.to_luma8().into_raw())
            }
            (ColorPolicy::Strict, DynamicImage::ImageRgb8(buf)) => (ColorMode::Rgb, buf.into_raw()),
            (ColorPolicy::Strict, image @ DynamicImage::ImageRgb16(_)) => (ColorMode::Rgb, image.to_rgb8().into_raw()),
            (ColorPolicy::Strict, image) => {
                return Err(CbError::UnsupportedPixelFormat(format!("{:?}", image.color())));
            }
        };
        Raster::new(width, height, mode, pixels)
    }

    /// Frames of an animation, composited onto the full canvas.
    pub(crate) struct AnimationFrames {
        frames: Frames<'static>,
        tolerance: DecodeTolerance,
        finished: bool,
    }

    impl AnimationFrames {
        pub(crate) fn open(path: &Path, tolerance: DecodeTolerance) -> ImageResult<Self> {
            Ok(Self {
                frames: frames(path)?,
                tolerance,
                finished: false,
            })
        }
    }

    impl Iterator for AnimationFrames {
        type Item = ImageResult<DynamicImage>;

        fn next(&mut self) -> Option<Self::Item> {
            if self.finished {
                return None;
            }
            match self.frames.next()? {
                Ok(frame) => Some(Ok(DynamicImage::ImageRgba8(frame.into_buffer()))),
                Err(err) if self.tolerance == DecodeTolerance::Truncated && is_truncation(&err) => {
                    log::debug!("animation ends early: {}", err);
                    self.finished = true;
                    None
                }
                Err(err) => {
                    self.finished = true;
                    Some(Err(err))
                }
            }
        }
    }

    /// Count the frames of an animation by decoding them one at a time.
    pub(crate) fn count_frames(path: &Path, tolerance: DecodeTolerance) -> ImageResult<usize> {
        AnimationFrames::open(path, tolerance)?.try_fold(0, |count, frame| frame.map(|_| count + 1))
    }

    pub(crate) fn encode_jpeg(pixels: &[u8], width: u32, height: u32, gray: bool, quality: u8) -> Result<Vec<u8>> {
        let color = if gray {
            ExtendedColorType::L8
        } else {
            ExtendedColorType::Rgb8
        };
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(pixels, width, height, color)
            .map_err(|err| CbError::Io(io::Error::new(io::ErrorKind::Other, err)))?;
        Ok(out)
    }

    /// JPEG with four components. Samples are stored inverted, the way Adobe
    /// applications write CMYK, so the image needs `/Decode [1 0 1 0 1 0 1 0]`.
    pub(crate) fn encode_cmyk_jpeg(pixels: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
        let too_large = || CbError::UnsupportedPixelFormat(format!("{}x{} exceeds the JPEG size limit", width, height));
        let width = u16::try_from(width).map_err(|_| too_large())?;
        let height = u16::try_from(height).map_err(|_| too_large())?;
        let inverted: Vec<u8> = pixels.iter().map(|&p| 255 - p).collect();

        let mut out = Vec::new();
        jpeg_encoder::Encoder::new(&mut out, quality)
            .encode(&inverted, width, height, jpeg_encoder::ColorType::Cmyk)
            .map_err(|err| CbError::Io(io::Error::new(io::ErrorKind::Other, err.to_string())))?;
        Ok(out)
    }

}
