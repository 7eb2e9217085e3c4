//! Source images, opened lazily and consumed page by page.

use std::path::{Path, PathBuf};

#[cfg(feature = "codec")]
use crate::codec::{self, AnimationFrames};
use crate::{codec::DecodeTolerance, config::ColorPolicy, error::Result, raster::Raster};

/// An image that will become one or more pages.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceImage {
    /// A file that has not been opened yet.
    Pending(PathBuf),
    /// Pixels that are already decoded.
    Raster(Raster),
}

impl From<PathBuf> for SourceImage {
    fn from(path: PathBuf) -> Self {
        SourceImage::Pending(path)
    }
}

impl From<&Path> for SourceImage {
    fn from(path: &Path) -> Self {
        SourceImage::Pending(path.to_owned())
    }
}

impl From<Raster> for SourceImage {
    fn from(raster: Raster) -> Self {
        SourceImage::Raster(raster)
    }
}

/// Result of looking at a source before any page is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Pages this source turns into.
    pub frames: usize,
    animated: bool,
    /// Tolerance the frames have to be decoded with to yield `frames`.
    tolerance: DecodeTolerance,
}

impl Probe {
    fn single() -> Self {
        Self {
            frames: 1,
            animated: false,
            tolerance: DecodeTolerance::Strict,
        }
    }
}

#[cfg(feature = "codec")]
fn decode_error(path: &Path, err: image::ImageError) -> crate::error::CbError {
    crate::error::CbError::Decode {
        path: path.to_owned(),
        message: err.to_string(),
    }
}

impl SourceImage {
    /// Short description for log messages.
    pub fn describe(&self) -> String {
        match self {
            SourceImage::Pending(path) => path.display().to_string(),
            SourceImage::Raster(r) => format!("<{}x{} {} raster>", r.width, r.height, r.mode),
        }
    }

    /// Count the frames of this source.
    ///
    /// Still images are not decoded here. Animations are decoded frame by
    /// frame and counted; a truncated animation is counted again with
    /// relaxed tolerance, and that tolerance is remembered for [`open`].
    ///
    /// [`open`]: SourceImage::open
    pub fn probe(&self) -> Result<Probe> {
        match self {
            SourceImage::Raster(_) => Ok(Probe::single()),
            #[cfg(feature = "codec")]
            SourceImage::Pending(path) => {
                if !codec::is_animation(path).map_err(|err| decode_error(path, err))? {
                    return Ok(Probe::single());
                }
                let (frames, tolerance) = match codec::count_frames(path, DecodeTolerance::Strict) {
                    Ok(frames) => (frames, DecodeTolerance::Strict),
                    Err(err) if codec::is_truncation(&err) => {
                        log::warn!("{} is truncated, counting readable frames: {}", path.display(), err);
                        let frames = codec::count_frames(path, DecodeTolerance::Truncated)
                            .map_err(|err| decode_error(path, err))?;
                        (frames, DecodeTolerance::Truncated)
                    }
                    Err(err) => return Err(decode_error(path, err)),
                };
                if frames == 0 {
                    return Err(crate::error::CbError::Decode {
                        path: path.clone(),
                        message: "animation without readable frames".to_owned(),
                    });
                }
                Ok(Probe {
                    frames,
                    animated: true,
                    tolerance,
                })
            }
            #[cfg(not(feature = "codec"))]
            SourceImage::Pending(_) => Err(crate::codec::missing_codec()),
        }
    }

    /// Take ownership of the source and start decoding it.
    ///
    /// A still image whose data ends early is decoded a second time with
    /// relaxed tolerance. The relaxed mode applies to that one retry only.
    pub fn open(self, probe: Probe, policy: ColorPolicy) -> Result<OpenedImage> {
        match self {
            SourceImage::Raster(raster) => Ok(OpenedImage {
                frames: Frames::Single(Some(raster)),
                recovered: false,
            }),
            #[cfg(feature = "codec")]
            SourceImage::Pending(path) if probe.animated => {
                let frames = AnimationFrames::open(&path, probe.tolerance).map_err(|err| decode_error(&path, err))?;
                Ok(OpenedImage {
                    frames: Frames::Animation { frames, path },
                    recovered: probe.tolerance == DecodeTolerance::Truncated,
                })
            }
            #[cfg(feature = "codec")]
            SourceImage::Pending(path) => {
                let (image, recovered) = match codec::decode(&path, DecodeTolerance::Strict) {
                    Ok(image) => (image, false),
                    Err(err) if codec::is_truncation(&err) => {
                        log::warn!("{} is truncated, retrying with relaxed tolerance: {}", path.display(), err);
                        let image =
                            codec::decode(&path, DecodeTolerance::Truncated).map_err(|err| decode_error(&path, err))?;
                        (image, true)
                    }
                    Err(err) => return Err(decode_error(&path, err)),
                };
                Ok(OpenedImage {
                    frames: Frames::Single(Some(codec::to_raster(image, policy)?)),
                    recovered,
                })
            }
            #[cfg(not(feature = "codec"))]
            SourceImage::Pending(_) => {
                let _ = (probe, policy);
                Err(crate::codec::missing_codec())
            }
        }
    }
}

enum Frames {
    Single(Option<Raster>),
    #[cfg(feature = "codec")]
    Animation { frames: AnimationFrames, path: PathBuf },
}

/// Decoded frames of one source, handed out one at a time so that each can
/// be dropped once its page is written.
pub struct OpenedImage {
    frames: Frames,
    recovered: bool,
}

impl OpenedImage {
    /// Whether truncation recovery was needed for this source.
    pub fn recovered(&self) -> bool {
        self.recovered
    }
}

impl Iterator for OpenedImage {
    type Item = Result<Raster>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.frames {
            Frames::Single(raster) => raster.take().map(Ok),
            #[cfg(feature = "codec")]
            Frames::Animation { frames, path } => Some(
                frames
                    .next()?
                    .map_err(|err| decode_error(path, err))
                    // composited animation frames carry alpha, flatten them
                    .and_then(|image| codec::to_raster(image, ColorPolicy::ConvertToRgb)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ColorMode;

    #[test]
    fn raster_source_is_single_frame() {
        let raster = Raster::new(1, 1, ColorMode::Grayscale, vec![7]).unwrap();
        let source = SourceImage::from(raster.clone());
        let probe = source.probe().unwrap();
        assert_eq!(probe.frames, 1);

        let mut opened = source.open(probe, ColorPolicy::Strict).unwrap();
        assert!(!opened.recovered());
        assert_eq!(opened.next().unwrap().unwrap(), raster);
        assert!(opened.next().is_none());
    }

    #[cfg(feature = "codec")]
    #[test]
    fn missing_file_is_a_decode_error() {
        let source = SourceImage::from(PathBuf::from("/nonexistent/claybook/page.png"));
        assert!(matches!(source.probe(), Err(crate::error::CbError::Decode { .. })));
    }
}
