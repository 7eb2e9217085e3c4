use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CbError, Result},
    filter::Filter,
};

/// What to do with pixel formats outside the gray/RGB/palette/CMYK set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorPolicy {
    /// Unknown formats fail the page with `UnsupportedPixelFormat`.
    #[default]
    Strict,
    /// Convert every decoded source to RGB first.
    ConvertToRgb,
}

/// Settings for encoding pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    /// DPI used for the MediaBox when a frame does not carry its own.
    pub resolution: f64,
    /// Quality of DCT (JPEG) encoded images, 1 to 100.
    pub jpeg_quality: u8,
    pub color_policy: ColorPolicy,
    /// Filter for every non-palette image instead of the per-mode default.
    pub filter: Option<Filter>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            resolution: 72.0,
            jpeg_quality: 75,
            color_policy: ColorPolicy::Strict,
            filter: None,
        }
    }
}

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the PDF files are written to.
    pub output_dir: PathBuf,
    /// Overwrite existing PDF files instead of skipping their jobs.
    pub replace: bool,
    /// Leave out the chapter marker pages of merged books.
    pub skip_chapter_markers: bool,
    /// Number of encoder threads.
    pub workers: usize,
    /// Jobs that may wait for a worker before submission blocks.
    pub queue_capacity: usize,
    pub pdf: PdfOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            replace: false,
            skip_chapter_markers: false,
            workers: 1,
            queue_capacity: 8,
            pdf: PdfOptions::default(),
        }
    }
}

impl Config {
    /// Check the configuration before any job is scheduled.
    pub fn validate(&self) -> Result<()> {
        if !cfg!(feature = "codec") {
            return Err(crate::codec::missing_codec());
        }
        if self.workers == 0 {
            return Err(CbError::InvalidConfig("at least one worker is required".to_owned()));
        }
        if self.queue_capacity == 0 {
            return Err(CbError::InvalidConfig("queue capacity must not be zero".to_owned()));
        }
        self.pdf.validate()
    }
}

impl PdfOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(CbError::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CbError::InvalidConfig(format!(
                "JPEG quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
