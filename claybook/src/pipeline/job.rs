use std::{
    ffi::OsString,
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    config::PdfOptions,
    document::{self, DocumentInfo},
    error::{CbError, Result},
    progress::Progress,
    source::SourceImage,
};

/// One output file and the images that go into it.
///
/// Jobs own everything they need; nothing is shared with the code that
/// planned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Used as document title and in progress events.
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub target: PathBuf,
    /// Overwrite `target` if it exists instead of skipping the job.
    pub replace: bool,
    /// Removed after the job ran, whether it succeeded or not.
    pub staging_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TargetExists,
    AlreadyInFlight,
    /// A fatal error in another job stopped the pipeline.
    Stopped,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TargetExists => f.write_str("target exists and replace is off"),
            SkipReason::AlreadyInFlight => f.write_str("another job is writing the same target"),
            SkipReason::Stopped => f.write_str("pipeline stopped"),
        }
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        pages: usize,
        /// Pages decoded from truncated images.
        recovered: usize,
    },
    Skipped(SkipReason),
    Failed(CbError),
    Panicked(String),
}

impl ConversionJob {
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>, sources: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            sources,
            target: target.into(),
            replace: false,
            staging_dirs: Vec::new(),
        }
    }

    /// Where the document is written before it is moved to `target`.
    pub fn part_path(&self) -> PathBuf {
        let mut name = self.target.file_name().map(OsString::from).unwrap_or_default();
        name.push(".part");
        self.target.with_file_name(name)
    }

    /// Convert all sources. `target` either ends up as a complete document
    /// or is left as it was.
    pub(crate) fn run(&self, options: &PdfOptions, progress: &dyn Progress) -> JobOutcome {
        if self.target.exists() {
            if !self.replace {
                log::info!("{}: {} exists, skipping", self.name, self.target.display());
                return JobOutcome::Skipped(SkipReason::TargetExists);
            }
            log::info!("{}: replacing {}", self.name, self.target.display());
        }

        log::info!("{}: converting {} images", self.name, self.sources.len());
        let part = self.part_path();
        match self.write(&part, options, progress) {
            Ok(pages) => JobOutcome::Completed {
                pages: pages.len(),
                recovered: pages.iter().filter(|page| page.recovered).count(),
            },
            Err(err) => {
                match fs::remove_file(&part) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => log::warn!("{}: cannot remove {}: {}", self.name, part.display(), e),
                }
                JobOutcome::Failed(err)
            }
        }
    }

    fn write(
        &self,
        part: &Path,
        options: &PdfOptions,
        progress: &dyn Progress,
    ) -> Result<Vec<document::PageRecord>> {
        if self.sources.is_empty() {
            return Err(CbError::InvalidConfig(format!("job {} has no images", self.name)));
        }
        let sources = self.sources.iter().map(|path| SourceImage::from(path.as_path())).collect();
        let pages = document::create_file(part, sources, DocumentInfo::titled(&self.name), options, |current, total| {
            progress.page_written(&self.name, current, total)
        })?;

        if self.replace && self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        fs::rename(part, &self.target)?;
        Ok(pages)
    }

    /// Remove the staging directories. Failures are only logged.
    pub(crate) fn remove_staging(&self) {
        for dir in &self.staging_dirs {
            match fs::remove_dir_all(dir) {
                Ok(()) => log::debug!("{}: removed {}", self.name, dir.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log::warn!("{}: cannot remove {}: {}", self.name, dir.display(), err),
            }
        }
    }
}
