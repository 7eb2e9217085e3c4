//! Binding chapters into books.
//!
//! Chapter batches are grouped into [`ConversionJob`]s by [`plan_jobs`] and
//! converted on a fixed number of worker threads. Submitting blocks once
//! `queue_capacity` jobs are waiting. Every job runs to its end on one
//! worker; different jobs never share a target file.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use claybook::{BookGrouping, Config, LogProgress, Pipeline};
//!
//! # fn main() -> claybook::Result<()> {
//! # let batches = Vec::new();
//! let pipeline = Pipeline::new(Config::default(), Arc::new(LogProgress))?;
//! pipeline.submit_batches(&BookGrouping::PerVolume, batches);
//! let report = pipeline.shutdown()?;
//! println!("{} books written", report.completed.len());
//! # Ok(())
//! # }
//! ```

use std::{fs, sync::Arc};

pub use self::{
    grouping::{plan_jobs, BookGrouping, ChapterBatch, ChapterInfo},
    job::{ConversionJob, JobOutcome, SkipReason},
    pool::Report,
};
use self::pool::WorkerPool;
use crate::{config::Config, error::Result, progress::Progress};

mod grouping;
mod job;
mod pool;

pub struct Pipeline {
    config: Config,
    pool: WorkerPool,
}

impl Pipeline {
    /// Validate `config` and start the workers.
    ///
    /// Fails before any job is accepted when the configuration cannot work,
    /// including when the image codec is not compiled in.
    pub fn new(config: Config, progress: Arc<dyn Progress>) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.output_dir)?;
        let pool = WorkerPool::new(config.workers, config.queue_capacity, config.pdf.clone(), progress)?;
        log::info!(
            "pipeline started with {} workers writing to {}",
            config.workers,
            config.output_dir.display()
        );
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Plan jobs for `batches` and queue them. Returns the number of jobs
    /// accepted.
    pub fn submit_batches(&self, grouping: &BookGrouping, batches: Vec<ChapterBatch>) -> usize {
        plan_jobs(grouping, batches, &self.config)
            .into_iter()
            .map(|job| self.submit(job))
            .filter(|accepted| *accepted)
            .count()
    }

    /// Queue a single job. Jobs for a target that is already queued or being
    /// written, and all jobs after a fatal error, are skipped.
    pub fn submit(&self, job: ConversionJob) -> bool {
        self.pool.submit(job)
    }

    /// Wait until every accepted job has finished.
    pub fn shutdown(self) -> Result<Report> {
        let report = self.pool.shutdown()?;
        log::info!(
            "pipeline finished: {} completed, {} failed, {} skipped",
            report.completed.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
