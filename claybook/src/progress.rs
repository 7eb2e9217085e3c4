//! Observing conversion jobs while they run.

use crate::pipeline::JobOutcome;

/// Receives progress events from pipeline workers.
///
/// Events for different jobs can arrive concurrently from different worker
/// threads. Both methods do nothing by default.
pub trait Progress: Send + Sync {
    /// `current` of `total` pages of `job` have been written.
    fn page_written(&self, job: &str, current: usize, total: usize) {
        let _ = (job, current, total);
    }

    fn job_finished(&self, job: &str, outcome: &JobOutcome) {
        let _ = (job, outcome);
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Reports progress through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn page_written(&self, job: &str, current: usize, total: usize) {
        log::debug!("{}: page {}/{}", job, current, total);
    }

    fn job_finished(&self, job: &str, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed { pages, recovered } if *recovered > 0 => {
                log::info!("{}: {} pages written, {} recovered from truncated images", job, pages, recovered)
            }
            JobOutcome::Completed { pages, .. } => log::info!("{}: {} pages written", job, pages),
            JobOutcome::Skipped(reason) => log::debug!("{}: skipped, {}", job, reason),
            JobOutcome::Failed(err) => log::error!("{}: aborted, {}", job, err),
            JobOutcome::Panicked(message) => log::error!("{}: worker panicked, {}", job, message),
        }
    }
}
