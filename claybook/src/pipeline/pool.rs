use std::{
    any::Any,
    io, mem,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
};

use fnv::FnvHashSet;

use super::{ConversionJob, JobOutcome, SkipReason};
use crate::{
    config::PdfOptions,
    error::{CbError, Result},
    progress::Progress,
};

/// What happened to every job handed to the pipeline.
#[derive(Debug, Default)]
pub struct Report {
    pub completed: Vec<PathBuf>,
    /// Target and error message of every aborted job.
    pub failed: Vec<(PathBuf, String)>,
    pub skipped: Vec<PathBuf>,
}

struct Shared {
    options: PdfOptions,
    progress: Arc<dyn Progress>,
    in_flight: Mutex<FnvHashSet<PathBuf>>,
    /// Jobs accepted and not finished yet, running or waiting for a thread.
    pending: Mutex<usize>,
    slot_freed: Condvar,
    report: Mutex<Report>,
    fatal: Mutex<Option<CbError>>,
    stopped: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn record(&self, job: &ConversionJob, outcome: JobOutcome) {
        self.progress.job_finished(&job.name, &outcome);
        let target = job.target.clone();
        match outcome {
            JobOutcome::Completed { .. } => lock(&self.report).completed.push(target),
            JobOutcome::Skipped(_) => lock(&self.report).skipped.push(target),
            JobOutcome::Panicked(message) => lock(&self.report).failed.push((target, message)),
            JobOutcome::Failed(err) => {
                lock(&self.report).failed.push((target, err.to_string()));
                if err.is_fatal() {
                    self.stopped.store(true, Ordering::SeqCst);
                    lock(&self.fatal).get_or_insert(err);
                }
            }
        }
    }

    /// Block until fewer than `capacity` jobs are pending, then take a slot.
    fn acquire(&self, capacity: usize) {
        let mut pending = lock(&self.pending);
        while *pending >= capacity {
            pending = self.slot_freed.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
        *pending += 1;
    }

    fn wait_idle(&self) {
        let mut pending = lock(&self.pending);
        while *pending > 0 {
            pending = self.slot_freed.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Gives the slot of a job back when the task ends, however it ends.
struct Slot(Arc<Shared>);

impl Drop for Slot {
    fn drop(&mut self) {
        *lock(&self.0.pending) -= 1;
        self.0.slot_freed.notify_all();
    }
}

/// Jobs run on a rayon pool with a fixed number of threads. At most
/// `workers + queue_capacity` jobs are pending at once; [`submit`] blocks
/// beyond that.
///
/// [`submit`]: WorkerPool::submit
pub(crate) struct WorkerPool {
    pool: rayon::ThreadPool,
    capacity: usize,
    shared: Arc<Shared>,
}

impl WorkerPool {
    pub(crate) fn new(
        workers: usize,
        queue_capacity: usize,
        options: PdfOptions,
        progress: Arc<dyn Progress>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("claybook-worker-{}", i))
            .panic_handler(|payload| log::error!("worker task panicked: {}", panic_message(payload.as_ref())))
            .build()
            .map_err(|err| CbError::Io(io::Error::new(io::ErrorKind::Other, err.to_string())))?;
        let shared = Arc::new(Shared {
            options,
            progress,
            in_flight: Mutex::new(FnvHashSet::default()),
            pending: Mutex::new(0),
            slot_freed: Condvar::new(),
            report: Mutex::new(Report::default()),
            fatal: Mutex::new(None),
            stopped: AtomicBool::new(false),
        });

        Ok(Self {
            pool,
            capacity: workers + queue_capacity,
            shared,
        })
    }

    /// Queue `job`, blocking while the queue is full. Returns whether the job
    /// was accepted.
    pub(crate) fn submit(&self, job: ConversionJob) -> bool {
        if self.shared.stopped.load(Ordering::SeqCst) {
            log::warn!("{}: not queued, the pipeline has stopped", job.name);
            self.shared.record(&job, JobOutcome::Skipped(SkipReason::Stopped));
            return false;
        }
        if !lock(&self.shared.in_flight).insert(job.target.clone()) {
            log::warn!("{}: {} is already being written, skipping", job.name, job.target.display());
            self.shared.record(&job, JobOutcome::Skipped(SkipReason::AlreadyInFlight));
            return false;
        }

        self.shared.acquire(self.capacity);
        log::debug!("{}: queued", job.name);
        let slot = Slot(Arc::clone(&self.shared));
        self.pool.spawn(move || {
            work(&slot.0, job);
            drop(slot);
        });
        true
    }

    /// Wait for every queued job to end.
    ///
    /// Returns the first fatal error any job hit, otherwise the report.
    pub(crate) fn shutdown(self) -> Result<Report> {
        self.shared.wait_idle();
        if let Some(err) = lock(&self.shared.fatal).take() {
            return Err(err);
        }
        Ok(mem::take(&mut *lock(&self.shared.report)))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.wait_idle();
    }
}

fn work(shared: &Shared, job: ConversionJob) {
    let outcome = if shared.stopped.load(Ordering::SeqCst) {
        log::info!("{}: dropped after a fatal error", job.name);
        JobOutcome::Skipped(SkipReason::Stopped)
    } else {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run(&shared.options, shared.progress.as_ref())))
            .unwrap_or_else(|payload| JobOutcome::Panicked(panic_message(payload.as_ref())));
        if !matches!(outcome, JobOutcome::Skipped(_)) {
            job.remove_staging();
        }
        outcome
    };

    lock(&shared.in_flight).remove(&job.target);
    shared.record(&job, outcome);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
