//! Filter executors, worker loop, and progress accounting

use crate::kernel::{box_downsample, filter_face, FilterSource};
use crate::queue::{ExecutorKind, FilterJob, FilterTask, TaskKind, TaskList};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Upper bound on worker threads for one filter run
pub const MAX_THREADS: u32 = 64;

/// Result of running a job on an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    /// Executor gave up; the job goes back for another worker
    Unfinished,
}

/// Something that can run filter jobs
pub trait FilterExecutor: Sync {
    fn kind(&self) -> ExecutorKind;

    fn execute(&self, job: &mut FilterJob<'_>, source: &FilterSource<'_>) -> TaskOutcome;
}

/// Runs every task on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuExecutor;

impl FilterExecutor for CpuExecutor {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Cpu
    }

    fn execute(&self, job: &mut FilterJob<'_>, source: &FilterSource<'_>) -> TaskOutcome {
        let FilterTask {
            face,
            face_size,
            kind,
            ..
        } = job.task;
        match kind {
            TaskKind::Downsample => box_downsample(job.dst, face, face_size, source.image),
            TaskKind::Radiance(params) => filter_face(job.dst, face, face_size, source, &params),
        }
        TaskOutcome::Done
    }
}

/// Completion counters for one filter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    pub completed_cpu: usize,
    pub completed_accelerated: usize,
    pub total: usize,
}

impl ProgressCounters {
    pub fn completed(&self) -> usize {
        self.completed_cpu + self.completed_accelerated
    }
}

/// Progress state for one filter run, shared by reference with its workers
#[derive(Debug)]
pub struct FilterProgress {
    counters: Mutex<ProgressCounters>,
    next_thread_id: AtomicU32,
    start: Instant,
}

impl FilterProgress {
    pub fn new(total: usize) -> Self {
        Self {
            counters: Mutex::new(ProgressCounters {
                total,
                ..Default::default()
            }),
            next_thread_id: AtomicU32::new(0),
            start: Instant::now(),
        }
    }

    /// Issue an id for log correlation
    pub fn register_thread(&self) -> u32 {
        self.next_thread_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record(&self, kind: ExecutorKind, thread_id: u32, task: &FilterTask, elapsed: Duration) {
        let snapshot = {
            let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
            match kind {
                ExecutorKind::Cpu => counters.completed_cpu += 1,
                ExecutorKind::Accelerated => counters.completed_accelerated += 1,
            }
            *counters
        };

        let percent = 100.0 * snapshot.completed() as f32 / snapshot.total.max(1) as f32;
        tracing::debug!(
            thread_id,
            executor = ?kind,
            mip = task.mip,
            face = ?task.face,
            face_size = task.face_size,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "[{:5.1}%] task complete",
            percent
        );
    }

    pub fn snapshot(&self) -> ProgressCounters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn run_job<'a, E: FilterExecutor + ?Sized>(
    mut job: FilterJob<'a>,
    source: &FilterSource<'_>,
    executor: &E,
    progress: &FilterProgress,
    thread_id: u32,
) -> Option<FilterJob<'a>> {
    let start = Instant::now();
    match executor.execute(&mut job, source) {
        TaskOutcome::Done => {
            progress.record(executor.kind(), thread_id, &job.task, start.elapsed());
            None
        }
        TaskOutcome::Unfinished => Some(job),
    }
}

/// Claim and run jobs until none are left for this executor
///
/// CPU executors walk the coarse cursor and then drain the unfinished stack.
/// Accelerated executors walk the fine cursor and hand back what they cannot
/// finish.
pub fn run_worker<'a, E: FilterExecutor + ?Sized>(
    queue: &TaskList<'a>,
    source: &FilterSource<'_>,
    executor: &E,
    progress: &FilterProgress,
) {
    let thread_id = progress.register_thread();
    let kind = executor.kind();
    tracing::trace!(thread_id, executor = ?kind, "worker started");

    match kind {
        ExecutorKind::Cpu => {
            while let Some(job) = queue.claim_coarse(kind).or_else(|| queue.pop_unfinished()) {
                if let Some(job) = run_job(job, source, executor, progress, thread_id) {
                    tracing::warn!(thread_id, mip = job.task.mip, "CPU executor left a task unfinished");
                    queue.push_unfinished(job);
                    break;
                }
            }
        }
        ExecutorKind::Accelerated => {
            while let Some(job) = queue.claim_fine(kind) {
                if let Some(job) = run_job(job, source, executor, progress, thread_id) {
                    queue.push_unfinished(job);
                }
            }
        }
    }

    tracing::trace!(thread_id, "worker finished");
}

/// Run the queue to completion on up to `thread_count` CPU workers
///
/// Workers that fail to spawn are skipped; whatever is left once the pool has
/// joined is drained on the calling thread. Returns the number of threads that
/// actually ran.
pub fn run_pool(
    queue: &TaskList<'_>,
    source: &FilterSource<'_>,
    thread_count: u32,
    progress: &FilterProgress,
) -> u32 {
    let requested = thread_count.min(MAX_THREADS);
    let executor = CpuExecutor;

    let spawned = std::thread::scope(|scope| {
        let mut spawned = 0;
        for index in 0..requested {
            let result = std::thread::Builder::new()
                .name(format!("ibl-worker-{index}"))
                .spawn_scoped(scope, || run_worker(queue, source, &executor, progress));
            match result {
                Ok(_) => spawned += 1,
                Err(err) => tracing::warn!(index, error = %err, "failed to spawn filter worker"),
            }
        }
        spawned
    });

    let remaining = queue.remaining();
    if remaining > 0 {
        if requested > 0 {
            tracing::warn!(
                requested,
                spawned,
                remaining,
                "draining remaining filter tasks on the calling thread"
            );
        }
        run_worker(queue, source, &executor, progress);
    }

    spawned
}
