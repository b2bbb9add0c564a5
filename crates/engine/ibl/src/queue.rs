//! Task list shared by filter workers
//!
//! Cells form a `[mip][face]` grid. Two cursors claim from opposite ends: the
//! coarse cursor starts at the smallest mip and suits general-purpose workers,
//! the fine cursor starts at mip 0 and suits accelerated executors that do best
//! on large faces. Both sit behind one mutex and take a cell out of the grid
//! when claiming it, so every job reaches exactly one worker. Jobs an executor
//! hands back go onto a separate unfinished stack with its own mutex.

use crate::face::CubeFace;
use crate::kernel::MipFilter;
use glam::Vec4;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Work performed for one (mip, face)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskKind {
    /// Box-resample the source into the base mip
    Downsample,
    /// Cosine-power convolution with per-mip parameters
    Radiance(MipFilter),
}

/// Kind of worker claiming tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Cpu,
    Accelerated,
}

/// Which executors may run a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    #[default]
    Any,
    CpuOnly,
}

impl Capability {
    pub fn allows(self, kind: ExecutorKind) -> bool {
        match self {
            Capability::Any => true,
            Capability::CpuOnly => kind == ExecutorKind::Cpu,
        }
    }
}

/// Immutable description of one (mip, face) task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterTask {
    pub mip: u32,
    pub face: CubeFace,
    pub face_size: u32,
    pub kind: TaskKind,
    pub capability: Capability,
}

/// A task together with the destination surface it owns
#[derive(Debug)]
pub struct FilterJob<'a> {
    pub task: FilterTask,
    pub dst: &'a mut [Vec4],
}

struct Cursors<'a> {
    cells: Vec<Option<FilterJob<'a>>>,
    /// Cells scanned from the end (coarsest mip)
    coarse: usize,
    /// Cells scanned from the start (mip 0)
    fine: usize,
    unclaimed: usize,
}

impl<'a> Cursors<'a> {
    fn take(&mut self, idx: usize) -> Option<FilterJob<'a>> {
        let job = self.cells[idx].take();
        if job.is_some() {
            self.unclaimed -= 1;
        }
        job
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Grid of filter jobs with two claim cursors and an unfinished stack
pub struct TaskList<'a> {
    cursors: Mutex<Cursors<'a>>,
    unfinished: Mutex<Vec<FilterJob<'a>>>,
}

impl<'a> TaskList<'a> {
    /// Build from a grid indexed by `[mip][face]`; `None` cells are already done
    pub fn new(grid: Vec<[Option<FilterJob<'a>>; 6]>) -> Self {
        let cells: Vec<_> = grid.into_iter().flatten().collect();
        let unclaimed = cells.iter().filter(|cell| cell.is_some()).count();
        Self {
            cursors: Mutex::new(Cursors {
                cells,
                coarse: 0,
                fine: 0,
                unclaimed,
            }),
            unfinished: Mutex::new(Vec::new()),
        }
    }

    /// Claim the next job walking from the coarsest mip toward mip 0
    pub fn claim_coarse(&self, kind: ExecutorKind) -> Option<FilterJob<'a>> {
        let mut cursors = lock(&self.cursors);
        let len = cursors.cells.len();
        while cursors.coarse < len {
            let idx = len - 1 - cursors.coarse;
            cursors.coarse += 1;
            let claimable = cursors.cells[idx]
                .as_ref()
                .is_some_and(|job| job.task.capability.allows(kind));
            if claimable {
                return cursors.take(idx);
            }
        }
        None
    }

    /// Claim the next job walking from mip 0 toward the coarsest mip
    pub fn claim_fine(&self, kind: ExecutorKind) -> Option<FilterJob<'a>> {
        let mut cursors = lock(&self.cursors);
        while cursors.fine < cursors.cells.len() {
            let idx = cursors.fine;
            cursors.fine += 1;
            let claimable = cursors.cells[idx]
                .as_ref()
                .is_some_and(|job| job.task.capability.allows(kind));
            if claimable {
                return cursors.take(idx);
            }
        }
        None
    }

    /// Hand back a job an executor could not finish
    pub fn push_unfinished(&self, job: FilterJob<'a>) {
        lock(&self.unfinished).push(job);
    }

    pub fn pop_unfinished(&self) -> Option<FilterJob<'a>> {
        lock(&self.unfinished).pop()
    }

    /// Jobs not yet claimed plus jobs waiting on the unfinished stack
    pub fn remaining(&self) -> usize {
        let unclaimed = lock(&self.cursors).unclaimed;
        unclaimed + lock(&self.unfinished).len()
    }
}
