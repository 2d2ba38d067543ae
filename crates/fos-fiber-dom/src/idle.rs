//! Idle-frame driver
//!
//! Emulates an idle-callback loop: every frame the reconciler gets whatever
//! is left of the frame's idle share as its [`Deadline`], and the callback is
//! implicitly re-registered for the next frame.

use std::time::{Duration, Instant};

use fos_fiber::{Deadline, Host, ReconcileError, Reconciler, WorkStatus};

/// Driver errors
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("work still pending after {frames} frames")]
    NotSettled { frames: usize },
}

/// Frame budget allocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBudget {
    /// Total frame length
    pub frame: Duration,
    /// Portion of each frame handed to idle work
    pub idle: Duration,
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::for_60fps()
    }
}

impl FrameBudget {
    /// Budget for 60 FPS (16.67ms per frame)
    pub fn for_60fps() -> Self {
        Self {
            frame: Duration::from_micros(16_667),
            idle: Duration::from_micros(2_670),
        }
    }

    /// Budget for 30 FPS
    pub fn for_30fps() -> Self {
        Self {
            frame: Duration::from_micros(33_333),
            idle: Duration::from_micros(5_330),
        }
    }

    /// Idle share as a fraction of the frame
    pub fn idle_ratio(&self) -> f64 {
        if self.frame.is_zero() {
            0.0
        } else {
            self.idle.as_secs_f64() / self.frame.as_secs_f64()
        }
    }
}

/// Idle deadline info
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline {
    end: Instant,
}

impl IdleDeadline {
    /// Deadline `idle` from now
    pub fn new(idle: Duration) -> Self {
        Self { end: Instant::now() + idle }
    }

    pub fn did_timeout(&self) -> bool {
        self.time_remaining().is_zero()
    }
}

impl Deadline for IdleDeadline {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Frame statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub frame_count: u64,
    /// Frames in which the reconciler had work
    pub busy_frames: u64,
    /// Busy frames that ended with work still pending
    pub yielded_frames: u64,
    pub avg_work_ms: f64,
    pub max_work_ms: f64,
}

/// Frame-by-frame driver for a [`Reconciler`]
#[derive(Debug, Default)]
pub struct IdleScheduler {
    budget: FrameBudget,
    stats: FrameStats,
}

impl IdleScheduler {
    pub fn new(budget: FrameBudget) -> Self {
        Self {
            budget,
            stats: FrameStats::default(),
        }
    }

    pub fn set_budget(&mut self, budget: FrameBudget) {
        self.budget = budget;
    }

    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Deadline for the idle period of a frame starting now
    pub fn idle_deadline(&self) -> IdleDeadline {
        IdleDeadline::new(self.budget.idle)
    }

    /// Run one frame's idle callback
    pub fn run_frame<H: Host>(&mut self, reconciler: &mut Reconciler<H>) -> Result<WorkStatus, ReconcileError> {
        self.stats.frame_count += 1;
        if !reconciler.has_pending_work() {
            return Ok(WorkStatus::Idle);
        }

        let start = Instant::now();
        let status = reconciler.work_loop(&self.idle_deadline())?;
        let work_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.stats.busy_frames += 1;
        let n = self.stats.busy_frames as f64;
        self.stats.avg_work_ms += (work_ms - self.stats.avg_work_ms) / n;
        self.stats.max_work_ms = self.stats.max_work_ms.max(work_ms);
        if status == WorkStatus::Pending {
            self.stats.yielded_frames += 1;
        }

        tracing::trace!("frame {}: {:.3}ms of work, {:?}", self.stats.frame_count, work_ms, status);
        Ok(status)
    }

    /// Run frames until the reconciler has nothing left to do.
    ///
    /// Returns the number of frames used.
    pub fn run_until_idle<H: Host>(
        &mut self,
        reconciler: &mut Reconciler<H>,
        max_frames: usize,
    ) -> Result<usize, DriverError> {
        for frame in 1..=max_frames {
            if self.run_frame(reconciler)? == WorkStatus::Idle {
                return Ok(frame);
            }
        }
        if reconciler.has_pending_work() {
            tracing::warn!("reconciler still busy after {} frames", max_frames);
            return Err(DriverError::NotSettled { frames: max_frames });
        }
        Ok(max_frames)
    }
}
