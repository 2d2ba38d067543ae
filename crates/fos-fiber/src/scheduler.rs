//! Work Scheduler
//!
//! Turns "render a tree" into a resumable sequence of units of work. The
//! cursor (`next_unit_of_work`) plus the fiber links form an explicit stack,
//! so a walk can stop at any unit boundary when the deadline runs out and
//! continue later in exactly the same depth-first order.
//!
//! Overlapping work: a [`Reconciler::render`] issued during a walk is queued
//! (latest wins) and started once that walk commits; state setters raise an
//! update request that starts one full pass from the current root whenever
//! the scheduler is idle. Walks are never cancelled.

use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::SlotMap;

use crate::commit::CommitReport;
use crate::config::ReconcilerConfig;
use crate::element::{Element, Props};
use crate::error::{ReconcileError, Result};
use crate::fiber::{Fiber, FiberId, FiberType};
use crate::hooks::{HookRecord, UpdateSignal};
use crate::host::Host;

/// Time budget of the current slice, as reported by the host scheduler
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Deadline that never expires
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deadline ending at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    end: Instant,
}

impl TimeSlice {
    /// Slice of `budget` starting now
    pub fn new(budget: Duration) -> Self {
        Self { end: Instant::now() + budget }
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Scheduler state after a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing left to do until the next render or state update
    Idle,
    /// The slice ran out with work remaining
    Pending,
}

/// Cumulative reconciler statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcilerStats {
    /// Render passes started (fresh renders and state updates)
    pub passes: u64,
    pub units_performed: u64,
    /// Slices that ended with work remaining
    pub yields: u64,
    pub commits: u64,
    pub placements: u64,
    pub updates: u64,
    pub deletions: u64,
    pub effects_run: u64,
    pub cleanups_run: u64,
    /// Host mutations that failed and were skipped
    pub host_errors: u64,
}

/// Incremental fiber reconciler bound to one host
pub struct Reconciler<H: Host> {
    pub(crate) host: H,
    pub(crate) config: ReconcilerConfig,
    pub(crate) fibers: SlotMap<FiberId, Fiber<H::Node>>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit_of_work: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pending_render: Option<(Element, H::Node)>,
    pub(crate) updates: UpdateSignal,
    pub(crate) stats: ReconcilerStats,
    pub(crate) last_commit: Option<CommitReport>,
}

impl<H: Host> Reconciler<H> {
    /// Create a reconciler driving `host`
    pub fn new(host: H, config: ReconcilerConfig) -> Self {
        Self {
            host,
            config,
            fibers: SlotMap::with_key(),
            current_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            pending_render: None,
            updates: UpdateSignal::default(),
            stats: ReconcilerStats::default(),
            last_commit: None,
        }
    }

    /// Mount (or re-mount) `element` into `container`.
    ///
    /// Only seeds the work; nothing touches the host until the walk is driven
    /// by [`work_loop`](Self::work_loop) or [`flush`](Self::flush).
    pub fn render(&mut self, element: Element, container: H::Node) {
        if self.wip_root.is_some() {
            tracing::debug!("render queued behind in-flight walk");
            self.pending_render = Some((element, container));
            return;
        }
        self.seed_render(element, container);
    }

    fn seed_render(&mut self, element: Element, container: H::Node) {
        let props = Rc::new(Props::new().with_children(vec![element]));
        let root = self.fibers.insert(Fiber::root(container, props, self.current_root));
        // A full pass from the root covers any queued state updates
        self.updates.take();
        self.start_pass(root);
        tracing::debug!("render pass seeded");
    }

    fn seed_update(&mut self, current: FiberId) {
        let fiber = &self.fibers[current];
        let (container, props) = match &fiber.dom {
            Some(dom) => (dom.clone(), Rc::clone(&fiber.props)),
            None => return,
        };
        let root = self.fibers.insert(Fiber::root(container, props, Some(current)));
        self.start_pass(root);
        tracing::debug!("state update pass seeded");
    }

    fn start_pass(&mut self, root: FiberId) {
        self.wip_root = Some(root);
        self.deletions.clear();
        self.next_unit_of_work = Some(root);
        self.stats.passes += 1;
    }

    /// Seed queued work if the scheduler is between walks
    fn start_pending_work(&mut self) {
        if self.wip_root.is_some() {
            return;
        }
        if let Some((element, container)) = self.pending_render.take() {
            self.seed_render(element, container);
        } else if let Some(current) = self.current_root {
            let requested = self.updates.take();
            if requested > 0 {
                tracing::trace!(requested, "state updates requested");
                self.seed_update(current);
            }
        }
    }

    /// Check if any render, walk, commit, or state update is outstanding
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some()
            || self.pending_render.is_some()
            || (self.current_root.is_some() && self.updates.is_requested())
    }

    /// Run one slice: perform units of work until the deadline drops below
    /// the yield threshold, committing if the walk completes.
    ///
    /// At least one unit is performed per slice so every slice makes progress.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus> {
        self.start_pending_work();

        let mut should_yield = false;
        while let Some(unit) = self.next_unit_of_work {
            if should_yield {
                break;
            }
            self.next_unit_of_work = match self.perform_unit_of_work(unit) {
                Ok(next) => next,
                Err(err) => {
                    self.discard_work_in_progress();
                    return Err(err);
                }
            };
            should_yield = deadline.time_remaining() < self.config.yield_threshold;
        }

        if self.next_unit_of_work.is_none() && self.wip_root.is_some() {
            if let Err(err) = self.commit_root() {
                self.discard_work_in_progress();
                return Err(err);
            }
        } else if self.next_unit_of_work.is_some() {
            self.stats.yields += 1;
            tracing::trace!("yielding with work remaining");
        }

        Ok(if self.has_pending_work() { WorkStatus::Pending } else { WorkStatus::Idle })
    }

    /// Drive all outstanding work to completion without yielding.
    ///
    /// Includes passes triggered by effects that set state; fails with
    /// [`ReconcileError::UpdateLoop`] if work keeps arriving past
    /// `max_flush_passes`.
    pub fn flush(&mut self) -> Result<()> {
        let mut passes = 0;
        while self.has_pending_work() {
            if passes >= self.config.max_flush_passes {
                return Err(ReconcileError::UpdateLoop { passes });
            }
            self.work_loop(&Unbounded)?;
            passes += 1;
        }
        Ok(())
    }

    /// Process one fiber and return the next one in depth-first order
    pub(crate) fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        self.stats.units_performed += 1;

        let component = match &self.fibers[id].ty {
            FiberType::Component(c) => Some(c.clone()),
            _ => None,
        };
        match component {
            Some(component) => self.update_function_component(id, &component),
            None => self.update_host_component(id)?,
        }

        Ok(self.next_in_walk(id, self.wip_root))
    }

    /// Pre-order successor of `id`: its child, else the nearest sibling of
    /// itself or an ancestor. Never climbs past `boundary`.
    pub(crate) fn next_in_walk(&self, id: FiberId, boundary: Option<FiberId>) -> Option<FiberId> {
        if let Some(child) = self.fibers[id].child {
            return Some(child);
        }
        let mut cursor = id;
        loop {
            if Some(cursor) == boundary {
                return None;
            }
            let fiber = &self.fibers[cursor];
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent?;
        }
    }

    /// All fibers of the subtree rooted at `root`, in pre-order
    pub(crate) fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut order = vec![root];
        let mut cursor = self.next_in_walk(root, Some(root));
        while let Some(id) = cursor {
            order.push(id);
            cursor = self.next_in_walk(id, Some(root));
        }
        order
    }

    /// Drop the pending tree after a fatal error; the current tree stays.
    /// State updates the pass had folded in stay queued for the next pass.
    pub(crate) fn discard_work_in_progress(&mut self) {
        if let Some(root) = self.wip_root.take() {
            let pending = self.subtree(root);
            let unsettled = pending
                .iter()
                .any(|&id| self.fibers[id].hooks.iter().any(HookRecord::is_unsettled));
            if unsettled {
                self.updates.request();
            }
            for id in pending {
                self.fibers.remove(id);
            }
        }
        self.next_unit_of_work = None;
        for id in self.deletions.drain(..) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.effect_tag = None;
            }
        }
        tracing::warn!("discarded work-in-progress tree");
    }

    // Introspection

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn stats(&self) -> &ReconcilerStats {
        &self.stats
    }

    /// Report of the most recent commit
    pub fn last_commit(&self) -> Option<&CommitReport> {
        self.last_commit.as_ref()
    }

    /// Root of the last committed tree
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built, if a walk is in flight
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Cursor of the in-flight walk
    pub fn next_unit_of_work(&self) -> Option<FiberId> {
        self.next_unit_of_work
    }

    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<H::Node>> {
        self.fibers.get(id)
    }

    /// Child fibers of `id`, following the sibling chain
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = self.fibers.get(id).and_then(|f| f.child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.fibers.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Number of fibers alive in the arena (current plus pending tree)
    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }
}
