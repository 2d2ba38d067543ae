//! Commit phase
//!
//! Applies a completed work-in-progress tree to the host in one go:
//! 1. remove the host nodes of every DELETION fiber
//! 2. walk the new tree top-down (children before siblings), appending
//!    PLACEMENT nodes and patching UPDATE nodes; the state updates the pass
//!    folded in are then dropped from their queues
//! 3. run cleanups (unmounted components first, then changed effects)
//! 4. run effects, storing any cleanup they return on their hook record
//! 5. promote the tree to current and free the previous generation

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{ReconcileError, Result};
use crate::fiber::{EffectTag, FiberId};
use crate::hooks::{Cleanup, HookRecord};
use crate::host::{update_dom, Host, HostResult, PropPatch};
use crate::scheduler::Reconciler;

/// Summary of one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Prop writes made while patching UPDATE fibers
    pub props: PropPatch,
    pub cleanups_run: usize,
    pub effects_run: usize,
}

impl CommitReport {
    /// Check if the commit changed tree shape (anything placed or deleted)
    pub fn changed_shape(&self) -> bool {
        self.placements > 0 || self.deletions > 0
    }
}

impl<H: Host> Reconciler<H> {
    pub(crate) fn commit_root(&mut self) -> Result<()> {
        let Some(root) = self.wip_root else {
            return Ok(());
        };
        let mut report = CommitReport::default();

        for index in 0..self.deletions.len() {
            let id = self.deletions[index];
            let parent = self.host_parent(id)?;
            self.commit_deletion(id, &parent)?;
            report.deletions += 1;
        }

        let order = self.subtree(root);
        for &id in order.iter().skip(1) {
            self.commit_work(id, &mut report)?;
        }
        for &id in &order {
            self.fibers[id].hooks.iter().for_each(HookRecord::settle);
        }

        let mut cleanups: Vec<Cleanup> = Vec::new();
        for index in 0..self.deletions.len() {
            for id in self.subtree(self.deletions[index]) {
                cleanups.extend(self.fibers[id].hooks.iter().filter_map(|hook| hook.take_cleanup()));
            }
        }
        let mut effects = Vec::new();
        for &id in &order {
            let fiber = &mut self.fibers[id];
            cleanups.append(&mut fiber.cleanups);
            effects.append(&mut fiber.effects);
        }

        report.cleanups_run = cleanups.len();
        for cleanup in cleanups {
            cleanup();
        }
        report.effects_run = effects.len();
        for effect in effects {
            effect.run();
        }

        self.current_root = Some(root);
        self.wip_root = None;
        self.deletions.clear();
        self.collect_garbage(&order);

        self.stats.commits += 1;
        self.stats.placements += report.placements as u64;
        self.stats.updates += report.updates as u64;
        self.stats.deletions += report.deletions as u64;
        self.stats.cleanups_run += report.cleanups_run as u64;
        self.stats.effects_run += report.effects_run as u64;

        tracing::debug!(
            "Commit: {} placed, {} updated, {} deleted, {} effects",
            report.placements,
            report.updates,
            report.deletions,
            report.effects_run
        );
        self.last_commit = Some(report);
        Ok(())
    }

    fn commit_work(&mut self, id: FiberId, report: &mut CommitReport) -> Result<()> {
        let fiber = &self.fibers[id];
        let Some(tag) = fiber.effect_tag else {
            return Ok(());
        };

        match tag {
            EffectTag::Placement => {
                report.placements += 1;
                if let Some(node) = fiber.dom.clone() {
                    let parent = self.host_parent(id)?;
                    let result = self.host.append_child(&parent, &node);
                    self.record_host(result, "append child");
                }
            }
            EffectTag::Update => {
                report.updates += 1;
                if let Some(node) = fiber.dom.clone() {
                    let prev = fiber
                        .alternate
                        .and_then(|alt| self.fibers.get(alt))
                        .map(|alt| Rc::clone(&alt.props))
                        .unwrap_or_default();
                    let next = Rc::clone(&fiber.props);
                    let patch = update_dom(&mut self.host, &node, &prev, &next);
                    self.stats.host_errors += patch.failures as u64;
                    report.props += patch;
                }
            }
            EffectTag::Deletion => {
                let parent = self.host_parent(id)?;
                self.commit_deletion(id, &parent)?;
                report.deletions += 1;
            }
        }
        Ok(())
    }

    /// Remove the host node(s) of `id`. Fibers without a node (components)
    /// are transparent: descend to the first child that has one.
    fn commit_deletion(&mut self, id: FiberId, parent: &H::Node) -> Result<()> {
        let mut cursor = id;
        loop {
            let fiber = &self.fibers[cursor];
            if let Some(node) = fiber.dom.clone() {
                let result = self.host.remove_child(parent, &node);
                self.record_host(result, "remove child");
                return Ok(());
            }
            cursor = fiber.child.ok_or(ReconcileError::MissingHostNode { fiber: cursor })?;
        }
    }

    /// Host node of the nearest ancestor that owns one
    fn host_parent(&self, id: FiberId) -> Result<H::Node> {
        let mut cursor = self.fibers[id].parent;
        while let Some(ancestor) = cursor {
            let fiber = &self.fibers[ancestor];
            if let Some(node) = &fiber.dom {
                return Ok(node.clone());
            }
            cursor = fiber.parent;
        }
        Err(ReconcileError::NoHostAncestor { fiber: id })
    }

    fn record_host(&mut self, result: HostResult<()>, what: &str) {
        if let Err(err) = result {
            tracing::warn!("host failed to {}: {}", what, err);
            self.stats.host_errors += 1;
        }
    }

    /// Keep only the fibers of the committed tree
    fn collect_garbage(&mut self, live: &[FiberId]) {
        let before = self.fibers.len();
        let keep: HashSet<FiberId> = live.iter().copied().collect();
        self.fibers.retain(|id, _| keep.contains(&id));
        for &id in live {
            let fiber = &mut self.fibers[id];
            fiber.alternate = None;
            fiber.effect_tag = None;
        }
        tracing::trace!("freed {} fibers", before - self.fibers.len());
    }
}
