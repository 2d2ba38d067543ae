//! Fiber Tree & Diff Engine
//!
//! Children are matched by position only. At each index the old fiber and the
//! new element are compared by type:
//! - same type: UPDATE fiber reusing the old host node
//! - new element without a same-type predecessor: PLACEMENT fiber
//! - old fiber without a same-type successor: old fiber tagged DELETION
//!
//! There is no keyed matching, so reordering same-type siblings shows up as
//! updates, and reordering mixed types as placement/deletion pairs.
//!
//! Placements are committed with [`Host::append_child`] only, so a node placed
//! before siblings that were merely updated lands after them in the host:
//! going from `[p, span]` to `[em, span]` leaves the host with `[span, em]`.

use std::rc::Rc;

use crate::element::{Component, Element};
use crate::error::{ReconcileError, Result};
use crate::fiber::{EffectTag, Fiber, FiberId, FiberType};
use crate::hooks::{HookRecord, Hooks};
use crate::host::{create_dom, Host};
use crate::scheduler::Reconciler;

impl<H: Host> Reconciler<H> {
    /// Run a function component and reconcile the single element it returns
    pub(crate) fn update_function_component(&mut self, id: FiberId, component: &Component) {
        let props = Rc::clone(&self.fibers[id].props);
        let previous: &[HookRecord] = self.fibers[id]
            .alternate
            .and_then(|alt| self.fibers.get(alt))
            .map(|alt| alt.hooks.as_slice())
            .unwrap_or_default();

        let mut hooks = Hooks::new(previous, &self.updates);
        let element = component.render(&props, &mut hooks);
        let output = hooks.finish();

        tracing::trace!(
            component = component.name(),
            hooks = output.records.len(),
            effects = output.effects.len(),
            "rendered component"
        );

        let fiber = &mut self.fibers[id];
        fiber.hooks = output.records;
        fiber.effects = output.effects;
        fiber.cleanups = output.cleanups;

        self.reconcile_children(id, std::slice::from_ref(&element));
    }

    /// Ensure the host node exists, then reconcile `props.children`
    pub(crate) fn update_host_component(&mut self, id: FiberId) -> Result<()> {
        let fiber = &self.fibers[id];
        if fiber.dom.is_none() {
            if let Some(ty) = fiber.ty.element_type() {
                let (node, patch) = create_dom(&mut self.host, &ty, &fiber.props).map_err(|source| {
                    ReconcileError::HostNodeCreation {
                        kind: format!("{:?}", fiber.ty),
                        source,
                    }
                })?;
                self.stats.host_errors += patch.failures as u64;
                tracing::trace!("created host node {:?}", node);
                self.fibers[id].dom = Some(node);
            }
        }

        let props = Rc::clone(&self.fibers[id].props);
        self.reconcile_children(id, props.children());
        Ok(())
    }

    /// Diff `elements` against the previous generation's children of `wip`
    pub(crate) fn reconcile_children(&mut self, wip: FiberId, elements: &[Element]) {
        let mut old = self.fibers[wip]
            .alternate
            .and_then(|alt| self.fibers.get(alt))
            .and_then(|alt| alt.child);
        let mut prev_sibling: Option<FiberId> = None;
        let mut index = 0;

        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let old_fiber = old.and_then(|id| self.fibers.get(id));
            let same_type = match (old_fiber, element) {
                (Some(fiber), Some(element)) => fiber.ty.matches(element.ty()),
                _ => false,
            };
            let next_old = old_fiber.and_then(|fiber| fiber.sibling);

            let new_fiber = match (old, element) {
                (Some(old_id), Some(element)) if same_type => Some(self.update_fiber(wip, old_id, element)),
                (_, Some(element)) => Some(self.place_fiber(wip, element)),
                (_, None) => None,
            };

            if let Some(old_id) = old {
                if !same_type {
                    self.fibers[old_id].effect_tag = Some(EffectTag::Deletion);
                    self.deletions.push(old_id);
                }
            }

            if let Some(new_id) = new_fiber {
                match prev_sibling {
                    None => self.fibers[wip].child = Some(new_id),
                    Some(prev) => self.fibers[prev].sibling = Some(new_id),
                }
                prev_sibling = Some(new_id);
            }

            old = next_old;
            index += 1;
        }
    }

    fn update_fiber(&mut self, parent: FiberId, old_id: FiberId, element: &Element) -> FiberId {
        let old = &self.fibers[old_id];
        let mut fiber = Fiber::new(old.ty.clone(), element.shared_props(), Some(parent));
        fiber.dom = old.dom.clone();
        fiber.alternate = Some(old_id);
        fiber.effect_tag = Some(EffectTag::Update);
        self.fibers.insert(fiber)
    }

    fn place_fiber(&mut self, parent: FiberId, element: &Element) -> FiberId {
        let mut fiber = Fiber::new(FiberType::from(element.ty()), element.shared_props(), Some(parent));
        fiber.effect_tag = Some(EffectTag::Placement);
        self.fibers.insert(fiber)
    }
}
