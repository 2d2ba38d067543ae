//! fOS Fiber - Incremental virtual DOM reconciler
//!
//! Diffs a declarative [`Element`] tree against the last committed tree and
//! applies the minimal set of mutations to a [`Host`].
//!
//! The walk over the tree is split into units of work (one [`Fiber`] each)
//! linked by parent/child/sibling references, so the [`Reconciler`] can stop
//! whenever the host's [`Deadline`] runs out and resume later from the same
//! cursor. Once the walk completes the pending tree is committed atomically.
//!
//! ```ignore
//! let counter = Component::new(|_props, hooks| {
//!     let (count, set_count) = hooks.use_state(0i64);
//!     let on_click = EventHandler::new(move |_| set_count.set(|c| c + 1));
//!     create_element(
//!         "h1",
//!         Props::new().with("onClick", on_click),
//!         [Child::from(format!("Click me: {count}"))],
//!     )
//! });
//!
//! let mut reconciler = Reconciler::new(host, ReconcilerConfig::default());
//! reconciler.render(Element::component(counter, Props::new()), container);
//! reconciler.flush()?;
//! ```

mod commit;
mod config;
mod element;
mod error;
mod event;
mod fiber;
mod hooks;
mod host;
mod reconcile;
mod scheduler;

#[cfg(test)]
mod testing;

pub use commit::CommitReport;
pub use config::ReconcilerConfig;
pub use element::{
    create_element, create_text_element, Child, Component, Element, ElementType, PropValue,
    Props, CHILDREN, NODE_VALUE, TEXT_ELEMENT,
};
pub use error::{ReconcileError, Result};
pub use event::{Event, EventHandler};
pub use fiber::{EffectTag, Fiber, FiberId, FiberType};
pub use hooks::{Cleanup, Hooks, StateSetter};
pub use host::{
    create_dom, event_type_of, is_event_key, update_dom, Host, HostError, HostResult,
    PropPatch,
};
pub use scheduler::{Deadline, Reconciler, ReconcilerStats, TimeSlice, Unbounded, WorkStatus};
