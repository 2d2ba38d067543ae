//! fOS Fiber DOM - In-memory host for the fiber reconciler
//!
//! [`MemoryDom`] is a small arena-backed document implementing
//! [`fos_fiber::Host`]: element and text nodes, string attributes, event
//! listeners with bubbling dispatch, and a bounded log of the mutations the
//! reconciler performs. [`IdleScheduler`] drives a [`fos_fiber::Reconciler`]
//! frame by frame, giving it each frame's idle time as its deadline.

mod dom;
mod idle;
mod mutation;

pub use dom::{DomNode, MemoryDom, NodeData, NodeId, DEFAULT_MUTATION_LIMIT};
pub use idle::{DriverError, FrameBudget, FrameStats, IdleDeadline, IdleScheduler};
pub use mutation::Mutation;
