//! Host Adapter
//!
//! The reconciler never touches a concrete DOM. It drives a [`Host`], which
//! owns the real nodes, and reconciles props onto them with [`update_dom`].

use crate::element::{ElementType, PropValue, Props};
use crate::event::EventHandler;

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Host operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host node not found")]
    NotFound,

    #[error("node is not a child of the given parent")]
    NotAChild,

    #[error("operation not supported on this node type")]
    InvalidNodeType,

    #[error("{0}")]
    Other(String),
}

/// DOM-like host consumed by the reconciler.
///
/// `Node` is an opaque handle; the container passed to
/// [`Reconciler::render`](crate::Reconciler::render) is one of them.
pub trait Host {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Create an element node by tag name
    fn create_element(&mut self, tag: &str) -> HostResult<Self::Node>;

    /// Create a text node
    fn create_text_node(&mut self, text: &str) -> HostResult<Self::Node>;

    /// Assign a property/attribute. Text nodes take `nodeValue`.
    fn set_property(&mut self, node: &Self::Node, name: &str, value: &PropValue) -> HostResult<()>;

    /// Reset a property/attribute to empty
    fn clear_property(&mut self, node: &Self::Node, name: &str) -> HostResult<()>;

    fn add_event_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        handler: &EventHandler,
    ) -> HostResult<()>;

    fn remove_event_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        handler: &EventHandler,
    ) -> HostResult<()>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> HostResult<()>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> HostResult<()>;
}

/// Check if a prop key names an event listener (`on` prefix)
#[inline]
pub fn is_event_key(key: &str) -> bool {
    key.starts_with("on")
}

/// Listener type for an event key: `onClick` -> `click`
pub fn event_type_of(key: &str) -> String {
    key.strip_prefix("on").unwrap_or(key).to_lowercase()
}

/// Counts of host writes made by one [`update_dom`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropPatch {
    pub listeners_removed: usize,
    pub props_cleared: usize,
    pub props_set: usize,
    pub listeners_added: usize,
    /// Host operations that failed and were skipped
    pub failures: usize,
}

impl PropPatch {
    /// Total successful host writes
    pub fn writes(&self) -> usize {
        self.listeners_removed + self.props_cleared + self.props_set + self.listeners_added
    }

    fn record(&mut self, result: HostResult<()>, what: &str, key: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("host failed to {} `{}`: {}", what, key, err);
                self.failures += 1;
                false
            }
        }
    }
}

impl std::ops::AddAssign for PropPatch {
    fn add_assign(&mut self, rhs: Self) {
        self.listeners_removed += rhs.listeners_removed;
        self.props_cleared += rhs.props_cleared;
        self.props_set += rhs.props_set;
        self.listeners_added += rhs.listeners_added;
        self.failures += rhs.failures;
    }
}

/// Reconcile `prev` props onto `next` for one host node.
///
/// Four passes, in order: drop stale listeners, clear removed properties,
/// assign new or changed properties, attach new or changed listeners.
/// Failed host calls are logged and skipped.
pub fn update_dom<H: Host>(host: &mut H, node: &H::Node, prev: &Props, next: &Props) -> PropPatch {
    let mut patch = PropPatch::default();
    let changed = |key: &str, value: &PropValue| next.get(key) != Some(value);

    for (key, value) in prev.iter().filter(|(k, _)| is_event_key(k)) {
        if !changed(key, value) {
            continue;
        }
        let Some(handler) = value.as_handler() else { continue };
        let result = host.remove_event_listener(node, &event_type_of(key), handler);
        if patch.record(result, "remove listener", key) {
            patch.listeners_removed += 1;
        }
    }

    for (key, _) in prev.iter().filter(|(k, _)| !is_event_key(k)) {
        if next.contains_key(key) {
            continue;
        }
        let result = host.clear_property(node, key);
        if patch.record(result, "clear", key) {
            patch.props_cleared += 1;
        }
    }

    for (key, value) in next.iter().filter(|(k, _)| !is_event_key(k)) {
        if prev.get(key) == Some(value) {
            continue;
        }
        let result = host.set_property(node, key, value);
        if patch.record(result, "set", key) {
            patch.props_set += 1;
        }
    }

    for (key, value) in next.iter().filter(|(k, _)| is_event_key(k)) {
        if prev.get(key) == Some(value) {
            continue;
        }
        let Some(handler) = value.as_handler() else {
            tracing::debug!("event prop `{}` does not hold a handler", key);
            continue;
        };
        let result = host.add_event_listener(node, &event_type_of(key), handler);
        if patch.record(result, "add listener", key) {
            patch.listeners_added += 1;
        }
    }

    patch
}

/// Allocate the host node for an element type and apply its initial props
pub fn create_dom<H: Host>(host: &mut H, ty: &ElementType, props: &Props) -> HostResult<(H::Node, PropPatch)> {
    let node = match ty {
        ElementType::Text => host.create_text_node("")?,
        ElementType::Host(tag) => host.create_element(tag)?,
        ElementType::Component(_) => return Err(HostError::InvalidNodeType),
    };
    let patch = update_dom(host, &node, &Props::new(), props);
    Ok((node, patch))
}
