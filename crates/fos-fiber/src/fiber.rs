//! Fiber tree nodes
//!
//! Fibers live in a generational arena owned by the reconciler. `child` and
//! `sibling` are the owning links of the tree; `parent` and `alternate` are
//! back-references only and may outlive their target (a stale key simply
//! resolves to nothing).

use std::rc::Rc;

use crate::element::{Component, ElementType, Props};
use crate::hooks::{Cleanup, HookRecord, PendingEffect};

slotmap::new_key_type! {
    /// Fiber identifier (key into the reconciler's arena)
    pub struct FiberId;
}

/// Commit action recorded during diffing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Insert the host node under its nearest host ancestor
    Placement,
    /// Patch the existing host node's props
    Update,
    /// Remove the host node(s); the fiber is not part of the new tree
    Deletion,
}

/// What a fiber renders
#[derive(Debug, Clone, PartialEq)]
pub enum FiberType {
    /// Synthetic root wrapping the container
    Root,
    Host(Rc<str>),
    Text,
    Component(Component),
}

impl FiberType {
    /// Same-type check used by the diff
    pub fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (FiberType::Host(a), ElementType::Host(b)) => a == b,
            (FiberType::Text, ElementType::Text) => true,
            (FiberType::Component(a), ElementType::Component(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, FiberType::Component(_))
    }

    /// Element type for host node creation
    pub(crate) fn element_type(&self) -> Option<ElementType> {
        match self {
            FiberType::Root => None,
            FiberType::Host(tag) => Some(ElementType::Host(Rc::clone(tag))),
            FiberType::Text => Some(ElementType::Text),
            FiberType::Component(c) => Some(ElementType::Component(c.clone())),
        }
    }
}

impl From<&ElementType> for FiberType {
    fn from(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => FiberType::Host(Rc::clone(tag)),
            ElementType::Text => FiberType::Text,
            ElementType::Component(c) => FiberType::Component(c.clone()),
        }
    }
}

/// One node of the shadow tree for one render pass
pub struct Fiber<N> {
    pub(crate) ty: FiberType,
    pub(crate) props: Rc<Props>,
    /// Host node, created lazily for host and text fibers
    pub(crate) dom: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    /// Same position in the other tree generation
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: Option<EffectTag>,
    // Function components only
    pub(crate) hooks: Vec<HookRecord>,
    pub(crate) effects: Vec<PendingEffect>,
    pub(crate) cleanups: Vec<Cleanup>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(ty: FiberType, props: Rc<Props>, parent: Option<FiberId>) -> Self {
        Self {
            ty,
            props,
            dom: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: None,
            hooks: Vec::new(),
            effects: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    /// Root fiber wrapping an existing container node
    pub(crate) fn root(container: N, props: Rc<Props>, alternate: Option<FiberId>) -> Self {
        let mut fiber = Self::new(FiberType::Root, props, None);
        fiber.dom = Some(container);
        fiber.alternate = alternate;
        fiber
    }

    pub fn ty(&self) -> &FiberType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn dom(&self) -> Option<&N> {
        self.dom.as_ref()
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect_tag(&self) -> Option<EffectTag> {
        self.effect_tag
    }

    /// Number of hook records from the last render
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}
