//! In-memory DOM (arena-based)
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]; nodes are never
//! freed, a removed subtree is only detached. Element attributes are kept as
//! strings, text nodes carry their content as `nodeValue`.

use std::collections::BTreeMap;
use std::fmt;

use fos_fiber::{Event, EventHandler, Host, HostError, HostResult, PropValue, NODE_VALUE};

use crate::mutation::Mutation;

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

/// DOM node
#[derive(Debug)]
pub struct DomNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
    listeners: Vec<(String, EventHandler)>,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
            listeners: Vec::new(),
        }
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Tag name if this is an element
    pub fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    /// Content if this is a text node
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(content) => Some(content),
            NodeData::Element { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    /// Number of listeners registered for `event_type`
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.iter().filter(|(t, _)| t == event_type).count()
    }
}

/// Mutations kept before the oldest half of the log is dropped
pub const DEFAULT_MUTATION_LIMIT: usize = 4096;

/// Arena-backed document implementing [`Host`]
#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<DomNode>,
    mutations: Vec<Mutation>,
    mutation_limit: usize,
    dropped_mutations: u64,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            mutations: Vec::new(),
            mutation_limit: DEFAULT_MUTATION_LIMIT,
            dropped_mutations: 0,
        }
    }
}

impl MemoryDom {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the mutation log. A limit of 0 turns recording off.
    pub fn set_mutation_limit(&mut self, limit: usize) {
        self.mutation_limit = limit;
        self.trim_mutations();
    }

    /// Mutations discarded to stay within the limit
    pub fn dropped_mutations(&self) -> u64 {
        self.dropped_mutations
    }

    /// Create a detached element to render into. Not recorded as a mutation.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        })
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DomNode::new(data));
        id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.index())
    }

    fn node(&self, id: NodeId) -> HostResult<&DomNode> {
        self.nodes.get(id.index()).ok_or(HostError::NotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> HostResult<&mut DomNode> {
        self.nodes.get_mut(id.index()).ok_or(HostError::NotFound)
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node was allocated yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(DomNode::children).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(DomNode::parent)
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|node| node.attribute(name))
    }

    /// Concatenated text of every text node under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(content) => out.push_str(content),
            NodeData::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// First element with `tag` under `root` (inclusive), in document order
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            if node.tag() == Some(tag) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Serialize the subtree at `id` as HTML-like markup
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(content) => out.push_str(&escape(content, false)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    /// Deliver `event` to `target`, then bubble it through every ancestor.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch_event(&self, target: NodeId, event: &Event) -> usize {
        let mut invoked = 0;
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            let Some(node) = self.get(id) else { break };
            for (event_type, handler) in &node.listeners {
                if event_type == event.event_type() {
                    handler.call(event);
                    invoked += 1;
                }
            }
            cursor = node.parent;
        }
        tracing::trace!("dispatched {} to {} listeners", event.event_type(), invoked);
        invoked
    }

    /// Recorded host writes since the last call
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    fn record(&mut self, mutation: Mutation) {
        tracing::trace!("{}", mutation);
        if self.mutation_limit == 0 {
            self.dropped_mutations += 1;
            return;
        }
        if self.mutations.len() >= self.mutation_limit {
            // Drop the oldest half so trimming stays amortized
            let keep = self.mutation_limit / 2;
            self.drop_oldest(self.mutations.len() - keep);
        }
        self.mutations.push(mutation);
    }

    fn trim_mutations(&mut self) {
        if self.mutations.len() > self.mutation_limit {
            self.drop_oldest(self.mutations.len() - self.mutation_limit);
        }
    }

    fn drop_oldest(&mut self, count: usize) {
        self.mutations.drain(..count);
        self.dropped_mutations += count as u64;
    }

    /// Check if `node` is `ancestor` or lies below it
    fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Host for MemoryDom {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> HostResult<NodeId> {
        let node = self.create_container(tag);
        self.record(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self, text: &str) -> HostResult<NodeId> {
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.record(Mutation::CreateText { node });
        Ok(node)
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: &PropValue) -> HostResult<()> {
        let value = value
            .to_attribute()
            .ok_or_else(|| HostError::Other(format!("{} is not an attribute value", name)))?;
        match &mut self.node_mut(*node)?.data {
            NodeData::Element { attrs, .. } => {
                attrs.insert(name.to_string(), value.clone());
            }
            NodeData::Text(content) if name == NODE_VALUE => content.clone_from(&value),
            NodeData::Text(_) => return Err(HostError::InvalidNodeType),
        }
        self.record(Mutation::SetProperty {
            node: *node,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn clear_property(&mut self, node: &NodeId, name: &str) -> HostResult<()> {
        match &mut self.node_mut(*node)?.data {
            NodeData::Element { attrs, .. } => {
                attrs.remove(name);
            }
            NodeData::Text(content) if name == NODE_VALUE => content.clear(),
            NodeData::Text(_) => return Err(HostError::InvalidNodeType),
        }
        self.record(Mutation::ClearProperty {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_event_listener(&mut self, node: &NodeId, event_type: &str, handler: &EventHandler) -> HostResult<()> {
        self.node_mut(*node)?
            .listeners
            .push((event_type.to_string(), handler.clone()));
        self.record(Mutation::AddListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    fn remove_event_listener(&mut self, node: &NodeId, event_type: &str, handler: &EventHandler) -> HostResult<()> {
        let listeners = &mut self.node_mut(*node)?.listeners;
        let before = listeners.len();
        listeners.retain(|(t, h)| !(t == event_type && h.ptr_eq(handler)));
        if listeners.len() == before {
            return Err(HostError::NotFound);
        }
        self.record(Mutation::RemoveListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> HostResult<()> {
        if self.node(*parent)?.text().is_some() {
            return Err(HostError::InvalidNodeType);
        }
        if self.is_inclusive_descendant(*parent, *child) {
            return Err(HostError::Other(format!("appending {} under {} would create a cycle", child, parent)));
        }
        // Appending an attached node moves it
        if let Some(old_parent) = self.node(*child)?.parent {
            self.node_mut(old_parent)?.children.retain(|c| c != child);
        }
        self.node_mut(*child)?.parent = Some(*parent);
        self.node_mut(*parent)?.children.push(*child);
        self.record(Mutation::Append {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> HostResult<()> {
        let children = &mut self.node_mut(*parent)?.children;
        let pos = children.iter().position(|c| c == child).ok_or(HostError::NotAChild)?;
        children.remove(pos);
        self.node_mut(*child)?.parent = None;
        self.record(Mutation::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}
