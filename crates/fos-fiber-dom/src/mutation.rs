//! Mutation records
//!
//! Every write the reconciler makes through the host is appended to the
//! document's mutation log, so callers can assert exactly what a commit did.

use std::fmt;

use crate::dom::NodeId;

/// One host write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId },
    SetProperty { node: NodeId, name: String, value: String },
    ClearProperty { node: NodeId, name: String },
    AddListener { node: NodeId, event_type: String },
    RemoveListener { node: NodeId, event_type: String },
    Append { parent: NodeId, child: NodeId },
    Remove { parent: NodeId, child: NodeId },
}

impl Mutation {
    /// Node the mutation targets (the child for tree edits)
    pub fn node(&self) -> NodeId {
        match self {
            Mutation::CreateElement { node, .. }
            | Mutation::CreateText { node }
            | Mutation::SetProperty { node, .. }
            | Mutation::ClearProperty { node, .. }
            | Mutation::AddListener { node, .. }
            | Mutation::RemoveListener { node, .. } => *node,
            Mutation::Append { child, .. } | Mutation::Remove { child, .. } => *child,
        }
    }

    /// Check if this mutation changes tree shape
    pub fn is_structural(&self) -> bool {
        matches!(self, Mutation::Append { .. } | Mutation::Remove { .. })
    }

    /// Check if this mutation writes a property or listener of an existing node
    pub fn is_property_write(&self) -> bool {
        matches!(
            self,
            Mutation::SetProperty { .. }
                | Mutation::ClearProperty { .. }
                | Mutation::AddListener { .. }
                | Mutation::RemoveListener { .. }
        )
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::CreateElement { node, tag } => write!(f, "create <{}> {}", tag, node),
            Mutation::CreateText { node } => write!(f, "create #text {}", node),
            Mutation::SetProperty { node, name, value } => write!(f, "set {}.{} = {:?}", node, name, value),
            Mutation::ClearProperty { node, name } => write!(f, "clear {}.{}", node, name),
            Mutation::AddListener { node, event_type } => write!(f, "listen {} on{}", node, event_type),
            Mutation::RemoveListener { node, event_type } => write!(f, "unlisten {} on{}", node, event_type),
            Mutation::Append { parent, child } => write!(f, "append {} -> {}", child, parent),
            Mutation::Remove { parent, child } => write!(f, "remove {} from {}", child, parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let append = Mutation::Append { parent: NodeId(0), child: NodeId(3) };
        assert!(append.is_structural());
        assert!(!append.is_property_write());
        assert_eq!(append.node(), NodeId(3));

        let set = Mutation::SetProperty {
            node: NodeId(2),
            name: "id".into(),
            value: "main".into(),
        };
        assert!(set.is_property_write());
        assert_eq!(set.to_string(), "set #2.id = \"main\"");
    }
}
