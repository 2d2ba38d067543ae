//! Reconciler errors
//!
//! Only malformed-tree conditions and host node allocation failures are
//! fatal. Other host failures are logged and skipped during commit.

use crate::fiber::FiberId;
use crate::host::HostError;

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Fatal reconciler errors
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("fiber {fiber:?} has no ancestor owning a host node")]
    NoHostAncestor { fiber: FiberId },

    #[error("deleted fiber {fiber:?} owns no host node and has no child")]
    MissingHostNode { fiber: FiberId },

    #[error("failed to create host node for {kind}: {source}")]
    HostNodeCreation {
        kind: String,
        #[source]
        source: HostError,
    },

    #[error("work did not settle after {passes} render passes")]
    UpdateLoop { passes: usize },
}
