//! Errors surfaced by the binding host.

use mooring_core::{BindingId, NodeId};
use thiserror::Error;

/// Errors that can occur while attaching bindings to render nodes.
///
/// Only operations whose inputs are ordinary caller data return these;
/// contract violations (operating on a detached binding) are absorbed per
/// the crate's error policy instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindError {
    /// The node id does not refer to a live node in the tree.
    #[error("render node {0:?} does not exist")]
    MissingNode(NodeId),
    /// The binding id does not refer to a live binding.
    #[error("binding {0:?} does not exist")]
    MissingBinding(BindingId),
    /// The node already carries a different binding.
    #[error("render node {0:?} is already bound")]
    NodeAlreadyBound(NodeId),
    /// The binding is already attached to a different node.
    #[error("binding {0:?} is attached to another node")]
    BindingInUse(BindingId),
}
