//! Arena storage for the virtual render tree.
//!
//! Nodes and their native bindings are kept in parallel arenas referenced
//! by index, so the node → binding and binding → node links never form an
//! ownership cycle. This crate owns the node side; the binding arena lives
//! in `mooring` and mirrors the [`BindingId`] stored here.

use std::collections::{BTreeMap, BTreeSet};

use crate::geometry::Rect;
use crate::style::Style;

/// Identifier for a node stored inside the [`RenderTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new [`NodeId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifier for a native binding stored in the parallel binding arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

impl BindingId {
    /// Creates a new [`BindingId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Kind of a render node, as declared by the external tree producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum NodeKind {
    /// The tree root hosting every other node.
    Body,
    /// A generic container or leaf surface.
    #[default]
    View,
    /// A text-bearing leaf.
    Label,
    /// A recycled list cell; an external collaborator fully owns its visuals.
    Cell,
    /// A virtual container with no measurable surface of its own.
    Shadow,
}

impl NodeKind {
    /// Returns `true` when generic style application must skip this kind.
    #[must_use]
    pub const fn is_style_exempt(self) -> bool {
        matches!(self, Self::Cell)
    }

    /// Returns `true` when the node cannot host native children directly and
    /// layout-parameter derivation should hop to its parent.
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        matches!(self, Self::Shadow)
    }
}

/// One element of the virtual tree: resolved style, absolute frame,
/// attributes, declared event names, and optional text.
#[derive(Debug, Clone, Default)]
pub struct RenderNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Resolved style snapshot.
    pub style: Style,
    /// Absolute frame assigned by the external layout engine.
    pub frame: Rect,
    /// Raw attribute map, as authored.
    pub attributes: BTreeMap<String, String>,
    /// Event names the node declared listeners for.
    pub events: BTreeSet<String>,
    /// Text content for text-bearing kinds.
    pub text: Option<String>,
    binding: Option<BindingId>,
}

impl RenderNode {
    /// Creates a node of the given kind with default state.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Returns the binding currently projecting this node, if any.
    #[must_use]
    pub const fn binding(&self) -> Option<BindingId> {
        self.binding
    }

    /// Sets or clears the binding back-pointer.
    ///
    /// Maintained by the binding layer; the forward and backward references
    /// are kept mutually consistent there.
    pub const fn set_binding(&mut self, binding: Option<BindingId>) {
        self.binding = binding;
    }
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node: RenderNode,
}

/// Arena storing the virtual render tree.
///
/// Slots freed by [`RenderTree::remove`] are reused by later insertions, so
/// a long-lived tree driven by an external diff process does not grow
/// without bound.
#[derive(Debug, Default)]
pub struct RenderTree {
    entries: Vec<Option<NodeEntry>>,
    free: Vec<usize>,
    root: Option<NodeId>,
}

impl RenderTree {
    /// Creates an empty render tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    /// Replaces the root node of the tree, clearing any existing nodes.
    pub fn replace_root(&mut self, node: RenderNode) -> NodeId {
        self.entries.clear();
        self.free.clear();

        let root = self.push_entry(NodeEntry {
            parent: None,
            children: Vec::new(),
            node,
        });
        self.root = Some(root);
        root
    }

    /// Adds a child under the provided parent, appended after its siblings.
    ///
    /// # Panics
    ///
    /// Panics if the parent node does not exist.
    pub fn insert_child(&mut self, parent: NodeId, node: RenderNode) -> NodeId {
        assert!(
            self.contains(parent),
            "parent must exist before inserting children"
        );

        let id = self.push_entry(NodeEntry {
            parent: Some(parent),
            children: Vec::new(),
            node,
        });
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.push(id);
        }
        id
    }

    /// Removes a node and its entire subtree, detaching it from its parent.
    ///
    /// Removing a dead id is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(entry) = self.entry_mut(parent) {
                entry.children.retain(|child| *child != id);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.remove_subtree(id);
    }

    /// Returns the root node identifier, if one exists.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns `true` when the id refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.entries.get(id.index()), Some(Some(_)))
    }

    /// Returns the node behind the id, if it is live.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.entry(id).map(|entry| &entry.node)
    }

    /// Returns the node behind the id mutably, if it is live.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.entry_mut(id).map(|entry| &mut entry.node)
    }

    /// Returns the parent of a node, if it has one.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|entry| entry.parent)
    }

    /// Returns the child identifiers for the provided node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id)
            .map_or(&[], |entry| entry.children.as_slice())
    }

    /// Walks to the root of the tree containing `id` in O(depth).
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        self.entry(current)?;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// Returns the path from the tree root down to `id`, both inclusive.
    ///
    /// Returns `None` when `id` is dead.
    #[must_use]
    pub fn path_from_root(&self, id: NodeId) -> Option<Vec<NodeId>> {
        self.entry(id)?;
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Returns the total number of live nodes stored in this tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Returns `true` when the tree holds no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn push_entry(&mut self, entry: NodeEntry) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.entries[index] = Some(entry);
            NodeId::new(index)
        } else {
            let id = NodeId::new(self.entries.len());
            self.entries.push(Some(entry));
            id
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let Some(entry) = self.entries.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        self.free.push(id.index());
        for child in entry.children {
            self.remove_subtree(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_chain() -> (RenderTree, NodeId, NodeId, NodeId) {
        let mut tree = RenderTree::new();
        let root = tree.replace_root(RenderNode::new(NodeKind::Body));
        let middle = tree.insert_child(root, RenderNode::new(NodeKind::View));
        let leaf = tree.insert_child(middle, RenderNode::new(NodeKind::Label));
        (tree, root, middle, leaf)
    }

    #[test]
    fn root_walk_is_depth_bound() {
        let (tree, root, _, leaf) = tree_with_chain();
        assert_eq!(tree.root_of(leaf), Some(root));
        assert_eq!(tree.root_of(root), Some(root));
    }

    #[test]
    fn path_from_root_is_ordered_and_inclusive() {
        let (tree, root, middle, leaf) = tree_with_chain();
        assert_eq!(tree.path_from_root(leaf), Some(vec![root, middle, leaf]));
        assert_eq!(tree.path_from_root(root), Some(vec![root]));
    }

    #[test]
    fn remove_detaches_subtree_and_reuses_slots() {
        let (mut tree, root, middle, leaf) = tree_with_chain();
        tree.remove(middle);
        assert!(!tree.contains(middle));
        assert!(!tree.contains(leaf));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.path_from_root(leaf), None);
        assert_eq!(tree.len(), 1);

        let replacement = tree.insert_child(root, RenderNode::new(NodeKind::View));
        assert!(replacement.index() == middle.index() || replacement.index() == leaf.index());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn removing_dead_id_is_noop() {
        let (mut tree, _, middle, _) = tree_with_chain();
        tree.remove(middle);
        tree.remove(middle);
        assert_eq!(tree.len(), 1);
    }
}
