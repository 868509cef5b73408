//! Arena orchestration for one bound tree.
//!
//! [`BindingHost`] owns the virtual [`RenderTree`] and the parallel arena of
//! [`ViewBinding`]s, keeps the node ↔ binding references mutually
//! consistent, and scopes the tree's [`ActionCoordinator`] to the root
//! binding's lifetime. Every method here runs on the UI context; the only
//! cross-thread surface is the coordinator handle returned by
//! [`BindingHost::root_coordinator`].

use std::fmt::Debug;
use std::sync::Arc;

use mooring_core::{BindingId, EventPayload, NodeId, Rect, RenderTree, Size, Style};
use tracing::{debug, trace, warn};

use crate::actions::{Action, ActionCoordinator};
use crate::anim::AnimProperties;
use crate::binding::ViewBinding;
use crate::dispatch::EventDispatcher;
use crate::error::BindError;
use crate::widget::{LayoutParams, NativeWidget};

/// Data exchanged between bindings and the tree's owning object.
///
/// The set of recognized operations is closed here and dispatched by
/// pattern match; downstream crates matching on this enum must carry a
/// wildcard arm, which is exactly the ignored-unknown-key default.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DataUpdate {
    /// Animation property payload forwarded to the binding's driver list.
    AnimateProps(AnimProperties),
    /// Replacement text for text-bearing nodes.
    Text(String),
}

impl DataUpdate {
    /// Returns the data field's identifier, used as the coalescing key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::AnimateProps(_) => "animate-props",
            Self::Text(_) => "text",
        }
    }
}

/// Application-facing sink for events and data pushes drained from the
/// action queue.
///
/// Implementations run on the UI context during flush and must not block.
pub trait TreeDelegate: Debug {
    /// Called once per flushed event delivery.
    fn handle_event(&mut self, target: NodeId, name: &str, payload: &EventPayload) {
        let _ = (target, name, payload);
    }

    /// Called once per flushed data push.
    fn handle_data(&mut self, target: NodeId, update: &DataUpdate) {
        let _ = (target, update);
    }
}

impl TreeDelegate for () {}

/// Context handed to every flushing do-function.
///
/// Gives actions read access to the tree (for the defensive
/// still-attached check) and delivery access to the delegate.
#[derive(Debug)]
pub struct FlushCtx<'a> {
    tree: &'a RenderTree,
    delegate: &'a mut dyn TreeDelegate,
}

impl<'a> FlushCtx<'a> {
    /// Creates a flush context over the tree and its delegate.
    pub fn new(tree: &'a RenderTree, delegate: &'a mut dyn TreeDelegate) -> Self {
        Self { tree, delegate }
    }

    /// Returns the tree being flushed.
    #[must_use]
    pub const fn tree(&self) -> &'a RenderTree {
        self.tree
    }

    /// Returns `true` when the node is alive and still carries a binding.
    ///
    /// Unbinding invalidates queued actions without evicting them, so every
    /// do-function checks this before touching its target.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.tree.node(node).is_some_and(|n| n.binding().is_some())
    }

    /// Delivers a named event to the application layer.
    pub fn deliver_event(&mut self, target: NodeId, name: &str, payload: &EventPayload) {
        self.delegate.handle_event(target, name, payload);
    }

    /// Delivers a data push to the application layer.
    pub fn deliver_data(&mut self, target: NodeId, update: &DataUpdate) {
        self.delegate.handle_data(target, update);
    }
}

/// Owner of one bound tree: nodes, bindings, and the root-scoped
/// action coordinator.
#[derive(Debug)]
pub struct BindingHost {
    tree: RenderTree,
    bindings: Vec<Option<ViewBinding>>,
    free: Vec<usize>,
    coordinator: Option<Arc<ActionCoordinator>>,
    delegate: Box<dyn TreeDelegate>,
}

impl BindingHost {
    /// Creates a host with an empty tree.
    #[must_use]
    pub fn new(delegate: impl TreeDelegate + 'static) -> Self {
        Self {
            tree: RenderTree::new(),
            bindings: Vec::new(),
            free: Vec::new(),
            coordinator: None,
            delegate: Box::new(delegate),
        }
    }

    /// Returns the virtual tree.
    #[must_use]
    pub const fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// Returns the virtual tree mutably, for the external diff process.
    pub const fn tree_mut(&mut self) -> &mut RenderTree {
        &mut self.tree
    }

    /// Returns a binding by id.
    #[must_use]
    pub fn binding(&self, id: BindingId) -> Option<&ViewBinding> {
        self.bindings.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns a binding by id, mutably.
    pub fn binding_mut(&mut self, id: BindingId) -> Option<&mut ViewBinding> {
        self.bindings.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Returns the binding currently projecting `node`, if any.
    #[must_use]
    pub fn binding_of(&self, node: NodeId) -> Option<&ViewBinding> {
        self.tree
            .node(node)
            .and_then(|render| render.binding())
            .and_then(|id| self.binding(id))
    }

    /// Creates an unattached binding owning `widget` and stores it in the
    /// binding arena.
    pub fn create_binding(&mut self, widget: Box<dyn NativeWidget>) -> BindingId {
        let binding = ViewBinding::new(widget);
        if let Some(index) = self.free.pop() {
            self.bindings[index] = Some(binding);
            BindingId::new(index)
        } else {
            let id = BindingId::new(self.bindings.len());
            self.bindings.push(Some(binding));
            id
        }
    }

    /// Attaches a binding to a node and projects the node's current state:
    /// style, size, position, attributes, event listeners, layout
    /// parameters (own, then parent-derived), and text, in that order.
    ///
    /// Calling bind again for an already-bound pair re-applies the same
    /// state without duplicating listeners. Binding the tree root also
    /// creates the per-tree action coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when either id is dead, or when node and
    /// binding are already attached elsewhere.
    pub fn bind(&mut self, id: BindingId, node: NodeId) -> Result<(), BindError> {
        let render = self.tree.node(node).ok_or(BindError::MissingNode(node))?;
        let node_binding = render.binding();
        {
            let binding = self.binding(id).ok_or(BindError::MissingBinding(id))?;
            match (binding.node(), node_binding) {
                (Some(current), _) if current != node => {
                    return Err(BindError::BindingInUse(id));
                }
                (_, Some(current)) if current != id => {
                    return Err(BindError::NodeAlreadyBound(node));
                }
                _ => {}
            }
        }

        let kind = render.kind;
        let style = render.style.clone();
        let frame = render.frame;
        let attributes: Vec<(String, String)> = render
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let events: Vec<String> = render.events.iter().cloned().collect();
        let text = render.text.clone();

        if let Some(render) = self.tree.node_mut(node) {
            render.set_binding(Some(id));
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.attach(node);
            binding.update_style(kind, Some(&style));
            binding.set_size(frame.size);
            binding.set_position(frame);
            for (key, value) in &attributes {
                binding.set_attribute(key, value);
            }
            for name in &events {
                binding.add_event_listener(name);
            }
            binding
                .widget_mut()
                .set_layout_params(LayoutParams::from_size(frame.size));
        }
        self.derive_layout_params(id);
        if let Some(text) = text {
            if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
                binding.set_text(&text);
            }
        }

        if self.tree.root() == Some(node) && self.coordinator.is_none() {
            self.coordinator = Some(Arc::new(ActionCoordinator::new()));
            debug!(node = node.index(), "created root action coordinator");
        }
        debug!(node = node.index(), binding = id.index(), "bound node");
        Ok(())
    }

    /// Detaches a binding, reversing everything bind applied: neutral
    /// style, no listeners, stopped animations, cleared references, and
    /// the widget released with the binding slot.
    ///
    /// Unbinding the root binding also drops the action coordinator,
    /// discarding any pending actions.
    pub fn unbind(&mut self, id: BindingId) {
        let node = {
            let Some(Some(binding)) = self.bindings.get_mut(id.index()) else {
                debug_assert!(false, "unbind called with a dead binding id");
                warn!(binding = id.index(), "ignoring unbind of a dead binding");
                return;
            };
            binding.reset();
            let node = binding.node();
            binding.detach();
            node
        };
        self.bindings[id.index()] = None;
        self.free.push(id.index());

        if let Some(node) = node {
            if let Some(render) = self.tree.node_mut(node) {
                render.set_binding(None);
            }
            if self.tree.root() == Some(node) {
                self.coordinator = None;
                debug!(node = node.index(), "dropped root action coordinator");
            }
        }
        debug!(binding = id.index(), "unbound node");
    }

    /// Stores and applies a new style snapshot for `node`.
    ///
    /// `None` is a no-op, as is any style on a kind exempt from generic
    /// styling.
    pub fn update_style(&mut self, node: NodeId, style: Option<Style>) {
        let Some(id) = self.attached_binding(node, "update_style") else {
            return;
        };
        let Some(style) = style else { return };
        let Some(render) = self.tree.node_mut(node) else {
            return;
        };
        render.style = style.clone();
        let kind = render.kind;
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.update_style(kind, Some(&style));
        }
    }

    /// Stores a new size for `node` and forwards it to the binding.
    pub fn set_size(&mut self, node: NodeId, size: Size) {
        let Some(id) = self.attached_binding(node, "set_size") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.frame.size = size;
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.set_size(size);
        }
    }

    /// Stores a new absolute frame for `node` and applies it to the
    /// binding's decoration and layout parameters.
    pub fn set_position(&mut self, node: NodeId, frame: Rect) {
        let Some(id) = self.attached_binding(node, "set_position") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.frame = frame;
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.set_position(frame);
        }
    }

    /// Stores an attribute on the node and lets the binding recognize it.
    pub fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) {
        let Some(id) = self.attached_binding(node, "set_attribute") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.attributes.insert(key.to_owned(), value.to_owned());
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.set_attribute(key, value);
        }
    }

    /// Declares a listener for the named event on `node`.
    pub fn add_event_listener(&mut self, node: NodeId, name: &str) {
        let Some(id) = self.attached_binding(node, "add_event_listener") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.events.insert(name.to_owned());
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.add_event_listener(name);
        }
    }

    /// Removes the listener for the named event on `node`.
    pub fn remove_event_listener(&mut self, node: NodeId, name: &str) {
        let Some(id) = self.attached_binding(node, "remove_event_listener") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.events.remove(name);
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.remove_event_listener(name);
        }
    }

    /// Stores new text content for `node` and forwards it to the widget.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        let Some(id) = self.attached_binding(node, "set_text") else {
            return;
        };
        if let Some(render) = self.tree.node_mut(node) {
            render.text = Some(text.to_owned());
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.set_text(text);
        }
    }

    /// Applies an inbound data operation to `node`, dispatching on the
    /// closed set of recognized kinds.
    pub fn set_data(&mut self, node: NodeId, update: DataUpdate) {
        match update {
            DataUpdate::AnimateProps(props) => {
                let Some(id) = self.attached_binding(node, "set_data") else {
                    return;
                };
                if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
                    binding.start_anim(props);
                }
            }
            DataUpdate::Text(text) => self.set_text(node, &text),
        }
    }

    /// Cooperatively stops every animation running on `node`.
    pub fn stop_anim(&mut self, node: NodeId) {
        let Some(id) = self.attached_binding(node, "stop_anim") else {
            return;
        };
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.stop_anim();
        }
    }

    /// Re-derives parent layout parameters, then measures the widget at
    /// exactly its node's frame size — zero when detached.
    pub fn measure(&mut self, id: BindingId) {
        self.derive_layout_params(id);
        let frame = self.frame_of(id);
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.measure(frame);
        }
    }

    /// Places the widget at its node's frame — a zero rectangle when
    /// detached.
    pub fn layout(&mut self, id: BindingId) {
        let frame = self.frame_of(id);
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.place(frame);
        }
    }

    /// Queues a named event for delivery to the application layer.
    ///
    /// Safe to call with a detached or dead node — the event is silently
    /// dropped, as it is when the tree has no bound root.
    pub fn post_event(&self, node: NodeId, name: &str, payload: EventPayload) {
        let Some(coordinator) = self.root_coordinator(node) else {
            trace!(node = node.index(), name, "dropping event for an unrooted node");
            return;
        };
        coordinator.collect(Action::post_event(node, name, payload));
    }

    /// Queues a data push for delivery to the application layer, keyed by
    /// the data field's identifier.
    pub fn update_data(&self, node: NodeId, update: DataUpdate) {
        let Some(coordinator) = self.root_coordinator(node) else {
            trace!(node = node.index(), "dropping data push for an unrooted node");
            return;
        };
        coordinator.collect(Action::update_data(node, update));
    }

    /// Returns the tree's coordinator, reached by walking from `node` to
    /// the root. `None` when the node is detached, the root is unbound, or
    /// no coordinator exists yet.
    ///
    /// The returned handle is the crate's only any-thread surface: clone it
    /// onto the production context and feed it through
    /// [`ActionCoordinator::collect`].
    #[must_use]
    pub fn root_coordinator(&self, node: NodeId) -> Option<Arc<ActionCoordinator>> {
        let render = self.tree.node(node)?;
        render.binding()?;
        let root = self.tree.root_of(node)?;
        self.tree.node(root)?.binding()?;
        self.coordinator.clone()
    }

    /// Drains the action queue on the UI context. No-op without a bound
    /// root.
    pub fn flush_actions(&mut self) {
        let Some(coordinator) = self.coordinator.clone() else {
            return;
        };
        let Self { tree, delegate, .. } = self;
        let mut ctx = FlushCtx::new(tree, delegate.as_mut());
        coordinator.flush(&mut ctx);
    }

    /// Returns a dispatcher routing input over this host's tree.
    #[must_use]
    pub const fn dispatcher(&self) -> EventDispatcher<'_> {
        EventDispatcher::new(self)
    }

    fn frame_of(&self, id: BindingId) -> Option<Rect> {
        self.binding(id)
            .and_then(ViewBinding::node)
            .and_then(|node| self.tree.node(node))
            .map(|render| render.frame)
    }

    /// Re-derives this binding's layout parameters from the nearest
    /// non-virtual bound ancestor capable of generating child parameters.
    fn derive_layout_params(&mut self, id: BindingId) {
        let Some(binding) = self.binding(id) else {
            return;
        };
        let Some(node) = binding.node() else {
            return;
        };
        let current = binding.widget().layout_params();
        let Some(params) = self.parent_generated_params(node, current) else {
            return;
        };
        if current == Some(params) {
            return;
        }
        if let Some(Some(binding)) = self.bindings.get_mut(id.index()) {
            binding.widget_mut().set_layout_params(params);
        }
    }

    fn parent_generated_params(
        &self,
        node: NodeId,
        current: Option<LayoutParams>,
    ) -> Option<LayoutParams> {
        let mut ancestor = self.tree.parent(node);
        while let Some(parent) = ancestor {
            let render = self.tree.node(parent)?;
            if render.kind.is_virtual() {
                ancestor = self.tree.parent(parent);
                continue;
            }
            let binding = render.binding().and_then(|id| self.binding(id))?;
            return binding.widget().generate_child_params(current);
        }
        None
    }

    /// Looks up the binding behind a node for an operation that requires
    /// attachment. A dead node is a silent drop (missing-target); a live
    /// but unbound node is a caller contract violation.
    fn attached_binding(&self, node: NodeId, operation: &str) -> Option<BindingId> {
        let Some(render) = self.tree.node(node) else {
            trace!(node = node.index(), operation, "dropping call for a dead node");
            return None;
        };
        let Some(id) = render.binding() else {
            debug_assert!(false, "{operation} called for an unbound node");
            warn!(node = node.index(), operation, "ignoring call for an unbound node");
            return None;
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use mooring_core::{NodeKind, Point, Rect, RenderNode, Size};

    use super::*;
    use crate::tests::{NativeCall, RecordingWidget};

    fn host_with_root() -> (BindingHost, NodeId, BindingId, crate::tests::CallLog) {
        let mut host = BindingHost::new(());
        let root = host.tree_mut().replace_root(RenderNode::new(NodeKind::Body));
        let (widget, log) = RecordingWidget::container();
        let id = host.create_binding(widget);
        host.bind(id, root).expect("binding the root should succeed");
        (host, root, id, log)
    }

    #[test]
    fn bind_keeps_references_mutually_consistent() {
        let (host, root, id, _log) = host_with_root();
        assert_eq!(host.tree().node(root).unwrap().binding(), Some(id));
        assert_eq!(host.binding(id).unwrap().node(), Some(root));
    }

    #[test]
    fn bind_rejects_dead_and_conflicting_ids() {
        let (mut host, root, id, _log) = host_with_root();
        let dead = NodeId::new(99);
        assert_eq!(host.bind(id, dead), Err(BindError::MissingNode(dead)));

        let child = host
            .tree_mut()
            .insert_child(root, RenderNode::new(NodeKind::View));
        assert_eq!(host.bind(id, child), Err(BindError::BindingInUse(id)));

        let (widget, _) = RecordingWidget::plain();
        let other = host.create_binding(widget);
        assert_eq!(host.bind(other, root), Err(BindError::NodeAlreadyBound(root)));

        // Rebinding the same pair is the idempotent path.
        assert_eq!(host.bind(id, root), Ok(()));
    }

    #[test]
    fn root_coordinator_lives_and_dies_with_the_root_binding() {
        let (mut host, root, id, _log) = host_with_root();
        assert!(host.root_coordinator(root).is_some());

        host.post_event(root, "onShow", EventPayload::Empty);
        let coordinator = host.root_coordinator(root).expect("coordinator");
        assert_eq!(coordinator.pending(), 1);

        host.unbind(id);
        assert!(host.root_coordinator(root).is_none());
        assert!(host.tree().node(root).unwrap().binding().is_none());
        // The old handle still exists but the host no longer flushes it.
        host.flush_actions();
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn child_params_derive_from_the_nearest_real_container() {
        let (mut host, root, _id, _log) = host_with_root();
        let shadow = host
            .tree_mut()
            .insert_child(root, RenderNode::new(NodeKind::Shadow));
        let mut leaf_node = RenderNode::new(NodeKind::View);
        leaf_node.frame = Rect::new(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let leaf = host.tree_mut().insert_child(shadow, leaf_node);

        let (widget, log) = RecordingWidget::plain();
        let id = host.create_binding(widget);
        host.bind(id, leaf).expect("binding the leaf should succeed");

        // Own frame params first, then the container-generated override.
        let params: Vec<_> = log
            .take()
            .into_iter()
            .filter(|call| matches!(call, NativeCall::Params(_)))
            .collect();
        assert_eq!(
            params,
            vec![
                NativeCall::Params(crate::widget::LayoutParams::new(40.0, 20.0)),
                NativeCall::Params(RecordingWidget::GENERATED_PARAMS),
            ]
        );
    }

    #[test]
    fn set_data_dispatches_on_the_recognized_kinds() {
        let (mut host, root, id, log) = host_with_root();
        host.set_data(
            root,
            DataUpdate::AnimateProps(AnimProperties {
                name: "fade".into(),
                opacity: Some(0.0),
                duration_ms: 150,
                ..AnimProperties::default()
            }),
        );
        assert_eq!(host.binding(id).unwrap().anim_drivers().len(), 1);

        host.set_data(root, DataUpdate::Text("hello".into()));
        assert!(log.take().contains(&NativeCall::Text("hello".into())));
        assert_eq!(
            host.tree().node(root).unwrap().text.as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn measure_uses_the_exact_frame_size() {
        let (mut host, root, id, log) = host_with_root();
        host.set_position(
            root,
            Rect::new(Point::new(0.0, 0.0), Size::new(100.0, 50.0)),
        );
        log.take();

        host.measure(id);
        host.layout(id);

        let calls = log.take();
        assert!(calls.contains(&NativeCall::Measure(Size::new(100.0, 50.0))));
        assert!(calls.contains(&NativeCall::Place(Rect::new(
            Point::new(0.0, 0.0),
            Size::new(100.0, 50.0),
        ))));
    }
}
