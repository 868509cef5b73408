//! Two-phase pointer routing over the bound-node tree.
//!
//! There is no stored dispatcher state: routing reads the three per-node
//! control flags and walks the ancestor chain twice. The capture pass runs
//! from the root down to the target's parent, visiting only nodes that
//! opted into interception; the bubble pass runs from the target up,
//! delivering at every node until the first stop-propagation flag halts
//! it. A node never receives the same event in both phases: capture-enabled
//! nodes are excluded from bubble delivery, including the target itself.
//!
//! Deliveries are not synchronous — each one is queued on the tree's
//! coordinator keyed by event name, so repeats of the same named event
//! coalesce before the next flush. Stop-propagation is honored only during
//! the bubble walk; a capture-enabled node's flag still halts the walk
//! above it even though the node itself received the event during capture.

use mooring_core::{EventPayload, GestureEvent, NodeId, PointerEvent};
use tracing::trace;

use crate::actions::{Action, ActionCoordinator};
use crate::binding::ViewBinding;
use crate::host::BindingHost;

/// Result of routing one input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// The node that ultimately handled the event: the last node a
    /// delivery was queued for. `None` when nothing listened.
    pub handled_by: Option<NodeId>,
    /// `true` when the handling node requests suppression of the platform
    /// default action. Propagation is never affected by this.
    pub prevent_default: bool,
}

/// Routes hit-tested input events across a host's bound nodes.
#[derive(Debug)]
pub struct EventDispatcher<'a> {
    host: &'a BindingHost,
}

impl<'a> EventDispatcher<'a> {
    pub(crate) const fn new(host: &'a BindingHost) -> Self {
        Self { host }
    }

    /// Routes a pointer event hit-tested to `target` through the capture
    /// and bubble phases.
    ///
    /// A dead or unbound target drops the event silently: input is never
    /// queued across frames for a node that is gone.
    pub fn perform_touch(&self, target: NodeId, event: &PointerEvent) -> DispatchOutcome {
        let Some(coordinator) = self.host.root_coordinator(target) else {
            trace!(node = target.index(), "dropping touch for a detached target");
            return DispatchOutcome::default();
        };
        let Some(path) = self.host.tree().path_from_root(target) else {
            return DispatchOutcome::default();
        };

        let name = event.name();
        let payload = EventPayload::from(*event);
        let mut handled = None;

        // Capture pass: root down to the target's parent.
        for &node in &path[..path.len() - 1] {
            if let Some(binding) = self.host.binding_of(node) {
                if binding.is_capture_enabled()
                    && emit(&coordinator, binding, node, name, &payload)
                {
                    handled = Some(node);
                }
            }
        }

        // Target delivery, then the bubble walk toward the root.
        for &node in path.iter().rev() {
            let Some(binding) = self.host.binding_of(node) else {
                continue;
            };
            if !binding.is_capture_enabled() && emit(&coordinator, binding, node, name, &payload) {
                handled = Some(node);
            }
            if binding.is_stop_propagation() {
                break;
            }
        }

        self.outcome(handled)
    }

    /// Capture-phase delivery primitive for a single node.
    ///
    /// Delivers only when the node opted into interception; returns whether
    /// a delivery was queued. Exposed for platforms that drive the ancestor
    /// walk themselves.
    pub fn on_capturing_touch(&self, node: NodeId, event: &PointerEvent) -> bool {
        let Some(coordinator) = self.host.root_coordinator(node) else {
            return false;
        };
        let Some(binding) = self.host.binding_of(node) else {
            return false;
        };
        binding.is_capture_enabled()
            && emit(
                &coordinator,
                binding,
                node,
                event.name(),
                &EventPayload::from(*event),
            )
    }

    /// Delivers a gesture event directly to its pre-resolved target.
    ///
    /// Gestures skip capture/bubble entirely; recognizers upstream already
    /// picked the single target.
    pub fn perform_gesture(&self, target: NodeId, event: &GestureEvent) -> DispatchOutcome {
        let Some(coordinator) = self.host.root_coordinator(target) else {
            trace!(node = target.index(), "dropping gesture for a detached target");
            return DispatchOutcome::default();
        };
        let Some(binding) = self.host.binding_of(target) else {
            return DispatchOutcome::default();
        };
        let handled = emit(
            &coordinator,
            binding,
            target,
            event.name(),
            &EventPayload::from(*event),
        )
        .then_some(target);
        self.outcome(handled)
    }

    fn outcome(&self, handled: Option<NodeId>) -> DispatchOutcome {
        let prevent_default = handled
            .and_then(|node| self.host.binding_of(node))
            .is_some_and(ViewBinding::is_prevent_default);
        DispatchOutcome {
            handled_by: handled,
            prevent_default,
        }
    }
}

/// Queues one delivery when the node listens for the event name.
fn emit(
    coordinator: &ActionCoordinator,
    binding: &ViewBinding,
    node: NodeId,
    name: &str,
    payload: &EventPayload,
) -> bool {
    if !binding.is_event_enabled(name) {
        return false;
    }
    coordinator.collect(Action::post_event(node, name, payload.clone()));
    true
}

#[cfg(test)]
mod tests {
    use mooring_core::{GestureKind, Point, PointerPhase};

    use super::*;
    use crate::binding::{ATTR_CAPTURE, ATTR_PREVENT_DEFAULT, ATTR_STOP_PROPAGATION};
    use crate::tests::{Delivery, bound_chain};

    fn touch() -> PointerEvent {
        PointerEvent::new(PointerPhase::Down, Point::new(1.0, 1.0))
    }

    #[test]
    fn capture_ancestor_hears_before_target_and_not_again() {
        let (mut host, nodes, deliveries) = bound_chain(3);
        let [a1, a2, target] = [nodes[0], nodes[1], nodes[2]];
        for node in [a1, a2, target] {
            host.add_event_listener(node, "touchstart");
        }
        host.set_attribute(a1, ATTR_CAPTURE, "true");

        host.dispatcher().perform_touch(target, &touch());
        host.flush_actions();

        let order: Vec<NodeId> = deliveries.take().into_iter().map(Delivery::target).collect();
        assert_eq!(order, vec![a1, target, a2]);
    }

    #[test]
    fn stop_propagation_halts_the_bubble_walk() {
        let (mut host, nodes, deliveries) = bound_chain(3);
        let [a1, a2, target] = [nodes[0], nodes[1], nodes[2]];
        for node in [a1, a2, target] {
            host.add_event_listener(node, "touchstart");
        }
        host.set_attribute(a2, ATTR_STOP_PROPAGATION, "true");

        host.dispatcher().perform_touch(target, &touch());
        host.flush_actions();

        let order: Vec<NodeId> = deliveries.take().into_iter().map(Delivery::target).collect();
        assert_eq!(order, vec![target, a2]);
    }

    #[test]
    fn capture_only_target_is_skipped_at_itself() {
        let (mut host, nodes, deliveries) = bound_chain(2);
        let [root, target] = [nodes[0], nodes[1]];
        for node in [root, target] {
            host.add_event_listener(node, "touchstart");
        }
        host.set_attribute(target, ATTR_CAPTURE, "true");

        host.dispatcher().perform_touch(target, &touch());
        host.flush_actions();

        let order: Vec<NodeId> = deliveries.take().into_iter().map(Delivery::target).collect();
        assert_eq!(order, vec![root]);
    }

    #[test]
    fn prevent_default_reports_from_the_handling_node() {
        let (mut host, nodes, _deliveries) = bound_chain(2);
        let target = nodes[1];
        host.add_event_listener(target, "touchstart");
        host.set_attribute(target, ATTR_PREVENT_DEFAULT, "true");

        let outcome = host.dispatcher().perform_touch(target, &touch());
        assert_eq!(outcome.handled_by, Some(target));
        assert!(outcome.prevent_default);
    }

    #[test]
    fn missing_target_drops_the_event() {
        let (mut host, nodes, deliveries) = bound_chain(2);
        let target = nodes[1];
        host.add_event_listener(target, "touchstart");
        let binding = host.tree().node(target).unwrap().binding().unwrap();
        host.unbind(binding);

        let outcome = host.dispatcher().perform_touch(target, &touch());
        host.flush_actions();

        assert_eq!(outcome, DispatchOutcome::default());
        assert!(deliveries.take().is_empty());
    }

    #[test]
    fn gestures_go_straight_to_the_target() {
        let (mut host, nodes, deliveries) = bound_chain(3);
        let [a1, target] = [nodes[0], nodes[2]];
        host.add_event_listener(a1, "tap");
        host.add_event_listener(target, "tap");
        host.set_attribute(a1, ATTR_CAPTURE, "true");

        let gesture = GestureEvent::new(GestureKind::Tap, Point::new(1.0, 1.0));
        host.dispatcher().perform_gesture(target, &gesture);
        host.flush_actions();

        let order: Vec<NodeId> = deliveries.take().into_iter().map(Delivery::target).collect();
        assert_eq!(order, vec![target]);
    }

    #[test]
    fn unlistened_events_produce_no_outcome() {
        let (host, nodes, deliveries) = bound_chain(2);
        let outcome = host.dispatcher().perform_touch(nodes[1], &touch());

        assert_eq!(outcome, DispatchOutcome::default());
        assert!(deliveries.take().is_empty());
    }
}
