//! Pointer and gesture events routed through the binding layer.
//!
//! Events arrive already hit-tested: the input system resolves the target
//! node before handing the event over, so the types here carry positions
//! and phases but no hit-testing state.

use crate::geometry::Point;

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// A pointer made contact.
    Down,
    /// The pointer moved while in contact.
    Move,
    /// The pointer lifted.
    Up,
    /// The interaction was cancelled by the platform.
    Cancel,
}

impl PointerPhase {
    /// Returns the event name listeners register under for this phase.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Down => "touchstart",
            Self::Move => "touchmove",
            Self::Up => "touchend",
            Self::Cancel => "touchcancel",
        }
    }
}

/// A raw pointer event, hit-tested upstream to a target node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Interaction phase.
    pub phase: PointerPhase,
    /// Position in the tree's root coordinate space.
    pub position: Point,
}

impl PointerEvent {
    /// Creates a new pointer event.
    #[must_use]
    pub const fn new(phase: PointerPhase, position: Point) -> Self {
        Self { phase, position }
    }

    /// Returns the event name listeners register under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.phase.event_name()
    }
}

/// Recognized gesture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GestureKind {
    /// A completed tap.
    Tap,
    /// A press held past the platform threshold.
    LongPress,
    /// A drag update.
    Drag,
}

impl GestureKind {
    /// Returns the event name listeners register under for this kind.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::LongPress => "longpress",
            Self::Drag => "drag",
        }
    }
}

/// A gesture event, pre-resolved to a single target by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// Recognized gesture kind.
    pub kind: GestureKind,
    /// Position in the tree's root coordinate space.
    pub position: Point,
}

impl GestureEvent {
    /// Creates a new gesture event.
    #[must_use]
    pub const fn new(kind: GestureKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Returns the event name listeners register under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.event_name()
    }
}

/// Payload delivered alongside a named event.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub enum EventPayload {
    /// No payload.
    #[default]
    Empty,
    /// A pointer event payload.
    Pointer(PointerEvent),
    /// A gesture event payload.
    Gesture(GestureEvent),
    /// A free-form text payload.
    Text(String),
    /// A numeric payload.
    Number(f64),
}

impl From<PointerEvent> for EventPayload {
    fn from(event: PointerEvent) -> Self {
        Self::Pointer(event)
    }
}

impl From<GestureEvent> for EventPayload {
    fn from(event: GestureEvent) -> Self {
        Self::Gesture(event)
    }
}
