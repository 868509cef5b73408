//! Mooring — binds a virtual render tree to native platform widgets.
//!
//! An external layout/style engine produces a [`RenderTree`] of
//! [`RenderNode`]s; Mooring projects each bound node onto exactly one
//! native widget and mediates the two cross-thread concerns around that
//! projection:
//!
//! - **Deferred mutation batching.** Bindings queue notifications and data
//!   pushes on the tree's [`ActionCoordinator`] from any thread; the UI
//!   context drains the queue once per cycle, coalescing unordered actions
//!   per (target, key) with last-write-wins semantics.
//! - **Two-phase input routing.** Pointer events walk the ancestor chain
//!   twice — capture down, bubble up — honoring the per-node `capture`,
//!   `stop-propagation`, and `prevent-default` flags.
//!
//! Everything below the binding sits behind the [`NativeWidget`] trait;
//! platforms implement it over their own view handles and keep full
//! ownership of painting.

#![deny(missing_debug_implementations)]

pub mod actions;
pub mod anim;
pub mod binding;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod widget;


pub use actions::{Action, ActionCoordinator, ActionKind};
pub use anim::{AnimDriver, AnimProperties};
pub use binding::{
    ATTR_CAPTURE, ATTR_PREVENT_DEFAULT, ATTR_STOP_PROPAGATION, BackgroundDecoration, ViewBinding,
};
pub use dispatch::{DispatchOutcome, EventDispatcher};
pub use error::BindError;
pub use host::{BindingHost, DataUpdate, FlushCtx, TreeDelegate};
pub use mooring_core::{
    BindingId, Display, EventPayload, GestureEvent, GestureKind, NodeId, NodeKind, Point,
    PointerEvent, PointerPhase, Rect, RenderNode, RenderTree, Rgba, Size, Style, Visibility,
};
pub use widget::{LayerMode, LayoutParams, NativeWidget, WidgetVisibility};
