//! Render-tree data model consumed by the Mooring binding layer.
//!
//! The crate hosts the virtual side of the binding: an arena-backed
//! [`RenderTree`] of [`RenderNode`]s plus the style, geometry, and input
//! event types the native layer projects onto platform widgets. Nothing in
//! here touches a platform surface; the tree is produced and mutated by an
//! external layout/diff engine and merely mirrored by `mooring`.

#![deny(missing_debug_implementations)]

pub mod event;
pub mod geometry;
pub mod node;
pub mod style;

pub use event::{EventPayload, GestureEvent, GestureKind, PointerEvent, PointerPhase};
pub use geometry::{Point, Rect, Size};
pub use node::{BindingId, NodeId, NodeKind, RenderNode, RenderTree};
pub use style::{Display, Rgba, Style, Visibility};
