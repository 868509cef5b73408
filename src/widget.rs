//! The opaque native widget surface.
//!
//! Everything below the binding layer — actual drawing, platform view
//! hierarchies, compositing — sits behind [`NativeWidget`]. The trait is
//! deliberately narrow: it exposes exactly the mutations the binding layer
//! performs, and platforms implement it over whatever handle type they use.

use std::fmt::Debug;

use mooring_core::{Rect, Rgba, Size};

/// Composited-layer selection for a native widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerMode {
    /// No extra layer is forced; the platform paints directly.
    #[default]
    None,
    /// A hardware-composited layer backs the widget.
    Hardware,
    /// A software bitmap layer backs the widget.
    Software,
}

/// Native visibility state of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetVisibility {
    /// The widget is painted.
    #[default]
    Visible,
    /// The widget keeps its slot but is not painted.
    Invisible,
}

/// Exact-size layout parameters handed to the platform so a parent can
/// measure the widget without consulting the virtual tree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutParams {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl LayoutParams {
    /// Creates layout parameters from explicit dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates layout parameters matching a measured size.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// One native platform widget, owned exclusively by its binding.
///
/// Implementations must treat every setter as cheap and non-reentrant; the
/// binding layer already guards against redundant calls, so a setter is
/// only invoked when the value actually changes.
pub trait NativeWidget: Debug {
    /// Installs or clears the background fill.
    fn set_background(&mut self, background: Option<Rgba>);

    /// Returns the current alpha in `0.0..=1.0`.
    fn alpha(&self) -> f32;

    /// Sets the alpha in `0.0..=1.0`.
    fn set_alpha(&mut self, alpha: f32);

    /// Returns the current layer selection.
    fn layer(&self) -> LayerMode;

    /// Selects the backing layer.
    fn set_layer(&mut self, layer: LayerMode);

    /// Returns `true` when the surface beneath the widget already
    /// composites in hardware.
    fn is_hardware_accelerated(&self) -> bool;

    /// Returns the current native visibility.
    fn visibility(&self) -> WidgetVisibility;

    /// Sets the native visibility.
    fn set_visibility(&mut self, visibility: WidgetVisibility);

    /// Returns the installed layout parameters, when any.
    fn layout_params(&self) -> Option<LayoutParams>;

    /// Installs layout parameters.
    fn set_layout_params(&mut self, params: LayoutParams);

    /// Generates layout parameters for a child widget, when this widget is
    /// a container capable of hosting native children.
    ///
    /// The default implementation returns `None`: plain widgets cannot
    /// host children and the binding layer skips derivation for them.
    fn generate_child_params(&self, current: Option<LayoutParams>) -> Option<LayoutParams> {
        let _ = current;
        None
    }

    /// Replaces the widget's text content. Non-text widgets ignore this.
    fn set_text(&mut self, text: &str) {
        let _ = text;
    }

    /// Measures the widget at exactly the provided size.
    fn measure(&mut self, size: Size);

    /// Places the widget at the provided frame.
    fn place(&mut self, frame: Rect);

    /// Schedules a native layout pass.
    fn request_layout(&mut self);

    /// Schedules a native repaint.
    fn invalidate(&mut self);
}
