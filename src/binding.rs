//! Per-node projection of a render node onto one native widget.
//!
//! A [`ViewBinding`] owns exactly one widget handle for the lifetime of the
//! binding. Style application is guarded field by field so unchanged values
//! never reach the platform, and the three event-control flags are settable
//! only through the attribute path.

use std::collections::BTreeSet;

use mooring_core::{NodeId, NodeKind, Rect, Rgba, Size, Style};
use tracing::warn;

use crate::anim::{AnimDriver, AnimProperties};
use crate::widget::{LayerMode, LayoutParams, NativeWidget, WidgetVisibility};

/// Attribute key enabling capture-phase interception.
pub const ATTR_CAPTURE: &str = "capture";
/// Attribute key enabling native default-action suppression.
pub const ATTR_PREVENT_DEFAULT: &str = "prevent-default";
/// Attribute key halting upward propagation at this node.
pub const ATTR_STOP_PROPAGATION: &str = "stop-propagation";

/// Decoration drawn behind the widget's content.
///
/// Bounds follow the node's frame through `set_position`; style updates
/// mutate the decoration before the widget repaints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackgroundDecoration {
    color: Option<Rgba>,
    corner_radius: f32,
    bounds: Rect,
}

impl BackgroundDecoration {
    /// Returns the decoration fill, when any.
    #[must_use]
    pub const fn color(&self) -> Option<Rgba> {
        self.color
    }

    /// Returns the corner radius in logical pixels.
    #[must_use]
    pub const fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Returns the decoration bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    fn update_style(&mut self, style: &Style) {
        self.color = style.background;
        self.corner_radius = style.border_radius;
    }

    fn update_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }
}

/// The live projection of one render node onto one native widget.
#[derive(Debug)]
pub struct ViewBinding {
    widget: Box<dyn NativeWidget>,
    node: Option<NodeId>,
    background: BackgroundDecoration,
    background_installed: bool,
    capture_enabled: bool,
    prevent_default_enabled: bool,
    stop_propagation_enabled: bool,
    enabled_events: BTreeSet<String>,
    anim_drivers: Vec<AnimDriver>,
    last_anim_props: Option<AnimProperties>,
}

impl ViewBinding {
    /// Creates an unattached binding owning `widget`.
    ///
    /// The binding stays unattached only until the host binds it to a node.
    #[must_use]
    pub fn new(widget: Box<dyn NativeWidget>) -> Self {
        Self {
            widget,
            node: None,
            background: BackgroundDecoration::default(),
            background_installed: false,
            capture_enabled: false,
            prevent_default_enabled: false,
            stop_propagation_enabled: false,
            enabled_events: BTreeSet::new(),
            anim_drivers: Vec::new(),
            last_anim_props: None,
        }
    }

    /// Returns the node this binding projects, when attached.
    #[must_use]
    pub const fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Returns the owned widget.
    #[must_use]
    pub fn widget(&self) -> &dyn NativeWidget {
        self.widget.as_ref()
    }

    /// Returns the owned widget mutably.
    pub fn widget_mut(&mut self) -> &mut dyn NativeWidget {
        self.widget.as_mut()
    }

    /// Returns the background decoration state.
    #[must_use]
    pub const fn background(&self) -> &BackgroundDecoration {
        &self.background
    }

    /// Returns `true` when this node intercepts events during the capture
    /// phase.
    #[must_use]
    pub const fn is_capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Returns `true` when this node suppresses the platform default
    /// action for events it handles.
    #[must_use]
    pub const fn is_prevent_default(&self) -> bool {
        self.prevent_default_enabled
    }

    /// Returns `true` when upward propagation halts at this node.
    #[must_use]
    pub const fn is_stop_propagation(&self) -> bool {
        self.stop_propagation_enabled
    }

    /// Returns `true` when a listener for `name` is registered.
    #[must_use]
    pub fn is_event_enabled(&self, name: &str) -> bool {
        self.enabled_events.contains(name)
    }

    /// Returns the drivers of currently running animations.
    #[must_use]
    pub fn anim_drivers(&self) -> &[AnimDriver] {
        &self.anim_drivers
    }

    pub(crate) const fn attach(&mut self, node: NodeId) {
        self.node = Some(node);
    }

    pub(crate) const fn detach(&mut self) {
        self.node = None;
    }

    /// Recognizes the three event-control keys and updates the matching
    /// flag; unknown keys are ignored so external attribute vocabularies
    /// can grow without breaking this layer. Malformed boolean values fall
    /// back to `false`.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        if !self.check_attached("set_attribute") {
            return;
        }
        match key {
            ATTR_CAPTURE => self.capture_enabled = parse_flag(value),
            ATTR_PREVENT_DEFAULT => self.prevent_default_enabled = parse_flag(value),
            ATTR_STOP_PROPAGATION => self.stop_propagation_enabled = parse_flag(value),
            _ => {}
        }
    }

    /// Applies a style snapshot to the widget.
    ///
    /// No-op when `style` is `None` or the node kind is exempt from generic
    /// styling. Otherwise applies background, opacity, layer selection, and
    /// visibility — each guarded against redundant native calls — then
    /// requests exactly one layout pass and one repaint.
    pub fn update_style(&mut self, kind: NodeKind, style: Option<&Style>) {
        if !self.check_attached("update_style") {
            return;
        }
        let Some(style) = style else { return };
        if kind.is_style_exempt() {
            return;
        }

        self.apply_background(style);
        self.apply_alpha(style);
        self.apply_layer(style);
        self.apply_visibility(style);

        self.widget.request_layout();
        self.widget.invalidate();
    }

    /// Updates the decoration bounds and the installed layout parameters to
    /// the new frame, then requests a layout pass.
    pub fn set_position(&mut self, frame: Rect) {
        if !self.check_attached("set_position") {
            return;
        }
        self.background.update_bounds(frame);
        if self.widget.layout_params().is_some() {
            self.widget
                .set_layout_params(LayoutParams::from_size(frame.size));
        }
        self.widget.request_layout();
    }

    /// Accepts a size change.
    ///
    /// Intentionally a no-op: sizes flow through position frames and layout
    /// parameters; the entry point exists so the inbound surface stays
    /// symmetrical for the diff engine.
    pub fn set_size(&mut self, size: Size) {
        let _ = size;
    }

    /// Registers a listener for the named event. Idempotent.
    pub fn add_event_listener(&mut self, name: &str) {
        if !self.check_attached("add_event_listener") {
            return;
        }
        self.enabled_events.insert(name.to_owned());
    }

    /// Removes the listener for the named event, if registered.
    pub fn remove_event_listener(&mut self, name: &str) {
        if !self.check_attached("remove_event_listener") {
            return;
        }
        self.enabled_events.remove(name);
    }

    /// Forwards text content to the widget.
    pub fn set_text(&mut self, text: &str) {
        if !self.check_attached("set_text") {
            return;
        }
        self.widget.set_text(text);
    }

    /// Measures the widget at exactly the frame's size, or zero when the
    /// binding is detached. Never panics on a detached binding.
    pub fn measure(&mut self, frame: Option<Rect>) {
        let size = frame.map_or_else(Size::zero, |frame| frame.size);
        self.widget.measure(size);
    }

    /// Places the widget at the frame, or at a zero rectangle when the
    /// binding is detached. Never panics on a detached binding.
    pub fn place(&mut self, frame: Option<Rect>) {
        self.widget.place(frame.unwrap_or_default());
    }

    /// Starts an animation from the last applied snapshot toward `props`,
    /// records its driver, and remembers `props` as the next "from" state.
    pub fn start_anim(&mut self, props: AnimProperties) {
        if !self.check_attached("start_anim") {
            return;
        }
        let driver = AnimDriver::start(self.last_anim_props.clone(), props.clone());
        self.anim_drivers.push(driver);
        self.last_anim_props = Some(props);
    }

    /// Cooperatively stops every running driver and clears the snapshot.
    pub fn stop_anim(&mut self) {
        self.last_anim_props = None;
        for driver in &self.anim_drivers {
            driver.stop();
        }
        self.anim_drivers.clear();
    }

    /// Reverses every side effect style and listener application produced:
    /// neutral style, cleared decoration, no listeners, stopped animations.
    pub(crate) fn reset(&mut self) {
        self.stop_anim();
        self.enabled_events.clear();
        self.capture_enabled = false;
        self.prevent_default_enabled = false;
        self.stop_propagation_enabled = false;
        self.background = BackgroundDecoration::default();
        if self.background_installed {
            self.widget.set_background(None);
            self.background_installed = false;
        }
        if (self.widget.alpha() - 1.0).abs() > f32::EPSILON {
            self.widget.set_alpha(1.0);
        }
        if self.widget.layer() != LayerMode::None {
            self.widget.set_layer(LayerMode::None);
        }
        if self.widget.visibility() != WidgetVisibility::Visible {
            self.widget.set_visibility(WidgetVisibility::Visible);
        }
    }

    fn apply_background(&mut self, style: &Style) {
        let previous = self.background.color();
        self.background.update_style(style);
        if !self.background_installed || previous != self.background.color() {
            self.widget.set_background(self.background.color());
            self.background_installed = true;
        }
    }

    fn apply_alpha(&mut self, style: &Style) {
        let alpha = style.normalized_opacity();
        if (self.widget.alpha() - alpha).abs() > f32::EPSILON {
            self.widget.set_alpha(alpha);
        }
    }

    fn apply_layer(&mut self, style: &Style) {
        // Composited layer only for corner clipping on a surface that is
        // not already hardware-accelerated.
        let desired = if style.border_radius > 0.0 && !self.widget.is_hardware_accelerated() {
            LayerMode::Hardware
        } else {
            LayerMode::None
        };
        if self.widget.layer() != desired {
            self.widget.set_layer(desired);
        }
    }

    fn apply_visibility(&mut self, style: &Style) {
        let desired = if style.is_hidden() {
            WidgetVisibility::Invisible
        } else {
            WidgetVisibility::Visible
        };
        if self.widget.visibility() != desired {
            self.widget.set_visibility(desired);
        }
    }

    /// Attachment guard for operations whose contract requires a bound
    /// binding: panics in debug builds, warns and no-ops in release.
    fn check_attached(&self, operation: &str) -> bool {
        if self.node.is_some() {
            return true;
        }
        debug_assert!(false, "{operation} called on a detached binding");
        warn!(operation, "ignoring call on a detached binding");
        false
    }
}

fn parse_flag(value: &str) -> bool {
    value.parse().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use mooring_core::{Display, Point};

    use super::*;
    use crate::tests::{NativeCall, RecordingWidget};

    fn attached_binding() -> (ViewBinding, crate::tests::CallLog) {
        let (widget, log) = RecordingWidget::plain();
        let mut binding = ViewBinding::new(widget);
        binding.attach(NodeId::new(0));
        (binding, log)
    }

    #[test]
    fn attribute_flags_parse_booleans_and_ignore_unknown_keys() {
        let (mut binding, _log) = attached_binding();

        binding.set_attribute(ATTR_CAPTURE, "true");
        binding.set_attribute(ATTR_PREVENT_DEFAULT, "true");
        binding.set_attribute(ATTR_STOP_PROPAGATION, "not-a-bool");
        binding.set_attribute("data-role", "true");

        assert!(binding.is_capture_enabled());
        assert!(binding.is_prevent_default());
        assert!(!binding.is_stop_propagation());
    }

    #[test]
    fn update_style_skips_unchanged_values() {
        let (mut binding, log) = attached_binding();
        let style = Style {
            background: Some(Rgba::opaque(10, 20, 30)),
            opacity: 128,
            ..Style::default()
        };

        binding.update_style(NodeKind::View, Some(&style));
        let first = log.take();
        assert!(first.contains(&NativeCall::Background(Some(Rgba::opaque(10, 20, 30)))));
        assert!(first.contains(&NativeCall::Alpha(128.0 / 255.0)));

        binding.update_style(NodeKind::View, Some(&style));
        let second = log.take();
        assert_eq!(second, vec![NativeCall::RequestLayout, NativeCall::Invalidate]);
    }

    #[test]
    fn update_style_none_and_exempt_kind_touch_nothing() {
        let (mut binding, log) = attached_binding();

        binding.update_style(NodeKind::View, None);
        binding.update_style(NodeKind::Cell, Some(&Style::default()));

        assert!(log.take().is_empty());
    }

    #[test]
    fn layer_follows_corner_clipping_and_acceleration() {
        let (mut binding, log) = attached_binding();
        let rounded = Style {
            border_radius: 4.0,
            ..Style::default()
        };

        binding.update_style(NodeKind::View, Some(&rounded));
        assert!(log.take().contains(&NativeCall::Layer(LayerMode::Hardware)));

        // Same style again: the layer is already hardware, no new call.
        binding.update_style(NodeKind::View, Some(&rounded));
        assert!(!log.take().iter().any(|call| matches!(call, NativeCall::Layer(_))));

        binding.update_style(NodeKind::View, Some(&Style::default()));
        assert!(log.take().contains(&NativeCall::Layer(LayerMode::None)));
    }

    #[test]
    fn visibility_tracks_display_and_hidden() {
        let (mut binding, log) = attached_binding();
        let hidden = Style {
            display: Display::None,
            ..Style::default()
        };

        binding.update_style(NodeKind::View, Some(&hidden));
        assert!(
            log.take()
                .contains(&NativeCall::Visibility(WidgetVisibility::Invisible))
        );

        binding.update_style(NodeKind::View, Some(&Style::default()));
        assert!(
            log.take()
                .contains(&NativeCall::Visibility(WidgetVisibility::Visible))
        );
    }

    #[test]
    fn measure_and_place_tolerate_detachment() {
        let (widget, log) = RecordingWidget::plain();
        let mut binding = ViewBinding::new(widget);

        binding.measure(None);
        binding.place(None);

        assert_eq!(
            log.take(),
            vec![
                NativeCall::Measure(Size::zero()),
                NativeCall::Place(Rect::default()),
            ]
        );
    }

    #[test]
    fn set_position_moves_decoration_and_params() {
        let (mut binding, log) = attached_binding();
        binding
            .widget_mut()
            .set_layout_params(LayoutParams::new(1.0, 1.0));
        log.take();

        let frame = Rect::new(Point::new(5.0, 6.0), Size::new(100.0, 50.0));
        binding.set_position(frame);

        assert_eq!(binding.background().bounds(), frame);
        assert!(
            log.take()
                .contains(&NativeCall::Params(LayoutParams::new(100.0, 50.0)))
        );
    }

    #[test]
    fn start_anim_threads_the_previous_snapshot() {
        let (mut binding, _log) = attached_binding();
        let first = AnimProperties {
            name: "enter".into(),
            opacity: Some(1.0),
            duration_ms: 100,
            ..AnimProperties::default()
        };
        let second = AnimProperties {
            name: "exit".into(),
            opacity: Some(0.0),
            duration_ms: 100,
            ..AnimProperties::default()
        };

        binding.start_anim(first.clone());
        binding.start_anim(second.clone());

        let drivers = binding.anim_drivers();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].from(), None);
        assert_eq!(drivers[1].from(), Some(&first));
        assert_eq!(drivers[1].to(), &second);

        let handle = drivers[1].clone();
        binding.stop_anim();
        assert!(!handle.is_running());
        assert!(binding.anim_drivers().is_empty());
    }
}
