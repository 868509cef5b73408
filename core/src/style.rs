//! Style snapshots the binding layer projects onto native widgets.
//!
//! A [`Style`] is a flattened, already-resolved snapshot: the external
//! style engine has done cascade and inheritance before the value reaches
//! this crate. Fields carry the exact units the native layer expects
//! (opacity as `0..=255`, radii in logical pixels).

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a new color from channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, u8::MAX)
    }
}

/// Layout participation of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Display {
    /// The node takes part in layout and painting.
    #[default]
    Flex,
    /// The node is removed from layout entirely.
    None,
}

/// Visibility of a node that still takes part in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// The node is painted.
    #[default]
    Visible,
    /// The node keeps its layout slot but is not painted.
    Hidden,
}

/// Resolved style snapshot for one render node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    /// Background fill, when any.
    pub background: Option<Rgba>,
    /// Opacity in `0..=255`; the native layer normalizes to `0.0..=1.0`.
    pub opacity: u8,
    /// Corner radius in logical pixels; positive values request clipping.
    pub border_radius: f32,
    /// Layout participation.
    pub display: Display,
    /// Paint visibility.
    pub visibility: Visibility,
}

impl Style {
    /// Returns the opacity normalized to `0.0..=1.0`.
    #[must_use]
    pub fn normalized_opacity(&self) -> f32 {
        f32::from(self.opacity) / 255.0
    }

    /// Returns `true` when the node must not be painted: display-none or
    /// explicitly hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.display == Display::None || self.visibility == Visibility::Hidden
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: None,
            opacity: u8::MAX,
            border_radius: 0.0,
            display: Display::Flex,
            visibility: Visibility::Visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_normalization() {
        let mut style = Style::default();
        assert_eq!(style.normalized_opacity(), 1.0);
        style.opacity = 0;
        assert_eq!(style.normalized_opacity(), 0.0);
    }

    #[test]
    fn hidden_when_display_none_or_hidden() {
        let mut style = Style::default();
        assert!(!style.is_hidden());
        style.visibility = Visibility::Hidden;
        assert!(style.is_hidden());
        style.visibility = Visibility::Visible;
        style.display = Display::None;
        assert!(style.is_hidden());
    }
}
