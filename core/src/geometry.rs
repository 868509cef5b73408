//! Geometry primitives shared between the tree and the native layer.

/// Two-dimensional size expressed in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl Size {
    /// Creates a new [`Size`] using the provided dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the zero size.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::zero()
    }
}

/// Absolute coordinate in the tree's root coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal position in logical pixels.
    pub x: f32,
    /// Vertical position in logical pixels.
    pub y: f32,
}

impl Point {
    /// Creates a new [`Point`].
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; the absolute frame the layout engine assigns to a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point,
    /// Rectangle size.
    pub size: Size,
}

impl Rect {
    /// Creates a new [`Rect`].
    #[must_use]
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Builds a rectangle from its four edges.
    #[must_use]
    pub const fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            origin: Point::new(left, top),
            size: Size::new(right - left, bottom - top),
        }
    }

    /// Returns the maximum X coordinate of the rectangle.
    #[must_use]
    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    /// Returns the maximum Y coordinate of the rectangle.
    #[must_use]
    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// Returns `true` when the point falls inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.max_x()
            && point.y < self.max_y()
    }
}
