//! Cooperative animation drivers owned by bindings.
//!
//! Interpolation math lives outside this crate: a driver only records the
//! endpoints of one animation and a shared running flag. The external
//! animator polls [`AnimDriver::is_running`] each frame and winds down
//! cooperatively once [`AnimDriver::stop`] clears the flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mooring_core::Point;

/// Property snapshot describing one end state of an animation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimProperties {
    /// Animation name, used as the coalescing key for repeated starts.
    pub name: String,
    /// Target opacity in `0.0..=1.0`, when animated.
    pub opacity: Option<f32>,
    /// Target translation, when animated.
    pub translate: Option<Point>,
    /// Target uniform scale, when animated.
    pub scale: Option<f32>,
    /// Target rotation in degrees, when animated.
    pub rotate: Option<f32>,
    /// Duration in milliseconds.
    pub duration_ms: u32,
}

/// A single running animation: endpoints plus a cooperative stop flag.
///
/// Cloning a driver shares the running flag, so an external animator can
/// hold a clone while the owning binding keeps the original.
#[derive(Debug, Clone)]
pub struct AnimDriver {
    from: Option<AnimProperties>,
    to: AnimProperties,
    running: Arc<AtomicBool>,
}

impl AnimDriver {
    /// Starts a driver animating from the previous snapshot (when any)
    /// toward `to`.
    #[must_use]
    pub fn start(from: Option<AnimProperties>, to: AnimProperties) -> Self {
        Self {
            from,
            to,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns the animation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.to.name
    }

    /// Returns the start snapshot, when the animation has one.
    #[must_use]
    pub const fn from(&self) -> Option<&AnimProperties> {
        self.from.as_ref()
    }

    /// Returns the end snapshot.
    #[must_use]
    pub const fn to(&self) -> &AnimProperties {
        &self.to
    }

    /// Returns `true` while the driver has not been stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Requests a cooperative stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}
