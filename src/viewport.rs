//! Viewport tracking along the scroll axis.

use serde::Serialize;

/// Visible interval `[min, max]` in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ViewportWindow {
    pub min: f64,
    pub max: f64,
}

impl ViewportWindow {
    /// Inclusive containment.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Environment accessors for the current scroll state.
///
/// Both offset accessors return `None` when the host has no such source.
pub trait ScrollMetrics {
    /// Scroll offset reported at document level (`document.body` on the web)
    fn document_scroll_offset(&self) -> Option<f64>;

    /// Scroll offset reported by the root element (`document.documentElement`)
    fn root_scroll_offset(&self) -> Option<f64>;

    /// Length of the visible region along the scroll axis
    fn viewport_length(&self) -> f64;
}

/// Resolve the scroll offset, falling back from document level to the root
/// element.
///
/// A reading of `0` is not conclusive: in standards mode browsers keep the
/// body offset at zero while the root element carries the real value. The
/// last reading seen wins when no strategy reports a non-zero offset.
pub fn scroll_offset<M: ScrollMetrics + ?Sized>(metrics: &M) -> f64 {
    let strategies = [metrics.document_scroll_offset(), metrics.root_scroll_offset()];
    let mut fallback = None;
    for reading in strategies.into_iter().flatten() {
        if reading != 0.0 && reading.is_finite() {
            return reading;
        }
        fallback = Some(reading);
    }
    fallback.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Caches the viewport window for the current check pass.
#[derive(Debug, Clone, Default)]
pub struct ViewportTracker {
    window: ViewportWindow,
    margin: f64,
}

impl ViewportTracker {
    /// Create a tracker that widens the window by `margin` at both ends.
    pub fn new(margin: f64) -> Self {
        Self {
            window: ViewportWindow::default(),
            margin,
        }
    }

    /// Re-read the scroll state and overwrite the cached window.
    pub fn refresh<M: ScrollMetrics + ?Sized>(&mut self, metrics: &M) -> ViewportWindow {
        let offset = scroll_offset(metrics);
        let length = metrics.viewport_length().max(0.0);
        self.window = ViewportWindow {
            min: offset - self.margin,
            max: offset + length + self.margin,
        };
        self.window
    }

    /// Window computed by the last refresh.
    pub fn window(&self) -> ViewportWindow {
        self.window
    }
}
