//! Placement of the floating drag preview.
//!
//! The preview sits just below-right of the pointer and flips to the
//! other side of the pointer when it would cross the right or bottom
//! edge of the viewport. The result is clamped so the preview is never
//! placed off-screen.

use serde::{Deserialize, Serialize};

/// Gap between the pointer hot-spot and the preview's corner, in pixels.
pub const CURSOR_GAP: f64 = 2.0;

/// Distance from the right viewport edge at which the preview flips left.
pub const RIGHT_EDGE_MARGIN: f64 = 25.0;

/// Distance from the bottom viewport edge at which the preview flips up.
pub const BOTTOM_EDGE_MARGIN: f64 = 5.0;

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The visible client area and its vertical scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Document scroll offset added to client coordinates to get page
    /// coordinates.
    pub scroll_y: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64, scroll_y: f64) -> Self {
        Self {
            width,
            height,
            scroll_y,
        }
    }
}

/// Compute the page position of a `popup` anchored at the client-space
/// `pointer`.
pub fn popup_position(pointer: Point, popup: Size, viewport: Viewport) -> Point {
    let mut left = pointer.x + CURSOR_GAP;
    let mut top = viewport.scroll_y + pointer.y + CURSOR_GAP;

    if pointer.x + popup.width > viewport.width - RIGHT_EDGE_MARGIN {
        left -= popup.width;
    }
    if pointer.y + popup.height > viewport.height - BOTTOM_EDGE_MARGIN {
        top -= popup.height;
    }

    let max_left = (viewport.width - popup.width).max(0.0);
    let min_top = viewport.scroll_y;
    let max_top = viewport.scroll_y + (viewport.height - popup.height).max(0.0);

    Point::new(left.clamp(0.0, max_left), top.clamp(min_top, max_top))
}
