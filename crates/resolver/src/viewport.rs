//! Floating result-panel placement.
//!
//! Geometry is pure: feed it the anchor rectangle and the window width, get
//! back the panel rectangle. [`ViewportTracker`] adds the "only listen while
//! visible" lifecycle on top.

use crate::config::PanelGeometry;
use log::debug;
use serde::{Deserialize, Serialize};

/// Bounding box of the input field the panel hangs under, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.bottom()
    }

    /// A detached/unmounted anchor reports an empty box.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

/// Computed panel placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub max_height: f64,
}

impl ViewportRect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.max_height
    }
}

/// Layout-affecting events the panel must follow while visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Default)]
pub struct ViewportPositioner {
    geometry: PanelGeometry,
}

impl ViewportPositioner {
    pub const fn new(geometry: PanelGeometry) -> Self {
        Self { geometry }
    }

    /// Place the panel under `anchor`. Returns `None` for an empty anchor.
    pub fn place(&self, anchor: &AnchorRect, window: &WindowSize) -> Option<ViewportRect> {
        if anchor.is_empty() || !(window.width > 0.0) {
            return None;
        }
        let g = &self.geometry;

        let upper = (window.width - g.window_margin).max(0.0);
        let width = anchor.width.max(g.min_width).min(upper);

        let mut left = anchor.left;
        if left + width > window.width - g.edge_margin {
            left = window.width - g.edge_margin - width;
        }
        let left = left.max(g.edge_margin);

        Some(ViewportRect {
            top: anchor.bottom() + g.gap,
            left,
            width,
            max_height: g.max_height,
        })
    }
}

/// Keeps the panel rectangle current while it is showing.
///
/// Layout events are only honoured between [`show`](Self::show) and
/// [`hide`](Self::hide); outside that window the tracker is detached and
/// ignores them.
#[derive(Debug, Clone, Default)]
pub struct ViewportTracker {
    positioner: ViewportPositioner,
    attached: bool,
    rect: Option<ViewportRect>,
}

impl ViewportTracker {
    pub const fn new(positioner: ViewportPositioner) -> Self {
        Self {
            positioner,
            attached: false,
            rect: None,
        }
    }

    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    pub const fn rect(&self) -> Option<ViewportRect> {
        self.rect
    }

    /// Initial placement when the result set becomes non-empty.
    pub fn show(&mut self, anchor: &AnchorRect, window: &WindowSize) -> Option<ViewportRect> {
        self.attached = true;
        self.rect = self.positioner.place(anchor, window);
        self.rect
    }

    pub fn hide(&mut self) {
        self.attached = false;
        self.rect = None;
    }

    /// Recompute on scroll/resize. Returns the new rect if recomputed.
    pub fn on_layout(
        &mut self,
        event: LayoutEvent,
        anchor: &AnchorRect,
        window: &WindowSize,
    ) -> Option<ViewportRect> {
        if !self.attached {
            debug!("ignoring {event:?} while the panel is hidden");
            return None;
        }
        match self.positioner.place(anchor, window) {
            Some(rect) => {
                debug!("{event:?}: panel moved to {rect:?}");
                self.rect = Some(rect);
            }
            None => debug!("{event:?}: anchor is empty; keeping the last placement"),
        }
        self.rect
    }
}
