//! Coordinate transformation between screen pixels and PDF document space
//!
//! Document space has its origin at the bottom-left of the page with y increasing
//! upward, in PDF points. Screen space has its origin at the top-left of the rendered
//! page with y increasing downward, in CSS pixels. Pages are rendered fit-to-width,
//! so a single uniform scale maps both axes.

use shared_types::{DocRect, PageSize, ScreenRect};

/// Scale factor for a page rendered `width_px` pixels wide.
///
/// Returns `None` until both the page and the container have a positive width.
pub fn scale_for(page: PageSize, width_px: f64) -> Option<f64> {
    if page.width > 0.0 && width_px > 0.0 {
        Some(width_px / page.width)
    } else {
        None
    }
}

/// Convert a document point to a screen point (flips the Y axis)
pub fn doc_to_screen(doc_x: f64, doc_y: f64, page: PageSize, scale: f64) -> (f64, f64) {
    (doc_x * scale, (page.height - doc_y) * scale)
}

/// Convert a screen point to a document point (flips the Y axis)
pub fn screen_to_doc(screen_x: f64, screen_y: f64, page: PageSize, scale: f64) -> (f64, f64) {
    (screen_x / scale, page.height - screen_y / scale)
}

/// Map a document rectangle to the on-screen rectangle that renders it.
///
/// The screen rectangle's origin is the document rectangle's top-left corner.
pub fn to_screen(rect: DocRect, page: PageSize, scale: f64) -> ScreenRect {
    let (x, y) = doc_to_screen(rect.x, rect.top(), page, scale);
    ScreenRect::new(x, y, rect.width * scale, rect.height * scale)
}

/// Map an on-screen rectangle back to document space
pub fn to_document(screen: ScreenRect, page: PageSize, scale: f64) -> DocRect {
    let width = screen.width / scale;
    let height = screen.height / scale;
    let (x, top) = screen_to_doc(screen.x, screen.y, page, scale);
    DocRect::new(x, top - height, width, height)
}

/// Fit a resized rectangle inside the page.
///
/// Size is clamped first: whatever hangs off the page on any side is cut away, so an
/// edge dragged past the boundary stops at the boundary instead of pushing the
/// rectangle. The origin is then clamped onto the page.
pub fn clamp_to_page(rect: DocRect, page: PageSize) -> DocRect {
    let left = rect.x.max(0.0).min(page.width);
    let bottom = rect.y.max(0.0).min(page.height);
    let width = (rect.right().min(page.width) - left).max(0.0);
    let height = (rect.top().min(page.height) - bottom).max(0.0);
    DocRect::new(left, bottom, width, height)
}

/// Fit a moved rectangle inside the page, preserving its size where possible
pub fn clamp_move(rect: DocRect, page: PageSize) -> DocRect {
    let width = rect.width.max(0.0).min(page.width);
    let height = rect.height.max(0.0).min(page.height);
    let x = rect.x.min(page.width - width).max(0.0);
    let y = rect.y.min(page.height - height).max(0.0);
    DocRect::new(x, y, width, height)
}

/// A page rendered fit-to-width inside a container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    page: PageSize,
    width_px: f64,
}

impl Viewport {
    pub fn fit_width(page: PageSize, width_px: f64) -> Self {
        Self { page, width_px }
    }

    pub fn page(&self) -> PageSize {
        self.page
    }

    /// Current scale; native size (1.0) until the container has been measured
    pub fn scale(&self) -> f64 {
        scale_for(self.page, self.width_px).unwrap_or(1.0)
    }

    /// Height of the rendered page, i.e. of the field overlay
    pub fn height_px(&self) -> f64 {
        self.page.height * self.scale()
    }

    /// Container width changed (window resize)
    pub fn resize(&mut self, width_px: f64) {
        self.width_px = width_px;
    }

    pub fn to_screen(&self, rect: DocRect) -> ScreenRect {
        to_screen(rect, self.page, self.scale())
    }

    pub fn to_document(&self, screen: ScreenRect) -> DocRect {
        to_document(screen, self.page, self.scale())
    }
}
