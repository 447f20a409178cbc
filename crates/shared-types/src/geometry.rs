//! Page and rectangle geometry shared by the editor, the PDF layer and the API

use serde::{Deserialize, Serialize};

/// Native size of a PDF page in document units (points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter, 8.5in x 11in
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }
}

/// Geometry of one page as exposed over the API (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in document coordinates.
///
/// `(x, y)` is the lower-left corner, measured from the page's bottom-left origin,
/// with y increasing upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// True when the rectangle lies entirely inside the page
    pub fn is_within(&self, page: PageSize) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= page.width && self.top() <= page.height
    }

    /// Round the edges to the nearest whole document unit.
    ///
    /// Returns `[x, y, width, height]`; width and height are the distances between
    /// rounded edges, so a rectangle touching an integer boundary still touches it.
    pub fn rounded(&self) -> [i64; 4] {
        let x = self.x.round() as i64;
        let y = self.y.round() as i64;
        let right = self.right().round() as i64;
        let top = self.top().round() as i64;
        [x, y, right - x, top - y]
    }
}

/// Rectangle in on-screen pixels: top-left origin, y increasing downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
