//! Shared PDF handling utilities
//!
//! This crate provides page geometry extraction and the coordinate
//! transformation between rendered pages and PDF document space.

pub mod coords;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;

pub use coords::{clamp_move, clamp_to_page, scale_for, to_document, to_screen, Viewport};
pub use error::PdfError;
pub use parser::PdfDocument;
