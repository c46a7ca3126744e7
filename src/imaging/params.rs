//! Parameter types for annotation.
//!
//! These structs describe *what* to draw, not *how* to draw it. They are the
//! interface between callers (and the [`config`](crate::config) layer) and the
//! [`operations`](super::operations) module, which does the actual pixel work.
//!
//! ## Types
//!
//! - [`PlotRect`]: Half-open pixel rectangle `x0..x1 × y0..y1`. May extend past the canvas.
//! - [`PlotEntry`]: One rectangle plus the label drawn at its top-left corner.
//! - [`Quality`]: Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`PlotStyle`]: Stroke and label appearance shared by every entry of a call.

use super::codec::ImagingError;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Rectangle in image pixel space.
///
/// Coordinates are half-open: the rectangle covers columns `x0..x1` and rows
/// `y0..y1`. They may lie partially or fully outside the image; drawing clips
/// them to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PlotRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Zero or negative width/height. Such entries are skipped when drawing.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// A rectangle and the label rendered near its top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotEntry {
    pub rect: PlotRect,
    #[serde(default)]
    pub label: String,
}

impl PlotEntry {
    pub fn new(rect: PlotRect, label: impl Into<String>) -> Self {
        Self {
            rect,
            label: label.into(),
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    /// Same as `image::codecs::jpeg::JpegEncoder::new`.
    fn default() -> Self {
        Self(75)
    }
}

/// Accepted outline thicknesses, in pixels.
pub const STROKE_WIDTH_RANGE: RangeInclusive<u32> = 1..=32;

/// Accepted label font heights, in pixels. Rasterizing one glyph allocates
/// about `size²` bytes.
pub const LABEL_SIZE_RANGE: RangeInclusive<f32> = 4.0..=256.0;

/// Appearance of outlines and labels.
///
/// Resolved once from [`StyleConfig`](crate::config::StyleConfig) so the draw
/// loop works with ready-made pixels instead of strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotStyle {
    pub stroke_color: Rgba<u8>,
    /// Outline thickness in pixels, drawn inward from the rectangle edge.
    pub stroke_width: u32,
    pub label_color: Rgba<u8>,
    /// Font height in pixels.
    pub label_size: f32,
    /// Offset of the label's top-left corner from the rectangle's top-left corner.
    pub label_offset: (i32, i32),
    /// Optional box filled behind each label.
    pub label_background: Option<Rgba<u8>>,
}

impl PlotStyle {
    /// Check `stroke_width` and `label_size` against [`STROKE_WIDTH_RANGE`]
    /// and [`LABEL_SIZE_RANGE`].
    pub fn validate(&self) -> Result<(), ImagingError> {
        if !STROKE_WIDTH_RANGE.contains(&self.stroke_width) {
            return Err(ImagingError::InvalidStyle(format!(
                "stroke_width {} outside {}-{}",
                self.stroke_width,
                STROKE_WIDTH_RANGE.start(),
                STROKE_WIDTH_RANGE.end()
            )));
        }
        if !LABEL_SIZE_RANGE.contains(&self.label_size) {
            return Err(ImagingError::InvalidStyle(format!(
                "label_size {} outside {}-{}",
                self.label_size,
                LABEL_SIZE_RANGE.start(),
                LABEL_SIZE_RANGE.end()
            )));
        }
        Ok(())
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            stroke_color: Rgba([255, 0, 0, 255]),
            stroke_width: 1,
            label_color: Rgba([255, 0, 0, 255]),
            label_size: 14.0,
            label_offset: (2, 2),
            label_background: None,
        }
    }
}
