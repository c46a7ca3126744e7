//! Pure geometry for annotation drawing.
//!
//! All functions here are pure and testable without any I/O or images.
//! Arithmetic is done in `i64` so callers can pass extreme `i32` coordinates
//! without overflow; only the clipped result is narrowed back to `u32`.

use super::params::PlotRect;

/// The visible part of a shape after clipping to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Intersect the half-open box `x0..x1 × y0..y1` with a `width × height` canvas.
///
/// Returns `None` when nothing of the box is visible.
///
/// # Examples
/// ```
/// # use plotmark::imaging::{CanvasBox, clip_to_canvas};
/// // Partly off the top-left corner → only the visible quarter remains
/// assert_eq!(
///     clip_to_canvas(-10, -10, 10, 10, (100, 100)),
///     Some(CanvasBox { left: 0, top: 0, width: 10, height: 10 })
/// );
///
/// // Entirely to the right of the canvas
/// assert_eq!(clip_to_canvas(150, 0, 200, 50, (100, 100)), None);
/// ```
pub fn clip_to_canvas(x0: i64, y0: i64, x1: i64, y1: i64, canvas: (u32, u32)) -> Option<CanvasBox> {
    let (width, height) = (i64::from(canvas.0), i64::from(canvas.1));

    let left = x0.max(0);
    let top = y0.max(0);
    let right = x1.min(width);
    let bottom = y1.min(height);

    if right <= left || bottom <= top {
        return None;
    }

    Some(CanvasBox {
        left: left as u32,
        top: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Whether any pixel of `rect` lands on the canvas.
pub fn intersects_canvas(rect: &PlotRect, canvas: (u32, u32)) -> bool {
    clip_to_canvas(
        rect.x0.into(),
        rect.y0.into(),
        rect.x1.into(),
        rect.y1.into(),
        canvas,
    )
    .is_some()
}

/// Split a rectangle outline into four filled strips: top, bottom, left, right.
///
/// Each strip is a half-open `(x0, y0, x1, y1)` box `stroke` pixels thick,
/// lying on the inside of the rectangle edge. Strips are capped at the
/// rectangle size, so a thick stroke on a small rectangle fills it solid.
pub fn outline_strips(rect: &PlotRect, stroke: u32) -> [(i64, i64, i64, i64); 4] {
    let (x0, y0, x1, y1) = (
        i64::from(rect.x0),
        i64::from(rect.y0),
        i64::from(rect.x1),
        i64::from(rect.y1),
    );
    let sx = i64::from(stroke.max(1)).min(x1 - x0);
    let sy = i64::from(stroke.max(1)).min(y1 - y0);

    [
        (x0, y0, x1, y0 + sy),
        (x0, y1 - sy, x1, y1),
        (x0, y0, x0 + sx, y1),
        (x1 - sx, y0, x1, y1),
    ]
}

/// How far left of / above the canvas a label origin is kept.
///
/// Labels are never this wide, so pinning an origin here leaves the visible
/// result unchanged while keeping glyph placement inside `i32` range.
pub const LABEL_REACH: i64 = 1 << 20;

/// Top-left corner of a rectangle's label, pinned to
/// `-LABEL_REACH..=canvas` on each axis.
pub fn label_origin(rect: &PlotRect, offset: (i32, i32), canvas: (u32, u32)) -> (i32, i32) {
    let x = i64::from(rect.x0) + i64::from(offset.0);
    let y = i64::from(rect.y0) + i64::from(offset.1);
    (
        x.clamp(-LABEL_REACH, i64::from(canvas.0)) as i32,
        y.clamp(-LABEL_REACH, i64::from(canvas.1)) as i32,
    )
}
