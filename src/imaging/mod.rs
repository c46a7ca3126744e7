//! Image annotation: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Detect** | signature sniff, PNG then JPEG |
//! | **Decode / encode** | `image` (PNG, JPEG codecs only) |
//! | **Outline** | `imageproc::drawing::draw_filled_rect_mut`, one strip per edge |
//! | **Label** | `imageproc::drawing::draw_text_mut` + bundled DejaVu Sans Bold (`ab_glyph`) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for clipping and label placement (unit testable)
//! - **Parameters**: Data structures describing what to draw
//! - **Codec**: format detection, decode, same-format encode
//! - **Operations**: the [`annotate`] routine combining the three

mod calculations;
pub mod codec;
pub mod operations;
mod params;

pub use calculations::{CanvasBox, clip_to_canvas};
pub use codec::{DecodedImage, ImagingError, SourceFormat, decode, detect_format, encode};
pub use operations::{annotate, draw_plots};
pub use params::{LABEL_SIZE_RANGE, PlotEntry, PlotRect, PlotStyle, Quality, STROKE_WIDTH_RANGE};
