//! The annotation routine: decode → draw → re-encode.
//!
//! [`annotate`] is a pure function of its inputs. It never touches the disk
//! or network; sources are handled by [`crate::source`].

use super::calculations::{clip_to_canvas, intersects_canvas, label_origin, outline_strips};
use super::codec::{DecodedImage, ImagingError, SourceFormat, decode, encode};
use super::params::{PlotEntry, PlotRect, PlotStyle, Quality};
use ab_glyph::{FontRef, PxScale};
use image::{ColorType, DynamicImage, ImageBuffer, Pixel, Rgba, RgbaImage};
use imageproc::definitions::Clamp;
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, trace};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

const LABEL_FONT: &[u8] = include_bytes!("../../resources/DejaVuSans-Bold.ttf");

fn label_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(LABEL_FONT).map_err(|e| ImagingError::Font(e.to_string()))
}

/// Decode `source`, draw every entry of `plots` onto it and encode the result
/// in the format the source was in.
///
/// An empty `plots` slice re-encodes the image untouched. `style` is checked
/// with [`PlotStyle::validate`] before any decoding.
pub fn annotate(
    source: &[u8],
    plots: &[PlotEntry],
    style: &PlotStyle,
    quality: Quality,
) -> Result<Vec<u8>> {
    style.validate()?;
    let DecodedImage { image, format } = decode(source)?;
    debug!(
        %format,
        width = image.width(),
        height = image.height(),
        entries = plots.len(),
        "decoded source image"
    );

    if plots.is_empty() {
        return encode(&image, format, quality);
    }

    let original_color = image.color();
    let (drawn, canvas) = if is_16_bit(original_color) {
        let mut canvas = image.into_rgba16();
        let drawn = paint(&mut canvas, plots, style, &Palette::<Rgba<u16>>::widened(style))?;
        (drawn, DynamicImage::ImageRgba16(canvas))
    } else {
        let mut canvas = image.into_rgba8();
        let drawn = paint(&mut canvas, plots, style, &Palette::<Rgba<u8>>::from_style(style))?;
        (drawn, DynamicImage::ImageRgba8(canvas))
    };
    debug!(drawn, skipped = plots.len() - drawn, "drew plot entries");

    encode(&restore_color(canvas, original_color, format), format, quality)
}

/// Draw entries in order onto `canvas`. Later entries paint over earlier ones.
///
/// Entries with an empty rectangle, or whose rectangle lies entirely off the
/// canvas, are skipped along with their label. Returns how many were drawn.
/// An out-of-range `style` is rejected with [`ImagingError::InvalidStyle`]
/// before anything is drawn.
pub fn draw_plots(
    canvas: &mut RgbaImage,
    plots: &[PlotEntry],
    style: &PlotStyle,
) -> Result<usize> {
    style.validate()?;
    paint(canvas, plots, style, &Palette::<Rgba<u8>>::from_style(style))
}

/// Style colors converted to the canvas pixel type.
struct Palette<P> {
    stroke: P,
    label: P,
    background: Option<P>,
}

impl Palette<Rgba<u8>> {
    fn from_style(style: &PlotStyle) -> Self {
        Self {
            stroke: style.stroke_color,
            label: style.label_color,
            background: style.label_background,
        }
    }
}

impl Palette<Rgba<u16>> {
    fn widened(style: &PlotStyle) -> Self {
        let widen = |c: Rgba<u8>| Rgba(c.0.map(|v| u16::from(v) * 257));
        Self {
            stroke: widen(style.stroke_color),
            label: widen(style.label_color),
            background: style.label_background.map(widen),
        }
    }
}

fn paint<P>(
    canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    plots: &[PlotEntry],
    style: &PlotStyle,
    palette: &Palette<P>,
) -> Result<usize>
where
    P: Pixel,
    P::Subpixel: Into<f32> + Clamp<f32>,
{
    let font = if plots.iter().any(|p| !p.label.is_empty()) {
        Some(label_font()?)
    } else {
        None
    };
    let dims = canvas.dimensions();
    let mut drawn = 0;

    for (idx, entry) in plots.iter().enumerate() {
        if entry.rect.is_empty() {
            trace!(idx, rect = ?entry.rect, "skipping empty rectangle");
            continue;
        }
        if !intersects_canvas(&entry.rect, dims) {
            trace!(idx, rect = ?entry.rect, "skipping off-canvas rectangle");
            continue;
        }

        draw_outline(canvas, &entry.rect, style.stroke_width, palette.stroke);
        if let Some(font) = &font {
            if !entry.label.is_empty() {
                draw_label(canvas, entry, style, palette, font);
            }
        }
        drawn += 1;
    }

    Ok(drawn)
}

fn fill_clipped<P: Pixel>(
    canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    area: (i64, i64, i64, i64),
    color: P,
) {
    let (x0, y0, x1, y1) = area;
    if let Some(visible) = clip_to_canvas(x0, y0, x1, y1, canvas.dimensions()) {
        let rect = Rect::at(visible.left as i32, visible.top as i32)
            .of_size(visible.width, visible.height);
        draw_filled_rect_mut(canvas, rect, color);
    }
}

fn draw_outline<P: Pixel>(
    canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    rect: &PlotRect,
    stroke_width: u32,
    color: P,
) {
    for strip in outline_strips(rect, stroke_width) {
        fill_clipped(canvas, strip, color);
    }
}

fn draw_label<P>(
    canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    entry: &PlotEntry,
    style: &PlotStyle,
    palette: &Palette<P>,
    font: &FontRef<'static>,
) where
    P: Pixel,
    P::Subpixel: Into<f32> + Clamp<f32>,
{
    let scale = PxScale::from(style.label_size);
    let (x, y) = label_origin(&entry.rect, style.label_offset, canvas.dimensions());

    if let Some(background) = palette.background {
        let (w, h) = text_size(scale, font, &entry.label);
        let (x, y) = (i64::from(x), i64::from(y));
        fill_clipped(
            canvas,
            (x - 1, y - 1, x + i64::from(w) + 1, y + i64::from(h) + 1),
            background,
        );
    }

    draw_text_mut(canvas, palette.label, x, y, scale, font, &entry.label);
}

fn is_16_bit(color: ColorType) -> bool {
    color.bytes_per_pixel() / color.channel_count() == 2
}

/// Convert the RGBA drawing canvas back to something `format` can hold.
///
/// PNG keeps the source's bit depth and its alpha channel if it had one.
/// Grayscale sources come back as RGB so colored outlines survive. JPEG is
/// always 8-bit RGB.
fn restore_color(canvas: DynamicImage, original: ColorType, format: SourceFormat) -> DynamicImage {
    match (format, is_16_bit(original), original.has_alpha()) {
        (SourceFormat::Png, true, true) => canvas,
        (SourceFormat::Png, true, false) => DynamicImage::ImageRgb16(canvas.to_rgb16()),
        (SourceFormat::Png, false, true) => canvas,
        _ => DynamicImage::ImageRgb8(canvas.to_rgb8()),
    }
}
