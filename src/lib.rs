//! # Plotmark
//!
//! Draws labeled rectangles onto PNG and JPEG images and hands back the
//! result encoded in the same format it came in. Images can come from a URL,
//! a file on disk, or a buffer already in memory.
//!
//! ```no_run
//! use plotmark::{PlotEntry, PlotRect, plot_image_from_path};
//!
//! let plots = [PlotEntry::new(PlotRect::new(10, 10, 50, 50), "cat")];
//! let jpeg = plot_image_from_path("photo.jpg", &plots)?;
//! # Ok::<(), plotmark::PlotError>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! source (URL | file | bytes) → detect format → decode → draw → encode (same format)
//! ```
//!
//! Each call is independent: no caching, no shared state, nothing written to
//! disk. A call either returns the full encoded image or an error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Format detection, decode/encode, rectangle and label drawing |
//! | [`source`] | The [`ImageSource`] trait and its URL, file and in-memory adapters |
//! | [`annotator`] | [`Annotator`] facade and the `plot_image_from_*` shorthands |
//! | [`config`] | `plotmark.toml` loading, validation and merging over stock defaults |
//! | [`notify`] | LINE Notify client for sending annotated images on |
//!
//! # Design Decisions
//!
//! ## Same Format Out As In
//!
//! The output format is whatever the input's header bytes say, never the file
//! extension or a content-type header. PNG stays lossless; JPEG is re-encoded
//! at the configured quality (75 by default). Anything that is not PNG or JPEG
//! is rejected with a typed error rather than transcoded.
//!
//! ## Draw Order Is Caller Order
//!
//! Entries are drawn in the order given. Overlapping boxes and labels are not
//! rearranged: the last one drawn wins. Rectangles are clipped to the canvas,
//! entries with no area are skipped, and entries entirely off the canvas leave
//! the image untouched.
//!
//! ## Bundled Font
//!
//! Labels use DejaVu Sans Bold compiled into the library, so output is the
//! same on every machine and no system font lookup happens at runtime.
//!
//! ## Blocking I/O
//!
//! URL sources and the notify client use `reqwest`'s blocking client with a
//! fixed timeout. There is no async runtime to set up and no retry logic.

pub mod annotator;
pub mod config;
pub mod imaging;
pub mod notify;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use annotator::{
    Annotator, PlotError, plot_image_from_bytes, plot_image_from_path, plot_image_from_url,
};
pub use config::{AnnotateConfig, ConfigError, load_config};
pub use imaging::{ImagingError, PlotEntry, PlotRect, PlotStyle, Quality, SourceFormat};
pub use notify::{MessageOptions, Notifier, NotifyError, NotifyResponse};
pub use source::{BytesSource, FileSource, ImageSource, SourceError, UrlSource};
