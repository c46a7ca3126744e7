//! The public entry point: fetch an image from a source, annotate it, return
//! the re-encoded bytes.
//!
//! [`Annotator`] holds the resolved style, JPEG quality and fetch settings
//! from an [`AnnotateConfig`]. The `plot_image_from_*` functions are
//! shorthands that use the stock configuration.
//!
//! ```no_run
//! use plotmark::{PlotEntry, PlotRect, plot_image_from_url};
//!
//! let plots = vec![
//!     PlotEntry::new(PlotRect::new(10, 10, 50, 50), "Test Label 1"),
//!     PlotEntry::new(PlotRect::new(0, 0, 5, 5), "Test Label 2"),
//! ];
//! let png = plot_image_from_url("https://picsum.photos/200.png", &plots)?;
//! std::fs::write("annotated.png", png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::{AnnotateConfig, ConfigError};
use crate::imaging::{ImagingError, PlotEntry, PlotStyle, Quality, annotate};
use crate::source::{BytesSource, FileSource, ImageSource, SourceError, UrlSource};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

/// Annotates images with a fixed style.
#[derive(Debug, Clone)]
pub struct Annotator {
    style: PlotStyle,
    quality: Quality,
    fetch_timeout: Duration,
    user_agent: String,
}

impl Default for Annotator {
    fn default() -> Self {
        let config = AnnotateConfig::default();
        Self {
            style: PlotStyle::default(),
            quality: config.encode.quality(),
            fetch_timeout: config.fetch.timeout(),
            user_agent: config.fetch.user_agent,
        }
    }
}

impl Annotator {
    /// Validate `config` and resolve it into draw-time settings.
    pub fn new(config: &AnnotateConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            style: config.style.resolve()?,
            quality: config.encode.quality(),
            fetch_timeout: config.fetch.timeout(),
            user_agent: config.fetch.user_agent.clone(),
        })
    }

    pub fn style(&self) -> &PlotStyle {
        &self.style
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn annotate_bytes(&self, bytes: &[u8], plots: &[PlotEntry]) -> Result<Vec<u8>, PlotError> {
        self.annotate_source(&BytesSource::new(bytes), plots)
    }

    pub fn annotate_path(
        &self,
        path: impl AsRef<Path>,
        plots: &[PlotEntry],
    ) -> Result<Vec<u8>, PlotError> {
        self.annotate_source(&FileSource::new(path.as_ref()), plots)
    }

    /// Fetch over HTTP(S) using the configured timeout and user agent.
    pub fn annotate_url(&self, url: &str, plots: &[PlotEntry]) -> Result<Vec<u8>, PlotError> {
        let source = UrlSource::new(url)
            .with_timeout(self.fetch_timeout)
            .with_user_agent(self.user_agent.as_str());
        self.annotate_source(&source, plots)
    }

    pub fn annotate_source(
        &self,
        source: &impl ImageSource,
        plots: &[PlotEntry],
    ) -> Result<Vec<u8>, PlotError> {
        let bytes = source.fetch()?;
        debug!(source = %source.describe(), len = bytes.len(), "annotating");
        Ok(annotate(&bytes, plots, &self.style, self.quality)?)
    }
}

/// Annotate an in-memory PNG or JPEG with the stock style.
pub fn plot_image_from_bytes(bytes: &[u8], plots: &[PlotEntry]) -> Result<Vec<u8>, PlotError> {
    Annotator::default().annotate_bytes(bytes, plots)
}

/// Annotate a PNG or JPEG file with the stock style.
pub fn plot_image_from_path(
    path: impl AsRef<Path>,
    plots: &[PlotEntry],
) -> Result<Vec<u8>, PlotError> {
    Annotator::default().annotate_path(path, plots)
}

/// Download and annotate a PNG or JPEG with the stock style.
pub fn plot_image_from_url(url: &str, plots: &[PlotEntry]) -> Result<Vec<u8>, PlotError> {
    Annotator::default().annotate_url(url, plots)
}
