//! Where image bytes come from.
//!
//! The [`ImageSource`] trait is the one capability the annotation core needs
//! from the outside world: "give me the encoded bytes, or fail". Three
//! implementations cover the supported inputs:
//!
//! | Source | Acquisition | Failure modes |
//! |---|---|---|
//! | [`UrlSource`] | blocking HTTP GET (`reqwest`) with a fixed timeout | bad URL, network, timeout, non-2xx |
//! | [`FileSource`] | `std::fs::read` | missing / unreadable file |
//! | [`BytesSource`] | caller-owned buffer | none |
//!
//! URL and file sources whose path carries an explicit extension other than
//! `png`, `jpg` or `jpeg` are rejected before any I/O. Sources without an
//! extension are accepted and left to content sniffing.

use crate::imaging::SourceFormat;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Upper bound on a single URL fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_USER_AGENT: &str = concat!("plotmark/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unsupported file extension `.{extension}` for {source_name} (expected png, jpg or jpeg)")]
    UnsupportedExtension {
        source_name: String,
        extension: String,
    },
}

/// Something that can produce encoded image bytes.
///
/// Implementations only fetch; they never decode. Decoding errors belong to
/// the annotation core.
pub trait ImageSource {
    /// Obtain the full encoded image.
    fn fetch(&self) -> Result<Vec<u8>, SourceError>;

    /// Short human-readable description for log fields.
    fn describe(&self) -> String;
}

/// Reject paths whose extension names a format other than PNG/JPEG.
fn check_extension(path: &Path, source_name: &str) -> Result<(), SourceError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if SourceFormat::from_extension(ext).is_none() => {
            Err(SourceError::UnsupportedExtension {
                source_name: source_name.to_string(),
                extension: ext.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// URL
// =============================================================================

/// Fetch an image over HTTP(S).
#[derive(Debug, Clone)]
pub struct UrlSource {
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self) -> Result<Url, SourceError> {
        let url = Url::parse(&self.url).map_err(|e| SourceError::InvalidUrl {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl {
                url: self.url.clone(),
                message: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        check_extension(Path::new(url.path()), &self.url)?;
        Ok(url)
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                url: self.url.clone(),
                timeout: self.timeout,
            }
        } else {
            SourceError::Http {
                url: self.url.clone(),
                source: err,
            }
        }
    }
}

impl ImageSource for UrlSource {
    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let url = self.parse()?;
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| self.map_reqwest_error(e))?;

        let response = client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| self.map_reqwest_error(e))?;
        debug!(url = %self.url, len = bytes.len(), "fetched image");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// =============================================================================
// File
// =============================================================================

/// Read an image from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        check_extension(&self.path, &self.path.display().to_string())?;
        let bytes = std::fs::read(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), len = bytes.len(), "read image file");
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Bytes the caller already holds.
#[derive(Debug, Clone, Copy)]
pub struct BytesSource<'a> {
    bytes: &'a [u8],
}

impl<'a> BytesSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl ImageSource for BytesSource<'_> {
    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        Ok(self.bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("<{} bytes>", self.bytes.len())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::{OneShotServer, white_canvas_bytes};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Mock source that hands out canned results and counts fetches.
    pub struct MockSource {
        pub result: Result<Vec<u8>, String>,
        pub fetches: Cell<usize>,
    }

    impl MockSource {
        pub fn ok(bytes: Vec<u8>) -> Self {
            Self {
                result: Ok(bytes),
                fetches: Cell::new(0),
            }
        }

        pub fn failing(path: &str) -> Self {
            Self {
                result: Err(path.to_string()),
                fetches: Cell::new(0),
            }
        }
    }

    impl ImageSource for MockSource {
        fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            self.fetches.set(self.fetches.get() + 1);
            match &self.result {
                Ok(bytes) => Ok(bytes.clone()),
                Err(path) => Err(SourceError::Io {
                    path: PathBuf::from(path),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
            }
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    #[test]
    fn mock_counts_fetches() {
        let mock = MockSource::ok(vec![1, 2, 3]);
        assert_eq!(mock.fetch().unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.fetch().unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.fetches.get(), 2);
    }

    #[test]
    fn bytes_source_returns_buffer() {
        let data = b"anything at all".to_vec();
        let source = BytesSource::new(&data);
        assert_eq!(source.fetch().unwrap(), data);
        assert_eq!(source.describe(), "<15 bytes>");
    }

    #[test]
    fn file_source_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("image_test.png");
        let png = white_canvas_bytes(SourceFormat::Png, 10, 10);
        std::fs::write(&path, &png).unwrap();

        assert_eq!(FileSource::new(&path).fetch().unwrap(), png);
    }

    #[test]
    fn file_source_missing_file_is_io_error() {
        let result = FileSource::new("/nonexistent/xxx.jpg").fetch();
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn file_source_rejects_webp_before_reading() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("image_test.webp");
        // even a real PNG behind a .webp name is refused
        std::fs::write(&path, white_canvas_bytes(SourceFormat::Png, 4, 4)).unwrap();

        let result = FileSource::new(&path).fetch();
        assert!(matches!(
            result,
            Err(SourceError::UnsupportedExtension { extension, .. }) if extension == "webp"
        ));
    }

    #[test]
    fn file_source_accepts_uppercase_and_missing_extension() {
        let tmp = TempDir::new().unwrap();
        let png = white_canvas_bytes(SourceFormat::Png, 4, 4);
        for name in ["UPPER.PNG", "photo.JPG", "no_extension"] {
            let path = tmp.path().join(name);
            std::fs::write(&path, &png).unwrap();
            assert!(FileSource::new(&path).fetch().is_ok(), "{name} rejected");
        }
    }

    #[test]
    fn url_source_rejects_webp_without_request() {
        let result = UrlSource::new("https://picsum.photos/200.webp").fetch();
        assert!(matches!(
            result,
            Err(SourceError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn url_source_rejects_unparsable_and_non_http_urls() {
        assert!(matches!(
            UrlSource::new("not a url").fetch(),
            Err(SourceError::InvalidUrl { .. })
        ));
        assert!(matches!(
            UrlSource::new("file:///etc/image.png").fetch(),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn url_source_fetches_body() {
        let png = white_canvas_bytes(SourceFormat::Png, 12, 12);
        let server = OneShotServer::respond(200, "image/png", png.clone());

        let bytes = UrlSource::new(server.url("/img16.png")).fetch().unwrap();
        assert_eq!(bytes, png);

        let request = server.finish();
        assert!(request.starts_with("GET /img16.png HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("user-agent: plotmark/"));
    }

    #[test]
    fn url_source_without_extension_is_fetched() {
        let jpeg = white_canvas_bytes(SourceFormat::Jpeg, 12, 12);
        let server = OneShotServer::respond(200, "image/jpeg", jpeg.clone());

        let bytes = UrlSource::new(server.url("/200")).fetch().unwrap();
        assert_eq!(bytes, jpeg);
        server.finish();
    }

    #[test]
    fn url_source_non_2xx_is_status_error() {
        let server = OneShotServer::respond(404, "text/plain", b"not found".to_vec());

        let result = UrlSource::new(server.url("/missing.png")).fetch();
        assert!(matches!(
            result,
            Err(SourceError::Status { status: 404, .. })
        ));
        server.finish();
    }

    #[test]
    fn url_source_times_out() {
        let server = OneShotServer::respond_after(
            Duration::from_millis(1500),
            200,
            "image/png",
            Vec::new(),
        );

        let result = UrlSource::new(server.url("/slow.png"))
            .with_timeout(Duration::from_millis(200))
            .fetch();
        assert!(matches!(result, Err(SourceError::Timeout { .. })));
        server.finish();
    }

    #[test]
    fn url_source_connection_refused_is_http_error() {
        // bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let result = UrlSource::new(format!("http://127.0.0.1:{port}/x.png")).fetch();
        assert!(matches!(result, Err(SourceError::Http { .. })));
    }
}
