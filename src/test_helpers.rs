//! Shared test utilities for the plotmark test suite.
//!
//! Provides synthetic images, the two-rectangle plot fixture used across the
//! annotation tests, and a one-shot HTTP server so URL sources and the
//! notify client can be exercised without network access.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = white_canvas_bytes(SourceFormat::Png, 200, 200);
//! let server = OneShotServer::respond(200, "image/png", png.clone());
//! let bytes = UrlSource::new(server.url("/img.png")).fetch().unwrap();
//! assert_eq!(bytes, png);
//! let request = server.finish();
//! assert!(request.starts_with("GET /img.png"));
//! ```

use crate::imaging::{PlotEntry, PlotRect, Quality, SourceFormat, encode};
use image::{DynamicImage, Rgb, RgbImage};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// =========================================================================
// Synthetic images
// =========================================================================

/// A solid white RGB canvas.
pub fn white_canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// A solid white canvas encoded as `format`.
pub fn white_canvas_bytes(format: SourceFormat, width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(white_canvas(width, height));
    encode(&img, format, Quality::default()).unwrap()
}

/// `(10,10)-(50,50) "Test Label 1"` and `(0,0)-(5,5) "Test Label 2"`.
pub fn sample_plots() -> Vec<PlotEntry> {
    vec![
        PlotEntry::new(PlotRect::new(10, 10, 50, 50), "Test Label 1"),
        PlotEntry::new(PlotRect::new(0, 0, 5, 5), "Test Label 2"),
    ]
}

// =========================================================================
// One-shot HTTP server
// =========================================================================

/// Serves exactly one canned HTTP response on a loopback port, then stops.
///
/// The raw request (head and body) is handed back by [`OneShotServer::finish`]
/// so tests can assert on what the client sent.
pub struct OneShotServer {
    addr: String,
    handle: JoinHandle<Vec<u8>>,
}

impl OneShotServer {
    pub fn respond(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self::respond_after(Duration::ZERO, status, content_type, body)
    }

    /// Like [`respond`](Self::respond), but sleeps before answering.
    pub fn respond_after(delay: Duration, status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let content_type = content_type.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let request = read_request(&mut stream);
            thread::sleep(delay);
            let head = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reason(status),
                body.len()
            );
            // The client may already have hung up after a timeout.
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            request
        });

        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for the server thread and return the request it received.
    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.handle.join().unwrap()).into_owned()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Read one request: headers up to the blank line, then `Content-Length` bytes.
fn read_request(stream: &mut impl Read) -> Vec<u8> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return data,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
        }
    }
    data
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
