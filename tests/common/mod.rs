//! Fixtures shared by the integration tests: encoded white canvases, the
//! two-rectangle plot list, and a loopback HTTP server that answers once.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use plotmark::{PlotEntry, PlotRect};
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A solid white canvas encoded as `format`.
pub fn white(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn plots() -> Vec<PlotEntry> {
    vec![
        PlotEntry::new(PlotRect::new(10, 10, 50, 50), "Test Label 1"),
        PlotEntry::new(PlotRect::new(0, 0, 5, 5), "Test Label 2"),
    ]
}

/// Answers exactly one request with a canned response. [`Stub::finish`]
/// returns the raw request text.
pub struct Stub {
    base: String,
    handle: JoinHandle<String>,
}

impl Stub {
    /// `status_line` is e.g. `"200 OK"`.
    pub fn respond(status_line: &'static str, content_type: &'static str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let request = read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            String::from_utf8_lossy(&request).into_owned()
        });
        Self { base, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn base_url(&self) -> String {
        self.base.clone()
    }

    pub fn finish(self) -> String {
        self.handle.join().unwrap()
    }
}

/// Headers up to the blank line, then `Content-Length` bytes of body.
fn read_request(stream: &mut impl Read) -> Vec<u8> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
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
