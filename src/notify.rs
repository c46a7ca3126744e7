//! LINE Notify client.
//!
//! Posts a message, optionally with a sticker and a PNG/JPEG attachment, to
//! the LINE Notify API, and checks whether an access token is still valid.
//! Pairs naturally with [`crate::annotator`]: annotate an image, then send
//! the result.
//!
//! ```no_run
//! use plotmark::notify::{MessageOptions, Notifier};
//!
//! # fn main() -> Result<(), plotmark::notify::NotifyError> {
//! let notifier = Notifier::new("access-token");
//! notifier.check_status()?;
//! let options = MessageOptions::new().with_sticker(446, 1988);
//! let response = notifier.send("build finished", Some(&options))?;
//! println!("{} {}", response.status, response.message);
//! # Ok(())
//! # }
//! ```
//!
//! Every request runs on a fresh blocking client bounded by the configured
//! timeout.

use crate::config::NotifyConfig;
use crate::imaging::{ImagingError, decode};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("stickerPackageId is required when stickerId is set")]
    StickerPackageIdMissing,
    #[error("stickerId is required when stickerPackageId is set")]
    StickerIdMissing,
    #[error("attached image is not a decodable PNG or JPEG: {0}")]
    ImageDecode(#[source] ImagingError),
    #[error("notify request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid access token (status {status}: {message})")]
    InvalidAccessToken { status: i32, message: String },
}

/// Body returned by the API. Errors are reported here rather than through
/// the HTTP status line, so callers should inspect `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub message: String,
}

/// Optional parts of a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// Encoded PNG or JPEG to attach.
    pub image_file: Option<Vec<u8>>,
    pub sticker_package_id: Option<u32>,
    pub sticker_id: Option<u32>,
    /// Deliver without a push notification.
    pub notification_disabled: bool,
}

impl MessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image_file = Some(bytes);
        self
    }

    pub fn with_sticker(mut self, package_id: u32, sticker_id: u32) -> Self {
        self.sticker_package_id = Some(package_id);
        self.sticker_id = Some(sticker_id);
        self
    }

    pub fn silent(mut self) -> Self {
        self.notification_disabled = true;
        self
    }
}

#[derive(Clone)]
pub struct Notifier {
    access_token: String,
    api_base: String,
    timeout: Duration,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("access_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Notifier {
    /// Client for the public API with the default 30 second timeout.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_config(access_token, &NotifyConfig::default())
    }

    pub fn with_config(access_token: impl Into<String>, config: &NotifyConfig) -> Self {
        Self {
            access_token: access_token.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }

    /// Send `message`. Options are validated before anything goes over the
    /// wire.
    pub fn send(
        &self,
        message: &str,
        options: Option<&MessageOptions>,
    ) -> Result<NotifyResponse, NotifyError> {
        let form = build_form(message, options)?;
        let response = self
            .client()?
            .post(self.endpoint("notify"))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()?;
        let result = read_response(response)?;
        debug!(status = result.status, "notify message sent");
        Ok(result)
    }

    /// Confirm the access token is accepted by the API.
    pub fn check_status(&self) -> Result<(), NotifyError> {
        let response = self
            .client()?
            .get(self.endpoint("status"))
            .bearer_auth(&self.access_token)
            .send()?;
        let result = read_response(response)?;
        if result.status != 200 {
            return Err(NotifyError::InvalidAccessToken {
                status: result.status,
                message: result.message,
            });
        }
        Ok(())
    }

    fn client(&self) -> Result<Client, NotifyError> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{name}", self.api_base)
    }
}

fn build_form(message: &str, options: Option<&MessageOptions>) -> Result<Form, NotifyError> {
    if message.is_empty() {
        return Err(NotifyError::EmptyMessage);
    }
    let mut form = Form::new().text("message", message.to_string());

    let Some(options) = options else {
        return Ok(form);
    };

    match (options.sticker_package_id, options.sticker_id) {
        (Some(package_id), Some(sticker_id)) => {
            form = form
                .text("stickerPackageId", package_id.to_string())
                .text("stickerId", sticker_id.to_string());
        }
        (None, Some(_)) => return Err(NotifyError::StickerPackageIdMissing),
        (Some(_), None) => return Err(NotifyError::StickerIdMissing),
        (None, None) => {}
    }

    if let Some(bytes) = options.image_file.as_ref().filter(|b| !b.is_empty()) {
        let format = decode(bytes).map_err(NotifyError::ImageDecode)?.format;
        let part = Part::bytes(bytes.clone())
            .file_name(format!("image.{}", format.extension()))
            .mime_str(format.mime_type())?;
        form = form.part("imageFile", part);
    }

    if options.notification_disabled {
        form = form.text("notificationDisabled", "true");
    }
    Ok(form)
}

/// Parse the in-band JSON body. A body that isn't the expected JSON falls
/// back to the HTTP status with an empty message.
fn read_response(response: Response) -> Result<NotifyResponse, NotifyError> {
    let http_status = response.status().as_u16();
    let body = response.bytes()?;
    Ok(
        serde_json::from_slice(&body).unwrap_or_else(|_| NotifyResponse {
            status: i32::from(http_status),
            message: String::new(),
        }),
    )
}
