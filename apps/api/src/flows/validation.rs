//! Field-level input validation shared by every flow and the upload boundary.
//!
//! Checks return the user-facing message on failure; `Checks` attaches field names and
//! collects every problem so a form can highlight all of them at once.

use chrono::{NaiveDate, NaiveTime};
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::MediaRef;

/// Upper bound on an uploaded or inlined image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image MIME types paired with the file extension used when storing them.
pub const ACCEPTED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more input fields failed validation. Raised before any model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects field errors across several checks.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the failure under `field` and yields the checked value on success.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.errors.push(FieldError { field, message });
                None
            }
        }
    }

    pub fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }

    /// Like `finish`, but hands back a value that was only computed when every check passed.
    pub fn finish_with<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match (self.finish(), value) {
            (Ok(()), Some(value)) => Ok(value),
            (Err(e), _) => Err(e),
            (Ok(()), None) => Err(ValidationError::single("input", "Invalid input.")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Individual checks
// ────────────────────────────────────────────────────────────────────────────

pub fn require_text(raw: &str, message: &str) -> Result<(), String> {
    if raw.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Date of birth is required.".to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

/// Accepts 24-hour `HH:MM` with exactly two digits on each side.
pub fn check_birth_time(raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Time of birth is required.".to_string());
    }
    if raw.len() != 5 || NaiveTime::parse_from_str(raw, "%H:%M").is_err() {
        return Err("Invalid time format. Use HH:MM.".to_string());
    }
    Ok(())
}

pub fn check_location(raw: &str) -> Result<(), String> {
    if raw.trim().chars().count() < 3 {
        return Err("Location must be at least 3 characters.".to_string());
    }
    Ok(())
}

/// Returns the storage extension for an accepted MIME type.
pub fn check_image_mime(mime: &str) -> Result<&'static str, String> {
    let mime = mime.trim().to_ascii_lowercase();
    ACCEPTED_IMAGE_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == mime)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| "Invalid file type. Only JPG, PNG, or WEBP images are accepted.".to_string())
}

pub fn check_image_size(len: usize) -> Result<(), String> {
    if len == 0 {
        return Err("Please upload an image.".to_string());
    }
    if len > MAX_IMAGE_BYTES {
        return Err("Max file size is 5MB.".to_string());
    }
    Ok(())
}

/// Parses `data:image/<type>;base64,<payload>` into inline media.
pub fn parse_data_uri(uri: &str) -> Result<MediaRef, String> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err("Please upload an image.".to_string());
    }
    let malformed = || "Image must be a base64 data URI.".to_string();

    let rest = uri.strip_prefix("data:").ok_or_else(malformed)?;
    let (header, payload) = rest.split_once(',').ok_or_else(malformed)?;
    let media_type = header.strip_suffix(";base64").ok_or_else(malformed)?;
    check_image_mime(media_type)?;

    if payload.is_empty()
        || !payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    {
        return Err(malformed());
    }
    check_image_size(decoded_len(payload))?;

    Ok(MediaRef::Inline {
        media_type: media_type.to_ascii_lowercase(),
        data: payload.to_string(),
    })
}

fn decoded_len(payload: &str) -> usize {
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    (payload.len() / 4 * 3 + (payload.len() % 4) * 3 / 4).saturating_sub(padding)
}

/// The model fetches face images itself, so they must be absolute http(s) URLs.
pub fn check_public_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Please upload an image.".to_string());
    }
    let url = Url::parse(raw).map_err(|_| "Image URL is not a valid URL.".to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err("Image URL must use http or https.".to_string()),
    }
}
