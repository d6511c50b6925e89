//! Locally validated request inputs.
//!
//! The transport only accepts these types, so malformed input is rejected
//! before any request can be built.

use std::path::Path;

use crate::ApiError;

/// Upper bound the service's request schema places on `raw_email_text`.
pub const MAX_TEXT_CHARS: usize = 200_000;

/// Non-empty, trimmed email text ready for `POST /analyze/text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailText(String);

impl EmailText {
    pub fn new(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ApiError::Validation(
                "Please paste email text first.".to_string(),
            ));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(ApiError::Validation(format!(
                "Email text is too long ({chars} characters, limit {MAX_TEXT_CHARS})."
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An `.eml` file ready for `POST /analyze/eml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmlUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl EmlUpload {
    /// Accepts any file whose name ends in `.eml`, compared case-insensitively.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ApiError> {
        let file_name = file_name.into();
        let base = Path::new(&file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if base.is_empty() {
            return Err(ApiError::Validation(
                "Please choose an .eml file first.".to_string(),
            ));
        }
        if !base.to_ascii_lowercase().ends_with(".eml") {
            return Err(ApiError::Validation(format!(
                "Please select a valid .eml file (got {base})."
            )));
        }
        Ok(Self {
            file_name: base,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size rounded up to whole KiB, at least 1, as shown in file pickers.
    pub fn size_kb(&self) -> u64 {
        self.len().div_ceil(1024).max(1)
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>) {
        (self.file_name, self.bytes)
    }
}
