//! Transport layer: validated inputs, error taxonomy, and the HTTP client for the analysis service.

mod api;
pub mod config;
mod error;
pub mod http;
mod input;

pub use api::AnalysisApi;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_RECENT_LIMIT, DEFAULT_TREND_LIMIT};
pub use error::ApiError;
pub use http::HttpAnalysisClient;
pub use input::{EmailText, EmlUpload, MAX_TEXT_CHARS};
