use std::time::Duration;

/// Default service base, matching a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

pub const DEFAULT_RECENT_LIMIT: u32 = 20;
pub const DEFAULT_TREND_LIMIT: u32 = 200;

/// Connection settings for [`HttpAnalysisClient`](crate::HttpAnalysisClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL such as `http://localhost:8000/api`. A trailing slash is trimmed.
    pub base_url: String,
    /// Sent as `X-API-Key` on the scan history endpoints when present.
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
    /// Reject larger `.eml` uploads locally. Unbounded when `None`.
    pub max_upload_bytes: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Some(Duration::from_secs(30)),
            max_upload_bytes: None,
        }
    }
}

/// Clamp a recent-scans limit to the range the service accepts (1–100).
pub fn clamp_recent_limit(limit: u32) -> u32 {
    limit.clamp(1, 100)
}

/// Clamp a trends sample limit to the range the service accepts (20–1000).
pub fn clamp_trend_limit(limit: u32) -> u32 {
    limit.clamp(20, 1000)
}
