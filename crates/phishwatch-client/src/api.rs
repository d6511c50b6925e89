use async_trait::async_trait;
use phishwatch_core::{AnalysisSource, ScanSummary, TrendSnapshot};

use crate::{ApiError, EmailText, EmlUpload};

/// The remote analysis operations, one attempt per call and no retries.
///
/// Futures are not required to be `Send`: callers drive them on a single
/// cooperative thread.
#[async_trait(?Send)]
pub trait AnalysisApi {
    /// `POST /analyze/text`
    async fn analyze_text(&self, text: EmailText) -> Result<AnalysisSource, ApiError>;

    /// `POST /analyze/eml`
    async fn analyze_eml(&self, upload: EmlUpload) -> Result<AnalysisSource, ApiError>;

    /// `GET /scans/recent?limit=N`, newest first.
    async fn recent_scans(&self, limit: u32) -> Result<Vec<ScanSummary>, ApiError>;

    /// `GET /scans/{id}`
    async fn fetch_scan(&self, id: i64) -> Result<AnalysisSource, ApiError>;

    /// `GET /scans/trends?limit=N`
    async fn fetch_trends(&self, limit: u32) -> Result<TrendSnapshot, ApiError>;
}
