//! Shared analysis types exchanged between the service payloads and the display layer.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown for any extracted header the source did not provide.
pub const PLACEHOLDER: &str = "N/A";

/// Risk level used both for scan verdicts and per-finding severities.
///
/// Parsing is lenient: anything that is not `low`, `medium` or `high`
/// (compared case-insensitively) collapses to [`RiskLevel::Low`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Upper-case label as rendered in badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse_lenient).unwrap_or_default())
    }
}

/// A single detection reported by the service, in detection-priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub code: String,
    pub title: String,
    pub severity: RiskLevel,
    pub detail: String,
}

/// Header fields and links pulled out of the submitted email.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub reply_to: Option<String>,
    pub to: Option<String>,
    pub urls: Vec<String>,
}

impl ExtractedFields {
    pub fn subject_or_placeholder(&self) -> &str {
        self.subject.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn from_or_placeholder(&self) -> &str {
        self.from.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn reply_to_or_placeholder(&self) -> &str {
        self.reply_to.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn to_or_placeholder(&self) -> &str {
        self.to.as_deref().unwrap_or(PLACEHOLDER)
    }
}

/// Canonical analysis result shown in the primary result view.
///
/// Every source (fresh text analysis, fresh `.eml` analysis, stored scan)
/// is reduced to this shape by [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    /// Always within `0..=100`.
    pub risk_score: u8,
    pub verdict: RiskLevel,
    pub extracted: ExtractedFields,
    pub findings: Vec<Finding>,
}

/// Where a stored scan came from, kept next to its normalized view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProvenance {
    pub id: Option<i64>,
    pub created_at: Option<String>,
}

/// One row of the recent-scans listing. A projection, not a full view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: i64,
    #[serde(default)]
    pub risk_score: i64,
    #[serde(default)]
    pub verdict: RiskLevel,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    /// ISO 8601 timestamp string as sent by the service (may lack an offset).
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ScanSummary {
    pub fn subject_label(&self) -> &str {
        match self.subject.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => "(No subject)",
        }
    }

    pub fn sender_label(&self) -> &str {
        match self.from.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => "Unknown sender",
        }
    }

    /// Score clamped the same way as [`AnalysisView::risk_score`].
    pub fn display_score(&self) -> u8 {
        self.risk_score.clamp(0, 100) as u8
    }

    pub fn created_at_label(&self) -> String {
        timestamp_label(self.created_at.as_deref())
    }
}

/// Timestamp rendered in local time, the raw value when it does not parse,
/// or `Unknown time` when absent.
pub fn timestamp_label(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => "Unknown time".to_string(),
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => raw.to_string(),
        },
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Verdict tallies over the trend sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

/// Raw aggregate statistics over the most recent scans.
///
/// Ranked lists arrive as `[label, count]` pairs, already ordered by the
/// service; the order is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSnapshot {
    pub sample_size: u64,
    pub average_score: f64,
    pub verdict_counts: VerdictCounts,
    pub top_link_domains: Vec<(String, u64)>,
    pub top_finding_codes: Vec<(String, u64)>,
}
