//! Result normalization: reduce every analysis payload shape to one [`AnalysisView`].
//!
//! The service answers with three structurally related but distinct bodies:
//! a fresh text analysis, a fresh `.eml` analysis, and a stored scan fetched
//! by id (which may predate the `findings`/`extracted` columns). They are
//! modelled as one tagged [`AnalysisSource`] and mapped by a single
//! exhaustive [`normalize`] function, so adding a variant forces the mapping
//! to be revisited.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::model::{AnalysisView, ExtractedFields, Finding, RiskLevel, ScanProvenance};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("{kind} payload is not a JSON object (got {found})")]
    NotAnObject { kind: &'static str, found: &'static str },
}

/// An analysis payload tagged with the operation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisSource {
    /// Response of `POST /analyze/text`.
    Text(Map<String, Value>),
    /// Response of `POST /analyze/eml`.
    File(Map<String, Value>),
    /// Response of `GET /scans/{id}`.
    Stored(Map<String, Value>),
}

impl AnalysisSource {
    pub fn text(payload: Value) -> Result<Self, NormalizeError> {
        expect_object("text analysis", payload).map(Self::Text)
    }

    pub fn file(payload: Value) -> Result<Self, NormalizeError> {
        expect_object("file analysis", payload).map(Self::File)
    }

    pub fn stored(payload: Value) -> Result<Self, NormalizeError> {
        expect_object("stored scan", payload).map(Self::Stored)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File(_) => "file",
            Self::Stored(_) => "stored",
        }
    }

    /// Id and timestamp of a stored scan; `None` for live analyses.
    pub fn provenance(&self) -> Option<ScanProvenance> {
        match self {
            Self::Text(_) | Self::File(_) => None,
            Self::Stored(body) => Some(ScanProvenance {
                id: body.get("id").and_then(Value::as_i64),
                created_at: non_blank(body.get("created_at")),
            }),
        }
    }
}

fn expect_object(kind: &'static str, payload: Value) -> Result<Map<String, Value>, NormalizeError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(NormalizeError::NotAnObject {
            kind,
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map any analysis source to the canonical view. Never fails.
pub fn normalize(source: &AnalysisSource) -> AnalysisView {
    let body = match source {
        AnalysisSource::Text(body) | AnalysisSource::File(body) => body,
        // Older stored rows may lack `findings`/`extracted`; the field readers
        // below already default those to empty.
        AnalysisSource::Stored(body) => body,
    };

    let view = AnalysisView {
        risk_score: clamp_score(body.get("risk_score")),
        verdict: body
            .get("verdict")
            .and_then(Value::as_str)
            .map(RiskLevel::parse_lenient)
            .unwrap_or_default(),
        extracted: read_extracted(body.get("extracted")),
        findings: read_findings(body.get("findings")),
    };
    debug!(
        source = source.kind(),
        risk_score = view.risk_score,
        verdict = %view.verdict,
        findings = view.findings.len(),
        "normalized analysis"
    );
    view
}

/// Clamp a score to `0..=100`. Fractions are rounded, non-numbers become 0.
pub fn clamp_score(raw: Option<&Value>) -> u8 {
    let score = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|v| v as f64)
            .or_else(|| n.as_f64())
            .unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

fn read_extracted(raw: Option<&Value>) -> ExtractedFields {
    let Some(Value::Object(map)) = raw else {
        return ExtractedFields::default();
    };

    let urls = match map.get("urls") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    ExtractedFields {
        subject: non_blank(map.get("subject")),
        from: non_blank(map.get("from")),
        reply_to: non_blank(map.get("reply_to")),
        to: non_blank(map.get("to")),
        urls,
    }
}

fn read_findings(raw: Option<&Value>) -> Vec<Finding> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|f| Finding {
            code: string_field(f, "code").unwrap_or_default(),
            title: string_field(f, "title")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Finding".to_string()),
            severity: f
                .get("severity")
                .and_then(Value::as_str)
                .map(RiskLevel::parse_lenient)
                .unwrap_or_default(),
            detail: string_field(f, "detail").unwrap_or_default(),
        })
        .collect()
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_blank(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
