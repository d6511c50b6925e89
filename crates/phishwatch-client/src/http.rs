//! HTTP transport for the phishing analysis service.

use async_trait::async_trait;
use phishwatch_core::{AnalysisSource, ScanSummary, TrendSnapshot};
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{ClientConfig, clamp_recent_limit, clamp_trend_limit};
use crate::{AnalysisApi, ApiError, EmailText, EmlUpload};

const API_KEY_HEADER: &str = "X-API-Key";

/// The remote operations, used for logging and fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AnalyzeText,
    AnalyzeEml,
    RecentScans,
    ScanById,
    Trends,
    Health,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeText => "analyze-text",
            Self::AnalyzeEml => "analyze-eml",
            Self::RecentScans => "recent-scans",
            Self::ScanById => "scan-by-id",
            Self::Trends => "trends",
            Self::Health => "health",
        }
    }

    /// Message used when an error response carries no usable `detail`.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::AnalyzeText => "Failed to analyze email text.",
            Self::AnalyzeEml => "Failed to analyze .eml file.",
            Self::RecentScans => "Failed to fetch recent scans.",
            Self::ScanById => "Failed to fetch scan details.",
            Self::Trends => "Failed to fetch scan trends.",
            Self::Health => "Health check failed.",
        }
    }
}

#[derive(Serialize)]
struct AnalyzeTextRequest<'a> {
    raw_email_text: &'a str,
}

/// reqwest-backed [`AnalysisApi`].
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_upload_bytes: Option<u64>,
}

impl HttpAnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Network(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; returns the reported status string.
    pub async fn health(&self) -> Result<String, ApiError> {
        let url = format!("{}/health", self.base_url);
        let body = self.execute(Operation::Health, self.client.get(&url)).await?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Send one request and classify the outcome. Returns the decoded JSON body.
    async fn execute(&self, op: Operation, request: RequestBuilder) -> Result<Value, ApiError> {
        let resp = request.send().await.map_err(|e| {
            warn!(op = op.as_str(), error = %e, "request did not complete");
            ApiError::from(e)
        })?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = error_detail(&body).unwrap_or_else(|| op.fallback_message().to_string());
            warn!(op = op.as_str(), status = status.as_u16(), %message, "service rejected request");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            warn!(op = op.as_str(), error = %e, "response body is not JSON");
            ApiError::Parse(e.to_string())
        })?;
        info!(op = op.as_str(), status = status.as_u16(), "request complete");
        Ok(value)
    }
}

/// Decode a JSON value into the operation's declared shape.
fn decode<T: DeserializeOwned>(op: Operation, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::Parse(format!("unexpected {} payload: {e}", op.as_str())))
}

/// Best-effort `detail` extraction from an error body.
///
/// Accepts the plain `{"detail": "..."}` form and the validation-error form
/// where `detail` is a list of objects with a `msg` field.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

#[async_trait(?Send)]
impl AnalysisApi for HttpAnalysisClient {
    async fn analyze_text(&self, text: EmailText) -> Result<AnalysisSource, ApiError> {
        let url = format!("{}/analyze/text", self.base_url);
        info!(url = %url, chars = text.as_str().chars().count(), "submitting email text");
        let request = self.client.post(&url).json(&AnalyzeTextRequest {
            raw_email_text: text.as_str(),
        });
        let body = self.execute(Operation::AnalyzeText, request).await?;
        Ok(AnalysisSource::text(body)?)
    }

    async fn analyze_eml(&self, upload: EmlUpload) -> Result<AnalysisSource, ApiError> {
        if let Some(max) = self.max_upload_bytes.filter(|max| upload.len() > *max) {
            return Err(ApiError::Validation(format!(
                "{} is too large ({} KB, limit {max} bytes).",
                upload.file_name(),
                upload.size_kb()
            )));
        }

        let url = format!("{}/analyze/eml", self.base_url);
        info!(
            url = %url,
            file = upload.file_name(),
            size_kb = upload.size_kb(),
            "uploading .eml file"
        );
        let (file_name, bytes) = upload.into_parts();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("message/rfc822")?;
        let request = self.client.post(&url).multipart(Form::new().part("file", part));
        let body = self.execute(Operation::AnalyzeEml, request).await?;
        Ok(AnalysisSource::file(body)?)
    }

    async fn recent_scans(&self, limit: u32) -> Result<Vec<ScanSummary>, ApiError> {
        let limit = clamp_recent_limit(limit);
        let url = format!("{}/scans/recent?limit={limit}", self.base_url);
        info!(url = %url, "fetching recent scans");
        let body = self
            .execute(Operation::RecentScans, self.authed(self.client.get(&url)))
            .await?;
        let scans: Vec<ScanSummary> = decode(Operation::RecentScans, body)?;
        info!(count = scans.len(), "fetched recent scans");
        Ok(scans)
    }

    async fn fetch_scan(&self, id: i64) -> Result<AnalysisSource, ApiError> {
        let url = format!("{}/scans/{id}", self.base_url);
        info!(url = %url, "fetching stored scan");
        let body = self
            .execute(Operation::ScanById, self.authed(self.client.get(&url)))
            .await?;
        Ok(AnalysisSource::stored(body)?)
    }

    async fn fetch_trends(&self, limit: u32) -> Result<TrendSnapshot, ApiError> {
        let limit = clamp_trend_limit(limit);
        let url = format!("{}/scans/trends?limit={limit}", self.base_url);
        info!(url = %url, "fetching scan trends");
        let body = self
            .execute(Operation::Trends, self.authed(self.client.get(&url)))
            .await?;
        let snapshot: TrendSnapshot = decode(Operation::Trends, body)?;
        info!(sample_size = snapshot.sample_size, "fetched scan trends");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishwatch_core::{RiskLevel, normalize};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve exactly one canned response and hand back the raw request text.
    async fn stub_server(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let request = read_request(&mut sock).await;
            let response = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            request
        });
        (format!("http://{addr}/api/"), handle)
    }

    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client_for(base_url: String, api_key: Option<&str>) -> HttpAnalysisClient {
        HttpAnalysisClient::new(ClientConfig {
            base_url,
            api_key: api_key.map(str::to_string),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    /// A base URL nothing is listening on.
    async fn dead_base_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/api")
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = client_for("http://localhost:8000/api/".into(), None);
        assert_eq!(client.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let client = client_for("http://localhost:8000/api".into(), Some("   "));
        assert!(client.api_key.is_none());
    }

    #[test]
    fn error_detail_forms() {
        assert_eq!(
            error_detail(br#"{"detail": "Scan not found."}"#).as_deref(),
            Some("Scan not found.")
        );
        assert_eq!(
            error_detail(br#"{"detail": [{"msg": "field required"}, {"msg": "too long"}]}"#)
                .as_deref(),
            Some("field required; too long")
        );
        assert_eq!(error_detail(br#"{"detail": ""}"#), None);
        assert_eq!(error_detail(br#"{"error": "x"}"#), None);
        assert_eq!(error_detail(b"<html>502</html>"), None);
        assert_eq!(error_detail(b""), None);
    }

    #[tokio::test]
    async fn analyze_text_posts_trimmed_json() {
        let (base, server) = stub_server(
            200,
            r#"{"risk_score": 72, "verdict": "medium", "findings": [{"code": "IP_URL", "severity": "medium", "title": "IP-based link", "detail": "..."}], "extracted": {"subject": "Test", "from": "a@b.com", "urls": ["http://1.2.3.4/login"]}}"#,
        )
        .await;
        let client = client_for(base, Some("secret"));
        let source = client
            .analyze_text(EmailText::new("  hello world  ").unwrap())
            .await
            .unwrap();
        let view = normalize(&source);
        assert_eq!(view.risk_score, 72);
        assert_eq!(view.verdict, RiskLevel::Medium);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/analyze/text HTTP/1.1"));
        assert!(request.contains(r#"{"raw_email_text":"hello world"}"#));
        // Analysis endpoints are not authenticated.
        assert!(!request.to_ascii_lowercase().contains("x-api-key"));
    }

    #[tokio::test]
    async fn analyze_eml_sends_multipart_file_field() {
        let (base, server) =
            stub_server(200, r#"{"risk_score": 5, "verdict": "low", "findings": [], "extracted": {}}"#)
                .await;
        let client = client_for(base, None);
        let upload = EmlUpload::new("suspicious.EML", b"Subject: Hi\r\n\r\nbody".to_vec()).unwrap();
        let source = client.analyze_eml(upload).await.unwrap();
        assert!(matches!(source, AnalysisSource::File(_)));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/analyze/eml HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("multipart/form-data; boundary="));
        assert!(request.contains(r#"name="file"; filename="suspicious.EML""#));
        assert!(request.contains("message/rfc822"));
    }

    #[tokio::test]
    async fn oversized_upload_never_reaches_the_network() {
        let client = HttpAnalysisClient::new(ClientConfig {
            base_url: dead_base_url().await,
            max_upload_bytes: Some(4),
            ..ClientConfig::default()
        })
        .unwrap();
        let upload = EmlUpload::new("big.eml", vec![b'x'; 5]).unwrap();
        let err = client.analyze_eml(upload).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
        assert_eq!(err.to_string(), "big.eml is too large (1 KB, limit 4 bytes).");
    }

    #[tokio::test]
    async fn recent_scans_sends_key_and_clamps_limit() {
        let (base, server) = stub_server(
            200,
            r#"[{"id": 2, "created_at": "2026-02-21T10:00:00", "verdict": "high", "risk_score": 91, "subject": "Verify", "from": "x@y.test"},
                {"id": 1, "created_at": null, "verdict": "low", "risk_score": 3, "subject": "", "from": ""}]"#,
        )
        .await;
        let client = client_for(base, Some("secret"));
        let scans = client.recent_scans(500).await.unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].id, 2);
        assert_eq!(scans[0].verdict, RiskLevel::High);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/scans/recent?limit=100 http/1.1"));
        assert!(request.contains("x-api-key: secret"));
    }

    #[tokio::test]
    async fn recent_scans_with_wrong_shape_is_a_parse_error() {
        let (base, _server) = stub_server(200, r#"{"items": []}"#).await;
        let err = client_for(base, None).recent_scans(20).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn server_error_surfaces_detail() {
        let (base, _server) = stub_server(404, r#"{"detail": "Scan not found."}"#).await;
        let err = client_for(base, Some("secret")).fetch_scan(999).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                message: "Scan not found.".into()
            }
        );
        assert_eq!(err.to_string(), "Scan not found. (HTTP 404)");
    }

    #[tokio::test]
    async fn server_error_without_body_uses_fallback() {
        let (base, _server) = stub_server(500, "").await;
        let err = client_for(base, None).fetch_trends(200).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                message: "Failed to fetch scan trends.".into()
            }
        );
    }

    #[tokio::test]
    async fn unauthorized_is_a_server_error() {
        let (base, _server) = stub_server(401, r#"{"detail": "Unauthorized"}"#).await;
        let err = client_for(base, None).recent_scans(20).await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 401, .. }));
    }

    #[tokio::test]
    async fn success_with_invalid_json_is_a_parse_error() {
        let (base, _server) = stub_server(200, "<html>ok</html>").await;
        let err = client_for(base, None)
            .analyze_text(EmailText::new("hi").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn non_object_analysis_is_a_validation_error() {
        let (base, _server) = stub_server(200, "[1, 2]").await;
        let err = client_for(base, Some("k")).fetch_scan(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let client = client_for(dead_base_url().await, None);
        let err = client.fetch_trends(200).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn trends_decode_and_clamp_limit() {
        let (base, server) = stub_server(
            200,
            r#"{"sample_size": 0, "average_score": 0, "verdict_counts": {"low": 0, "medium": 0, "high": 0}, "top_link_domains": [], "top_finding_codes": []}"#,
        )
        .await;
        let snapshot = client_for(base, Some("k")).fetch_trends(1).await.unwrap();
        assert_eq!(snapshot.sample_size, 0);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/scans/trends?limit=20 HTTP/1.1"));
    }

    #[tokio::test]
    async fn health_reports_status() {
        let (base, _server) = stub_server(200, r#"{"status": "ok"}"#).await;
        assert_eq!(client_for(base, None).health().await.unwrap(), "ok");
    }
}
