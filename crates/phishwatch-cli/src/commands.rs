//! Operation runners shared by the one-shot subcommands and the interactive shell.
//!
//! Each runner triggers one session operation, prints its result (card or
//! JSON) to stdout or its error to stderr, and reports whether it succeeded.

use phishwatch_client::AnalysisApi;
use phishwatch_core::AnalysisView;
use phishwatch_session::{Outcome, Session};
use serde_json::{Value, json};

use crate::display;

pub async fn analyze_text<A: AnalysisApi>(session: &Session<A>, raw: &str, json: bool) -> bool {
    let outcome = session.analyze_text(raw).await;
    report("Text analysis", outcome, json, live_card, |view| json!(view))
}

pub async fn analyze_eml<A: AnalysisApi>(
    session: &Session<A>,
    file_name: &str,
    bytes: Vec<u8>,
    json: bool,
) -> bool {
    let outcome = session.analyze_eml(file_name, bytes).await;
    report(".eml analysis", outcome, json, live_card, |view| json!(view))
}

pub async fn select_scan<A: AnalysisApi>(session: &Session<A>, id: i64, json: bool) -> bool {
    let outcome = session.select_scan(id).await;
    report(
        "Loading saved scan",
        outcome,
        json,
        |scan| display::render_analysis(&scan.view, Some(scan)),
        |scan| {
            json!({
                "id": scan.id,
                "created_at": scan.created_at,
                "analysis": scan.view,
            })
        },
    )
}

pub async fn recent<A: AnalysisApi>(session: &Session<A>, json: bool) -> bool {
    let outcome = session.refresh_recent().await;
    let selected = session.selected_scan_id();
    report(
        "Loading recent scans",
        outcome,
        json,
        |scans| display::render_recent_scans(scans, selected),
        |scans| json!(scans),
    )
}

pub async fn trends<A: AnalysisApi>(session: &Session<A>, json: bool) -> bool {
    let outcome = session.refresh_trends().await;
    report(
        "Loading trends",
        outcome,
        json,
        display::render_trends,
        |view| json!(view),
    )
}

/// Refresh recent scans and trends concurrently; each reports on its own.
pub async fn dashboard<A: AnalysisApi>(session: &Session<A>, json: bool) -> bool {
    let (recent, trends) = futures::join!(session.refresh_recent(), session.refresh_trends());
    let selected = session.selected_scan_id();

    if json {
        let doc = json!({
            "recent": section_json(&recent, |scans| json!(scans)),
            "trends": section_json(&trends, |view| json!(view)),
        });
        println!("{doc:#}");
        return matches!(recent, Outcome::Succeeded(_)) && matches!(trends, Outcome::Succeeded(_));
    }

    let recent_ok = report(
        "Loading recent scans",
        recent,
        false,
        |scans| display::render_recent_scans(scans, selected),
        |scans| json!(scans),
    );
    println!();
    let trends_ok = report(
        "Loading trends",
        trends,
        false,
        display::render_trends,
        |view| json!(view),
    );
    recent_ok && trends_ok
}

fn live_card(view: &AnalysisView) -> String {
    display::render_analysis(view, None)
}

fn section_json<T>(outcome: &Outcome<T>, to_json: impl FnOnce(&T) -> Value) -> Value {
    match outcome {
        Outcome::Succeeded(data) => json!({ "data": to_json(data) }),
        Outcome::Failed(err) => json!({ "error": err.to_string(), "kind": err.kind() }),
        Outcome::Ignored | Outcome::Stale => Value::Null,
    }
}

fn report<T>(
    label: &str,
    outcome: Outcome<T>,
    json: bool,
    render: impl FnOnce(&T) -> String,
    to_json: impl FnOnce(&T) -> Value,
) -> bool {
    match outcome {
        Outcome::Succeeded(data) => {
            if json {
                println!("{:#}", to_json(&data));
            } else {
                print!("{}", render(&data));
            }
            true
        }
        Outcome::Failed(err) => {
            eprintln!("{label} failed: {err}");
            false
        }
        Outcome::Ignored => {
            eprintln!("{label} is already in progress.");
            false
        }
        Outcome::Stale => {
            eprintln!("{label} was superseded by a newer request.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phishwatch_client::{ApiError, EmailText, EmlUpload};
    use phishwatch_core::{AnalysisSource, ScanSummary, TrendSnapshot};

    /// Transport answering every call with a fixed result.
    struct FixedApi {
        analysis: Result<AnalysisSource, ApiError>,
        recent: Result<Vec<ScanSummary>, ApiError>,
        trends: Result<TrendSnapshot, ApiError>,
    }

    impl FixedApi {
        fn healthy() -> Self {
            Self {
                analysis: Ok(AnalysisSource::stored(json!({
                    "id": 42,
                    "risk_score": 72,
                    "verdict": "medium"
                }))
                .unwrap()),
                recent: Ok(vec![]),
                trends: Ok(TrendSnapshot::default()),
            }
        }
    }

    #[async_trait(?Send)]
    impl AnalysisApi for FixedApi {
        async fn analyze_text(&self, _text: EmailText) -> Result<AnalysisSource, ApiError> {
            self.analysis.clone()
        }

        async fn analyze_eml(&self, _upload: EmlUpload) -> Result<AnalysisSource, ApiError> {
            self.analysis.clone()
        }

        async fn recent_scans(&self, _limit: u32) -> Result<Vec<ScanSummary>, ApiError> {
            self.recent.clone()
        }

        async fn fetch_scan(&self, _id: i64) -> Result<AnalysisSource, ApiError> {
            self.analysis.clone()
        }

        async fn fetch_trends(&self, _limit: u32) -> Result<TrendSnapshot, ApiError> {
            self.trends.clone()
        }
    }

    fn not_found() -> ApiError {
        ApiError::Server {
            status: 404,
            message: "Scan not found.".into(),
        }
    }

    #[test]
    fn only_success_reports_ok() {
        let render = |n: &u32| n.to_string();
        let to_json = |n: &u32| json!(n);
        assert!(report("lookup", Outcome::Succeeded(1), false, render, to_json));
        assert!(report("lookup", Outcome::Succeeded(1), true, render, to_json));
        assert!(!report("lookup", Outcome::Failed(not_found()), false, render, to_json));
        assert!(!report("lookup", Outcome::<u32>::Ignored, false, render, to_json));
        assert!(!report("lookup", Outcome::<u32>::Stale, false, render, to_json));
    }

    #[test]
    fn dashboard_sections_carry_data_or_error() {
        let ok = section_json(&Outcome::Succeeded(3u32), |n| json!(n));
        assert_eq!(ok, json!({ "data": 3 }));

        let failed = section_json(&Outcome::<u32>::Failed(not_found()), |n| json!(n));
        assert_eq!(
            failed,
            json!({ "error": "Scan not found. (HTTP 404)", "kind": "server" })
        );

        assert_eq!(section_json(&Outcome::<u32>::Ignored, |n| json!(n)), Value::Null);
        assert_eq!(section_json(&Outcome::<u32>::Stale, |n| json!(n)), Value::Null);
    }

    #[tokio::test]
    async fn dashboard_fails_when_either_section_fails() {
        let session = Session::new(FixedApi::healthy());
        assert!(dashboard(&session, false).await);
        assert!(dashboard(&session, true).await);

        let session = Session::new(FixedApi {
            recent: Err(ApiError::Network("connection refused".into())),
            ..FixedApi::healthy()
        });
        assert!(!dashboard(&session, false).await);
        assert!(!dashboard(&session, true).await);
    }

    #[tokio::test]
    async fn failed_operations_report_failure() {
        let session = Session::new(FixedApi {
            analysis: Err(not_found()),
            ..FixedApi::healthy()
        });
        assert!(!select_scan(&session, 9, false).await);
        assert!(!analyze_text(&session, "   ", false).await);
        assert!(!analyze_eml(&session, "notes.txt", b"x".to_vec(), true).await);
    }

    #[tokio::test]
    async fn successful_operations_report_success() {
        let session = Session::new(FixedApi::healthy());
        assert!(select_scan(&session, 42, true).await);
        assert!(analyze_text(&session, "Subject: hi", false).await);
        assert!(recent(&session, false).await);
        assert!(trends(&session, true).await);
    }
}
