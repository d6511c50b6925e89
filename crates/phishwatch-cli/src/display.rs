//! Vertical card display for analysis results, scan history, and trends.
//!
//! Every renderer builds a `String` so output can be checked without a terminal;
//! callers print it.

use std::fmt::Write;

use phishwatch_core::model::timestamp_label;
use phishwatch_core::{AnalysisView, Finding, RankedEntry, ScanSummary, TrendView};
use phishwatch_session::SelectedScan;

const LABEL_WIDTH: usize = 14;

// ── Analysis result ──

/// Render the primary result view, labelled with the stored scan it mirrors.
pub fn render_analysis(view: &AnalysisView, selected: Option<&SelectedScan>) -> String {
    let mut out = String::new();

    match selected {
        Some(scan) => {
            let _ = writeln!(out, "=== Saved scan #{} ===", scan.id);
            if scan.created_at.is_some() {
                let _ = writeln!(out, "Scanned {}", timestamp_label(scan.created_at.as_deref()));
            }
        }
        None => {
            let _ = writeln!(out, "=== Analysis Result ===");
        }
    }
    out.push('\n');

    field(&mut out, "Risk Score", &format!("{}/100", view.risk_score));
    field(&mut out, "Verdict", view.verdict.label());
    out.push('\n');

    let _ = writeln!(out, "Extracted Details");
    field(&mut out, "Subject", view.extracted.subject_or_placeholder());
    field(&mut out, "From", view.extracted.from_or_placeholder());
    field(&mut out, "Reply-To", view.extracted.reply_to_or_placeholder());
    field(&mut out, "To", view.extracted.to_or_placeholder());
    out.push('\n');

    let _ = writeln!(out, "URLs");
    if view.extracted.urls.is_empty() {
        let _ = writeln!(out, "  No URLs extracted.");
    } else {
        for url in &view.extracted.urls {
            let _ = writeln!(out, "  - {url}");
        }
    }
    out.push('\n');

    render_findings(&mut out, &view.findings);
    out
}

fn render_findings(out: &mut String, findings: &[Finding]) {
    let _ = writeln!(out, "Findings");
    if findings.is_empty() {
        let _ = writeln!(out, "  No strong phishing indicators were detected.");
        return;
    }
    for finding in findings {
        let _ = writeln!(out, "  [{}] {}", finding.severity.label(), finding.title);
        if !finding.code.is_empty() {
            let _ = writeln!(out, "      {}", finding.code);
        }
        if !finding.detail.is_empty() {
            let _ = writeln!(out, "      {}", finding.detail);
        }
    }
}

// ── Recent scans ──

pub fn render_recent_scans(scans: &[ScanSummary], selected_id: Option<i64>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Recent Scans ===");
    if scans.is_empty() {
        let _ = writeln!(out, "No scans yet. Analyze an email to populate history.");
        return out;
    }

    for scan in scans {
        let marker = if selected_id == Some(scan.id) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} #{:<6} {:<7} {:>3}/100  {}",
            scan.id,
            scan.verdict.label(),
            scan.display_score(),
            scan.subject_label()
        );
        let _ = writeln!(
            out,
            "  {:<15} {}  {}",
            "",
            scan.sender_label(),
            scan.created_at_label()
        );
    }
    out
}

// ── Trends ──

pub fn render_trends(view: &TrendView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Scan Trends ===");
    field(&mut out, "Sample Size", &view.sample_size.to_string());
    field(&mut out, "Average Risk", &format_average(view.average_score));
    out.push('\n');

    let _ = writeln!(out, "Verdict Counts");
    field(&mut out, "Low", &view.verdict_counts.low.to_string());
    field(&mut out, "Medium", &view.verdict_counts.medium.to_string());
    field(&mut out, "High", &view.verdict_counts.high.to_string());
    out.push('\n');

    ranked_section(&mut out, "Top Link Domains", &view.top_link_domains, "No domains yet.");
    out.push('\n');
    ranked_section(&mut out, "Top Finding Codes", &view.top_finding_codes, "No findings yet.");
    out
}

fn ranked_section(out: &mut String, header: &str, entries: &[RankedEntry], empty: &str) {
    let _ = writeln!(out, "{header}");
    if entries.is_empty() {
        let _ = writeln!(out, "  {empty}");
        return;
    }
    for entry in entries {
        let _ = writeln!(out, "  {:>2}. {} ({})", entry.rank, entry.label, entry.count);
    }
}

fn format_average(avg: f64) -> String {
    // Matches the service's two-decimal rounding without trailing zeros.
    let rounded = (avg * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {value}");
}
