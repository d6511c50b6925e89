//! Display-ready view model for scan trend aggregates.

use serde::Serialize;

use crate::model::{TrendSnapshot, VerdictCounts};

/// One row of a ranked list. `rank` is 1-based and follows source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendView {
    pub sample_size: u64,
    pub average_score: f64,
    pub verdict_counts: VerdictCounts,
    pub top_link_domains: Vec<RankedEntry>,
    pub top_finding_codes: Vec<RankedEntry>,
}

impl TrendView {
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }
}

/// Build the trend view. Ranking is taken verbatim from the snapshot; ties
/// are the service's concern and are never re-sorted here.
///
/// An empty sample is a valid state: counts and average are zeroed and the
/// ranked lists are empty regardless of what else the payload carried.
pub fn trend_view(snapshot: &TrendSnapshot) -> TrendView {
    if snapshot.sample_size == 0 {
        return TrendView::default();
    }

    TrendView {
        sample_size: snapshot.sample_size,
        average_score: if snapshot.average_score.is_finite() {
            snapshot.average_score
        } else {
            0.0
        },
        verdict_counts: snapshot.verdict_counts,
        top_link_domains: ranked(&snapshot.top_link_domains),
        top_finding_codes: ranked(&snapshot.top_finding_codes),
    }
}

fn ranked(pairs: &[(String, u64)]) -> Vec<RankedEntry> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (label, count))| RankedEntry {
            rank: i + 1,
            label: label.clone(),
            count: *count,
        })
        .collect()
}
