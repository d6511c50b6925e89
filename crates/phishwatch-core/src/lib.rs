pub mod model;
pub mod normalize;
pub mod trends;

pub use model::{
    AnalysisView, ExtractedFields, Finding, PLACEHOLDER, RiskLevel, ScanProvenance, ScanSummary,
    TrendSnapshot, VerdictCounts,
};
pub use normalize::{AnalysisSource, NormalizeError, normalize};
pub use trends::{RankedEntry, TrendView, trend_view};
