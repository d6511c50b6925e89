//! Top-level coordination of the primary result view and the scan selection.
//!
//! Three operations feed the primary view: text analysis, `.eml` analysis and
//! selecting a stored scan. A successful live analysis always replaces the
//! view. Each accepted live trigger advances the live epoch, and a scan-select
//! result is only mirrored into the view if no live trigger was accepted
//! after it was dispatched. Starting a live analysis drops the current
//! selection immediately, before any request is sent.

use std::cell::{Cell, RefCell};

use phishwatch_client::{
    AnalysisApi, ApiError, DEFAULT_RECENT_LIMIT, DEFAULT_TREND_LIMIT, EmailText, EmlUpload,
};
use phishwatch_core::{AnalysisView, ScanSummary, TrendView, normalize, trend_view};
use tracing::{debug, info};

use crate::operation::{OperationController, OperationState, Outcome, Ticket};

/// A stored scan mirrored into the primary view.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedScan {
    pub id: i64,
    pub created_at: Option<String>,
    pub view: AnalysisView,
}

/// Which operation last claimed the primary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimarySource {
    Text,
    File,
    Scan,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub recent: u32,
    pub trends: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            recent: DEFAULT_RECENT_LIMIT,
            trends: DEFAULT_TREND_LIMIT,
        }
    }
}

pub struct Session<A> {
    api: A,
    limits: SessionLimits,
    text: OperationController<AnalysisView>,
    file: OperationController<AnalysisView>,
    scan: OperationController<SelectedScan>,
    recent: OperationController<Vec<ScanSummary>>,
    trends: OperationController<TrendView>,
    view: RefCell<Option<AnalysisView>>,
    selected_scan_id: Cell<Option<i64>>,
    live_epoch: Cell<u64>,
    primary: Cell<Option<PrimarySource>>,
}

impl<A: AnalysisApi> Session<A> {
    pub fn new(api: A) -> Self {
        Self::with_limits(api, SessionLimits::default())
    }

    pub fn with_limits(api: A, limits: SessionLimits) -> Self {
        Self {
            api,
            limits,
            text: OperationController::new("analyze-text"),
            file: OperationController::new("analyze-eml"),
            scan: OperationController::new("scan-select"),
            recent: OperationController::new("recent-scans"),
            trends: OperationController::new("trends"),
            view: RefCell::new(None),
            selected_scan_id: Cell::new(None),
            live_epoch: Cell::new(0),
            primary: Cell::new(None),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit pasted email text. Blank text fails locally without a request.
    pub async fn analyze_text(&self, raw: &str) -> Outcome<AnalysisView> {
        let Some(ticket) = self.text.begin() else {
            return Outcome::Ignored;
        };
        self.start_live(PrimarySource::Text);

        let result = async {
            let text = EmailText::new(raw)?;
            let source = self.api.analyze_text(text).await?;
            Ok::<_, ApiError>(normalize(&source))
        }
        .await;
        self.finish_live(&self.text, PrimarySource::Text, ticket, result)
    }

    /// Upload an `.eml` file. Non-`.eml` names fail locally without a request.
    pub async fn analyze_eml(&self, file_name: &str, bytes: Vec<u8>) -> Outcome<AnalysisView> {
        let Some(ticket) = self.file.begin() else {
            return Outcome::Ignored;
        };
        self.start_live(PrimarySource::File);

        let result = async {
            let upload = EmlUpload::new(file_name, bytes)?;
            let source = self.api.analyze_eml(upload).await?;
            Ok::<_, ApiError>(normalize(&source))
        }
        .await;
        self.finish_live(&self.file, PrimarySource::File, ticket, result)
    }

    /// Load a stored scan by id and, on success, mirror it into the primary view.
    pub async fn select_scan(&self, id: i64) -> Outcome<SelectedScan> {
        let Some(ticket) = self.scan.begin() else {
            return Outcome::Ignored;
        };
        let epoch = self.live_epoch.get();
        self.primary.set(Some(PrimarySource::Scan));

        let result = async {
            let source = self.api.fetch_scan(id).await?;
            let created_at = source.provenance().and_then(|p| p.created_at);
            Ok::<_, ApiError>(SelectedScan {
                id,
                created_at,
                view: normalize(&source),
            })
        }
        .await;

        let outcome = self.scan.complete(ticket, result);
        if let Outcome::Succeeded(selected) = &outcome {
            if self.live_epoch.get() == epoch {
                self.view.replace(Some(selected.view.clone()));
                self.selected_scan_id.set(Some(selected.id));
                info!(scan_id = selected.id, "stored scan selected");
            } else {
                debug!(scan_id = selected.id, "newer analysis started; selection not applied");
            }
        }
        outcome
    }

    pub async fn refresh_recent(&self) -> Outcome<Vec<ScanSummary>> {
        self.recent
            .run(|| self.api.recent_scans(self.limits.recent))
            .await
    }

    pub async fn refresh_trends(&self) -> Outcome<TrendView> {
        self.trends
            .run(|| async {
                let snapshot = self.api.fetch_trends(self.limits.trends).await?;
                Ok::<_, ApiError>(trend_view(&snapshot))
            })
            .await
    }

    pub fn current_view(&self) -> Option<AnalysisView> {
        self.view.borrow().clone()
    }

    pub fn selected_scan_id(&self) -> Option<i64> {
        self.selected_scan_id.get()
    }

    /// The stored scan currently mirrored in the view, if any.
    pub fn selected_scan(&self) -> Option<SelectedScan> {
        let id = self.selected_scan_id.get()?;
        self.scan.data().filter(|scan| scan.id == id)
    }

    /// Operation that last claimed the primary view, if any.
    pub fn primary_source(&self) -> Option<PrimarySource> {
        self.primary.get()
    }

    /// Error of the operation that last claimed the primary view.
    pub fn primary_error(&self) -> Option<String> {
        match self.primary.get()? {
            PrimarySource::Text => self.text.error(),
            PrimarySource::File => self.file.error(),
            PrimarySource::Scan => self.scan.error(),
        }
    }

    pub fn text_state(&self) -> OperationState<AnalysisView> {
        self.text.state()
    }

    pub fn file_state(&self) -> OperationState<AnalysisView> {
        self.file.state()
    }

    pub fn scan_state(&self) -> OperationState<SelectedScan> {
        self.scan.state()
    }

    pub fn recent_state(&self) -> OperationState<Vec<ScanSummary>> {
        self.recent.state()
    }

    pub fn trends_state(&self) -> OperationState<TrendView> {
        self.trends.state()
    }

    /// Runs synchronously on an accepted live trigger, before any await.
    fn start_live(&self, source: PrimarySource) {
        self.live_epoch.set(self.live_epoch.get() + 1);
        self.primary.set(Some(source));
        if let Some(id) = self.selected_scan_id.take() {
            debug!(scan_id = id, "selection cleared by new analysis");
        }
    }

    /// A successful live result replaces the view wholesale and drops any
    /// selection a scan-select applied while it was in flight.
    fn finish_live(
        &self,
        controller: &OperationController<AnalysisView>,
        source: PrimarySource,
        ticket: Ticket,
        result: Result<AnalysisView, ApiError>,
    ) -> Outcome<AnalysisView> {
        let outcome = controller.complete(ticket, result);
        if let Outcome::Succeeded(view) = &outcome {
            self.view.replace(Some(view.clone()));
            self.primary.set(Some(source));
            if let Some(id) = self.selected_scan_id.take() {
                debug!(scan_id = id, "selection replaced by analysis result");
            }
            info!(
                op = controller.name(),
                risk_score = view.risk_score,
                verdict = %view.verdict,
                "analysis complete"
            );
        }
        outcome
    }
}
