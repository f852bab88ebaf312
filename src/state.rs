use crate::analysis::flow::{AnalysisFlow, AnalysisOptions, AnalysisReport, Selection};
use crate::capability::BackendKind;
use crate::config::{AppConfig, DistributionProfile};
use crate::data::loader::Upload;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Charting backend picked at start-up.
    pub backend_kind: BackendKind,

    /// Loaded table and pipeline stage.
    pub flow: AnalysisFlow,

    /// Active distribution profile (starts from the config).
    pub profile: DistributionProfile,

    /// Columns picked in the distribution and trend selectors.
    pub selection: Selection,

    /// Output of the latest pass over the table.
    pub report: Option<AnalysisReport>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig, backend_kind: BackendKind) -> Self {
        Self {
            profile: config.distribution,
            config,
            backend_kind,
            flow: AnalysisFlow::default(),
            selection: Selection::default(),
            report: None,
            status_message: None,
        }
    }

    /// Options of the next pass: config values with the active profile.
    pub fn options(&self) -> AnalysisOptions {
        let mut options = AnalysisOptions::from_config(&self.config);
        options.bins = self.config.bins.filter(|&b| b > 0).unwrap_or(self.profile.bins());
        options.with_boxplot = self.profile.with_boxplot();
        options
    }

    /// Load an upload and run a fresh pass. A failed load clears
    /// everything and leaves the error in `status_message`.
    pub fn open(&mut self, upload: Upload) {
        self.selection = Selection::default();
        self.report = None;
        match self.flow.load(&upload) {
            Ok(table) => {
                log::info!("Opened {} ({} rows)", upload.name, table.len());
                self.status_message = None;
                self.rerun();
            }
            Err(e) => {
                let e = anyhow::Error::new(e);
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Run the whole pipeline again with the current selection and profile.
    pub fn rerun(&mut self) {
        let options = self.options();
        self.report = self.flow.run(&self.selection, &options);
        if let Some(report) = &self.report {
            // Keep the resolved defaults so the selectors show them.
            self.selection = report.selection.clone();
        }
    }

    pub fn set_profile(&mut self, profile: DistributionProfile) {
        if self.profile != profile {
            self.profile = profile;
            self.rerun();
        }
    }

    pub fn select_distribution(&mut self, column: String) {
        if self.selection.distribution.as_deref() != Some(column.as_str()) {
            self.selection.distribution = Some(column);
            self.rerun();
        }
    }

    pub fn select_trend(&mut self, column: String) {
        if self.selection.trend.as_deref() != Some(column.as_str()) {
            self.selection.trend = Some(column);
            self.rerun();
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        self.flow.table().map(|t| t.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::flow::{Chart, Stage};

    fn state() -> AppState {
        AppState::new(AppConfig::default(), BackendKind::BasicPlot)
    }

    fn csv(text: &str) -> Upload {
        Upload::from_bytes("data.csv", text.as_bytes().to_vec())
    }

    fn distribution(state: &AppState) -> &[Chart] {
        state
            .report
            .as_ref()
            .and_then(|r| r.distribution.as_ref())
            .and_then(|d| d.as_ref().ok())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    #[test]
    fn open_runs_a_pass_with_defaults() {
        let mut state = state();
        state.open(csv("a,b,c\n1,2,x\n3,5,y\n4,4,z\n"));
        assert!(state.status_message.is_none());
        assert_eq!(state.flow.stage(), Stage::Rendered);
        assert_eq!(state.row_count(), Some(3));
        assert_eq!(state.selection.distribution.as_deref(), Some("a"));
        assert_eq!(state.selection.trend.as_deref(), Some("a"));
        assert_eq!(distribution(&state).len(), 1);
    }

    #[test]
    fn failed_open_clears_and_reports() {
        let mut state = state();
        state.open(csv("a\n1\n2\n"));
        state.open(Upload::from_bytes("notes.txt", b"hello".to_vec()));
        assert!(state.report.is_none());
        assert_eq!(state.row_count(), None);
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.starts_with("Error: unsupported file type"), "{msg}");
    }

    #[test]
    fn extended_profile_adds_box_plot() {
        let mut state = state();
        state.open(csv("a\n1\n2\n3\n10\n"));
        state.set_profile(DistributionProfile::Extended);
        let charts = distribution(&state);
        assert_eq!(charts.len(), 2);
        match &charts[0] {
            Chart::Histogram(h) => assert_eq!(h.histogram.bins.len(), 20),
            other => panic!("expected histogram, got {}", other.key()),
        }
        assert!(matches!(charts[1], Chart::BoxPlot(_)));
    }

    #[test]
    fn bins_override_wins_over_profile() {
        let config = AppConfig {
            bins: Some(7),
            ..AppConfig::default()
        };
        let mut state = AppState::new(config, BackendKind::BasicPlot);
        assert_eq!(state.options().bins, 7);
        state.set_profile(DistributionProfile::Extended);
        assert_eq!(state.options().bins, 7);
        assert!(state.options().with_boxplot);
    }

    #[test]
    fn selecting_text_column_warns() {
        let mut state = state();
        state.open(csv("n,s\n1,x\n2,y\n"));
        state.select_distribution("s".into());
        let report = state.report.as_ref().unwrap();
        assert!(matches!(report.distribution, Some(Err(_))));
        assert!(report.warnings.iter().any(|w| w.contains("'s'")));
    }
}
