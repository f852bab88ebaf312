//! Chart renderers, one per charting backend.
//!
//! The backend is picked once at start-up (see [`crate::capability`]) and
//! handed to the UI as a `Box<dyn ChartBackend>`.

use eframe::egui::{self, Ui};

use crate::analysis::flow::Chart;
use crate::capability::BackendKind;

pub mod basic;
#[cfg(feature = "interactive")]
pub mod interactive;
#[cfg(feature = "statistical")]
pub mod statistical;

/// Height of every chart in points.
pub const CHART_HEIGHT: f32 = 320.0;

pub trait ChartBackend {
    fn kind(&self) -> BackendKind;

    /// Draw one chart at the current position of `ui`.
    fn show(&mut self, ui: &mut Ui, chart: &Chart);

    /// A new table was loaded; drop anything cached for the old one.
    fn reset(&mut self, _ctx: &egui::Context) {}
}

/// Construct the renderer for a detected backend.
pub fn backend_for(kind: BackendKind) -> Box<dyn ChartBackend> {
    match kind {
        #[cfg(feature = "interactive")]
        BackendKind::Interactive => Box::new(interactive::InteractiveBackend::default()),
        #[cfg(feature = "statistical")]
        BackendKind::StatisticalPlot => Box::new(statistical::StatisticalBackend::default()),
        _ => Box::new(basic::BasicBackend),
    }
}

/// Axis label for the heatmap cell centred on `value`, if there is one.
pub(crate) fn label_at(labels: &[String], value: f64) -> Option<&str> {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return None;
    }
    labels.get(idx as usize).map(String::as_str)
}
