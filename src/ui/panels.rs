use eframe::egui::{self, Color32, RichText, Ui};

use super::charts::ChartBackend;
use super::tables;
use crate::analysis::flow::AnalysisReport;
use crate::config::DistributionProfile;
use crate::color;
use crate::data::loader::Upload;
use crate::state::AppState;

const WARNING: Color32 = Color32::from_rgb(230, 160, 20);

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for profile in [DistributionProfile::Standard, DistributionProfile::Extended] {
            if ui
                .selectable_label(state.profile == profile, profile.label())
                .clicked()
            {
                state.set_profile(profile);
            }
        }

        ui.separator();
        ui.label(format!("Charts: {}", state.backend_kind));

        if let Some(rows) = state.row_count() {
            ui.separator();
            ui.label(format!("{rows} rows loaded"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &["csv", "xlsx", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open(Upload::from_path(&path));
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything below the top bar: the sections of the latest pass in
/// pipeline order, or the empty state.
pub fn report_view(ui: &mut Ui, state: &mut AppState, backend: &mut dyn ChartBackend) {
    // Cloned so the selectors can mutate state (and rerun) mid-frame.
    let Some(report) = state.report.clone() else {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add_space(80.0);
            ui.heading("Upload a CSV or Excel file to get started.");
            ui.label("Use File → Open… or drop a file onto the window.");
        });
        return;
    };

    ui.heading("Preview of Data");
    tables::data_table(ui, "preview", &report.preview);
    ui.add_space(12.0);

    ui.heading("Descriptive Statistics");
    tables::summary_table(ui, "summary", &report.summary);
    ui.add_space(12.0);

    if report.numeric_columns.is_empty() {
        for warning in &report.warnings {
            ui.colored_label(WARNING, warning);
        }
        return;
    }

    distribution_section(ui, state, backend, &report);
    ui.add_space(12.0);

    // every backend titles the heatmap itself
    if let Some(chart) = &report.correlation {
        backend.show(ui, chart);
        ui.add_space(12.0);
    }

    trend_section(ui, state, backend, &report);
}

fn distribution_section(
    ui: &mut Ui,
    state: &mut AppState,
    backend: &mut dyn ChartBackend,
    report: &AnalysisReport,
) {
    ui.heading("Distribution");
    let current = report.selection.distribution.clone().unwrap_or_default();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Column:");
        egui::ComboBox::from_id_salt("distribution_column")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for column in report.summary.columns.iter() {
                    let text = RichText::new(format!("{}  [{}]", column.name, column.kind.label()))
                        .color(color::kind_color(column.kind));
                    if ui.selectable_label(current == column.name, text).clicked() {
                        state.select_distribution(column.name.clone());
                    }
                }
            });
    });

    match &report.distribution {
        Some(Ok(charts)) if charts.is_empty() => {
            tables::empty_note(ui, "No values to plot.");
        }
        Some(Ok(charts)) => {
            for chart in charts {
                backend.show(ui, chart);
            }
        }
        Some(Err(e)) => {
            ui.colored_label(WARNING, e.to_string());
        }
        None => {}
    }
}

fn trend_section(
    ui: &mut Ui,
    state: &mut AppState,
    backend: &mut dyn ChartBackend,
    report: &AnalysisReport,
) {
    ui.heading("Trend Line Plot");
    let current = report.selection.trend.clone().unwrap_or_default();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Column:");
        egui::ComboBox::from_id_salt("trend_column")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for name in &report.numeric_columns {
                    if ui.selectable_label(current == *name, name).clicked() {
                        state.select_trend(name.clone());
                    }
                }
            });
    });

    if let Some(chart) = &report.trend {
        backend.show(ui, chart);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::epaint::Shape;

    use super::*;
    use crate::capability::BackendKind;
    use crate::config::AppConfig;
    use crate::ui::charts::basic::BasicBackend;

    /// Every piece of text painted by one frame of the report view.
    fn painted_text(state: &mut AppState) -> Vec<String> {
        let ctx = egui::Context::default();
        let mut backend = BasicBackend;
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                report_view(ui, state, &mut backend);
            });
        });
        output
            .shapes
            .iter()
            .filter_map(|clipped| match &clipped.shape {
                Shape::Text(text) => Some(text.galley.text().to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_state_invites_an_upload() {
        let mut state = AppState::new(AppConfig::default(), BackendKind::BasicPlot);
        let text = painted_text(&mut state);
        assert!(text.iter().any(|t| t == "Upload a CSV or Excel file to get started."));
    }

    #[test]
    fn heatmap_is_titled_once() {
        let mut state = AppState::new(AppConfig::default(), BackendKind::BasicPlot);
        state.open(Upload::from_bytes("data.csv", b"a,b\n1,2\n2,4\n3,5\n".to_vec()));
        let text = painted_text(&mut state);
        assert_eq!(text.iter().filter(|t| *t == "Correlation Heatmap").count(), 1);
        assert!(text.iter().any(|t| t == "Preview of Data"));
    }
}
