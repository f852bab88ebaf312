use eframe::egui::{self, Color32, Id, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};

use super::{CHART_HEIGHT, ChartBackend, label_at};
use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::distribution::{BoxStats, Histogram, TrendSeries};
use crate::analysis::flow::Chart;
use crate::capability::BackendKind;
use crate::color;

// ---------------------------------------------------------------------------
// Zoomable charts drawn with egui_plot
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InteractiveBackend {
    /// Bumped per table so plots never reuse the zoom of an older upload.
    generation: u64,
}

impl InteractiveBackend {
    fn plot_id(&self, chart: &Chart) -> Id {
        Id::new(("plot", chart.key(), self.generation))
    }
}

impl ChartBackend for InteractiveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Interactive
    }

    fn show(&mut self, ui: &mut Ui, chart: &Chart) {
        ui.strong(chart.title());
        let id = self.plot_id(chart);
        match chart {
            Chart::Histogram(h) => histogram(ui, id, &h.histogram),
            Chart::BoxPlot(b) => box_plot(ui, id, b),
            Chart::Heatmap(m) => heatmap(ui, id, m),
            Chart::Trend(t) => trend(ui, id, t),
        }
    }

    fn reset(&mut self, _ctx: &egui::Context) {
        self.generation += 1;
    }
}

fn histogram(ui: &mut Ui, id: Id, hist: &Histogram) {
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("[{:.4}, {:.4}]", b.start, b.end))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(hist.column.clone())
        .y_axis_label("count")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name(hist.column.clone())
                    .color(color::LINE_BLUE),
            );
        });
}

fn box_plot(ui: &mut Ui, id: Id, stats: &BoxStats) {
    let spread = BoxSpread::new(
        stats.lower_whisker,
        stats.q1,
        stats.median,
        stats.q3,
        stats.upper_whisker,
    );
    let elem = BoxElem::new(0.0, spread)
        .name(stats.column.clone())
        .box_width(0.5)
        .whisker_width(0.3)
        .fill(color::SKY_BLUE)
        .stroke(Stroke::new(1.5, color::LINE_BLUE));

    let outliers: Vec<[f64; 2]> = stats.outliers.iter().map(|&v| [0.0, v]).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(stats.column.clone())
        .show_x(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(stats.column.clone()));
            if !outliers.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::from(outliers))
                        .name("outliers")
                        .radius(3.0)
                        .color(color::KDE_ORANGE),
                );
            }
        });
}

fn heatmap(ui: &mut Ui, id: Id, matrix: &CorrelationMatrix) {
    let n = matrix.size();
    let x_labels = matrix.labels.clone();
    let y_labels: Vec<String> = matrix.labels.iter().rev().cloned().collect();

    Plot::new(id)
        .height(CHART_HEIGHT.max(60.0 * n as f32))
        .data_aspect(1.0)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .x_axis_formatter(move |mark, _range| {
            label_at(&x_labels, mark.value).unwrap_or_default().to_string()
        })
        .y_axis_formatter(move |mark, _range| {
            label_at(&y_labels, mark.value).unwrap_or_default().to_string()
        })
        .show(ui, |plot_ui| {
            for row in 0..n {
                for col in 0..n {
                    let value = matrix.get(row, col);
                    let fill = color::coolwarm(value);
                    let x = col as f64;
                    let y = (n - 1 - row) as f64;
                    let cell = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(format!("{value:.2}")).color(color::text_on(fill)),
                    ));
                }
            }
        });
}

fn trend(ui: &mut Ui, id: Id, series: &TrendSeries) {
    let points: PlotPoints = series.points.iter().map(|&(x, y)| [x, y]).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("index")
        .y_axis_label(series.column.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name(series.column.clone())
                    .color(color::LINE_BLUE)
                    .width(1.5),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::distribution::TrendSeries;

    #[test]
    fn plot_ids_change_with_each_table() {
        let chart = Chart::Trend(TrendSeries {
            column: "a".into(),
            points: vec![(0.0, 1.0)],
        });
        let mut backend = InteractiveBackend::default();
        let first = backend.plot_id(&chart);
        assert_eq!(backend.plot_id(&chart), first);

        backend.reset(&egui::Context::default());
        assert_ne!(backend.plot_id(&chart), first);
    }
}
