use eframe::egui::{
    Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, pos2, vec2,
};

use super::{CHART_HEIGHT, ChartBackend};
use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::distribution::{BoxStats, Histogram, TrendSeries};
use crate::analysis::flow::Chart;
use crate::capability::BackendKind;
use crate::color;

// ---------------------------------------------------------------------------
// Static charts painted with egui shapes (no plotting library needed)
// ---------------------------------------------------------------------------

pub struct BasicBackend;

impl ChartBackend for BasicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::BasicPlot
    }

    fn show(&mut self, ui: &mut Ui, chart: &Chart) {
        match chart {
            Chart::Histogram(h) => histogram(ui, &chart.title(), &h.histogram),
            Chart::BoxPlot(b) => box_plot(ui, &chart.title(), b),
            Chart::Heatmap(m) => heatmap(ui, &chart.title(), m),
            Chart::Trend(t) => trend(ui, &chart.title(), t),
        }
    }
}

const MARGIN_LEFT: f32 = 60.0;
const MARGIN_RIGHT: f32 = 20.0;
const MARGIN_TOP: f32 = 30.0;
const MARGIN_BOTTOM: f32 = 40.0;

/// Maps data coordinates into the plotting rectangle.
struct Axes {
    area: Rect,
    x: (f64, f64),
    y: (f64, f64),
}

impl Axes {
    fn to_screen(&self, x: f64, y: f64) -> Pos2 {
        let fx = ((x - self.x.0) / (self.x.1 - self.x.0)) as f32;
        let fy = ((y - self.y.0) / (self.y.1 - self.y.0)) as f32;
        pos2(
            self.area.left() + fx * self.area.width(),
            self.area.bottom() - fy * self.area.height(),
        )
    }

    /// Axis lines with the range ends written next to them.
    fn draw(&self, painter: &Painter, x_label: &str, y_label: &str) {
        let stroke = Stroke::new(1.0, Color32::GRAY);
        let a = self.area;
        painter.line_segment([a.left_bottom(), a.right_bottom()], stroke);
        painter.line_segment([a.left_bottom(), a.left_top()], stroke);

        let font = FontId::proportional(11.0);
        let text = Color32::GRAY;
        painter.text(a.left_bottom() + vec2(0.0, 4.0), Align2::LEFT_TOP, fmt_tick(self.x.0), font.clone(), text);
        painter.text(a.right_bottom() + vec2(0.0, 4.0), Align2::RIGHT_TOP, fmt_tick(self.x.1), font.clone(), text);
        painter.text(a.left_bottom() - vec2(4.0, 0.0), Align2::RIGHT_BOTTOM, fmt_tick(self.y.0), font.clone(), text);
        painter.text(a.left_top() - vec2(4.0, 0.0), Align2::RIGHT_TOP, fmt_tick(self.y.1), font.clone(), text);
        painter.text(
            pos2(a.center().x, a.bottom() + 22.0),
            Align2::CENTER_TOP,
            x_label,
            font.clone(),
            text,
        );
        painter.text(
            pos2(a.left() - 8.0, a.center().y),
            Align2::RIGHT_CENTER,
            y_label,
            font,
            text,
        );
    }
}

fn fmt_tick(v: f64) -> String {
    if v.abs() >= 1e4 || (v != 0.0 && v.abs() < 1e-2) {
        format!("{v:.2e}")
    } else {
        format!("{v:.2}")
    }
}

/// Reserve a chart-sized region and paint its title.
fn canvas(ui: &mut Ui, title: &str) -> (Painter, Rect) {
    let size = vec2(ui.available_width(), CHART_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    painter.text(
        pos2(rect.center().x, rect.top() + 4.0),
        Align2::CENTER_TOP,
        title,
        FontId::proportional(15.0),
        ui.visuals().strong_text_color(),
    );
    let area = Rect::from_min_max(
        pos2(rect.left() + MARGIN_LEFT, rect.top() + MARGIN_TOP),
        pos2(rect.right() - MARGIN_RIGHT, rect.bottom() - MARGIN_BOTTOM),
    );
    (painter, area)
}

fn histogram(ui: &mut Ui, title: &str, hist: &Histogram) {
    let (painter, area) = canvas(ui, title);
    let axes = Axes {
        area,
        x: hist.range(),
        y: (0.0, (hist.max_count() as f64).max(1.0) * 1.05),
    };

    let edge = Stroke::new(1.0, Color32::BLACK);
    for bin in &hist.bins {
        let top_left = axes.to_screen(bin.start, bin.count as f64);
        let bottom_right = axes.to_screen(bin.end, 0.0);
        let rect = Rect::from_two_pos(top_left, bottom_right);
        painter.rect_filled(rect, 0.0, color::SKY_BLUE);
        painter.add(Shape::closed_line(
            vec![rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()],
            edge,
        ));
    }
    axes.draw(&painter, &hist.column, "count");
}

fn box_plot(ui: &mut Ui, title: &str, stats: &BoxStats) {
    let (painter, area) = canvas(ui, title);
    let (lo, hi) = stats.extent();
    let pad = ((hi - lo) * 0.05).max(0.5);
    let axes = Axes {
        area,
        x: (lo - pad, hi + pad),
        y: (0.0, 1.0),
    };

    let stroke = Stroke::new(1.5, Color32::BLACK);
    let boxed = Rect::from_two_pos(axes.to_screen(stats.q1, 0.7), axes.to_screen(stats.q3, 0.3));
    painter.rect_filled(boxed, 0.0, color::SKY_BLUE);
    painter.add(Shape::closed_line(
        vec![boxed.left_top(), boxed.right_top(), boxed.right_bottom(), boxed.left_bottom()],
        stroke,
    ));

    let segment = |x0: f64, y0: f64, x1: f64, y1: f64| {
        painter.line_segment([axes.to_screen(x0, y0), axes.to_screen(x1, y1)], stroke);
    };
    segment(stats.median, 0.3, stats.median, 0.7);
    segment(stats.lower_whisker, 0.5, stats.q1, 0.5);
    segment(stats.q3, 0.5, stats.upper_whisker, 0.5);
    segment(stats.lower_whisker, 0.4, stats.lower_whisker, 0.6);
    segment(stats.upper_whisker, 0.4, stats.upper_whisker, 0.6);

    for &v in &stats.outliers {
        painter.circle_stroke(axes.to_screen(v, 0.5), 3.5, stroke);
    }

    // only the x axis carries meaning
    let a = axes.area;
    let font = FontId::proportional(11.0);
    painter.line_segment([a.left_bottom(), a.right_bottom()], Stroke::new(1.0, Color32::GRAY));
    painter.text(a.left_bottom() + vec2(0.0, 4.0), Align2::LEFT_TOP, fmt_tick(axes.x.0), font.clone(), Color32::GRAY);
    painter.text(a.right_bottom() + vec2(0.0, 4.0), Align2::RIGHT_TOP, fmt_tick(axes.x.1), font.clone(), Color32::GRAY);
    painter.text(
        pos2(a.center().x, a.bottom() + 22.0),
        Align2::CENTER_TOP,
        &stats.column,
        font,
        Color32::GRAY,
    );
}

/// Matrix of coloured cells with a colour bar, no annotations.
fn heatmap(ui: &mut Ui, title: &str, matrix: &CorrelationMatrix) {
    let n = matrix.size();
    if n == 0 {
        return;
    }
    let height = CHART_HEIGHT.max(28.0 * n as f32 + MARGIN_TOP + MARGIN_BOTTOM + 60.0);
    let (response, painter) = ui.allocate_painter(vec2(ui.available_width(), height), Sense::hover());
    let rect = response.rect;
    painter.text(
        pos2(rect.center().x, rect.top() + 4.0),
        Align2::CENTER_TOP,
        title,
        FontId::proportional(15.0),
        ui.visuals().strong_text_color(),
    );

    let label_width = 110.0;
    let side = (rect.width() - label_width - 80.0)
        .min(height - MARGIN_TOP - MARGIN_BOTTOM - 60.0)
        .max(20.0);
    let cell = side / n as f32;
    let origin = pos2(rect.left() + label_width, rect.top() + MARGIN_TOP);
    let font = FontId::proportional(11.0);
    let text = ui.visuals().text_color();

    for row in 0..n {
        for col in 0..n {
            let min = origin + vec2(col as f32 * cell, row as f32 * cell);
            let value = matrix.get(row, col);
            painter.rect_filled(
                Rect::from_min_size(min, vec2(cell, cell)),
                0.0,
                color::coolwarm(value),
            );
        }
        painter.text(
            origin + vec2(-6.0, (row as f32 + 0.5) * cell),
            Align2::RIGHT_CENTER,
            &matrix.labels[row],
            font.clone(),
            text,
        );
        painter.text(
            origin + vec2((row as f32 + 0.5) * cell, side + 6.0),
            Align2::CENTER_TOP,
            &matrix.labels[row],
            font.clone(),
            text,
        );
    }

    // colour bar, +1 at the top
    let bar_left = origin.x + side + 20.0;
    let ramp = color::coolwarm_ramp(64);
    let step = side / ramp.len() as f32;
    for (i, (_, c)) in ramp.iter().rev().enumerate() {
        let min = pos2(bar_left, origin.y + i as f32 * step);
        painter.rect_filled(Rect::from_min_size(min, vec2(14.0, step + 0.5)), 0.0, *c);
    }
    painter.text(pos2(bar_left + 18.0, origin.y), Align2::LEFT_TOP, "1.0", font.clone(), text);
    painter.text(
        pos2(bar_left + 18.0, origin.y + side / 2.0),
        Align2::LEFT_CENTER,
        "0.0",
        font.clone(),
        text,
    );
    painter.text(pos2(bar_left + 18.0, origin.y + side), Align2::LEFT_BOTTOM, "-1.0", font, text);

    if let Some(pos) = response.hover_pos() {
        let rel = (pos - origin) / cell;
        let (col, row) = (rel.x.floor(), rel.y.floor());
        if col >= 0.0 && row >= 0.0 && (col as usize) < n && (row as usize) < n {
            let (row, col) = (row as usize, col as usize);
            response.on_hover_text(format!(
                "{} / {}: {:.3}",
                matrix.labels[row],
                matrix.labels[col],
                matrix.get(row, col)
            ));
        }
    }
}

/// Line through the values with a circle marker on each point.
fn trend(ui: &mut Ui, title: &str, series: &TrendSeries) {
    let (painter, area) = canvas(ui, title);
    let Some((lo, hi)) = series.value_range() else {
        painter.text(
            area.center(),
            Align2::CENTER_CENTER,
            "No values to plot",
            FontId::proportional(13.0),
            Color32::GRAY,
        );
        return;
    };
    let pad = ((hi - lo) * 0.05).max(0.5);
    let x_max = series.points.last().map_or(1.0, |(x, _)| x.max(1.0));
    let axes = Axes {
        area,
        x: (0.0, x_max),
        y: (lo - pad, hi + pad),
    };

    let points: Vec<Pos2> = series
        .points
        .iter()
        .map(|&(x, y)| axes.to_screen(x, y))
        .collect();
    painter.add(Shape::line(points.clone(), Stroke::new(1.5, color::LINE_BLUE)));
    // markers get noisy on long series
    if points.len() <= 500 {
        for p in points {
            painter.circle_filled(p, 2.5, color::LINE_BLUE);
        }
    }
    axes.draw(&painter, "Index", &series.column);
}
