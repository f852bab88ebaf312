//! Statistical charts rasterised with plotters and shown as textures.
//!
//! Each chart is drawn once into an RGB buffer and cached until the chart
//! changes. Text goes through ab_glyph with egui's bundled sans-serif font,
//! so labels and annotations land in the pixels.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions, Ui};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{CHART_HEIGHT, ChartBackend};
use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::distribution::{BoxStats, TrendSeries};
use crate::analysis::flow::{Chart, HistogramChart};
use crate::capability::BackendKind;
use crate::color;

const IMAGE_SIZE: (u32, u32) = (900, 480);
const FONT: &str = "sans-serif";
/// egui's bundled proportional font, reused for chart text.
const FONT_SOURCE: &str = "Ubuntu-Light";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// A chart drawn into a packed RGB buffer.
pub struct Raster {
    pub size: [usize; 2],
    pub rgb: Vec<u8>,
}

struct Rendered {
    chart: Chart,
    texture: TextureHandle,
}

#[derive(Default)]
pub struct StatisticalBackend {
    cache: HashMap<String, Rendered>,
}

impl StatisticalBackend {
    /// Cached render of `chart`, re-rendered when the chart changed.
    fn rendered(&mut self, ctx: &egui::Context, chart: &Chart) -> Result<&Rendered> {
        let key = chart.key();
        let stale = self.cache.get(&key).map_or(true, |r| r.chart != *chart);
        if stale {
            let raster = render_rgb(chart)?;
            let image = ColorImage::from_rgb(raster.size, &raster.rgb);
            let rendered = Rendered {
                chart: chart.clone(),
                texture: ctx.load_texture(key.clone(), image, TextureOptions::LINEAR),
            };
            self.cache.insert(key.clone(), rendered);
        }
        self.cache
            .get(&key)
            .ok_or_else(|| anyhow!("chart {key} missing from cache"))
    }
}

impl ChartBackend for StatisticalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::StatisticalPlot
    }

    fn show(&mut self, ui: &mut Ui, chart: &Chart) {
        let ctx = ui.ctx().clone();
        match self.rendered(&ctx, chart) {
            Ok(r) => {
                let texture = egui::load::SizedTexture::from_handle(&r.texture);
                let image = egui::Image::from_texture(texture)
                    .max_width(ui.available_width())
                    .max_height(CHART_HEIGHT * 1.5);
                ui.add(image);
            }
            Err(e) => {
                log::error!("Failed to render {}: {e:#}", chart.key());
                ui.colored_label(Color32::RED, format!("Could not draw {}: {e:#}", chart.title()));
            }
        }
    }

    /// Dropping the handles frees the textures.
    fn reset(&mut self, _ctx: &egui::Context) {
        self.cache.clear();
    }
}

// ---------------------------------------------------------------------------
// Rasterising
// ---------------------------------------------------------------------------

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

/// Register egui's sans-serif font with plotters, once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    let registered = REGISTERED.get_or_init(|| {
        let fonts = egui::FontDefinitions::default();
        let data = fonts
            .font_data
            .get(FONT_SOURCE)
            .ok_or_else(|| format!("font {FONT_SOURCE} is not bundled"))?;
        let bytes: &'static [u8] = match &data.font {
            Cow::Borrowed(bytes) => *bytes,
            // lives as long as the registration, i.e. the process
            Cow::Owned(bytes) => Box::leak(bytes.clone().into_boxed_slice()),
        };
        register_font(FONT, FontStyle::Normal, bytes).map_err(|_| "invalid font data".to_string())
    });
    registered
        .clone()
        .map_err(|e| anyhow!("registering chart font: {e}"))
}

/// Render one chart into an RGB buffer of `IMAGE_SIZE`.
pub fn render_rgb(chart: &Chart) -> Result<Raster> {
    ensure_font()?;
    let (width, height) = IMAGE_SIZE;
    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, IMAGE_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        match chart {
            Chart::Histogram(h) => draw_histogram(&root, &chart.title(), h)?,
            Chart::BoxPlot(b) => draw_box_plot(&root, &chart.title(), b)?,
            Chart::Heatmap(m) => draw_heatmap(&root, &chart.title(), m)?,
            Chart::Trend(t) => draw_trend(&root, &chart.title(), t)?,
        }
        root.present()?;
    }
    Ok(Raster {
        size: [width as usize, height as usize],
        rgb,
    })
}

/// Histogram with the density curve laid over it.
fn draw_histogram(root: &Area<'_>, title: &str, data: &HistogramChart) -> Result<()> {
    let hist = &data.histogram;
    let (x0, x1) = hist.range();
    let curve: Vec<(f64, f64)> = data
        .kde
        .as_ref()
        .map(|kde| kde.scaled_to(hist))
        .unwrap_or_default()
        .into_iter()
        .filter(|(x, _)| *x >= x0 && *x <= x1)
        .collect();
    let curve_max = curve.iter().map(|(_, y)| *y).fold(0.0, f64::max);
    let y_max = (hist.max_count() as f64).max(curve_max).max(1.0) * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x0..x1, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(hist.column.as_str())
        .y_desc("Count")
        .draw()?;

    let bar = rgb(color::LINE_BLUE).mix(0.6);
    chart.draw_series(
        hist.bins
            .iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], bar.filled())),
    )?;
    chart.draw_series(hist.bins.iter().map(|b| {
        Rectangle::new(
            [(b.start, 0.0), (b.end, b.count as f64)],
            WHITE.stroke_width(1),
        )
    }))?;

    if !curve.is_empty() {
        chart.draw_series(LineSeries::new(curve, rgb(color::LINE_BLUE).stroke_width(2)))?;
    }
    Ok(())
}

/// Horizontal box plot: box from Q1 to Q3, median line, whiskers and
/// outlier dots.
fn draw_box_plot(root: &Area<'_>, title: &str, stats: &BoxStats) -> Result<()> {
    let (lo, hi) = stats.extent();
    let pad = ((hi - lo) * 0.05).max(0.5);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d((lo - pad)..(hi + pad), 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc(stats.column.as_str())
        .draw()?;

    let (bottom, top, mid) = (0.3, 0.7, 0.5);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, bottom), (stats.q3, top)],
        rgb(color::SKY_BLUE).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, bottom), (stats.q3, top)],
        BLACK.stroke_width(1),
    )))?;

    let segments = [
        vec![(stats.median, bottom), (stats.median, top)],
        vec![(stats.lower_whisker, mid), (stats.q1, mid)],
        vec![(stats.q3, mid), (stats.upper_whisker, mid)],
        vec![(stats.lower_whisker, 0.4), (stats.lower_whisker, 0.6)],
        vec![(stats.upper_whisker, 0.4), (stats.upper_whisker, 0.6)],
    ];
    chart.draw_series(
        segments
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
    )?;

    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|&v| Circle::new((v, mid), 4, BLACK.stroke_width(1))),
    )?;
    Ok(())
}

/// Annotated coolwarm heatmap; row 0 at the top.
fn draw_heatmap(root: &Area<'_>, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
    let n = matrix.size();
    let size = n as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..size, 0f64..size)?;

    for row in 0..n {
        let y = size - row as f64;
        chart.draw_series((0..n).map(|col| {
            let x = col as f64;
            Rectangle::new(
                [(x, y - 1.0), (x + 1.0, y)],
                rgb(color::coolwarm(matrix.get(row, col))).filled(),
            )
        }))?;
        chart.draw_series((0..n).map(|col| {
            let value = matrix.get(row, col);
            let style = (FONT, 15)
                .into_font()
                .color(&rgb(color::text_on(color::coolwarm(value))))
                .pos(Pos::new(HPos::Center, VPos::Center));
            EmptyElement::at((col as f64 + 0.5, y - 0.5))
                + Text::new(format!("{value:.2}"), (0, 0), style)
        }))?;
    }

    let x_style = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    chart.draw_series(matrix.labels.iter().enumerate().map(|(i, label)| {
        EmptyElement::at((i as f64 + 0.5, 0.0)) + Text::new(label.clone(), (0, 8), x_style.clone())
    }))?;

    let y_style = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    chart.draw_series(matrix.labels.iter().enumerate().map(|(i, label)| {
        EmptyElement::at((0.0, size - i as f64 - 0.5))
            + Text::new(label.clone(), (-8, 0), y_style.clone())
    }))?;
    Ok(())
}

/// Values against row index.
fn draw_trend(root: &Area<'_>, title: &str, series: &TrendSeries) -> Result<()> {
    let Some((lo, hi)) = series.value_range() else {
        root.draw(&Text::new(
            "No values to plot",
            (IMAGE_SIZE.0 as i32 / 2, IMAGE_SIZE.1 as i32 / 2),
            (FONT, 20).into_font().color(&BLACK),
        ))?;
        return Ok(());
    };
    let pad = ((hi - lo) * 0.05).max(0.5);
    let x_max = series.points.last().map_or(1.0, |(x, _)| x.max(1.0));

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..x_max, (lo - pad)..(hi + pad))?;

    chart
        .configure_mesh()
        .x_desc("Index")
        .y_desc(series.column.as_str())
        .draw()?;

    chart.draw_series(LineSeries::new(
        series.points.iter().copied(),
        rgb(color::LINE_BLUE).stroke_width(2),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::flow::{AnalysisOptions, render_distribution, render_trend};
    use crate::data::model::{CellValue, Column};

    fn heatmap(labels: [&str; 2], values: Vec<Vec<f64>>) -> Chart {
        Chart::Heatmap(CorrelationMatrix {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            values,
        })
    }

    fn pixels(raster: &Raster) -> Vec<[u8; 3]> {
        raster.rgb.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect()
    }

    /// Pixels of another colour lying between the first and last pixel of
    /// `fill` on the same row, i.e. drawn on top of the filled cells.
    fn marks_inside(raster: &Raster, fill: Color32) -> usize {
        let fill = [fill.r(), fill.g(), fill.b()];
        let all = pixels(raster);
        all.chunks_exact(raster.size[0])
            .map(|row| {
                match (
                    row.iter().position(|p| *p == fill),
                    row.iter().rposition(|p| *p == fill),
                ) {
                    (Some(a), Some(b)) => row[a..=b].iter().filter(|p| **p != fill).count(),
                    _ => 0,
                }
            })
            .sum()
    }

    #[test]
    fn renders_histogram_and_box_plot() {
        let column = Column::new("v", (0..50).map(|i| CellValue::Integer(i % 17)).collect());
        let options = AnalysisOptions {
            with_boxplot: true,
            ..AnalysisOptions::default()
        };
        for chart in render_distribution(&column, &options).unwrap() {
            let raster = render_rgb(&chart).unwrap();
            assert_eq!(raster.size, [IMAGE_SIZE.0 as usize, IMAGE_SIZE.1 as usize]);
            assert_eq!(raster.rgb.len(), raster.size[0] * raster.size[1] * 3);
            assert!(pixels(&raster).iter().any(|p| *p != [255, 255, 255]));
        }
    }

    #[test]
    fn heatmap_annotations_are_rasterised() {
        let chart = heatmap(["a", "b"], vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let raster = render_rgb(&chart).unwrap();
        // the "1.00" in each cell breaks up the solid fill
        assert!(marks_inside(&raster, color::coolwarm(1.0)) > 0);
    }

    #[test]
    fn axis_labels_are_rasterised() {
        let values = vec![vec![1.0, -0.25], vec![-0.25, 1.0]];
        let ab = render_rgb(&heatmap(["a", "b"], values.clone())).unwrap();
        let xy = render_rgb(&heatmap(["x", "y"], values)).unwrap();
        assert_ne!(ab.rgb, xy.rgb);
    }

    #[test]
    fn empty_trend_still_renders() {
        let column = Column::new("v", vec![CellValue::Null]);
        let chart = render_trend(&column).unwrap();
        let raster = render_rgb(&chart).unwrap();
        assert!(pixels(&raster).iter().any(|p| *p != [255, 255, 255]));
    }
}
