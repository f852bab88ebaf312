use super::correlation::{CorrelationMatrix, correlation_matrix};
use super::describe::{Summary, summarize};
use super::distribution::{BoxStats, Histogram, Kde, TrendSeries};
use crate::config::AppConfig;
use crate::data::loader::{self, Upload};
use crate::data::model::{Column, DataTable};
use crate::error::{LoadError, UnsupportedColumnError};

/// Shown when a table has nothing to chart.
pub const NO_NUMERIC_COLUMNS: &str = "No numeric columns found in your dataset.";

/// Points on which the density curve is evaluated.
const KDE_POINTS: usize = 200;

// ---------------------------------------------------------------------------
// Pipeline types
// ---------------------------------------------------------------------------

/// Where the current upload is in the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    #[default]
    NoFile,
    Loaded,
    Previewed,
    Summarized,
    Rendered,
}

/// Knobs of one analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub preview_rows: usize,
    pub bins: usize,
    pub with_boxplot: bool,
}

impl AnalysisOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        AnalysisOptions {
            preview_rows: config.preview_rows,
            bins: config.histogram_bins(),
            with_boxplot: config.distribution.with_boxplot(),
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Columns picked by the user. `None` means "first numeric column".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub distribution: Option<String>,
    pub trend: Option<String>,
}

/// Histogram plus the density curve drawn over it by backends that can.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    pub histogram: Histogram,
    pub kde: Option<Kde>,
}

/// A chart ready to hand to a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Histogram(HistogramChart),
    BoxPlot(BoxStats),
    Heatmap(CorrelationMatrix),
    Trend(TrendSeries),
}

impl Chart {
    /// Stable name, unique per chart kind and column.
    pub fn key(&self) -> String {
        match self {
            Chart::Histogram(h) => format!("hist-{}", h.histogram.column),
            Chart::BoxPlot(b) => format!("box-{}", b.column),
            Chart::Heatmap(_) => "corr".to_string(),
            Chart::Trend(t) => format!("trend-{}", t.column),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Chart::Histogram(h) => format!("Distribution of {}", h.histogram.column),
            Chart::BoxPlot(b) => format!("Box plot of {}", b.column),
            Chart::Heatmap(_) => "Correlation Heatmap".to_string(),
            Chart::Trend(t) => format!("Trend of {}", t.column),
        }
    }
}

/// Everything one pass produces for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub preview: DataTable,
    pub summary: Summary,
    pub numeric_columns: Vec<String>,
    /// Selection after defaults were applied.
    pub selection: Selection,
    /// `None` when no column was selected for the distribution.
    pub distribution: Option<Result<Vec<Chart>, UnsupportedColumnError>>,
    pub correlation: Option<Chart>,
    pub trend: Option<Chart>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// The first `rows` rows of the table, unmodified.
pub fn preview(table: &DataTable, rows: usize) -> DataTable {
    table.head(rows)
}

/// Histogram (and box plot when asked) of a numeric column.
pub fn render_distribution(
    column: &Column,
    options: &AnalysisOptions,
) -> Result<Vec<Chart>, UnsupportedColumnError> {
    if !column.is_numeric() {
        return Err(UnsupportedColumnError {
            column: column.name.clone(),
            kind: column.kind.label(),
        });
    }

    let values = column.present_numbers();
    let mut charts = Vec::new();
    if let Some(histogram) = Histogram::compute(&column.name, &values, options.bins) {
        charts.push(Chart::Histogram(HistogramChart {
            histogram,
            kde: Kde::compute(&values, KDE_POINTS),
        }));
    }
    if options.with_boxplot {
        if let Some(stats) = BoxStats::compute(&column.name, &values) {
            charts.push(Chart::BoxPlot(stats));
        }
    }
    Ok(charts)
}

/// Correlation heatmap, skipped for fewer than two numeric columns.
pub fn render_correlation(table: &DataTable) -> Option<Chart> {
    correlation_matrix(table).map(Chart::Heatmap)
}

/// Values against row index; only numeric columns have a trend.
pub fn render_trend(column: &Column) -> Option<Chart> {
    column
        .is_numeric()
        .then(|| Chart::Trend(TrendSeries::from_column(column)))
}

/// Fill in defaults: the distribution may name any column, the trend
/// must name a numeric one.
fn resolve_selection(table: &DataTable, selection: &Selection) -> Selection {
    let numeric = table.numeric_column_names();
    let first = numeric.first().cloned();

    let distribution = selection
        .distribution
        .clone()
        .filter(|name| table.select_column(name).is_some())
        .or_else(|| first.clone());
    let trend = selection
        .trend
        .clone()
        .filter(|name| numeric.contains(name))
        .or(first);

    Selection {
        distribution,
        trend,
    }
}

// ---------------------------------------------------------------------------
// Flow controller
// ---------------------------------------------------------------------------

/// Owns the loaded table and sequences one analysis pass over it:
/// `NoFile → Loaded → Previewed → Summarized → Rendered`.
#[derive(Debug, Default)]
pub struct AnalysisFlow {
    table: Option<DataTable>,
    stage: Stage,
    /// Bumped on every successful load.
    generation: u64,
}

impl AnalysisFlow {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the table with a freshly loaded one. On failure the old
    /// table is gone too and the flow is back at `NoFile`.
    pub fn load(&mut self, upload: &Upload) -> Result<&DataTable, LoadError> {
        self.clear();
        let table = loader::load(upload)?;
        log::info!(
            "Loaded {} rows with columns {:?}",
            table.len(),
            table.column_names()
        );
        self.generation += 1;
        self.stage = Stage::Loaded;
        Ok(self.table.insert(table))
    }

    pub fn clear(&mut self) {
        self.table = None;
        self.stage = Stage::NoFile;
    }

    /// Run the whole pipeline from scratch against the loaded table.
    pub fn run(&mut self, selection: &Selection, options: &AnalysisOptions) -> Option<AnalysisReport> {
        let table = self.table.as_ref()?;
        self.stage = Stage::Loaded;

        let preview = preview(table, options.preview_rows);
        self.stage = Stage::Previewed;

        let summary = summarize(table);
        self.stage = Stage::Summarized;

        let numeric_columns = table.numeric_column_names();
        let selection = resolve_selection(table, selection);
        let mut warnings = Vec::new();
        if numeric_columns.is_empty() {
            log::warn!("{}: {NO_NUMERIC_COLUMNS}", table.source);
            warnings.push(NO_NUMERIC_COLUMNS.to_string());
        }

        let distribution = selection
            .distribution
            .as_deref()
            .and_then(|name| table.select_column(name))
            .map(|column| render_distribution(column, options));
        if let Some(Err(e)) = &distribution {
            log::warn!("{e}");
            warnings.push(e.to_string());
        }

        let correlation = render_correlation(table);
        if correlation.is_none() {
            log::debug!("Correlation skipped: fewer than two numeric columns");
        }

        let trend = selection
            .trend
            .as_deref()
            .and_then(|name| table.select_column(name))
            .and_then(render_trend);

        self.stage = Stage::Rendered;
        Some(AnalysisReport {
            preview,
            summary,
            numeric_columns,
            selection,
            distribution,
            correlation,
            trend,
            warnings,
        })
    }
}
