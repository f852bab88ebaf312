use super::describe::quantile;
use crate::data::model::Column;

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width histogram over `[min, max]`; the last bin includes `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
    /// Number of values binned.
    pub total: usize,
}

impl Histogram {
    /// `None` when there is nothing to bin. Infinite values are left out.
    pub fn compute(column: &str, values: &[f64], bins: usize) -> Option<Self> {
        let values = finite(values);
        if values.is_empty() || bins == 0 {
            return None;
        }
        let (mut lo, mut hi) = min_max(&values)?;
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in &values {
            let idx = ((v - lo) / width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                start: lo + i as f64 * width,
                end: if i + 1 == bins { hi } else { lo + (i + 1) as f64 * width },
                count,
            })
            .collect();

        Some(Histogram {
            column: column.to_string(),
            bins,
            total: values.len(),
        })
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn range(&self) -> (f64, f64) {
        let start = self.bins.first().map_or(0.0, |b| b.start);
        let end = self.bins.last().map_or(1.0, |b| b.end);
        (start, end)
    }

    pub fn bin_width(&self) -> f64 {
        self.bins.first().map_or(1.0, Bin::width)
    }
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Range of the finite values, `None` when there are none.
fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

// ---------------------------------------------------------------------------
// Box plot statistics
// ---------------------------------------------------------------------------

/// Quartiles with Tukey whiskers (1.5 × IQR).
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub column: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Highest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn compute(column: &str, values: &[f64]) -> Option<Self> {
        let mut sorted = finite(values);
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside = || sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxStats {
            column: column.to_string(),
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }

    /// Smallest and largest value drawn, outliers included.
    pub fn extent(&self) -> (f64, f64) {
        let lo = self
            .outliers
            .iter()
            .copied()
            .fold(self.lower_whisker, f64::min);
        let hi = self
            .outliers
            .iter()
            .copied()
            .fold(self.upper_whisker, f64::max);
        (lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Kernel density estimate
// ---------------------------------------------------------------------------

/// Gaussian KDE evaluated on an even grid, Scott's rule bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    pub bandwidth: f64,
    /// `(x, density)` pairs.
    pub points: Vec<(f64, f64)>,
}

impl Kde {
    /// `None` for fewer than two values or a constant series.
    pub fn compute(values: &[f64], grid: usize) -> Option<Self> {
        let values = finite(values);
        let n = values.len();
        if n < 2 || grid < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std = var.sqrt();
        if std == 0.0 || !std.is_finite() {
            return None;
        }

        let bandwidth = std * (n as f64).powf(-0.2);
        let (min, max) = min_max(&values)?;
        let lo = min - 3.0 * bandwidth;
        let hi = max + 3.0 * bandwidth;
        let step = (hi - lo) / (grid - 1) as f64;
        let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

        let points = (0..grid)
            .map(|i| {
                let x = lo + i as f64 * step;
                let density: f64 = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum();
                (x, density * norm)
            })
            .collect();

        Some(Kde { bandwidth, points })
    }

    /// Density scaled to histogram counts, so the curve overlays the bars.
    pub fn scaled_to(&self, hist: &Histogram) -> Vec<(f64, f64)> {
        let scale = hist.total as f64 * hist.bin_width();
        self.points.iter().map(|&(x, d)| (x, d * scale)).collect()
    }
}

// ---------------------------------------------------------------------------
// Trend series
// ---------------------------------------------------------------------------

/// Values of a column plotted against their row index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub column: String,
    /// `(row index, value)`; missing and infinite values are skipped.
    pub points: Vec<(f64, f64)>,
}

impl TrendSeries {
    pub fn from_column(column: &Column) -> Self {
        let points = column
            .numeric_values()
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
            .collect();
        TrendSeries {
            column: column.name.clone(),
            points,
        }
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = self.points.iter().map(|(_, y)| *y).collect();
        min_max(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let hist = Histogram::compute("v", &values, 30).unwrap();
        assert_eq!(hist.bins.len(), 30);
        assert_eq!(hist.bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert_eq!(hist.range(), (0.0, 99.0));
        // max lands in the last (closed) bin
        assert!(hist.bins[29].count > 0);
    }

    #[test]
    fn constant_histogram_spans_one_unit() {
        let hist = Histogram::compute("v", &[4.0, 4.0, 4.0], 20).unwrap();
        assert_eq!(hist.range(), (3.5, 4.5));
        assert_eq!(hist.max_count(), 3);
    }

    #[test]
    fn empty_histogram() {
        assert!(Histogram::compute("v", &[], 20).is_none());
        assert!(Histogram::compute("v", &[1.0], 0).is_none());
    }

    #[test]
    fn box_stats_with_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let stats = BoxStats::compute("v", &values).unwrap();
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.q3, 7.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 8.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.extent(), (1.0, 100.0));
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let kde = Kde::compute(&values, 400).unwrap();
        let step = kde.points[1].0 - kde.points[0].0;
        let area: f64 = kde.points.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area = {area}");
    }

    #[test]
    fn kde_needs_spread() {
        assert!(Kde::compute(&[1.0], 100).is_none());
        assert!(Kde::compute(&[2.0, 2.0, 2.0], 100).is_none());
    }

    #[test]
    fn trend_skips_missing_rows() {
        let column = Column::new(
            "v",
            vec![CellValue::Float(1.0), CellValue::Null, CellValue::Integer(3)],
        );
        let trend = TrendSeries::from_column(&column);
        assert_eq!(trend.points, vec![(0.0, 1.0), (2.0, 3.0)]);
        assert_eq!(trend.value_range(), Some((1.0, 3.0)));
    }

    #[test]
    fn infinite_values_do_not_hide_the_rest() {
        let values = [1.0, f64::INFINITY, 2.0, f64::NEG_INFINITY, 3.0];
        let hist = Histogram::compute("v", &values, 4).unwrap();
        assert_eq!(hist.total, 3);
        assert_eq!(hist.range(), (1.0, 3.0));
        assert!(Kde::compute(&values, 50).is_some());
        assert_eq!(BoxStats::compute("v", &values).unwrap().extent(), (1.0, 3.0));

        let column = Column::new(
            "v",
            vec![
                CellValue::Float(1.0),
                CellValue::Float(f64::INFINITY),
                CellValue::Float(3.0),
            ],
        );
        let trend = TrendSeries::from_column(&column);
        assert_eq!(trend.points, vec![(0.0, 1.0), (2.0, 3.0)]);
        assert_eq!(trend.value_range(), Some((1.0, 3.0)));
    }
}
