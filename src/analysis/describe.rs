use std::collections::HashMap;

use crate::data::model::{CellValue, Column, ColumnKind, DataTable};

// ---------------------------------------------------------------------------
// Descriptive statistics (describe over all columns)
// ---------------------------------------------------------------------------

/// One statistic row of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Count,
    Unique,
    Top,
    Freq,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Stat {
    const CATEGORICAL: [Stat; 3] = [Stat::Unique, Stat::Top, Stat::Freq];
    const NUMERIC: [Stat; 7] = [
        Stat::Mean,
        Stat::Std,
        Stat::Min,
        Stat::Q25,
        Stat::Q50,
        Stat::Q75,
        Stat::Max,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Count => "count",
            Stat::Unique => "unique",
            Stat::Top => "top",
            Stat::Freq => "freq",
            Stat::Mean => "mean",
            Stat::Std => "std",
            Stat::Min => "min",
            Stat::Q25 => "25%",
            Stat::Q50 => "50%",
            Stat::Q75 => "75%",
            Stat::Max => "max",
        }
    }
}

/// Statistics of a non-numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalStats {
    pub unique: usize,
    /// Most frequent value; the earliest one wins ties.
    pub top: Option<CellValue>,
    pub freq: usize,
}

/// Statistics of a numeric column. `None` when too few values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-missing cells.
    pub count: usize,
    pub stats: KindStats,
}

impl ColumnSummary {
    pub fn compute(column: &Column) -> Self {
        let stats = if column.is_numeric() {
            KindStats::Numeric(numeric_stats(&column.present_numbers()))
        } else {
            KindStats::Categorical(categorical_stats(&column.cells))
        };
        ColumnSummary {
            name: column.name.clone(),
            kind: column.kind,
            count: column.count(),
            stats,
        }
    }

    /// Display text for a statistic; "NaN" where it does not apply.
    pub fn display(&self, stat: Stat) -> String {
        const NAN: &str = "NaN";
        let fmt = |v: Option<f64>| v.map_or_else(|| NAN.to_string(), format_stat);
        match (&self.stats, stat) {
            (_, Stat::Count) => self.count.to_string(),
            (KindStats::Categorical(c), Stat::Unique) => c.unique.to_string(),
            (KindStats::Categorical(c), Stat::Top) => {
                c.top.as_ref().map_or_else(|| NAN.to_string(), |v| v.to_string())
            }
            (KindStats::Categorical(c), Stat::Freq) if c.top.is_some() => c.freq.to_string(),
            (KindStats::Numeric(n), Stat::Mean) => fmt(n.mean),
            (KindStats::Numeric(n), Stat::Std) => fmt(n.std),
            (KindStats::Numeric(n), Stat::Min) => fmt(n.min),
            (KindStats::Numeric(n), Stat::Q25) => fmt(n.q25),
            (KindStats::Numeric(n), Stat::Q50) => fmt(n.q50),
            (KindStats::Numeric(n), Stat::Q75) => fmt(n.q75),
            (KindStats::Numeric(n), Stat::Max) => fmt(n.max),
            _ => NAN.to_string(),
        }
    }
}

/// Summary of every column of a table, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub columns: Vec<ColumnSummary>,
}

impl Summary {
    /// Which statistic rows to show: categorical rows only when a
    /// non-numeric column exists, numeric rows only when a numeric one does.
    pub fn rows(&self) -> Vec<Stat> {
        let any_numeric = self.columns.iter().any(|c| c.kind.is_numeric());
        let any_other = self.columns.iter().any(|c| !c.kind.is_numeric());

        let mut rows = vec![Stat::Count];
        if any_other {
            rows.extend(Stat::CATEGORICAL);
        }
        if any_numeric {
            rows.extend(Stat::NUMERIC);
        }
        rows
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Descriptive statistics for every column of the table.
pub fn summarize(table: &DataTable) -> Summary {
    Summary {
        columns: table.columns().iter().map(ColumnSummary::compute).collect(),
    }
}

fn format_stat(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v:.6}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

pub fn numeric_stats(values: &[f64]) -> NumericStats {
    if values.is_empty() {
        return NumericStats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.len() > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    });

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    NumericStats {
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Quantile of already sorted values with linear interpolation between
/// the closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn categorical_stats(cells: &[CellValue]) -> CategoricalStats {
    // value → (count, first row)
    let mut counts: HashMap<&CellValue, (usize, usize)> = HashMap::new();
    for (row, cell) in cells.iter().enumerate() {
        if cell.is_missing() {
            continue;
        }
        counts.entry(cell).or_insert((0, row)).0 += 1;
    }

    let top = counts
        .iter()
        .max_by(|(_, (ca, ra)), (_, (cb, rb))| ca.cmp(cb).then(rb.cmp(ra)))
        .map(|(value, (count, _))| ((*value).clone(), *count));

    CategoricalStats {
        unique: counts.len(),
        freq: top.as_ref().map_or(0, |(_, c)| *c),
        top: top.map(|(v, _)| v),
    }
}
