use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{Result, bail};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Value counts key a `HashMap` by cell, so `CellValue` is `Eq + Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Dates and timestamps are kept as display text.
    Date(String),
    Null,
}

impl Eq for CellValue {}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "NaN"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. NaN floats count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whether the cell holds no value (explicit null or NaN float).
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Null) || matches!(self, CellValue::Float(v) if v.is_nan())
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – inferred type tag of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    DateTime,
    Text,
}

impl ColumnKind {
    /// Infer the kind from the non-missing cells. A column without any
    /// values is numeric (a float column of missing values).
    pub fn infer(cells: &[CellValue]) -> Self {
        let mut present = cells.iter().filter(|c| !c.is_missing()).peekable();
        if present.peek().is_none() {
            return ColumnKind::Numeric;
        }

        let mut numeric = true;
        let mut boolean = true;
        let mut date = true;
        for cell in present {
            numeric &= matches!(cell, CellValue::Integer(_) | CellValue::Float(_));
            boolean &= matches!(cell, CellValue::Bool(_));
            date &= matches!(cell, CellValue::Date(_));
        }

        if numeric {
            ColumnKind::Numeric
        } else if boolean {
            ColumnKind::Boolean
        } else if date {
            ColumnKind::DateTime
        } else {
            ColumnKind::Text
        }
    }

    pub fn is_numeric(self) -> bool {
        self == ColumnKind::Numeric
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Boolean => "bool",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Text => "text",
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named column of the table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        let kind = ColumnKind::infer(&cells);
        Column {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    /// One entry per row, `None` where the value is missing or not a number.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(CellValue::as_f64).collect()
    }

    /// Present numeric values only, in row order.
    pub fn present_numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(CellValue::as_f64).collect()
    }

    /// Number of non-missing cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_missing()).count()
    }
}

// ---------------------------------------------------------------------------
// DataTable – the loaded table for one rendering pass
// ---------------------------------------------------------------------------

/// A rectangular table of uniquely named columns, created fresh on each
/// upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    /// File name the table was loaded from.
    pub source: String,
    columns: Vec<Column>,
    n_rows: usize,
}

impl DataTable {
    /// Build a table from `(header, cells)` pairs. Header names are made
    /// unique and every column must have the same number of cells.
    pub fn from_columns(
        source: impl Into<String>,
        raw: Vec<(String, Vec<CellValue>)>,
    ) -> Result<Self> {
        let n_rows = raw.first().map(|(_, cells)| cells.len()).unwrap_or(0);
        for (name, cells) in &raw {
            if cells.len() != n_rows {
                bail!(
                    "column '{name}' has {} values but expected {n_rows}",
                    cells.len()
                );
            }
        }

        let headers: Vec<String> = raw.iter().map(|(name, _)| name.clone()).collect();
        let names = unique_column_names(&headers);
        let columns = names
            .into_iter()
            .zip(raw)
            .map(|(name, (_, cells))| Column::new(name, cells))
            .collect();

        Ok(DataTable {
            source: source.into(),
            columns,
            n_rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name, together with its kind tag.
    pub fn select_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.numeric_columns()
            .into_iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// The first `n` rows, unmodified.
    pub fn head(&self, n: usize) -> DataTable {
        let take = n.min(self.n_rows);
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                cells: c.cells[..take].to_vec(),
            })
            .collect();
        DataTable {
            source: self.source.clone(),
            columns,
            n_rows: take,
        }
    }

    /// Cells of row `i`, in column order.
    pub fn row(&self, i: usize) -> Vec<&CellValue> {
        self.columns.iter().filter_map(|c| c.cells.get(i)).collect()
    }
}

/// Make header names unique: blanks become `Unnamed: <i>`, repeats get a
/// `.1`, `.2`, … suffix.
pub fn unique_column_names(headers: &[String]) -> Vec<String> {
    let base: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::new();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut names = Vec::with_capacity(base.len());

    for name in base {
        let counter = seen.entry(name.clone()).or_insert(0);
        let mut candidate = name.clone();
        while taken.contains(&candidate) {
            *counter += 1;
            candidate = format!("{name}.{counter}");
        }
        taken.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DataTable {
        DataTable::from_columns(
            "sample.csv",
            vec![
                (
                    "id".to_string(),
                    (1..=8).map(CellValue::Integer).collect(),
                ),
                (
                    "label".to_string(),
                    (1..=8).map(|i| CellValue::String(format!("r{i}"))).collect(),
                ),
                (
                    "score".to_string(),
                    (1..=8).map(|i| CellValue::Float(i as f64 * 0.5)).collect(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn head_never_exceeds_row_count() {
        let table = sample_table();
        assert_eq!(table.head(5).len(), 5);
        assert_eq!(table.head(50).len(), 8);
        assert_eq!(table.head(0).len(), 0);
        assert_eq!(table.head(5).columns().len(), 3);
    }

    #[test]
    fn head_keeps_values_unmodified() {
        let table = sample_table();
        let head = table.head(2);
        assert_eq!(head.row(1), table.row(1));
    }

    #[test]
    fn numeric_columns_follow_schema() {
        let table = sample_table();
        assert_eq!(table.numeric_column_names(), vec!["id", "score"]);
        assert_eq!(
            table.select_column("label").map(|c| c.kind),
            Some(ColumnKind::Text)
        );
        assert!(table.select_column("missing").is_none());
    }

    #[test]
    fn kind_inference() {
        use CellValue::*;
        assert_eq!(
            ColumnKind::infer(&[Integer(1), Float(2.5), Null]),
            ColumnKind::Numeric
        );
        assert_eq!(ColumnKind::infer(&[Bool(true), Null]), ColumnKind::Boolean);
        assert_eq!(
            ColumnKind::infer(&[Integer(1), String("x".into())]),
            ColumnKind::Text
        );
        assert_eq!(ColumnKind::infer(&[Null, Float(f64::NAN)]), ColumnKind::Numeric);
        assert_eq!(
            ColumnKind::infer(&[Date("2024-01-01".into())]),
            ColumnKind::DateTime
        );
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let headers: Vec<String> = ["a", "a", "", "b", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            unique_column_names(&headers),
            vec!["a", "a.1", "Unnamed: 2", "b", "a.2"]
        );
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let result = DataTable::from_columns(
            "bad",
            vec![
                ("a".to_string(), vec![CellValue::Integer(1)]),
                ("b".to_string(), vec![]),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn equal_cells_count_together() {
        use std::collections::HashMap;
        let cells = [
            CellValue::String("x".into()),
            CellValue::Date("x".into()),
            CellValue::String("x".into()),
            CellValue::Integer(1),
            CellValue::Null,
            CellValue::Null,
        ];
        let mut counts: HashMap<&CellValue, usize> = HashMap::new();
        for cell in &cells {
            *counts.entry(cell).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&CellValue::String("x".into())], 2);
        assert_eq!(counts[&CellValue::Null], 2);
    }
}
