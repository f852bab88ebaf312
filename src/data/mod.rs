/// Data layer: cell/column/table types and file loading.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse upload → DataTable (typed columns)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ DataTable  │  unique column names, numeric subset
///   └───────────┘
/// ```

pub mod loader;
pub mod model;
