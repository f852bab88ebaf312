use thiserror::Error;

/// The uploaded file could not be turned into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file type '{name}' (expected .csv, .xlsx, .parquet or .json)")]
    UnsupportedExtension { name: String },

    #[error("could not read {name}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {name}")]
    Parse {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl LoadError {
    pub fn parse(name: &str, err: anyhow::Error) -> Self {
        LoadError::Parse {
            name: name.to_string(),
            source: err.into(),
        }
    }
}

/// A numeric-only chart was requested for a non-numeric column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}' is {kind}, not numeric; nothing to plot")]
pub struct UnsupportedColumnError {
    pub column: String,
    pub kind: &'static str,
}
