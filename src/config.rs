use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capability::BackendKind;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RUSTY_DESCRIBE_CONFIG";
/// Config file picked up from the working directory.
pub const CONFIG_FILE: &str = "rusty-describe.json";

// ---------------------------------------------------------------------------
// Distribution profiles
// ---------------------------------------------------------------------------

/// How the distribution of a numeric column is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionProfile {
    /// 30-bin histogram.
    #[default]
    Standard,
    /// 20-bin histogram followed by a box plot.
    Extended,
}

impl DistributionProfile {
    pub fn bins(self) -> usize {
        match self {
            DistributionProfile::Standard => 30,
            DistributionProfile::Extended => 20,
        }
    }

    pub fn with_boxplot(self) -> bool {
        self == DistributionProfile::Extended
    }

    pub fn label(self) -> &'static str {
        match self {
            DistributionProfile::Standard => "Histogram",
            DistributionProfile::Extended => "Histogram + Box plot",
        }
    }
}

// ---------------------------------------------------------------------------
// Application config
// ---------------------------------------------------------------------------

/// Start-up settings, read from JSON. Every field is optional.
///
/// ```json
/// {
///   "preview_rows": 5,
///   "distribution": "extended",
///   "bins": 25,
///   "disabled_backends": ["interactive"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    pub distribution: DistributionProfile,
    /// Overrides the profile's bin count.
    pub bins: Option<usize>,
    /// Backends treated as unavailable during detection.
    pub disabled_backends: Vec<BackendKind>,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            distribution: DistributionProfile::default(),
            bins: None,
            disabled_backends: Vec::new(),
            window_size: [1200.0, 900.0],
        }
    }
}

impl AppConfig {
    /// Load from `$RUSTY_DESCRIBE_CONFIG`, else `./rusty-describe.json`,
    /// else defaults. A broken file is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            log::debug!("No config file found, using defaults");
            return Self::default();
        };
        match Self::from_path(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading config file")?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing config JSON")
    }

    /// Bin count actually used for histograms.
    pub fn histogram_bins(&self) -> usize {
        self.bins
            .filter(|b| *b > 0)
            .unwrap_or_else(|| self.distribution.bins())
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    let local = PathBuf::from(CONFIG_FILE);
    local.is_file().then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.histogram_bins(), 30);
    }

    #[test]
    fn extended_profile_and_overrides() {
        let config = AppConfig::from_json(
            r#"{"distribution": "extended", "disabled_backends": ["interactive", "statistical"]}"#,
        )
        .unwrap();
        assert_eq!(config.histogram_bins(), 20);
        assert!(config.distribution.with_boxplot());
        assert_eq!(
            config.disabled_backends,
            vec![BackendKind::Interactive, BackendKind::StatisticalPlot]
        );

        let config = AppConfig::from_json(r#"{"bins": 12}"#).unwrap();
        assert_eq!(config.histogram_bins(), 12);
        let config = AppConfig::from_json(r#"{"bins": 0}"#).unwrap();
        assert_eq!(config.histogram_bins(), 30);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(AppConfig::from_json(r#"{"distribution": "fancy"}"#).is_err());
        assert!(AppConfig::from_json("not json").is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"preview_rows": 10}"#).unwrap();
        assert_eq!(AppConfig::from_path(&path).unwrap().preview_rows, 10);
        assert!(AppConfig::from_path(&dir.path().join("missing.json")).is_err());
    }
}
