use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Charting backends
// ---------------------------------------------------------------------------

/// The charting backends, most capable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Zoomable charts (`egui_plot`).
    #[serde(rename = "interactive")]
    Interactive,
    /// Static statistical charts rasterised with `plotters`.
    #[serde(rename = "statistical")]
    StatisticalPlot,
    /// Charts painted directly with egui shapes. Always present.
    #[serde(rename = "basic")]
    BasicPlot,
}

impl BackendKind {
    pub const PRIORITY: [BackendKind; 3] = [
        BackendKind::Interactive,
        BackendKind::StatisticalPlot,
        BackendKind::BasicPlot,
    ];

    /// Whether the backend's charting library was built into this binary.
    pub fn is_compiled_in(self) -> bool {
        match self {
            BackendKind::Interactive => cfg!(feature = "interactive"),
            BackendKind::StatisticalPlot => cfg!(feature = "statistical"),
            BackendKind::BasicPlot => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Interactive => "interactive charts",
            BackendKind::StatisticalPlot => "statistical plots",
            BackendKind::BasicPlot => "basic plots",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// A backend and the check telling whether it can be used.
pub struct Candidate<'a> {
    pub kind: BackendKind,
    pub probe: Box<dyn Fn() -> bool + 'a>,
}

impl<'a> Candidate<'a> {
    pub fn new(kind: BackendKind, probe: impl Fn() -> bool + 'a) -> Self {
        Candidate {
            kind,
            probe: Box::new(probe),
        }
    }
}

/// First candidate whose probe succeeds. `BasicPlot` needs no probe and
/// ends the chain; it is also the answer when nothing else matches.
pub fn select_backend(candidates: &[Candidate<'_>]) -> BackendKind {
    candidates
        .iter()
        .find(|c| c.kind == BackendKind::BasicPlot || (c.probe)())
        .map(|c| c.kind)
        .unwrap_or(BackendKind::BasicPlot)
}

/// Candidates in priority order: a backend is available when it is
/// compiled in and not disabled by the config.
pub fn candidates(config: &AppConfig) -> Vec<Candidate<'_>> {
    BackendKind::PRIORITY
        .into_iter()
        .map(|kind| {
            Candidate::new(kind, move || {
                kind.is_compiled_in() && !config.disabled_backends.contains(&kind)
            })
        })
        .collect()
}

/// Resolve the charting backend once for the whole session.
pub fn detect(config: &AppConfig) -> BackendKind {
    let backend = select_backend(&candidates(config));
    for kind in BackendKind::PRIORITY {
        log::debug!(
            "backend {kind}: compiled in = {}, disabled = {}",
            kind.is_compiled_in(),
            config.disabled_backends.contains(&kind)
        );
    }
    log::info!("Using {backend}");
    backend
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_available(available: &[BackendKind]) -> BackendKind {
        let list: Vec<Candidate<'_>> = BackendKind::PRIORITY
            .into_iter()
            .map(|kind| Candidate::new(kind, move || available.contains(&kind)))
            .collect();
        select_backend(&list)
    }

    #[test]
    fn first_available_wins() {
        use BackendKind::*;
        assert_eq!(with_available(&[Interactive, StatisticalPlot]), Interactive);
        assert_eq!(with_available(&[StatisticalPlot]), StatisticalPlot);
        assert_eq!(with_available(&[]), BasicPlot);
    }

    #[test]
    fn basic_plot_needs_no_probe() {
        let list = vec![
            Candidate::new(BackendKind::Interactive, || false),
            Candidate::new(BackendKind::BasicPlot, || false),
            Candidate::new(BackendKind::StatisticalPlot, || true),
        ];
        assert_eq!(select_backend(&list), BackendKind::BasicPlot);
        assert_eq!(select_backend(&[]), BackendKind::BasicPlot);
    }

    #[test]
    fn selection_is_deterministic() {
        let config = AppConfig::default();
        let first = detect(&config);
        for _ in 0..10 {
            assert_eq!(detect(&config), first);
        }
    }

    #[test]
    fn disabling_every_optional_backend_falls_back_to_basic() {
        let config = AppConfig {
            disabled_backends: vec![BackendKind::Interactive, BackendKind::StatisticalPlot],
            ..AppConfig::default()
        };
        assert_eq!(detect(&config), BackendKind::BasicPlot);
    }

    #[cfg(all(feature = "interactive", feature = "statistical"))]
    #[test]
    fn default_build_prefers_interactive() {
        assert_eq!(detect(&AppConfig::default()), BackendKind::Interactive);
        let config = AppConfig {
            disabled_backends: vec![BackendKind::Interactive],
            ..AppConfig::default()
        };
        assert_eq!(detect(&config), BackendKind::StatisticalPlot);
    }
}
