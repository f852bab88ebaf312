/// Analysis layer: statistics and the per-upload pipeline.
///
/// ```text
///   DataTable ──► flow ──► preview / describe ──► AnalysisReport
///                  │
///                  ├──► distribution (histogram, KDE, box plot, trend)
///                  └──► correlation (Pearson matrix)
/// ```

pub mod correlation;
pub mod describe;
pub mod distribution;
pub mod flow;
