//! One parsed xtck run and the statistics derived from it.

use crate::core::io::xtck::{self, TimeWindow, XtckError};
use crate::core::models::frame::StateTable;
use crate::core::models::metadata::SimulationMetadata;
use crate::engine::bootstrap::{BootstrapConfig, BootstrapResult, ConfidenceInterval};
use crate::engine::error::EngineError;
use crate::engine::occupancy;
use crate::engine::states::{self, StateSet, StateSpan};
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

/// A single simulation run: immutable metadata and state table, plus the
/// single-run statistics operations. Loading is atomic — any parse failure
/// yields no `Run` at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    metadata: SimulationMetadata,
    table: StateTable,
}

impl Run {
    #[instrument(level = "info", skip(path, window), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P, window: TimeWindow) -> Result<Self, XtckError> {
        let (metadata, table) = xtck::read_from_path(path.as_ref(), window)?;
        info!(
            frames = metadata.frame_number,
            waters = metadata.wat_number,
            ions = metadata.k_number,
            "loaded xtck run"
        );
        Ok(Self { metadata, table })
    }

    pub fn from_parts(metadata: SimulationMetadata, table: StateTable) -> Self {
        Self { metadata, table }
    }

    pub fn metadata(&self) -> &SimulationMetadata {
        &self.metadata
    }

    /// The full per-frame state table, in chronological order.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Occupancy fraction for each of the 18 site/label keys.
    pub fn occupancy(&self) -> HashMap<String, f64> {
        occupancy::occupancy_map(&self.table.site_columns())
    }

    /// Paired-resampling bootstrap of the 18 occupancy fractions.
    pub fn occupancy_bootstrap(
        &self,
        config: &BootstrapConfig,
        rng: &mut impl Rng,
    ) -> Result<(BootstrapResult, HashMap<String, ConfidenceInterval>), EngineError> {
        occupancy::occupancy_bootstrap(&self.table, config, rng)
    }

    /// Per-frame state patterns over the chosen span, in frame order.
    pub fn patterns(&self, span: StateSpan) -> Vec<String> {
        states::state_patterns(&self.table, span)
    }

    /// The distinct patterns of this run, frozen in first-appearance order.
    pub fn state_set(&self, span: StateSpan) -> StateSet {
        StateSet::from_patterns(&self.patterns(span))
    }

    /// One-call pattern distribution over the patterns observed in this run,
    /// as a mapping. Key order is not part of the contract here; use
    /// [`Run::state_set`] and [`states::state_distribution`] where a fixed
    /// order matters.
    pub fn state_distribution_map(&self, span: StateSpan) -> HashMap<String, f64> {
        let patterns = self.patterns(span);
        let set = StateSet::from_patterns(&patterns);
        let fractions = states::state_distribution(&patterns, &set);
        set.keys()
            .iter()
            .cloned()
            .zip(fractions)
            .collect()
    }

    /// Bootstrap of the pattern distribution. The key set is frozen from this
    /// run's own unresampled patterns and returned alongside the result so
    /// callers can align the fraction vectors.
    pub fn state_distribution_bootstrap(
        &self,
        span: StateSpan,
        config: &BootstrapConfig,
        rng: &mut impl Rng,
    ) -> Result<(StateSet, BootstrapResult), EngineError> {
        let patterns = self.patterns(span);
        let set = StateSet::from_patterns(&patterns);
        let result = states::state_distribution_bootstrap(&patterns, &set, config, rng)?;
        Ok((set, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bootstrap::BootstrapMethod;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;

    const TOLERANCE: f64 = 1e-12;

    fn write_log(dir: &tempfile::TempDir, name: &str, codes: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, " xtck hybrid analysis").unwrap();
        for i in 0..18 {
            writeln!(file, " setup step {i}").unwrap();
        }
        writeln!(file, " Nr. of K ions in input : 160").unwrap();
        writeln!(file, " Nr. of waters in input : 11134").unwrap();
        for (i, code) in codes.iter().enumerate() {
            writeln!(file, "{:>12.1}   4   0   2 {code}   0", i as f64 * 20.0).unwrap();
        }
        writeln!(file, " Nr. of K+ permeation up : 12").unwrap();
        path
    }

    fn reference_codes() -> Vec<&'static str> {
        vec![
            "0K0KKW", "WKK0KW", "WK0KKW", "WKK0KW", "WKK0KW", "WK0KKW", "WK0K0W", "WK0K0W",
            "WKK0KW", "WK0KWW",
        ]
    }

    #[test]
    fn load_exposes_metadata_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, "k_hybrid.out", &reference_codes());
        let run = Run::load(&path, TimeWindow::default()).unwrap();
        assert_eq!(run.metadata().wat_number, 11134);
        assert_eq!(run.metadata().k_number, 160);
        assert_eq!(run.metadata().frame_number, 10);
        assert_eq!(run.table().len(), 10);
        assert_eq!(run.table().frames()[0].pattern(0..6), "0K0KKW");
    }

    #[test]
    fn load_applies_the_time_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, "k_hybrid.out", &reference_codes());
        let run = Run::load(&path, TimeWindow::until(80.0)).unwrap();
        assert_eq!(run.metadata().frame_number, 5);
    }

    #[test]
    fn occupancy_agrees_with_the_state_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, "k_hybrid.out", &reference_codes());
        let run = Run::load(&path, TimeWindow::default()).unwrap();
        let occ = run.occupancy();
        assert!((occ["S1_K"] - 1.0).abs() < TOLERANCE);
        assert!((occ["S2_K"] - 0.4).abs() < TOLERANCE);
        assert!((occ["S4_0"] - 0.2).abs() < TOLERANCE);
    }

    #[test]
    fn distribution_map_covers_the_observed_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, "k_hybrid.out", &reference_codes());
        let run = Run::load(&path, TimeWindow::default()).unwrap();
        let map = run.state_distribution_map(StateSpan::Inner);
        assert_eq!(map.len(), 4);
        assert!((map["K0KK"] - 0.3).abs() < TOLERANCE);
        assert!((map["KK0K"] - 0.4).abs() < TOLERANCE);
        assert!((map["K0K0"] - 0.2).abs() < TOLERANCE);
        assert!((map["K0KW"] - 0.1).abs() < TOLERANCE);
        assert!((map.values().sum::<f64>() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn state_bootstrap_freezes_the_set_before_resampling() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, "k_hybrid.out", &reference_codes());
        let run = Run::load(&path, TimeWindow::default()).unwrap();
        let config = BootstrapConfig {
            n_resamples: 100,
            method: BootstrapMethod::Percentile,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(37);
        let (set, result) = run
            .state_distribution_bootstrap(StateSpan::Inner, &config, &mut rng)
            .unwrap();
        assert_eq!(set, run.state_set(StateSpan::Inner));
        assert_eq!(result.point_estimate.len(), set.len());
        assert!(result.resamples.iter().all(|row| row.len() == set.len()));
    }
}
