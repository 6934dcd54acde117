//! Cross-replica aggregation for HREX ensembles.
//!
//! Every replica is an independent run of the same system. The aggregator
//! loads all of them under one time window, computes each run's statistics
//! with the engine, and merges the results; it only reads per-run results and
//! never mutates a run's state.

use crate::core::io::xtck::{TimeWindow, XtckError};
use crate::core::models::frame::StateTable;
use crate::engine::bootstrap::BootstrapConfig;
use crate::engine::error::EngineError;
use crate::engine::occupancy::OCC_KEYS;
use crate::engine::run::Run;
use crate::engine::states::{self, StateSet, StateSpan};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("Replica {index} ('{}') failed to load: {source}", path.display())]
    Replica {
        index: usize,
        path: PathBuf,
        #[source]
        source: XtckError,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(
        "Replica {index}: occurrence of state '{pattern}' ({stored}) disagrees with its bootstrap point estimate ({recomputed})"
    )]
    Consistency {
        index: usize,
        pattern: String,
        stored: f64,
        recomputed: f64,
    },
}

/// Per-replica occupancy series for one site/label key: parallel vectors of
/// the point estimate and its confidence bounds, index-aligned with the
/// replica order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplicaSeries {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Sparse per-pattern series: one entry per replica in which the pattern
/// occurred at least once. Replicas that never visit the pattern are absent,
/// not zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternSeries {
    pub index: Vec<usize>,
    pub occurrence: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// N independent replicas of one simulated system, loaded under a uniform
/// time window.
#[derive(Debug, Clone)]
pub struct Ensemble {
    runs: Vec<Run>,
}

impl Ensemble {
    /// Loads every replica, in input order. Any replica failure aborts the
    /// whole ensemble; there is no best-effort skipping.
    #[instrument(level = "info", skip_all, fields(replicas = paths.len()))]
    pub fn load(paths: &[PathBuf], window: TimeWindow) -> Result<Self, EnsembleError> {
        let mut runs = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let run = Run::load(path, window).map_err(|source| EnsembleError::Replica {
                index,
                path: path.clone(),
                source,
            })?;
            runs.push(run);
        }
        info!(replicas = runs.len(), "ensemble loaded");
        Ok(Self { runs })
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Per-replica state tables, index-aligned with the input file list.
    pub fn state_tables(&self) -> Vec<&StateTable> {
        self.runs.iter().map(Run::table).collect()
    }

    /// Bootstraps every replica's occupancy and collects, for each of the 18
    /// site/label keys, the per-replica point estimates and confidence bounds
    /// as three parallel vectors in replica order.
    #[instrument(level = "info", skip_all, fields(replicas = self.runs.len()))]
    pub fn occupancy_bootstrap(
        &self,
        config: &BootstrapConfig,
        rng: &mut impl Rng,
    ) -> Result<HashMap<String, ReplicaSeries>, EnsembleError> {
        let mut per_replica = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            let (result, _) = run.occupancy_bootstrap(config, rng)?;
            per_replica.push(result);
        }

        let mut series = HashMap::with_capacity(OCC_KEYS.len());
        for (dim, key) in OCC_KEYS.iter().enumerate() {
            let mut entry = ReplicaSeries::default();
            for result in &per_replica {
                entry.mean.push(result.point_estimate[dim]);
                entry.lower.push(result.intervals[dim].lower);
                entry.upper.push(result.intervals[dim].upper);
            }
            series.insert((*key).to_string(), entry);
        }
        Ok(series)
    }

    /// Bootstraps every replica's pattern distribution over `span`, unions the
    /// patterns observed across replicas, and builds one sparse
    /// [`PatternSeries`] per pattern.
    ///
    /// Each replica's stored (unresampled) occurrence must equal its
    /// bootstrap point estimate; both are the same function of the same data,
    /// so any disagreement is a logic bug and aborts the aggregation.
    #[instrument(level = "info", skip_all, fields(replicas = self.runs.len()))]
    pub fn state_distribution_bootstrap(
        &self,
        span: StateSpan,
        config: &BootstrapConfig,
        rng: &mut impl Rng,
    ) -> Result<HashMap<String, PatternSeries>, EnsembleError> {
        struct ReplicaDistribution {
            set: StateSet,
            stored: Vec<f64>,
            point_estimate: Vec<f64>,
            lower: Vec<f64>,
            upper: Vec<f64>,
        }

        let mut replicas = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            let patterns = run.patterns(span);
            let set = StateSet::from_patterns(&patterns);
            let stored = states::state_distribution(&patterns, &set);
            let result = states::state_distribution_bootstrap(&patterns, &set, config, rng)?;
            replicas.push(ReplicaDistribution {
                set,
                stored,
                lower: result.intervals.iter().map(|i| i.lower).collect(),
                upper: result.intervals.iter().map(|i| i.upper).collect(),
                point_estimate: result.point_estimate,
            });
        }

        let mut union: Vec<String> = Vec::new();
        for replica in &replicas {
            for key in replica.set.keys() {
                if !union.iter().any(|k| k == key) {
                    union.push(key.clone());
                }
            }
        }
        info!(patterns = union.len(), "aggregating state distributions");

        let mut aggregated = HashMap::with_capacity(union.len());
        for pattern in union {
            let mut entry = PatternSeries::default();
            for (index, replica) in replicas.iter().enumerate() {
                let Some(dim) = replica.set.position(&pattern) else {
                    continue;
                };
                let stored = replica.stored[dim];
                let recomputed = replica.point_estimate[dim];
                if stored != recomputed {
                    return Err(EnsembleError::Consistency {
                        index,
                        pattern,
                        stored,
                        recomputed,
                    });
                }
                entry.index.push(index);
                entry.occurrence.push(stored);
                entry.lower.push(replica.lower[dim]);
                entry.upper.push(replica.upper[dim]);
            }
            aggregated.insert(pattern, entry);
        }
        Ok(aggregated)
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

    fn write_log(dir: &tempfile::TempDir, name: &str, codes: &[&str]) -> PathBuf {
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

    // Replica 0 visits WK0KKW at 0.3 and 0K0KWW at 0.1; replica 1 visits
    // WK0KKW at 0.6 and never 0K0KWW.
    fn two_replica_paths(dir: &tempfile::TempDir) -> Vec<PathBuf> {
        let replica0 = [
            "WK0KKW", "WK0KKW", "WK0KKW", "0K0KWW", "WKK0KW", "WKK0KW", "WKK0KW", "WKK0KW",
            "WKK0KW", "WKK0KW",
        ];
        let replica1 = [
            "WK0KKW", "WK0KKW", "WK0KKW", "WK0KKW", "WK0KKW", "WK0KKW", "WKK0KW", "WKK0KW",
            "WKK0KW", "WKK0KW",
        ];
        vec![
            write_log(dir, "rep0.out", &replica0),
            write_log(dir, "rep1.out", &replica1),
        ]
    }

    fn quick_config() -> BootstrapConfig {
        BootstrapConfig {
            n_resamples: 100,
            method: BootstrapMethod::Percentile,
            ..Default::default()
        }
    }

    #[test]
    fn state_tables_are_replica_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = Ensemble::load(&two_replica_paths(&dir), TimeWindow::default()).unwrap();
        let tables = ensemble.state_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].frames()[3].pattern(0..6), "0K0KWW");
        assert_eq!(tables[1].frames()[3].pattern(0..6), "WK0KKW");
    }

    #[test]
    fn a_failing_replica_aborts_the_whole_ensemble() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = two_replica_paths(&dir);
        paths.push(dir.path().join("missing.out"));
        let result = Ensemble::load(&paths, TimeWindow::default());
        assert!(matches!(
            result,
            Err(EnsembleError::Replica { index: 2, .. })
        ));
    }

    #[test]
    fn occupancy_series_are_parallel_over_replicas() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = Ensemble::load(&two_replica_paths(&dir), TimeWindow::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(41);
        let series = ensemble
            .occupancy_bootstrap(&quick_config(), &mut rng)
            .unwrap();
        assert_eq!(series.len(), OCC_KEYS.len());
        for key in OCC_KEYS {
            let entry = &series[key];
            assert_eq!(entry.mean.len(), 2);
            assert_eq!(entry.lower.len(), 2);
            assert_eq!(entry.upper.len(), 2);
        }
        // Unresampled occupancy of S2_0: replica 0 has 4 of 10 frames with S2
        // empty, replica 1 has 6 of 10.
        let s2_empty = &series["S2_0"];
        assert!((s2_empty.mean[0] - 0.4).abs() < TOLERANCE);
        assert!((s2_empty.mean[1] - 0.6).abs() < TOLERANCE);
    }

    #[test]
    fn pattern_series_are_sparse_over_replicas() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = Ensemble::load(&two_replica_paths(&dir), TimeWindow::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(43);
        let aggregated = ensemble
            .state_distribution_bootstrap(StateSpan::Full, &quick_config(), &mut rng)
            .unwrap();

        let shared = &aggregated["WK0KKW"];
        assert_eq!(shared.index, vec![0, 1]);
        assert!((shared.occurrence[0] - 0.3).abs() < TOLERANCE);
        assert!((shared.occurrence[1] - 0.6).abs() < TOLERANCE);
        assert_eq!(shared.lower.len(), 2);
        assert_eq!(shared.upper.len(), 2);

        let rare = &aggregated["0K0KWW"];
        assert_eq!(rare.index, vec![0]);
        assert!((rare.occurrence[0] - 0.1).abs() < TOLERANCE);

        for (pattern, entry) in &aggregated {
            for (position, &replica) in entry.index.iter().enumerate() {
                let occurrence = entry.occurrence[position];
                assert!(
                    occurrence > 0.0,
                    "pattern {pattern} reported for replica {replica} without occurring"
                );
            }
        }
    }

    #[test]
    fn inner_span_aggregation_merges_pattern_vocabularies() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = Ensemble::load(&two_replica_paths(&dir), TimeWindow::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(47);
        let aggregated = ensemble
            .state_distribution_bootstrap(StateSpan::Inner, &quick_config(), &mut rng)
            .unwrap();
        // Replica 0 reduces to {K0KK, K0KW, KK0K}, replica 1 to {K0KK, KK0K}.
        assert_eq!(aggregated.len(), 3);
        assert_eq!(aggregated["K0KK"].index, vec![0, 1]);
        assert_eq!(aggregated["KK0K"].index, vec![0, 1]);
        assert_eq!(aggregated["K0KW"].index, vec![0]);
    }
}
