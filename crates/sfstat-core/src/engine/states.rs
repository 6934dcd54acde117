//! Coarse-grained channel configurations: per-frame state patterns and their
//! distribution over a frozen key set.

use crate::core::models::frame::StateTable;
use crate::engine::bootstrap::{BootstrapConfig, BootstrapResult, bootstrap_single};
use crate::engine::error::EngineError;
use rand::Rng;
use std::ops::Range;
use tracing::instrument;

/// Which contiguous run of sites a state pattern covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSpan {
    /// The middle four sites S1..S4 (4-character patterns).
    Inner,
    /// All six sites S0..S5 (6-character patterns).
    Full,
}

impl StateSpan {
    /// Only 4-site and 6-site patterns are defined; anything else is a caller
    /// error.
    pub fn from_site_count(sites: usize) -> Result<Self, EngineError> {
        match sites {
            4 => Ok(StateSpan::Inner),
            6 => Ok(StateSpan::Full),
            other => Err(EngineError::InvalidSiteCount(other)),
        }
    }

    pub fn sites(&self) -> Range<usize> {
        match self {
            StateSpan::Inner => 1..5,
            StateSpan::Full => 0..6,
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites().len()
    }
}

/// The per-frame pattern strings of one run, in frame order.
pub fn state_patterns(table: &StateTable, span: StateSpan) -> Vec<String> {
    table
        .frames()
        .iter()
        .map(|frame| frame.pattern(span.sites()))
        .collect()
}

/// A frozen, ordered, de-duplicated list of state patterns.
///
/// Distribution vectors are index-aligned with this list, which is captured
/// from the full unresampled pattern list before any resampling so the output
/// stays a fixed-length, fixed-order vector across resamples that happen to
/// miss a pattern. The set is immutable once built; later calls receive it
/// explicitly instead of finding it as hidden object state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet {
    keys: Vec<String>,
}

impl StateSet {
    /// Distinct patterns in first-appearance order.
    pub fn from_patterns(patterns: &[String]) -> Self {
        let mut keys: Vec<String> = Vec::new();
        for pattern in patterns {
            if !keys.iter().any(|k| k == pattern) {
                keys.push(pattern.clone());
            }
        }
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == pattern)
    }
}

/// The fraction of `patterns` falling on each key of `set`, in the set's
/// frozen order. Keys that never occur get 0. Patterns outside the set are
/// silently not counted, so the fractions then sum to less than 1 — callers
/// building the set from the same data they pass here are unaffected.
pub fn state_distribution(patterns: &[String], set: &StateSet) -> Vec<f64> {
    let mut counts = vec![0usize; set.len()];
    for pattern in patterns {
        if let Some(index) = set.position(pattern) {
            counts[index] += 1;
        }
    }
    let total = patterns.len() as f64;
    counts
        .into_iter()
        .map(|c| if patterns.is_empty() { 0.0 } else { c as f64 / total })
        .collect()
}

/// Single-sequence bootstrap of the pattern distribution: each resample draws
/// pattern values independently with replacement and is scored against the
/// frozen `set`.
#[instrument(level = "debug", skip_all, fields(patterns = patterns.len(), states = set.len()))]
pub fn state_distribution_bootstrap(
    patterns: &[String],
    set: &StateSet,
    config: &BootstrapConfig,
    rng: &mut impl Rng,
) -> Result<BootstrapResult, EngineError> {
    let result = bootstrap_single(
        patterns,
        |drawn| state_distribution(drawn, set),
        config,
        rng,
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::frame::Frame;
    use crate::core::models::site::{SITE_COUNT, SiteLabel};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-12;

    fn table_from_codes(codes: &[&str]) -> StateTable {
        let frames = codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let mut sites = [SiteLabel::Empty; SITE_COUNT];
                for (slot, c) in sites.iter_mut().zip(code.chars()) {
                    *slot = SiteLabel::from_char(c).unwrap();
                }
                Frame {
                    time: i as f64,
                    sites,
                }
            })
            .collect();
        StateTable::from_frames(frames)
    }

    fn owned(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn only_four_and_six_site_spans_exist() {
        assert_eq!(StateSpan::from_site_count(4), Ok(StateSpan::Inner));
        assert_eq!(StateSpan::from_site_count(6), Ok(StateSpan::Full));
        assert_eq!(
            StateSpan::from_site_count(5),
            Err(EngineError::InvalidSiteCount(5))
        );
        assert_eq!(StateSpan::Inner.site_count(), 4);
        assert_eq!(StateSpan::Full.site_count(), 6);
    }

    #[test]
    fn patterns_follow_frame_order() {
        let table = table_from_codes(&["WK0KKW", "WKK0KW"]);
        assert_eq!(
            state_patterns(&table, StateSpan::Inner),
            owned(&["K0KK", "KK0K"])
        );
        assert_eq!(
            state_patterns(&table, StateSpan::Full),
            owned(&["WK0KKW", "WKK0KW"])
        );
    }

    #[test]
    fn state_set_freezes_first_appearance_order() {
        let patterns = owned(&["K0KK", "KK0K", "K0KK", "K0K0", "KK0K"]);
        let set = StateSet::from_patterns(&patterns);
        assert_eq!(set.keys(), owned(&["K0KK", "KK0K", "K0K0"]).as_slice());
        assert_eq!(set.position("K0K0"), Some(2));
        assert_eq!(set.position("KKKK"), None);
    }

    #[test]
    fn distribution_matches_the_reference_scenario() {
        let patterns = owned(&[
            "K0KK", "KK0K", "K0KK", "KK0K", "KK0K", "K0KK", "K0K0", "K0K0", "KK0K", "K0KW",
        ]);
        let set = StateSet::from_patterns(&patterns);
        assert_eq!(
            set.keys(),
            owned(&["K0KK", "KK0K", "K0K0", "K0KW"]).as_slice()
        );
        let distribution = state_distribution(&patterns, &set);
        let expected = [0.3, 0.4, 0.2, 0.1];
        for (value, expected) in distribution.iter().zip(expected) {
            assert!((value - expected).abs() < TOLERANCE);
        }
        assert!((distribution.iter().sum::<f64>() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn absent_keys_get_zero() {
        let set = StateSet::from_patterns(&owned(&["K0KK", "KK0K", "K0K0"]));
        let distribution = state_distribution(&owned(&["K0KK", "K0KK"]), &set);
        assert_eq!(distribution, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn distribution_ignores_patterns_outside_the_set() {
        let set = StateSet::from_patterns(&owned(&["K0KK"]));
        let distribution = state_distribution(&owned(&["K0KK", "KK0K", "KK0K", "K0KK"]), &set);
        assert_eq!(distribution, vec![0.5]);
        assert!(distribution.iter().sum::<f64>() < 1.0);
    }

    #[test]
    fn bootstrap_rows_keep_the_frozen_length_and_order() {
        let patterns = owned(&[
            "K0KK", "KK0K", "K0KK", "KK0K", "KK0K", "K0KK", "K0K0", "K0K0", "KK0K", "K0KW",
        ]);
        let set = StateSet::from_patterns(&patterns);
        let config = BootstrapConfig {
            n_resamples: 300,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(29);
        let result = state_distribution_bootstrap(&patterns, &set, &config, &mut rng).unwrap();
        assert_eq!(result.point_estimate, state_distribution(&patterns, &set));
        // Rare patterns drop out of some resamples; the vector length never
        // changes because it is keyed by the frozen set.
        assert!(result.resamples.iter().all(|row| row.len() == set.len()));
        assert!(
            result
                .resamples
                .iter()
                .any(|row| row.last().copied() == Some(0.0))
        );
    }

    #[test]
    fn seeded_state_bootstrap_is_reproducible() {
        let patterns = owned(&["K0KK", "KK0K", "K0KK", "K0K0"]);
        let set = StateSet::from_patterns(&patterns);
        let config = BootstrapConfig::default();
        let a = state_distribution_bootstrap(
            &patterns,
            &set,
            &config,
            &mut StdRng::seed_from_u64(31),
        )
        .unwrap();
        let b = state_distribution_bootstrap(
            &patterns,
            &set,
            &config,
            &mut StdRng::seed_from_u64(31),
        )
        .unwrap();
        assert_eq!(a.resamples, b.resamples);
    }
}
