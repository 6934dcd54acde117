//! Per-site occupancy fractions and their bootstrap confidence intervals.

use crate::core::models::frame::StateTable;
use crate::core::models::site::{SITE_COUNT, SiteLabel};
use crate::engine::bootstrap::{
    BootstrapConfig, BootstrapResult, ConfidenceInterval, bootstrap_paired,
};
use crate::engine::error::EngineError;
use rand::Rng;
use std::collections::HashMap;
use tracing::instrument;

/// The fixed reporting order for occupancy statistics: site-major S0..S5,
/// labels in `[K, 0, W]` order within each site.
pub const OCC_KEYS: [&str; SITE_COUNT * 3] = [
    "S0_K", "S0_0", "S0_W", "S1_K", "S1_0", "S1_W", "S2_K", "S2_0", "S2_W", "S3_K", "S3_0",
    "S3_W", "S4_K", "S4_0", "S4_W", "S5_K", "S5_0", "S5_W",
];

/// The 18 occupancy fractions in [`OCC_KEYS`] order, computed purely from the
/// supplied per-site label columns.
///
/// This is the resampling statistic: it reads nothing but its argument (and
/// the fixed key order), so the bootstrap can feed it arbitrary equal-length
/// resampled columns.
pub fn occupancy_fractions(columns: &[Vec<SiteLabel>]) -> Vec<f64> {
    debug_assert_eq!(columns.len(), SITE_COUNT);
    let mut fractions = Vec::with_capacity(OCC_KEYS.len());
    for column in columns {
        let total = column.len() as f64;
        for label in SiteLabel::ALL {
            let count = column.iter().filter(|&&l| l == label).count();
            fractions.push(if column.is_empty() {
                0.0
            } else {
                count as f64 / total
            });
        }
    }
    fractions
}

/// Occupancy fractions keyed by the 18 fixed keys; read in [`OCC_KEYS`] order
/// the values match [`occupancy_fractions`] element for element.
pub fn occupancy_map(columns: &[Vec<SiteLabel>]) -> HashMap<String, f64> {
    OCC_KEYS
        .iter()
        .map(|k| k.to_string())
        .zip(occupancy_fractions(columns))
        .collect()
}

/// Paired bootstrap over all six site columns: each resample draws frame
/// indices with replacement and applies them to every column at once, so the
/// within-frame correlation between sites is preserved.
///
/// Returns the full bootstrap result plus a simplified per-key interval map.
#[instrument(level = "debug", skip_all, fields(frames = table.len()))]
pub fn occupancy_bootstrap(
    table: &StateTable,
    config: &BootstrapConfig,
    rng: &mut impl Rng,
) -> Result<(BootstrapResult, HashMap<String, ConfidenceInterval>), EngineError> {
    let columns = table.site_columns();
    let result = bootstrap_paired(&columns, occupancy_fractions, config, rng)?;
    let intervals = OCC_KEYS
        .iter()
        .map(|k| k.to_string())
        .zip(result.intervals.iter().copied())
        .collect();
    Ok((result, intervals))
}
