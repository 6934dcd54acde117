pub mod ensemble;
pub mod occupancy;
pub mod states;

use crate::error::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::Path;

/// One line of a confidence-interval report table.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub key: String,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn print_rows(rows: &[ReportRow]) {
    println!("{:<8} {:>10} {:>10} {:>10}", "key", "mean", "lower", "upper");
    for row in rows {
        println!(
            "{:<8} {:>10.4} {:>10.4} {:>10.4}",
            row.key, row.mean, row.lower, row.upper
        );
    }
}

pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
