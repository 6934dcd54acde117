use crate::cli::EnsembleArgs;
use crate::commands::{make_rng, write_json};
use crate::config;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sfstat::engine::occupancy::OCC_KEYS;
use sfstat::engine::run::Run;
use sfstat::engine::states::StateSpan;
use sfstat::workflows::ensemble::{Ensemble, EnsembleError, PatternSeries, ReplicaSeries};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Serialize)]
struct EnsembleReport {
    replicas: Vec<String>,
    occupancy: HashMap<String, ReplicaSeries>,
    states: HashMap<String, PatternSeries>,
}

pub fn run(args: EnsembleArgs) -> Result<()> {
    let settings = config::resolve(&args.analysis)?;
    let span = StateSpan::from_site_count(args.sites)?;

    let pb = ProgressBar::new(args.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr_with_hz(4));

    let mut runs = Vec::with_capacity(args.inputs.len());
    for (index, path) in args.inputs.iter().enumerate() {
        pb.set_message(format!("loading {}", path.display()));
        let run = Run::load(path, settings.window).map_err(|source| EnsembleError::Replica {
            index,
            path: path.clone(),
            source,
        })?;
        runs.push(run);
        pb.inc(1);
    }
    pb.finish_with_message("replicas loaded");

    let ensemble = Ensemble::from_runs(runs);
    info!(
        replicas = ensemble.len(),
        resamples = settings.bootstrap.n_resamples,
        "aggregating ensemble statistics"
    );
    let mut rng = make_rng(settings.seed);
    let occupancy = ensemble.occupancy_bootstrap(&settings.bootstrap, &mut rng)?;
    let states = ensemble.state_distribution_bootstrap(span, &settings.bootstrap, &mut rng)?;

    println!("Ensemble of {} replicas", ensemble.len());
    println!("Site occupancy per replica (mean [lower, upper]):");
    for key in OCC_KEYS {
        let series = &occupancy[key];
        print!("  {key:<8}");
        for i in 0..series.mean.len() {
            print!(
                " {:.3} [{:.3}, {:.3}]",
                series.mean[i], series.lower[i], series.upper[i]
            );
        }
        println!();
    }

    let mut patterns: Vec<&String> = states.keys().collect();
    patterns.sort();
    println!("{}-site states across replicas:", span.site_count());
    for pattern in patterns {
        let series = &states[pattern];
        print!("  {pattern:<8} replicas {:?}:", series.index);
        for i in 0..series.index.len() {
            print!(
                " {:.3} [{:.3}, {:.3}]",
                series.occurrence[i], series.lower[i], series.upper[i]
            );
        }
        println!();
    }

    if let Some(path) = &args.analysis.csv {
        write_occupancy_csv(path, &occupancy)?;
        println!("CSV report written to {}", path.display());
    }
    if let Some(path) = &args.analysis.json {
        let report = EnsembleReport {
            replicas: args
                .inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            occupancy,
            states,
        };
        write_json(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

/// Long-format CSV: one row per (key, replica) pair. The sparse state series
/// are only exported in the JSON report.
fn write_occupancy_csv(
    path: &std::path::Path,
    occupancy: &HashMap<String, ReplicaSeries>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["key", "replica", "mean", "lower", "upper"])?;
    for key in OCC_KEYS {
        let series = &occupancy[key];
        for i in 0..series.mean.len() {
            writer.write_record([
                key.to_string(),
                i.to_string(),
                series.mean[i].to_string(),
                series.lower[i].to_string(),
                series.upper[i].to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
