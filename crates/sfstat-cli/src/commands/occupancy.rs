use crate::cli::OccupancyArgs;
use crate::commands::{ReportRow, make_rng, print_rows, write_csv, write_json};
use crate::config;
use crate::error::Result;
use sfstat::core::io::xtck::TimeWindow;
use sfstat::engine::occupancy::OCC_KEYS;
use sfstat::engine::run::Run;
use tracing::info;

pub fn run(args: OccupancyArgs) -> Result<()> {
    let settings = config::resolve(&args.analysis)?;
    let run = Run::load(&args.input, settings.window)?;

    let metadata = run.metadata();
    println!("Run: {}", args.input.display());
    println!(
        "  waters: {}  K ions: {}  frames: {}",
        metadata.wat_number, metadata.k_number, metadata.frame_number
    );
    print_window(&settings.window);

    info!(
        resamples = settings.bootstrap.n_resamples,
        "bootstrapping site occupancy"
    );
    let mut rng = make_rng(settings.seed);
    let (result, _) = run.occupancy_bootstrap(&settings.bootstrap, &mut rng)?;

    let rows: Vec<ReportRow> = OCC_KEYS
        .iter()
        .enumerate()
        .map(|(i, key)| ReportRow {
            key: (*key).to_string(),
            mean: result.point_estimate[i],
            lower: result.intervals[i].lower,
            upper: result.intervals[i].upper,
        })
        .collect();
    print_rows(&rows);

    if let Some(path) = &args.analysis.csv {
        write_csv(path, &rows)?;
        println!("CSV report written to {}", path.display());
    }
    if let Some(path) = &args.analysis.json {
        write_json(path, &rows)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn print_window(window: &TimeWindow) {
    if window.start.is_finite() || window.end.is_finite() {
        println!("  time window: [{}, {}]", window.start, window.end);
    }
}
