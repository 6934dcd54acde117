use crate::cli::StatesArgs;
use crate::commands::{ReportRow, make_rng, print_rows, write_csv, write_json};
use crate::config;
use crate::error::Result;
use sfstat::engine::run::Run;
use sfstat::engine::states::StateSpan;
use tracing::info;

pub fn run(args: StatesArgs) -> Result<()> {
    let settings = config::resolve(&args.analysis)?;
    let span = StateSpan::from_site_count(args.sites)?;
    let run = Run::load(&args.input, settings.window)?;

    let metadata = run.metadata();
    println!("Run: {}", args.input.display());
    println!(
        "  waters: {}  K ions: {}  frames: {}",
        metadata.wat_number, metadata.k_number, metadata.frame_number
    );

    info!(
        sites = span.site_count(),
        resamples = settings.bootstrap.n_resamples,
        "bootstrapping state distribution"
    );
    let mut rng = make_rng(settings.seed);
    let (set, result) = run.state_distribution_bootstrap(span, &settings.bootstrap, &mut rng)?;

    println!(
        "  {} distinct {}-site states",
        set.len(),
        span.site_count()
    );
    let rows: Vec<ReportRow> = set
        .keys()
        .iter()
        .enumerate()
        .map(|(i, key)| ReportRow {
            key: key.clone(),
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
