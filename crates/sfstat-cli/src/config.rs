use crate::cli::{AnalysisArgs, MethodArg};
use crate::error::{CliError, Result};
use serde::Deserialize;
use sfstat::core::io::xtck::TimeWindow;
use sfstat::engine::bootstrap::{BootstrapConfig, BootstrapMethod};
use std::path::Path;
use tracing::debug;

/// TOML analysis configuration. Every field is optional; command-line flags
/// take precedence over the file, and built-in defaults fill the rest.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisFile {
    pub window: WindowSection,
    pub bootstrap: BootstrapSection,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapSection {
    pub resamples: Option<usize>,
    pub confidence: Option<f64>,
    pub method: Option<FileMethod>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileMethod {
    Bca,
    Percentile,
    Basic,
}

impl From<FileMethod> for BootstrapMethod {
    fn from(m: FileMethod) -> Self {
        match m {
            FileMethod::Bca => BootstrapMethod::BiasCorrectedAccelerated,
            FileMethod::Percentile => BootstrapMethod::Percentile,
            FileMethod::Basic => BootstrapMethod::Basic,
        }
    }
}

impl From<MethodArg> for BootstrapMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Bca => BootstrapMethod::BiasCorrectedAccelerated,
            MethodArg::Percentile => BootstrapMethod::Percentile,
            MethodArg::Basic => BootstrapMethod::Basic,
        }
    }
}

impl AnalysisFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("invalid config '{}': {}", path.display(), e)))
    }
}

/// The fully resolved analysis parameters for one command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub window: TimeWindow,
    pub bootstrap: BootstrapConfig,
    pub seed: Option<u64>,
}

pub fn resolve(args: &AnalysisArgs) -> Result<AnalysisSettings> {
    let file = match &args.config {
        Some(path) => AnalysisFile::load(path)?,
        None => AnalysisFile::default(),
    };
    debug!("Analysis config from file: {:?}", file);

    let mut window = TimeWindow::default();
    if let Some(start) = args.start.or(file.window.start) {
        window.start = start;
    }
    if let Some(end) = args.end.or(file.window.end) {
        window.end = end;
    }

    let mut bootstrap = BootstrapConfig::default();
    if let Some(resamples) = args.resamples.or(file.bootstrap.resamples) {
        bootstrap.n_resamples = resamples;
    }
    if let Some(confidence) = args.confidence.or(file.bootstrap.confidence) {
        bootstrap.confidence_level = confidence;
    }
    if let Some(method) = args
        .method
        .map(BootstrapMethod::from)
        .or(file.bootstrap.method.map(BootstrapMethod::from))
    {
        bootstrap.method = method;
    }

    Ok(AnalysisSettings {
        window,
        bootstrap,
        seed: args.seed.or(file.bootstrap.seed),
    })
}
