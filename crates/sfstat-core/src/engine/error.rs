use crate::engine::bootstrap::BootstrapError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Unsupported state span: {0} sites (only 4 or 6 are defined)")]
    InvalidSiteCount(usize),

    #[error("Bootstrap failed: {source}")]
    Bootstrap {
        #[from]
        source: BootstrapError,
    },
}
