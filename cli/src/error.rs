use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid worksheet '{}': {source}", path.display())]
    Worksheet {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no poem with index {0}")]
    NoSuchPoem(f64),
}
