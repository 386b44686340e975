//! Crate error taxonomy. Structural infeasibility, admission rejection and
//! search exhaustion are not errors; they are terminal plan outcomes.

use thiserror::Error;

use crate::oracle::OracleError;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("the new-node template is missing or resolves to no nodes")]
    MissingNodeTemplate,

    /// Scheduling computation failed. Propagated unchanged, never retried:
    /// oracle failures are assumed deterministic-reproducible.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
