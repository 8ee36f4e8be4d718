use thiserror::Error;

use crate::cron::CronError;
use crate::diff::DiffError;
use crate::format::FormatError;
use crate::punycode::PunycodeError;

/// Error surfaced by the exported tool functions. The message is what the
/// page shows, so every variant displays its source error unchanged.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Punycode(#[from] PunycodeError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Cron(#[from] CronError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("failed to serialize result: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;
