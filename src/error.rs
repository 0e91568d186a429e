//! Error types for an access review run
//!
//! Errors are classified by how far they travel:
//! - Recovered locally: unparseable dates never reach this type, they become
//!   `None` plus a diagnostic.
//! - Structural: a missing HR table or a missing column aborts the run.
//! - Check failures: anything escaping a check is wrapped with the check name
//!   and the stage it failed in.

use crate::sources::SourceKind;
use std::path::PathBuf;
use thiserror::Error;

pub type ReviewResult<T> = Result<T, ReviewError>;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("required source '{table}' was not loaded")]
    MissingSource { table: SourceKind },

    #[error("source '{table}' is missing required column '{column}'")]
    MissingColumn {
        table: SourceKind,
        column: &'static str,
    },

    #[error("{check} check failed during {stage}: {source}")]
    CheckFailed {
        check: &'static str,
        stage: &'static str,
        #[source]
        source: Box<ReviewError>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewError {
    /// Wrap an error escaping a check with where it happened
    pub fn in_check(self, check: &'static str, stage: &'static str) -> Self {
        ReviewError::CheckFailed {
            check,
            stage,
            source: Box::new(self),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReviewError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the shape of the input tables
    pub fn is_structural(&self) -> bool {
        match self {
            ReviewError::MissingSource { .. } | ReviewError::MissingColumn { .. } => true,
            ReviewError::CheckFailed { source, .. } => source.is_structural(),
            _ => false,
        }
    }
}
