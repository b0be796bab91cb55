//! Caller-visible evaluation errors

use crate::dataset::DatasetError;
use thiserror::Error;

/// Errors that reject an evaluation outright (no partial report is produced).
///
/// Judge failures and malformed cell values never show up here: the former
/// degrade to a rules-only score, the latter lower a rule score.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
