//! Token launch domain: field catalog, draft record, completeness rules, the
//! per-user conversation state machine and the transaction builder.

pub mod aggregator;
pub mod builder;
pub mod completeness;
pub mod dex;
pub mod draft;
pub mod fields;
pub mod metadata;
pub mod status;

use alloy::primitives::TxHash;
use thiserror::Error;

use fields::FieldName;

/// Failures of a launch attempt.
///
/// `Validation` leaves the draft intact for correction. The two submission
/// variants are terminal for the attempt.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid {field}: {reason}")]
    Validation { field: FieldName, reason: String },

    #[error("launch rejected by simulation: {0}")]
    SubmissionRejected(String),

    #[error("launch failed{}: {cause}", tx_suffix(.tx))]
    SubmissionFailed { tx: Option<TxHash>, cause: String },
}

fn tx_suffix(tx: &Option<TxHash>) -> String {
    tx.map(|t| format!(" (tx {t})")).unwrap_or_default()
}

impl LaunchError {
    pub(crate) fn invalid(field: FieldName, reason: impl Into<String>) -> Self {
        LaunchError::Validation { field, reason: reason.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LaunchError::Validation { .. })
    }
}
