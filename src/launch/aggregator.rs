//! Per-user launch conversation state machine.
//!
//! States are derived from the draft's control fields:
//!
//! ```text
//! Empty ──intent──▶ Collecting ──ready──▶ AwaitingConfirmation ──yes──▶ Confirmed ──▶ (deleted on success)
//!                        │                        │ no
//!                        └──── cancel ────────────┴──────────────▶ Cancelled (deleted)
//! ```
//!
//! `hasRequestedConfirmation` is a one-way latch: a later edit that breaks
//! readiness does not clear it, but a confirmation is only acted on while
//! the draft passes the configured gate.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::builder::{LaunchResult, TransactionBuilder};
use super::completeness::{can_request_confirmation, is_complete};
use super::draft::DraftRecord;
use super::fields::FieldName;
use super::LaunchError;
use crate::config::ConfirmationGate;
use crate::nlu::{is_cancel, wants_token, Confirmation, Nlu};
use crate::store::DraftStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    Collecting,
    AwaitingConfirmation,
    Confirmed,
}

impl DraftState {
    pub fn of(record: &DraftRecord) -> Self {
        if !record.received_token_request {
            DraftState::Empty
        } else if record.is_confirmed == Some(true) {
            DraftState::Confirmed
        } else if record.has_requested_confirmation {
            DraftState::AwaitingConfirmation
        } else {
            DraftState::Collecting
        }
    }
}

/// What one turn did. Carries enough of the draft to render a reply.
#[derive(Debug)]
pub enum TurnOutcome {
    /// No launch in progress and no launch intent in the message.
    Ignored,
    Collecting { draft: DraftRecord, changed: Vec<FieldName> },
    AwaitingConfirmation { draft: DraftRecord, changed: Vec<FieldName> },
    /// Draft deleted. `existed` is false when there was nothing to cancel.
    Cancelled { existed: bool },
    /// Launch mined; draft deleted.
    Launched { draft: DraftRecord, result: LaunchResult },
    /// Pre-submission validation failed; draft kept for correction.
    Rejected { draft: DraftRecord, error: LaunchError },
    /// Submission attempt failed; draft kept so the user can retry.
    Failed { draft: DraftRecord, error: LaunchError },
}

pub struct Aggregator {
    agent_id: String,
    store: Arc<dyn DraftStore>,
    nlu: Nlu,
    builder: TransactionBuilder,
    gate: ConfirmationGate,
    ttl: Duration,
}

impl Aggregator {
    pub fn new(
        agent_id: impl Into<String>,
        store: Arc<dyn DraftStore>,
        nlu: Nlu,
        builder: TransactionBuilder,
        gate: ConfirmationGate,
        ttl: Duration,
    ) -> Self {
        Self { agent_id: agent_id.into(), store, nlu, builder, gate, ttl }
    }

    /// Current draft for `user_id`, or a fresh default.
    pub fn draft(&self, user_id: &str) -> DraftRecord {
        self.store.get(&self.agent_id, user_id)
    }

    /// Whether `record` passes the configured confirmation gate.
    pub fn passes_gate(&self, record: &DraftRecord) -> bool {
        match self.gate {
            ConfirmationGate::Ready => can_request_confirmation(record),
            ConfirmationGate::Complete => can_request_confirmation(record) && is_complete(record),
        }
    }

    /// Process one inbound message. Never fails; collaborator errors are
    /// logged and folded into the outcome.
    pub async fn handle_turn(&self, user_id: &str, text: &str) -> TurnOutcome {
        let mut record = self.draft(user_id);
        let state = DraftState::of(&record);
        debug!(%user_id, ?state, "turn started");

        if is_cancel(text) {
            return self.cancel(user_id, &record);
        }

        let mut dirty = false;
        if state == DraftState::Empty {
            if !wants_token(text) {
                return TurnOutcome::Ignored;
            }
            info!(%user_id, "launch requested");
            record.received_token_request = true;
            dirty = true;
        }

        let mut verdict = Confirmation::Unknown;
        if matches!(state, DraftState::AwaitingConfirmation | DraftState::Confirmed) {
            verdict = self.nlu.classify(text).await;
            if verdict == Confirmation::Declined {
                return self.cancel(user_id, &record);
            }
        }

        let changed = match self.nlu.extract(text).await {
            Ok(partial) => record.merge(&partial),
            Err(e) => {
                warn!(%user_id, "extraction failed, draft unchanged: {e}");
                Vec::new()
            }
        };
        if !changed.is_empty() {
            debug!(%user_id, ?changed, "fields merged");
            dirty = true;
        }

        // A confirmation that also edits fields is asked again.
        if verdict == Confirmation::Confirmed {
            if !changed.is_empty() {
                debug!(%user_id, "confirmation carried edits; asking again");
            } else if self.passes_gate(&record) {
                return self.confirm(user_id, record).await;
            } else {
                debug!(%user_id, "confirmation ignored; draft no longer passes the gate");
            }
        }

        if !record.has_requested_confirmation && self.passes_gate(&record) {
            info!(%user_id, "draft ready, requesting confirmation");
            record.has_requested_confirmation = true;
            dirty = true;
        }

        if dirty {
            self.persist(user_id, &mut record);
        }

        if record.has_requested_confirmation {
            TurnOutcome::AwaitingConfirmation { draft: record, changed }
        } else {
            TurnOutcome::Collecting { draft: record, changed }
        }
    }

    async fn confirm(&self, user_id: &str, mut record: DraftRecord) -> TurnOutcome {
        info!(%user_id, "launch confirmed");
        record.is_confirmed = Some(true);
        self.persist(user_id, &mut record);

        match self.builder.launch(&record).await {
            Ok(result) => {
                self.remove(user_id);
                TurnOutcome::Launched { draft: record, result }
            }
            Err(error) => {
                warn!(%user_id, "launch attempt failed: {error}");
                record.is_confirmed = None;
                self.persist(user_id, &mut record);
                if error.is_validation() {
                    TurnOutcome::Rejected { draft: record, error }
                } else {
                    TurnOutcome::Failed { draft: record, error }
                }
            }
        }
    }

    fn cancel(&self, user_id: &str, record: &DraftRecord) -> TurnOutcome {
        let existed = !record.is_untouched();
        info!(%user_id, existed, "launch cancelled");
        self.remove(user_id);
        TurnOutcome::Cancelled { existed }
    }

    /// Write with a fresh `lastUpdated` and TTL. Failures lose this turn's
    /// changes but do not surface.
    fn persist(&self, user_id: &str, record: &mut DraftRecord) {
        record.touch(Utc::now());
        if let Err(e) = self.store.set(&self.agent_id, user_id, record, self.ttl) {
            warn!(%user_id, "draft write failed: {e}");
        }
    }

    fn remove(&self, user_id: &str) {
        if let Err(e) = self.store.delete(&self.agent_id, user_id) {
            warn!(%user_id, "draft delete failed: {e}");
        }
    }
}
