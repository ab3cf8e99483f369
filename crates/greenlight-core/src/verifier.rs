//! Completion Verifier - recompute "done" from evidence alone
//!
//! The verifier trusts no single flag and no in-memory state: it reads the
//! three evidence records and re-derives completion. Its predicate is the
//! only authoritative definition of "done" in the system. It never writes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{EvidenceError, GovernanceError, Result};
use crate::evidence::EvidenceStore;
use crate::types::{now, Timestamp};

/// What the evidence supports, as four distinguishable states
///
/// A partial record set is `InProgress` (downstream steps still writing),
/// while a record that exists but is unparseable or internally ill-formed is
/// `Corrupt`. The two are never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    /// All three records present, well-formed, every required flag satisfied
    Complete,
    /// One or more records absent; those present are well-formed
    InProgress,
    /// All records present and well-formed, but a required flag is not satisfied
    Incomplete,
    /// A record exists but is unparseable or internally ill-formed
    Corrupt,
}

impl fmt::Display for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompletionState::Complete => "complete",
            CompletionState::InProgress => "in_progress",
            CompletionState::Incomplete => "incomplete",
            CompletionState::Corrupt => "corrupt",
        };
        write!(f, "{}", name)
    }
}

/// Everything the verifier derived for one unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    pub work_id: String,
    pub state: CompletionState,
    /// Records absent from the store
    pub missing: Vec<String>,
    /// Records present but damaged, with the reason
    pub corrupt: Vec<String>,
    /// Required checks that did not hold
    pub failed_checks: Vec<String>,
    pub verified_at: Timestamp,
}

impl CompletionReport {
    /// The single authoritative completion predicate
    pub fn is_truly_completed(&self) -> bool {
        self.state == CompletionState::Complete
    }
}

/// Read-only reconciliation over the Evidence Store
#[derive(Debug, Clone)]
pub struct CompletionVerifier {
    store: EvidenceStore,
}

impl CompletionVerifier {
    pub fn new(store: EvidenceStore) -> Self {
        Self { store }
    }

    /// Re-derive completion for one unit of work from its evidence
    pub async fn assess(&self, work_id: &str) -> Result<CompletionReport> {
        let mut missing = Vec::new();
        let mut corrupt = Vec::new();
        let mut failed_checks = Vec::new();

        match self.store.load_rules_snapshot(work_id).await {
            Ok(Some(snapshot)) => corrupt.extend(snapshot.problems(work_id)),
            Ok(None) => missing.push("rules snapshot".to_string()),
            Err(GovernanceError::Evidence(EvidenceError::Corrupt { record, reason, .. })) => {
                corrupt.push(format!("{record}: {reason}"));
            }
            Err(e) => return Err(e),
        }

        match self.store.load_task_descriptor(work_id).await {
            Ok(Some(task)) => corrupt.extend(task.problems(work_id)),
            Ok(None) => missing.push("task descriptor".to_string()),
            Err(GovernanceError::Evidence(EvidenceError::Corrupt { record, reason, .. })) => {
                corrupt.push(format!("{record}: {reason}"));
            }
            Err(e) => return Err(e),
        }

        match self.store.load_status(work_id).await {
            Ok(Some(status)) => {
                corrupt.extend(status.problems(work_id));
                failed_checks.extend(
                    status
                        .failed_flags()
                        .iter()
                        .map(|flag| format!("status record flag not satisfied: {flag}")),
                );
            }
            Ok(None) => missing.push("status record".to_string()),
            Err(GovernanceError::Evidence(EvidenceError::Corrupt { record, reason, .. })) => {
                corrupt.push(format!("{record}: {reason}"));
            }
            Err(e) => return Err(e),
        }

        let state = if !corrupt.is_empty() {
            CompletionState::Corrupt
        } else if !missing.is_empty() {
            CompletionState::InProgress
        } else if !failed_checks.is_empty() {
            CompletionState::Incomplete
        } else {
            CompletionState::Complete
        };

        debug!(work_id, state = %state, "completion assessed from evidence");
        Ok(CompletionReport {
            work_id: work_id.to_string(),
            state,
            missing,
            corrupt,
            failed_checks,
            verified_at: now(),
        })
    }

    /// Convenience form of the authoritative predicate
    pub async fn is_truly_completed(&self, work_id: &str) -> Result<bool> {
        Ok(self.assess(work_id).await?.is_truly_completed())
    }
}
