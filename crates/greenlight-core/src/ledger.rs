//! Append-only register of gate verdicts
//!
//! Every [`GateResult`] ever produced is appended here, including rejections;
//! accountability does not depend on the outcome. The ledger is the source of
//! truth for an artifact's attempt count and fingerprint chain, and it refuses
//! appends once an artifact has reached a terminal verdict. No delete or
//! modify operations exist.

use crate::error::{GovernanceError, Result};
use crate::gate::GateResult;

/// Append-only, in-memory judgment history
#[derive(Debug, Default)]
pub struct GateLedger {
    entries: Vec<GateResult>,
}

impl GateLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a verdict. APPEND-ONLY and refused after a terminal verdict.
    pub fn append(&mut self, result: GateResult) -> Result<()> {
        if let Some(last) = self.last(&result.artifact_id) {
            if !last.status.can_transition_to(result.status) {
                return Err(GovernanceError::validation_failed(
                    "artifact already has a terminal verdict",
                )
                .with_detail("artifact_id", result.artifact_id.clone())
                .with_detail("recorded_status", last.status.to_string())
                .with_detail("attempted_status", result.status.to_string()));
            }
        }
        self.entries.push(result);
        Ok(())
    }

    /// Full judgment history for one artifact, in submission order
    pub fn history(&self, artifact_id: &str) -> Vec<&GateResult> {
        self.entries
            .iter()
            .filter(|r| r.artifact_id == artifact_id)
            .collect()
    }

    /// Most recent verdict for one artifact
    pub fn last(&self, artifact_id: &str) -> Option<&GateResult> {
        self.entries
            .iter()
            .rev()
            .find(|r| r.artifact_id == artifact_id)
    }

    /// Number of submission attempts recorded for one artifact
    pub fn attempts(&self, artifact_id: &str) -> u32 {
        self.history(artifact_id).len() as u32
    }

    /// Total verdicts recorded, across all artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
