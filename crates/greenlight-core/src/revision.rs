//! Revision Controller - submit -> judge -> revise -> resubmit
//!
//! Drives the bounded retry loop between Generation and the gate. The loop
//! itself carries no counter: the boundary's ledger supplies the attempt
//! number, and the gate's verdict rules turn the ceiling into a terminal
//! REJECTED, so termination is a property of the rules rather than of this
//! loop.

use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info};

use crate::boundary::LayerBoundary;
use crate::content::GeneratedContent;
use crate::error::{GovernanceError, Result};
use crate::gate::{GateResult, GateStatus};

/// The Generation layer, behind a seam
///
/// Implementations wrap the external model-serving API. `revise` must return
/// content for the same logical artifact: same identifier, new body and
/// fingerprint.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce the first draft for a logical artifact
    async fn produce(&self, artifact_id: &str) -> Result<GeneratedContent>;

    /// Produce a revision addressing the gate's feedback
    async fn revise(
        &self,
        previous: &GeneratedContent,
        feedback: &GateResult,
    ) -> Result<GeneratedContent>;
}

/// Outcome of one artifact's full journey through the revision loop
#[derive(Debug, Clone)]
pub struct RevisionOutcome {
    /// The last content version judged
    pub content: GeneratedContent,
    /// Every verdict produced, in submission order
    pub history: Vec<GateResult>,
}

impl RevisionOutcome {
    /// The terminal verdict
    pub fn final_result(&self) -> Option<&GateResult> {
        self.history.last()
    }

    /// Number of gate attempts, revisions included
    pub fn attempts(&self) -> u32 {
        self.history.len() as u32
    }

    /// Whether the artifact ended approved and executable
    pub fn approved(&self) -> bool {
        self.final_result().map(GateResult::can_proceed).unwrap_or(false)
    }
}

/// Bounded retry loop between Generation and the gate
pub struct RevisionController {
    generator: Box<dyn Generator>,
}

impl RevisionController {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Produce, judge, and revise one artifact until a terminal verdict.
    ///
    /// NEEDS_REVISION is recovered here and nowhere else; APPROVED and
    /// REJECTED are returned to the caller untouched.
    pub async fn run(
        &self,
        boundary: &mut LayerBoundary,
        artifact_id: &str,
    ) -> Result<RevisionOutcome> {
        let mut content = self.generator.produce(artifact_id).await?;
        if content.artifact_id != artifact_id {
            return Err(identity_changed(artifact_id, &content.artifact_id));
        }

        let mut history: Vec<GateResult> = Vec::new();

        loop {
            let result = boundary.submit(&content).await?;
            history.push(result.clone());

            match result.status {
                GateStatus::Approved | GateStatus::Rejected => {
                    info!(
                        artifact_id = %artifact_id,
                        status = %result.status,
                        attempts = history.len(),
                        consensus = result.consensus_score,
                        "revision loop settled"
                    );
                    return Ok(RevisionOutcome { content, history });
                }
                GateStatus::NeedsRevision => {
                    debug!(
                        artifact_id = %artifact_id,
                        revision = result.revision_count + 1,
                        consensus = result.consensus_score,
                        "requesting revision from generation"
                    );
                    let revised = self.generator.revise(&content, &result).await?;
                    if revised.artifact_id != artifact_id {
                        return Err(identity_changed(artifact_id, &revised.artifact_id));
                    }
                    content = revised;
                }
                GateStatus::Pending => {
                    return Err(GovernanceError::validation_failed(
                        "gate returned a non-verdict status",
                    )
                    .with_detail("artifact_id", artifact_id)
                    .with_detail("status", result.status.to_string()));
                }
            }
        }
    }
}

impl fmt::Debug for RevisionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevisionController").finish_non_exhaustive()
    }
}

fn identity_changed(expected: &str, got: &str) -> GovernanceError {
    GovernanceError::validation_failed("generator changed the artifact identity")
        .with_detail("expected", expected)
        .with_detail("got", got)
}
