//! Quality gate: N independent judgments, one verdict
//!
//! The gate owns a fixed panel of reviewers and turns their judgments into a
//! [`GateResult`]. Aggregation is a pure function of the collected reviews
//! ([`GateResult::from_reviews`]), kept separate from reviewer dispatch so the
//! verdict rules can be tested without any async plumbing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::content::GeneratedContent;
use crate::error::{GovernanceError, Result};
use crate::review::{ReviewResult, Reviewer, ReviewerRole};
use crate::types::{now, Fingerprint, Timestamp};

/// Default consensus score required for approval
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 80.0;

/// Default revision ceiling per artifact
pub const DEFAULT_MAX_REVISIONS: u32 = 3;

/// Gate configuration
///
/// Role weights are declared here or nowhere: an empty table means plain
/// arithmetic mean, and reviewers themselves never carry weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Name of this gate, recorded on every result it produces
    #[serde(default = "GateConfig::default_name")]
    pub gate_name: String,
    /// Consensus score at or above which the artifact is approved
    #[serde(default = "GateConfig::default_threshold")]
    pub approval_threshold: f64,
    /// Revision ceiling; the loop never produces more than this many retries
    #[serde(default = "GateConfig::default_max_revisions")]
    pub max_revisions: u32,
    /// Optional per-role consensus weights; roles absent from the table weigh 1.0
    #[serde(default)]
    pub role_weights: BTreeMap<ReviewerRole, f64>,
}

impl GateConfig {
    fn default_name() -> String {
        "quality_gate".to_string()
    }

    fn default_threshold() -> f64 {
        DEFAULT_APPROVAL_THRESHOLD
    }

    fn default_max_revisions() -> u32 {
        DEFAULT_MAX_REVISIONS
    }

    /// Set the gate name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.gate_name = name.into();
        self
    }

    /// Set the approval threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.approval_threshold = threshold;
        self
    }

    /// Set the revision ceiling
    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    /// Declare a consensus weight for one role
    pub fn with_role_weight(mut self, role: ReviewerRole, weight: f64) -> Self {
        self.role_weights.insert(role, weight);
        self
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            gate_name: Self::default_name(),
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            max_revisions: DEFAULT_MAX_REVISIONS,
            role_weights: BTreeMap::new(),
        }
    }
}

/// Aggregate verdict for one submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
}

impl GateStatus {
    pub fn can_transition_to(self, next: GateStatus) -> bool {
        use GateStatus::*;
        match (self, next) {
            (Pending, Approved) | (Pending, Rejected) | (Pending, NeedsRevision) => true,
            (NeedsRevision, Approved) | (NeedsRevision, Rejected) => true,
            (NeedsRevision, NeedsRevision) => true,
            (Approved, _) | (Rejected, _) => false,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GateStatus::Approved | GateStatus::Rejected)
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateStatus::Pending => "PENDING",
            GateStatus::Approved => "APPROVED",
            GateStatus::Rejected => "REJECTED",
            GateStatus::NeedsRevision => "NEEDS_REVISION",
        };
        write!(f, "{}", name)
    }
}

/// The verdict record for one submission attempt
///
/// Created per attempt and never overwritten; revision attempts chain to the
/// prior attempt through `previous_fingerprint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub gate_name: String,
    pub artifact_id: String,
    /// Fingerprint of the exact content version this verdict applies to
    pub fingerprint: Fingerprint,
    /// Fingerprint judged in the previous attempt, if any
    pub previous_fingerprint: Option<Fingerprint>,
    pub status: GateStatus,
    pub reviews: Vec<ReviewResult>,
    /// Aggregate of all reviewer scores (0-100)
    pub consensus_score: f64,
    /// Union of issues from every blocking review
    pub blocking_issues: Vec<String>,
    /// How many revisions preceded this attempt
    pub revision_count: u32,
    pub max_revisions: u32,
    pub evaluated_at: Timestamp,
}

impl GateResult {
    /// Aggregate collected reviews into a verdict.
    ///
    /// Status priority: any blocking review rejects outright; otherwise
    /// consensus at or above the threshold approves; otherwise a revision is
    /// requested while the ceiling allows, and rejection follows once it is
    /// exhausted. An empty review set aggregates to a consensus of 0.0.
    pub fn from_reviews(
        config: &GateConfig,
        content: &GeneratedContent,
        reviews: Vec<ReviewResult>,
        revision_count: u32,
        previous_fingerprint: Option<Fingerprint>,
    ) -> Self {
        let blocking_issues = Self::collect_blocking_issues(&reviews);
        let consensus_score = Self::consensus(&config.role_weights, &reviews);

        let status = if !blocking_issues.is_empty() {
            GateStatus::Rejected
        } else if consensus_score >= config.approval_threshold {
            GateStatus::Approved
        } else if revision_count < config.max_revisions {
            GateStatus::NeedsRevision
        } else {
            GateStatus::Rejected
        };

        Self {
            gate_name: config.gate_name.clone(),
            artifact_id: content.artifact_id.clone(),
            fingerprint: content.fingerprint,
            previous_fingerprint,
            status,
            reviews,
            consensus_score,
            blocking_issues,
            revision_count,
            max_revisions: config.max_revisions,
            evaluated_at: now(),
        }
    }

    /// The single predicate the rest of the system may trust
    pub fn can_proceed(&self) -> bool {
        self.status == GateStatus::Approved && self.blocking_issues.is_empty()
    }

    /// Union of issues across all reviews, blocking or not
    pub fn issues(&self) -> Vec<&str> {
        self.reviews
            .iter()
            .flat_map(|r| r.issues.iter().map(String::as_str))
            .collect()
    }

    /// Union of suggestions across all reviews
    pub fn suggestions(&self) -> Vec<&str> {
        self.reviews
            .iter()
            .flat_map(|r| r.suggestions.iter().map(String::as_str))
            .collect()
    }

    fn collect_blocking_issues(reviews: &[ReviewResult]) -> Vec<String> {
        reviews
            .iter()
            .filter(|r| r.blocking)
            .flat_map(|r| {
                if r.issues.is_empty() {
                    vec![format!("{} raised a blocking objection", r.role)]
                } else {
                    r.issues.clone()
                }
            })
            .collect()
    }

    fn consensus(weights: &BTreeMap<ReviewerRole, f64>, reviews: &[ReviewResult]) -> f64 {
        if reviews.is_empty() {
            return 0.0;
        }
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for review in reviews {
            let weight = weights.get(&review.role).copied().unwrap_or(1.0);
            weighted_sum += review.score * weight;
            total_weight += weight;
        }
        if total_weight <= 0.0 {
            // Degenerate weight table; fall back to the plain mean
            return reviews.iter().map(|r| r.score).sum::<f64>() / reviews.len() as f64;
        }
        weighted_sum / total_weight
    }
}

/// A configured gate with its fixed reviewer panel
pub struct QualityGate {
    config: GateConfig,
    reviewers: Vec<Box<dyn Reviewer>>,
}

impl QualityGate {
    /// Create a gate with an empty panel
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            reviewers: Vec::new(),
        }
    }

    /// Add a reviewer to the panel (builder form)
    pub fn with_reviewer(mut self, reviewer: Box<dyn Reviewer>) -> Self {
        self.reviewers.push(reviewer);
        self
    }

    /// Add a reviewer to the panel
    pub fn add_reviewer(&mut self, reviewer: Box<dyn Reviewer>) {
        self.reviewers.push(reviewer);
    }

    /// Gate configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Roles on the panel, in invocation order
    pub fn panel_roles(&self) -> Vec<ReviewerRole> {
        self.reviewers.iter().map(|r| r.role()).collect()
    }

    /// Run every reviewer against one content version and aggregate the verdict.
    ///
    /// Reviewers run sequentially in panel order; each sees only the content,
    /// never another review. An empty panel is a configuration error, not a
    /// vacuous approval.
    pub async fn evaluate(
        &self,
        content: &GeneratedContent,
        revision_count: u32,
        previous_fingerprint: Option<Fingerprint>,
    ) -> Result<GateResult> {
        if self.reviewers.is_empty() {
            return Err(GovernanceError::validation_failed(
                "gate has no reviewers configured",
            )
            .with_detail("gate", self.config.gate_name.clone()));
        }

        let mut reviews = Vec::with_capacity(self.reviewers.len());
        for reviewer in &self.reviewers {
            let review = reviewer.review(content).await?;
            reviews.push(review);
        }

        let result = GateResult::from_reviews(
            &self.config,
            content,
            reviews,
            revision_count,
            previous_fingerprint,
        );

        match result.status {
            GateStatus::Rejected if !result.blocking_issues.is_empty() => {
                warn!(
                    artifact_id = %result.artifact_id,
                    gate = %result.gate_name,
                    blocking = result.blocking_issues.len(),
                    "gate rejected artifact on blocking issues"
                );
            }
            status => {
                info!(
                    artifact_id = %result.artifact_id,
                    gate = %result.gate_name,
                    status = %status,
                    consensus = result.consensus_score,
                    revision = result.revision_count,
                    "gate verdict"
                );
            }
        }

        Ok(result)
    }
}

impl fmt::Debug for QualityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityGate")
            .field("config", &self.config)
            .field("panel", &self.panel_roles())
            .finish()
    }
}
