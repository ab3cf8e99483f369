//! Reviewer roles and judgments
//!
//! Reviewers are opaque plug-ins: the gate hands each one the artifact and
//! receives exactly one [`ReviewResult`] back. Reviewers never see each
//! other's output, so invocation order cannot affect the verdict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::GeneratedContent;
use crate::error::Result;

/// The closed set of reviewer roles a gate panel is drawn from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerRole {
    /// Voice, tone, and account identity
    BrandGuardian,
    /// Food-safety claims and regulatory risk
    SafetyChecker,
    /// Factual accuracy and editorial quality
    QualityAuditor,
    /// Production and distribution cost
    CostOptimizer,
    /// Audience usefulness and clarity
    CustomerAdvocate,
}

impl ReviewerRole {
    /// Every role, in canonical panel order
    pub fn all() -> [ReviewerRole; 5] {
        [
            ReviewerRole::BrandGuardian,
            ReviewerRole::SafetyChecker,
            ReviewerRole::QualityAuditor,
            ReviewerRole::CostOptimizer,
            ReviewerRole::CustomerAdvocate,
        ]
    }
}

impl fmt::Display for ReviewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewerRole::BrandGuardian => "brand_guardian",
            ReviewerRole::SafetyChecker => "safety_checker",
            ReviewerRole::QualityAuditor => "quality_auditor",
            ReviewerRole::CostOptimizer => "cost_optimizer",
            ReviewerRole::CustomerAdvocate => "customer_advocate",
        };
        write!(f, "{}", name)
    }
}

/// One reviewer's judgment of one artifact version
///
/// Produced once per reviewer per gate invocation; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub role: ReviewerRole,
    /// Score in 0-100, clamped at construction
    pub score: f64,
    /// Problems the reviewer found
    pub issues: Vec<String>,
    /// Non-blocking improvement proposals
    pub suggestions: Vec<String>,
    /// A blocking review forces rejection regardless of every score
    pub blocking: bool,
}

impl ReviewResult {
    /// Create a non-blocking review with the given score
    pub fn new(role: ReviewerRole, score: f64) -> Self {
        Self {
            role,
            score: score.clamp(0.0, 100.0),
            issues: Vec::new(),
            suggestions: Vec::new(),
            blocking: false,
        }
    }

    /// Add an issue string
    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    /// Add a suggestion string
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Mark this review as blocking, recording the issue that forces rejection
    pub fn block_on(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self.blocking = true;
        self
    }
}

/// A plug-in reviewer
///
/// Implementations wrap whatever actually judges content (a rule engine, a
/// model call, a human queue). The gate only relies on the contract here:
/// one independent [`ReviewResult`] per invocation, no shared state between
/// reviewers.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// The role this reviewer fills on the panel
    fn role(&self) -> ReviewerRole;

    /// Judge one version of an artifact
    async fn review(&self, content: &GeneratedContent) -> Result<ReviewResult>;
}
