//! Greenlight Core - approval and execution governance for content pipelines
//!
//! Greenlight Core sits between the layer of a pipeline that produces content
//! and the layer that acts on it. Nothing crosses that boundary without a
//! recorded verdict, and nothing counts as finished unless independent
//! evidence says so.
//!
//! # Architecture
//!
//! The crate is built around five pieces:
//!
//! 1. **Quality Gate** (`gate`): a reviewer panel scored into one verdict
//! 2. **Gate Ledger** (`ledger`): append-only history of every verdict
//! 3. **Layer Boundary** (`boundary`): single-use execution tokens between
//!    approval and action
//! 4. **Operational Guards** (`guard`): batch ceilings, freeze flags, and the
//!    authorization stop
//! 5. **Evidence & Verification** (`evidence`, `verifier`): three independent
//!    completion records, re-derived into one authoritative answer
//!
//! # Quick Start
//!
//! ```
//! use greenlight_core::{GateConfig, GateResult, GeneratedContent, ReviewResult, ReviewerRole};
//!
//! let content = GeneratedContent::draft("Reheat leftovers until steaming hot all the way through.");
//!
//! // A full panel scores the draft
//! let reviews = vec![
//!     ReviewResult::new(ReviewerRole::BrandGuardian, 95.0),
//!     ReviewResult::new(ReviewerRole::SafetyChecker, 90.0),
//!     ReviewResult::new(ReviewerRole::QualityAuditor, 85.0),
//!     ReviewResult::new(ReviewerRole::CostOptimizer, 92.0),
//!     ReviewResult::new(ReviewerRole::CustomerAdvocate, 88.0),
//! ];
//!
//! let result = GateResult::from_reviews(&GateConfig::default(), &content, reviews, 0, None);
//!
//! assert_eq!(result.consensus_score, 90.0);
//! assert!(result.can_proceed());
//! ```
//!
//! # Design Principles
//!
//! 1. **Deny by default**: every override starts out not granted
//! 2. **Single path**: submit, authorize, execute - there is no other door
//! 3. **Evidence over assertion**: completion is recomputed from records, not
//!    read from a flag
//! 4. **Explicit configuration**: thresholds and ceilings travel in config
//!    values, never in ambient globals

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod boundary;
pub mod content;
pub mod error;
pub mod evidence;
pub mod gate;
pub mod guard;
pub mod ledger;
pub mod mocks;
pub mod review;
pub mod revision;
pub mod signals;
pub mod types;
pub mod verifier;

// Re-export commonly used types for convenience
pub use boundary::{
    ExecutionAction, ExecutionInterceptor, ExecutionRequest, ExecutionResult, ExecutionToken,
    InterceptDecision, LayerBoundary,
};
pub use content::GeneratedContent;
pub use error::{ErrorKind, EvidenceError, GovernanceError, Result, ResultExt};
pub use evidence::{EvidenceStore, RulesSnapshot, StatusRecord, TaskDescriptor};
pub use gate::{
    GateConfig, GateResult, GateStatus, QualityGate, DEFAULT_APPROVAL_THRESHOLD,
    DEFAULT_MAX_REVISIONS,
};
pub use guard::{
    require_authorization, BatchGuard, FreezeControl, FreezeFlag, DEFAULT_MAX_BATCH_ITEMS,
};
pub use ledger::GateLedger;
pub use review::{ReviewResult, Reviewer, ReviewerRole};
pub use revision::{Generator, RevisionController, RevisionOutcome};
pub use signals::OverrideSignals;
pub use types::{now, Fingerprint, PipelineStage, Timestamp};
pub use verifier::{CompletionReport, CompletionState, CompletionVerifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_gate_and_ledger_workflow() {
        // Drive a draft through two revisions by hand, the way the
        // revision controller does, and watch the ledger carry the count.
        let config = GateConfig::default();
        let mut ledger = GateLedger::default();

        let draft = GeneratedContent::draft("first attempt");
        let low_panel = vec![
            ReviewResult::new(ReviewerRole::BrandGuardian, 70.0),
            ReviewResult::new(ReviewerRole::SafetyChecker, 72.0),
        ];
        let first = GateResult::from_reviews(
            &config,
            &draft,
            low_panel,
            ledger.attempts(&draft.artifact_id),
            None,
        );
        assert_eq!(first.status, GateStatus::NeedsRevision);
        ledger.append(first.clone()).unwrap();

        let revised = draft.revised("second attempt, tightened copy");
        let high_panel = vec![
            ReviewResult::new(ReviewerRole::BrandGuardian, 92.0),
            ReviewResult::new(ReviewerRole::SafetyChecker, 90.0),
        ];
        let second = GateResult::from_reviews(
            &config,
            &revised,
            high_panel,
            ledger.attempts(&revised.artifact_id),
            ledger.last(&revised.artifact_id).map(|r| r.fingerprint),
        );
        assert_eq!(second.status, GateStatus::Approved);
        assert_eq!(second.revision_count, 1);
        assert_eq!(second.previous_fingerprint, Some(first.fingerprint));
        ledger.append(second).unwrap();

        assert_eq!(ledger.attempts(&draft.artifact_id), 2);
        // Approved is terminal: the ledger refuses further verdicts
        let stray = GateResult::from_reviews(
            &config,
            &revised,
            vec![ReviewResult::new(ReviewerRole::QualityAuditor, 50.0)],
            2,
            None,
        );
        assert!(ledger.append(stray).is_err());
    }

    #[test]
    fn test_version_and_name_are_wired() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "greenlight-core");
    }
}
