//! Property tests: gate verdict rules hold for arbitrary review panels.
//!
//! The aggregation in `GateResult::from_reviews` is a pure function, so every
//! rule it promises can be checked against randomized panels directly.

use greenlight_core::{
    GateConfig, GateLedger, GateResult, GeneratedContent, ReviewResult, ReviewerRole,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_role() -> impl Strategy<Value = ReviewerRole> {
    prop_oneof![
        Just(ReviewerRole::BrandGuardian),
        Just(ReviewerRole::SafetyChecker),
        Just(ReviewerRole::QualityAuditor),
        Just(ReviewerRole::CostOptimizer),
        Just(ReviewerRole::CustomerAdvocate),
    ]
}

fn arb_review() -> impl Strategy<Value = ReviewResult> {
    (
        arb_role(),
        0.0..=100.0f64,
        prop::collection::vec("[a-z ]{3,24}", 0..3),
        any::<bool>(),
    )
        .prop_map(|(role, score, issues, blocking)| {
            let mut review = ReviewResult::new(role, score);
            for issue in issues {
                review = review.with_issue(issue);
            }
            review.blocking = blocking;
            review
        })
}

fn arb_reviews(min: usize, max: usize) -> impl Strategy<Value = Vec<ReviewResult>> {
    prop::collection::vec(arb_review(), min..max)
}

fn content() -> GeneratedContent {
    GeneratedContent::draft("panel fodder")
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// can_proceed holds exactly when the verdict is approved with no
    /// blocking issues, for every panel and attempt number.
    #[test]
    fn can_proceed_iff_approved_and_unblocked(
        reviews in arb_reviews(0, 12),
        revision_count in 0u32..6,
    ) {
        use greenlight_core::GateStatus;

        let result = GateResult::from_reviews(
            &GateConfig::default(),
            &content(),
            reviews,
            revision_count,
            None,
        );

        prop_assert_eq!(
            result.can_proceed(),
            result.status == GateStatus::Approved && result.blocking_issues.is_empty()
        );
    }

    /// blocking_issues is non-empty exactly when some review blocks, and any
    /// blocking review forces rejection regardless of scores.
    #[test]
    fn blocking_reviews_always_reject(reviews in arb_reviews(1, 12)) {
        use greenlight_core::GateStatus;

        let any_blocking = reviews.iter().any(|r| r.blocking);
        let result =
            GateResult::from_reviews(&GateConfig::default(), &content(), reviews, 0, None);

        prop_assert_eq!(!result.blocking_issues.is_empty(), any_blocking);
        if any_blocking {
            prop_assert_eq!(result.status, GateStatus::Rejected);
            prop_assert!(!result.can_proceed());
        }
    }

    /// With no declared weights the consensus is the arithmetic mean, so it
    /// never leaves the closed interval spanned by the individual scores.
    #[test]
    fn consensus_stays_within_score_bounds(reviews in arb_reviews(1, 12)) {
        let lo = reviews.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
        let hi = reviews.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);

        let result =
            GateResult::from_reviews(&GateConfig::default(), &content(), reviews, 0, None);

        prop_assert!(result.consensus_score >= lo - 1e-9);
        prop_assert!(result.consensus_score <= hi + 1e-9);
    }

    /// Absent blocking reviews, approval tracks the threshold inclusively.
    #[test]
    fn approval_tracks_threshold(
        reviews in arb_reviews(1, 12),
        threshold in 0.0..=100.0f64,
    ) {
        use greenlight_core::GateStatus;

        let mut reviews = reviews;
        for review in &mut reviews {
            review.blocking = false;
        }
        let config = GateConfig::default().with_threshold(threshold);
        let result = GateResult::from_reviews(&config, &content(), reviews, 0, None);

        prop_assert_eq!(
            result.status == GateStatus::Approved,
            result.consensus_score >= threshold
        );
    }

    /// A revision is only ever requested below the ceiling; at or past it the
    /// same panel yields a terminal rejection instead.
    #[test]
    fn revision_requests_respect_the_ceiling(
        reviews in arb_reviews(1, 12),
        revision_count in 0u32..8,
        max_revisions in 0u32..5,
    ) {
        use greenlight_core::GateStatus;

        let config = GateConfig::default().with_max_revisions(max_revisions);
        let result = GateResult::from_reviews(&config, &content(), reviews, revision_count, None);

        if result.status == GateStatus::NeedsRevision {
            prop_assert!(revision_count < max_revisions);
        }
        prop_assert!(result.status != GateStatus::Pending);
    }

    /// Replaying the same panel yields the same verdict and consensus.
    #[test]
    fn verdict_is_deterministic(reviews in arb_reviews(0, 12)) {
        let config = GateConfig::default();
        let subject = content();

        let first = GateResult::from_reviews(&config, &subject, reviews.clone(), 1, None);
        let second = GateResult::from_reviews(&config, &subject, reviews, 1, None);

        prop_assert_eq!(first.status, second.status);
        prop_assert_eq!(first.consensus_score, second.consensus_score);
        prop_assert_eq!(first.blocking_issues, second.blocking_issues);
    }

    /// Driving any sequence of panels through the ledger terminates within
    /// max_revisions + 1 attempts, and the final entry is terminal.
    #[test]
    fn ledger_settles_within_the_ceiling(
        panels in prop::collection::vec(arb_reviews(1, 6), 1..10),
        max_revisions in 0u32..4,
    ) {
        let config = GateConfig::default().with_max_revisions(max_revisions);
        let mut ledger = GateLedger::new();
        let mut version = content();

        for panel in panels.iter().cycle().take((max_revisions as usize) + 1) {
            let attempt = ledger.attempts(&version.artifact_id);
            let previous = ledger.last(&version.artifact_id).map(|r| r.fingerprint);
            let result = GateResult::from_reviews(
                &config,
                &version,
                panel.clone(),
                attempt,
                previous,
            );
            let status = result.status;
            ledger.append(result).unwrap();
            if status.is_terminal() {
                break;
            }
            version = version.revised(format!("attempt {}", attempt + 1));
        }

        let last = ledger.last(&version.artifact_id).unwrap();
        prop_assert!(last.status.is_terminal());
        prop_assert!(ledger.attempts(&version.artifact_id) <= max_revisions + 1);
    }

    /// A blocking review with no written issues still surfaces an issue
    /// naming the role, so blocked verdicts are never silent.
    #[test]
    fn silent_blocking_review_names_its_role(role in arb_role()) {
        let mut review = ReviewResult::new(role, 100.0);
        review.blocking = true;

        let result =
            GateResult::from_reviews(&GateConfig::default(), &content(), vec![review], 0, None);

        prop_assert_eq!(result.blocking_issues.len(), 1);
        prop_assert!(result.blocking_issues[0].contains(&role.to_string()));
    }
}
