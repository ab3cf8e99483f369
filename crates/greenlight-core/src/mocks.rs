//! Scripted stand-ins for the external plug-in seams
//!
//! Real reviewers, generators, and actions live outside this crate. These
//! implementations back the test suites and the CLI's scripted panel: they
//! return exactly what they were configured with.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::boundary::{ExecutionAction, ExecutionInterceptor, ExecutionRequest, InterceptDecision};
use crate::content::GeneratedContent;
use crate::error::Result;
use crate::gate::GateResult;
use crate::review::{ReviewResult, Reviewer, ReviewerRole};
use crate::revision::Generator;

/// Reviewer that returns the same judgment every time
#[derive(Debug, Clone)]
pub struct StaticReviewer {
    review: ReviewResult,
}

impl StaticReviewer {
    /// A non-blocking reviewer with a fixed score
    pub fn approving(role: ReviewerRole, score: f64) -> Self {
        Self {
            review: ReviewResult::new(role, score),
        }
    }

    /// A reviewer that always blocks on the given issue
    pub fn blocking(role: ReviewerRole, score: f64, issue: impl Into<String>) -> Self {
        Self {
            review: ReviewResult::new(role, score).block_on(issue),
        }
    }

    /// A reviewer returning exactly this judgment
    pub fn from_review(review: ReviewResult) -> Self {
        Self { review }
    }
}

#[async_trait]
impl Reviewer for StaticReviewer {
    fn role(&self) -> ReviewerRole {
        self.review.role
    }

    async fn review(&self, _content: &GeneratedContent) -> Result<ReviewResult> {
        Ok(self.review.clone())
    }
}

/// Reviewer that serves a queue of scores, one per invocation
///
/// Once the queue is exhausted it keeps serving the last score, so loops can
/// settle regardless of attempt count.
#[derive(Debug)]
pub struct ScriptedReviewer {
    role: ReviewerRole,
    scores: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedReviewer {
    pub fn with_scores(role: ReviewerRole, scores: Vec<f64>) -> Self {
        let fallback = scores.last().copied().unwrap_or(0.0);
        Self {
            role,
            scores: Mutex::new(scores.into()),
            fallback,
        }
    }

    fn next_score(&self) -> f64 {
        match self.scores.lock() {
            Ok(mut queue) => queue.pop_front().unwrap_or(self.fallback),
            Err(_) => self.fallback,
        }
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    fn role(&self) -> ReviewerRole {
        self.role
    }

    async fn review(&self, _content: &GeneratedContent) -> Result<ReviewResult> {
        Ok(ReviewResult::new(self.role, self.next_score()))
    }
}

/// Generator that drafts a fixed body and marks each revision
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    body: String,
}

impl StaticGenerator {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    async fn produce(&self, artifact_id: &str) -> Result<GeneratedContent> {
        Ok(GeneratedContent::with_id(artifact_id, self.body.clone()))
    }

    async fn revise(
        &self,
        previous: &GeneratedContent,
        feedback: &GateResult,
    ) -> Result<GeneratedContent> {
        // Distinct body per attempt, so every revision gets a new fingerprint
        Ok(previous.revised(format!(
            "{} (rev {})",
            self.body,
            feedback.revision_count + 1
        )))
    }
}

/// Action that counts how many times it actually ran
#[derive(Debug, Default)]
pub struct CountingAction {
    runs: AtomicU32,
}

impl CountingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the side effect executed
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionAction for CountingAction {
    async fn run(&self, request: &ExecutionRequest) -> Result<Value> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({
            "action_class": request.action_class,
            "items": request.items.len(),
            "run": run,
        }))
    }
}

/// Interceptor that vetoes every request with a fixed reason
#[derive(Debug, Clone)]
pub struct VetoInterceptor {
    name: String,
    reason: String,
}

impl VetoInterceptor {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl ExecutionInterceptor for VetoInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn inspect(&self, _request: &ExecutionRequest) -> InterceptDecision {
        InterceptDecision::Veto {
            reason: self.reason.clone(),
        }
    }
}
