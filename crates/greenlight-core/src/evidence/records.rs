//! The three evidence record types
//!
//! Each record is written by exactly one producer: the rules snapshot by the
//! rule loader, the task descriptor by the planner, the status record by the
//! final reconciliation step. Well-formedness is checked structurally via
//! `problems`; the status record's booleans are a separate concern, reported
//! by [`StatusRecord::failed_flags`], because false flags mean incomplete
//! work, not a damaged record.

use serde::{Deserialize, Serialize};

use crate::types::{now, Fingerprint, Timestamp};

/// What rule version was in force when the work ran
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSnapshot {
    pub work_id: String,
    pub rules_version: String,
    /// Content hash of the rules document in force
    pub rules_hash: Fingerprint,
    pub captured_at: Timestamp,
}

impl RulesSnapshot {
    /// Capture the rules in force, hashing their content
    pub fn capture(
        work_id: impl Into<String>,
        rules_version: impl Into<String>,
        rules_content: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            work_id: work_id.into(),
            rules_version: rules_version.into(),
            rules_hash: Fingerprint::of(rules_content),
            captured_at: now(),
        }
    }

    /// Structural problems, empty when the record is well-formed
    pub fn problems(&self, expected_work_id: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.work_id != expected_work_id {
            problems.push(format!(
                "rules snapshot belongs to {}, expected {}",
                self.work_id, expected_work_id
            ));
        }
        if self.rules_version.trim().is_empty() {
            problems.push("rules snapshot has no rules version".to_string());
        }
        problems
    }
}

/// Declared intent for one unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub work_id: String,
    /// What the work acts on, e.g. a post slug or folder path
    pub target: String,
    /// Expected classification of the content
    pub classification: String,
    /// What the work is expected to produce
    pub expected_output: String,
    pub declared_at: Timestamp,
}

impl TaskDescriptor {
    pub fn declare(
        work_id: impl Into<String>,
        target: impl Into<String>,
        classification: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            work_id: work_id.into(),
            target: target.into(),
            classification: classification.into(),
            expected_output: expected_output.into(),
            declared_at: now(),
        }
    }

    /// Structural problems, empty when the record is well-formed
    pub fn problems(&self, expected_work_id: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.work_id != expected_work_id {
            problems.push(format!(
                "task descriptor belongs to {}, expected {}",
                self.work_id, expected_work_id
            ));
        }
        if self.target.trim().is_empty() {
            problems.push("task descriptor has no target".to_string());
        }
        if self.classification.trim().is_empty() {
            problems.push("task descriptor has no classification".to_string());
        }
        if self.expected_output.trim().is_empty() {
            problems.push("task descriptor has no expected output".to_string());
        }
        problems
    }
}

/// Post-hoc completion claims, each computed independently
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub work_id: String,
    pub validation_passed: bool,
    pub system_of_record_updated: bool,
    pub notification_sent: bool,
    /// The reconciliation step's own overall claim
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub recorded_at: Timestamp,
}

impl StatusRecord {
    /// A fresh record with every claim still false
    pub fn new(work_id: impl Into<String>) -> Self {
        Self {
            work_id: work_id.into(),
            validation_passed: false,
            system_of_record_updated: false,
            notification_sent: false,
            completed: false,
            completed_at: None,
            recorded_at: now(),
        }
    }

    pub fn with_validation_passed(mut self, passed: bool) -> Self {
        self.validation_passed = passed;
        self
    }

    pub fn with_system_of_record_updated(mut self, updated: bool) -> Self {
        self.system_of_record_updated = updated;
        self
    }

    pub fn with_notification_sent(mut self, sent: bool) -> Self {
        self.notification_sent = sent;
        self
    }

    /// Record the overall claim and stamp the completion time
    pub fn mark_completed(mut self) -> Self {
        self.completed = true;
        self.completed_at = Some(now());
        self
    }

    /// Structural problems, empty when the record is well-formed
    pub fn problems(&self, expected_work_id: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.work_id != expected_work_id {
            problems.push(format!(
                "status record belongs to {}, expected {}",
                self.work_id, expected_work_id
            ));
        }
        problems
    }

    /// Names of every required flag that is not satisfied
    pub fn failed_flags(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.validation_passed {
            failed.push("validation_passed");
        }
        if !self.system_of_record_updated {
            failed.push("system_of_record_updated");
        }
        if !self.notification_sent {
            failed.push("notification_sent");
        }
        if !self.completed {
            failed.push("completed");
        }
        if self.completed_at.is_none() {
            failed.push("completed_at");
        }
        failed
    }
}
