//! Evidence Store - durable proof of a unit of work's inputs and outcome
//!
//! Three independently-written records per unit of work: what rules were in
//! force, what the work intended to do, and what the reconciliation step
//! observed afterwards. The store is append-only and file-addressed; the
//! Completion Verifier reads it and nothing else.

pub mod records;
pub mod store;

pub use records::{RulesSnapshot, StatusRecord, TaskDescriptor};
pub use store::{
    EvidenceStore, RULES_SNAPSHOT_FILE, STATUS_RECORD_FILE, TASK_DESCRIPTOR_FILE,
};
