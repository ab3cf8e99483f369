//! The `verify` command: re-derive completion from evidence alone
//!
//! Reads the three records for one unit of work and reports what they
//! support. Never writes; a missing or damaged record shows up in the report
//! rather than as a crash.

use std::path::Path;
use std::process::ExitCode;

use greenlight_core::{CompletionReport, CompletionVerifier, EvidenceStore};

pub async fn verify(evidence_dir: &Path, work_id: &str) -> anyhow::Result<ExitCode> {
    let store = EvidenceStore::open(evidence_dir).await?;
    let verifier = CompletionVerifier::new(store);
    let report = verifier.assess(work_id).await?;

    print_report(&report);

    if report.is_truly_completed() {
        println!("completed: evidence verifies the work unit");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("blocked: evidence does not verify the work unit");
        Ok(ExitCode::FAILURE)
    }
}

pub fn print_report(report: &CompletionReport) {
    println!("Evidence:   {} -> {}", report.work_id, report.state);
    for record in &report.missing {
        println!("  missing: {record}");
    }
    for record in &report.corrupt {
        println!("  corrupt: {record}");
    }
    for check in &report.failed_checks {
        println!("  failed: {check}");
    }
}
