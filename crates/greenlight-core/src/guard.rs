//! Batch Guard and Freeze Control
//!
//! Last-line, process-local guards in front of destructive external calls.
//! Both are constructed from an explicit [`OverrideSignals`] value at process
//! start; neither reads ambient state at check time. Callers invoke the checks
//! immediately before the side-effecting call, so the guard is visible at the
//! call site. These are advisory, single-process guards, not a distributed
//! lock: two processes can each observe "not frozen" and both proceed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::{GovernanceError, Result};
use crate::signals::{OverrideSignals, ENV_BATCH_OVERRIDE, ENV_PIPELINE_AUTHORIZED, ENV_UNFREEZE_CLASS};
use crate::types::{now, Timestamp};

/// Default admission ceiling for one batch
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 20;

/// Throttle on how many work items one call may carry
#[derive(Debug, Clone)]
pub struct BatchGuard {
    max_items: usize,
    /// Captured from the override signals at construction
    override_granted: bool,
}

impl BatchGuard {
    /// Build the guard from the process signals, with the default ceiling
    pub fn new(signals: &OverrideSignals) -> Self {
        Self {
            max_items: DEFAULT_MAX_BATCH_ITEMS,
            override_granted: signals.batch_override,
        }
    }

    /// Change the admission ceiling
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// The configured ceiling
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Admit or block one batch.
    ///
    /// A batch larger than the ceiling is blocked unless the caller passed an
    /// explicit override flag or the process-level override signal was
    /// granted. Blocked calls log the overage and both unblock paths.
    pub fn check_batch_limit<T>(&self, items: &[T], override_flag: bool) -> Result<()> {
        let submitted = items.len();
        if submitted <= self.max_items {
            return Ok(());
        }

        if override_flag || self.override_granted {
            info!(
                submitted,
                max = self.max_items,
                via_flag = override_flag,
                via_signal = self.override_granted,
                "oversized batch admitted under override"
            );
            return Ok(());
        }

        let overage = submitted - self.max_items;
        warn!(
            submitted,
            max = self.max_items,
            overage,
            "batch blocked; unblock with the {} signal or an explicit override flag",
            ENV_BATCH_OVERRIDE
        );
        Err(GovernanceError::execution_blocked("batch exceeds admission ceiling")
            .with_detail("submitted", submitted.to_string())
            .with_detail("max", self.max_items.to_string())
            .with_detail("overage", overage.to_string())
            .with_detail("unblock_signal", ENV_BATCH_OVERRIDE)
            .with_detail("unblock_flag", "override"))
    }
}

/// One named kill-switch over a class of destructive external call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeFlag {
    pub class_name: String,
    pub engaged: bool,
    pub reason: Option<String>,
    pub changed_at: Timestamp,
}

/// Registry of freeze flags, one per destructive call class
#[derive(Debug, Clone)]
pub struct FreezeControl {
    flags: BTreeMap<String, FreezeFlag>,
    /// Captured from the override signals at construction
    unfreeze_class: Option<String>,
}

impl FreezeControl {
    /// Build the control from the process signals, with no class frozen
    pub fn new(signals: &OverrideSignals) -> Self {
        Self {
            flags: BTreeMap::new(),
            unfreeze_class: signals.unfreeze_class.clone(),
        }
    }

    /// Engage the kill-switch for one call class
    pub fn freeze(&mut self, class_name: impl Into<String>, reason: impl Into<String>) {
        let class_name = class_name.into();
        let reason = reason.into();
        info!(class = %class_name, reason = %reason, "freeze engaged");
        self.flags.insert(
            class_name.clone(),
            FreezeFlag {
                class_name,
                engaged: true,
                reason: Some(reason),
                changed_at: now(),
            },
        );
    }

    /// Lift the kill-switch for one call class
    pub fn lift(&mut self, class_name: &str) {
        if let Some(flag) = self.flags.get_mut(class_name) {
            info!(class = %class_name, "freeze lifted");
            flag.engaged = false;
            flag.reason = None;
            flag.changed_at = now();
        }
    }

    /// Whether the class is frozen, after applying the scoped override signal
    pub fn is_frozen(&self, class_name: &str) -> bool {
        let engaged = self
            .flags
            .get(class_name)
            .map(|flag| flag.engaged)
            .unwrap_or(false);
        engaged && self.unfreeze_class.as_deref() != Some(class_name)
    }

    /// The flag record for one class, if it was ever touched
    pub fn flag(&self, class_name: &str) -> Option<&FreezeFlag> {
        self.flags.get(class_name)
    }

    /// Pre-condition check to run immediately before a call in the class.
    ///
    /// A frozen class short-circuits to a blocked result; nothing in the
    /// class may run.
    pub fn check_frozen(&self, class_name: &str) -> Result<()> {
        if !self.is_frozen(class_name) {
            return Ok(());
        }

        let reason = self
            .flags
            .get(class_name)
            .and_then(|flag| flag.reason.clone())
            .unwrap_or_else(|| "frozen".to_string());
        warn!(
            class = %class_name,
            reason = %reason,
            "call class is frozen; unblock by lifting the flag or via the {} signal",
            ENV_UNFREEZE_CLASS
        );
        Err(GovernanceError::execution_blocked("call class is frozen")
            .with_detail("class", class_name)
            .with_detail("reason", reason)
            .with_detail("unblock_signal", ENV_UNFREEZE_CLASS))
    }
}

/// Hard stop for entry points that can reach a destructive class directly.
///
/// Denied unless the explicit pipeline-authorization signal was granted.
/// Callers are expected to treat a denial as fatal and exit non-zero; this
/// is a deliberately blunt control on anything that bypasses the governed
/// pipeline.
pub fn require_authorization(signals: &OverrideSignals) -> Result<()> {
    if signals.pipeline_authorized {
        return Ok(());
    }
    warn!(
        "direct entry point refused; grant {} to authorize",
        ENV_PIPELINE_AUTHORIZED
    );
    Err(
        GovernanceError::permission_denied("direct entry point requires pipeline authorization")
            .with_detail("signal", ENV_PIPELINE_AUTHORIZED),
    )
}
