//! Process-level override signals
//!
//! The three environment-style overrides are read exactly once, at the
//! process edge, into an explicit [`OverrideSignals`] value that gets passed
//! into guard constructors. Nothing deeper in the call chain reads ambient
//! process state. Every signal defaults to "not granted" when absent.

use serde::{Deserialize, Serialize};
use std::env;

/// Grants a batch-size override for this process
pub const ENV_BATCH_OVERRIDE: &str = "GREENLIGHT_BATCH_OVERRIDE";

/// Names one destructive call class whose freeze is lifted for this process
pub const ENV_UNFREEZE_CLASS: &str = "GREENLIGHT_UNFREEZE_CLASS";

/// Authorizes direct entry points that would otherwise hard-stop
pub const ENV_PIPELINE_AUTHORIZED: &str = "GREENLIGHT_PIPELINE_AUTHORIZED";

/// Externally granted override signals, all denied by default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSignals {
    /// Batch-size override granted out of band
    pub batch_override: bool,
    /// Freeze override, scoped to exactly one destructive call class
    pub unfreeze_class: Option<String>,
    /// Authorization for entry points that bypass the pipeline
    pub pipeline_authorized: bool,
}

impl OverrideSignals {
    /// All signals denied
    pub fn denied() -> Self {
        Self::default()
    }

    /// Read the signals from the process environment.
    ///
    /// Call once at startup; pass the value down from there.
    pub fn from_env() -> Self {
        Self {
            batch_override: env_flag(ENV_BATCH_OVERRIDE),
            unfreeze_class: env::var(ENV_UNFREEZE_CLASS)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            pipeline_authorized: env_flag(ENV_PIPELINE_AUTHORIZED),
        }
    }

    /// Grant the batch override
    pub fn with_batch_override(mut self) -> Self {
        self.batch_override = true;
        self
    }

    /// Grant a freeze override for one call class
    pub fn with_unfreeze_class(mut self, class: impl Into<String>) -> Self {
        self.unfreeze_class = Some(class.into());
        self
    }

    /// Grant pipeline authorization
    pub fn with_pipeline_authorization(mut self) -> Self {
        self.pipeline_authorized = true;
        self
    }

    /// Whether the freeze override covers the given call class
    pub fn unfreezes(&self, class_name: &str) -> bool {
        self.unfreeze_class.as_deref() == Some(class_name)
    }
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            value == "1" || value == "true"
        }
        Err(_) => false,
    }
}
