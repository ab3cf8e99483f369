//! Layer boundary between Generation, Validation, and Execution
//!
//! The boundary is the only path between layers: Generation enters Validation
//! through [`LayerBoundary::submit`], Validation grants execution rights only
//! through [`LayerBoundary::authorize`], and every side effect runs through
//! [`LayerBoundary::execute`]. Tokens are minted here and nowhere else; their
//! fields are private, so holding a [`GateResult`] is never enough to execute.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::content::GeneratedContent;
use crate::error::{GovernanceError, Result};
use crate::gate::{GateResult, QualityGate};
use crate::guard::{BatchGuard, FreezeControl};
use crate::ledger::GateLedger;
use crate::types::{now, Fingerprint, Timestamp};

/// Single-use capability proving Validation approved one content version
///
/// Minted only by [`LayerBoundary::authorize`]; there is no public
/// constructor and no deserialization, so tokens cannot be forged from data.
#[derive(Debug, Clone)]
pub struct ExecutionToken {
    token_id: String,
    artifact_id: String,
    fingerprint: Fingerprint,
    gate_name: String,
    issued_at: Timestamp,
}

impl ExecutionToken {
    fn mint(result: &GateResult) -> Self {
        Self {
            token_id: format!("tok_{}", uuid::Uuid::new_v4()),
            artifact_id: result.artifact_id.clone(),
            fingerprint: result.fingerprint,
            gate_name: result.gate_name.clone(),
            issued_at: now(),
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// The exact content version this token authorizes
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn gate_name(&self) -> &str {
        &self.gate_name
    }

    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }
}

/// Typed description of one destructive external call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub artifact_id: String,
    /// Content version the call is about; must match the presented token
    pub fingerprint: Fingerprint,
    /// Destructive call class, e.g. "external_publish"
    pub action_class: String,
    /// Work items carried by the call, checked by the Batch Guard
    pub items: Vec<String>,
    /// Explicit caller-side batch override flag
    #[serde(default)]
    pub batch_override: bool,
}

impl ExecutionRequest {
    /// Describe a call acting on one content version
    pub fn for_content(content: &GeneratedContent, action_class: impl Into<String>) -> Self {
        Self {
            artifact_id: content.artifact_id.clone(),
            fingerprint: content.fingerprint,
            action_class: action_class.into(),
            items: Vec::new(),
            batch_override: false,
        }
    }

    /// Attach the work items the call will touch
    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    /// Set the explicit batch override flag
    pub fn with_batch_override(mut self) -> Self {
        self.batch_override = true;
        self
    }
}

/// Receipt for one executed call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub token_id: String,
    pub artifact_id: String,
    pub action_class: String,
    /// Action-defined output document
    pub output: Value,
    pub executed_at: Timestamp,
}

/// The side-effecting call itself, behind the boundary
///
/// Implementations wrap the external clients (CDN upload, spreadsheet sync,
/// chat notification). The boundary runs one only after every check clears.
#[async_trait]
pub trait ExecutionAction: Send + Sync {
    async fn run(&self, request: &ExecutionRequest) -> Result<Value>;
}

/// Verdict from one automated safety interceptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptDecision {
    Allow,
    Veto { reason: String },
}

/// An automated safety check that can veto execution independent of the token
///
/// Registered on the boundary at construction and consulted, in order,
/// immediately before the side-effecting call.
pub trait ExecutionInterceptor: Send + Sync {
    fn name(&self) -> &str;
    fn inspect(&self, request: &ExecutionRequest) -> InterceptDecision;
}

/// The enforced path between pipeline layers
pub struct LayerBoundary {
    gate: QualityGate,
    ledger: GateLedger,
    batch_guard: BatchGuard,
    freeze: FreezeControl,
    interceptors: Vec<Box<dyn ExecutionInterceptor>>,
    consumed_tokens: HashSet<String>,
}

impl LayerBoundary {
    pub fn new(gate: QualityGate, batch_guard: BatchGuard, freeze: FreezeControl) -> Self {
        Self {
            gate,
            ledger: GateLedger::new(),
            batch_guard,
            freeze,
            interceptors: Vec::new(),
            consumed_tokens: HashSet::new(),
        }
    }

    /// Register an automated safety interceptor
    pub fn with_interceptor(mut self, interceptor: Box<dyn ExecutionInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// The only entry point into Validation from Generation.
    ///
    /// The attempt number and fingerprint chain come from the ledger, and the
    /// verdict is appended there before it is returned.
    pub async fn submit(&mut self, content: &GeneratedContent) -> Result<GateResult> {
        let revision_count = self.ledger.attempts(&content.artifact_id);
        let previous_fingerprint = self
            .ledger
            .last(&content.artifact_id)
            .map(|r| r.fingerprint);

        let result = self
            .gate
            .evaluate(content, revision_count, previous_fingerprint)
            .await?;
        self.ledger.append(result.clone())?;
        Ok(result)
    }

    /// Mint a single-use execution token for an approved verdict.
    ///
    /// Refused unless `can_proceed` holds: status APPROVED and zero blocking
    /// issues.
    pub fn authorize(&self, result: &GateResult) -> Result<ExecutionToken> {
        if !result.can_proceed() {
            return Err(GovernanceError::validation_failed(
                "gate verdict does not permit execution",
            )
            .with_detail("artifact_id", result.artifact_id.clone())
            .with_detail("status", result.status.to_string())
            .with_detail("blocking_issues", result.blocking_issues.len().to_string()));
        }

        let token = ExecutionToken::mint(result);
        info!(
            token_id = %token.token_id,
            artifact_id = %token.artifact_id,
            gate = %token.gate_name,
            "execution token minted"
        );
        Ok(token)
    }

    /// Run one destructive call behind the full check sequence.
    ///
    /// Order: token replay and binding, Batch Guard, Freeze Control,
    /// interceptors. The token is spent once every check clears, before the
    /// action runs; a failed action does not refund it. Replays are rejected
    /// without any side effect.
    pub async fn execute(
        &mut self,
        token: ExecutionToken,
        request: &ExecutionRequest,
        action: &dyn ExecutionAction,
    ) -> Result<ExecutionResult> {
        if self.consumed_tokens.contains(&token.token_id) {
            warn!(token_id = %token.token_id, "replayed execution token rejected");
            return Err(GovernanceError::permission_denied(
                "execution token already consumed",
            )
            .with_detail("token_id", token.token_id.clone()));
        }

        if token.artifact_id != request.artifact_id || token.fingerprint != request.fingerprint {
            return Err(GovernanceError::permission_denied(
                "execution token was not minted for this content version",
            )
            .with_detail("token_id", token.token_id.clone())
            .with_detail("token_artifact", token.artifact_id.clone())
            .with_detail("request_artifact", request.artifact_id.clone())
            .with_detail("token_fingerprint", token.fingerprint.to_hex())
            .with_detail("request_fingerprint", request.fingerprint.to_hex()));
        }

        self.batch_guard
            .check_batch_limit(&request.items, request.batch_override)?;
        self.freeze.check_frozen(&request.action_class)?;

        for interceptor in &self.interceptors {
            if let InterceptDecision::Veto { reason } = interceptor.inspect(request) {
                warn!(
                    interceptor = interceptor.name(),
                    artifact_id = %request.artifact_id,
                    reason = %reason,
                    "execution vetoed by safety interceptor"
                );
                return Err(GovernanceError::auto_blocked("automated safety check vetoed execution")
                    .with_detail("interceptor", interceptor.name())
                    .with_detail("reason", reason));
            }
        }

        self.consumed_tokens.insert(token.token_id.clone());
        info!(token_id = %token.token_id, artifact_id = %token.artifact_id, "execution token consumed");

        let output = action.run(request).await?;
        Ok(ExecutionResult {
            token_id: token.token_id,
            artifact_id: request.artifact_id.clone(),
            action_class: request.action_class.clone(),
            output,
            executed_at: now(),
        })
    }

    /// Judgment history recorded by this boundary
    pub fn ledger(&self) -> &GateLedger {
        &self.ledger
    }

    /// The gate behind `submit`
    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Freeze flags guarding execution
    pub fn freeze(&self) -> &FreezeControl {
        &self.freeze
    }

    /// Mutable access for engaging or lifting freeze flags
    pub fn freeze_mut(&mut self) -> &mut FreezeControl {
        &mut self.freeze
    }

    /// The batch throttle guarding execution
    pub fn batch_guard(&self) -> &BatchGuard {
        &self.batch_guard
    }
}

impl fmt::Debug for LayerBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBoundary")
            .field("gate", &self.gate)
            .field("verdicts", &self.ledger.len())
            .field("interceptors", &self.interceptors.len())
            .field("consumed_tokens", &self.consumed_tokens.len())
            .finish()
    }
}
