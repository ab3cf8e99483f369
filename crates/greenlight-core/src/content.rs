//! Generated content contracts
//!
//! A [`GeneratedContent`] is the unit that moves between pipeline layers. The
//! artifact identifier is stable across revisions; the fingerprint is
//! re-derived from the body on every revision, so each gate attempt binds to
//! exactly one version of the content.

use serde::{Deserialize, Serialize};

use crate::types::{now, Fingerprint, PipelineStage, Timestamp};

/// An artifact produced by the Generation layer
///
/// Immutable once a gate verdict is attached; revisions produce a new value
/// with the same identifier and a new fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Stable logical identifier, shared by every revision of this artifact
    pub artifact_id: String,
    /// Pipeline layer that currently owns the artifact
    pub stage: PipelineStage,
    /// BLAKE3 fingerprint of the body
    pub fingerprint: Fingerprint,
    /// Artifact body (caption text, rendered template, etc.)
    pub body: String,
    /// When this version of the content was produced
    pub created_at: Timestamp,
}

impl GeneratedContent {
    /// Create a first-draft artifact with a fresh identifier
    pub fn draft(body: impl Into<String>) -> Self {
        Self::with_id(format!("art_{}", uuid::Uuid::new_v4()), body)
    }

    /// Create a first draft under a caller-chosen identifier
    pub fn with_id(artifact_id: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            artifact_id: artifact_id.into(),
            stage: PipelineStage::Generation,
            fingerprint: Fingerprint::of(&body),
            body,
            created_at: now(),
        }
    }

    /// Produce a revision: same logical artifact, new body, new fingerprint
    pub fn revised(&self, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            artifact_id: self.artifact_id.clone(),
            stage: PipelineStage::Generation,
            fingerprint: Fingerprint::of(&body),
            body,
            created_at: now(),
        }
    }
}
