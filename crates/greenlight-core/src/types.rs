//! Core types for Greenlight
//!
//! This module defines the fundamental types shared across the pipeline:
//! - Pipeline stages
//! - Timestamps
//! - Content fingerprints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The layer of the pipeline an artifact currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Generation,
    Validation,
    Execution,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Generation => write!(f, "generation"),
            PipelineStage::Validation => write!(f, "validation"),
            PipelineStage::Execution => write!(f, "execution"),
        }
    }
}

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Create a timestamp for the current moment
pub fn now() -> Timestamp {
    Utc::now()
}

/// BLAKE3 content fingerprint
///
/// Derived from an artifact's body (or a rules document) and used for
/// idempotence, token binding, and revision chaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn new(bytes: [u8; 32]) -> Self { Self(bytes) }
    pub fn empty() -> Self { Self([0u8; 32]) }
    pub fn to_hex(&self) -> String { hex::encode(self.0) }
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Fingerprint of arbitrary content bytes
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        blake3::hash(content.as_ref()).into()
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
