//! Integrity of the frozen principles
//!
//! The principle table is hashed once and pinned. Every turn re-hashes it;
//! a mismatch does not abort the turn, it forces the center phase.

use sha2::{Digest, Sha256};

use crate::error::ReasonError;

/// Result of one integrity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub verified: bool,
    /// Hex digest observed during this check
    pub digest: String,
}

pub trait IntegrityVerifier: Send + Sync {
    fn verify(&self) -> IntegrityReport;
}

/// Principles the pipeline is built on
pub const FROZEN_PRINCIPLES: &[&str] = &[
    "fire rises and opens; water falls and closes",
    "the center holds both without choosing",
    "an observation is not a conclusion",
    "every observation leaves something unresolved",
    "contradictions are held, not dissolved",
    "each turn feeds the next as its premise",
];

/// SHA-256 pinned principle table
#[derive(Debug, Clone)]
pub struct FrozenPrinciples {
    principles: Vec<String>,
    pinned: [u8; 32],
}

impl Default for FrozenPrinciples {
    fn default() -> Self {
        Self::new()
    }
}

impl FrozenPrinciples {
    /// Freeze the built-in table, pinning its current digest
    pub fn new() -> Self {
        let principles: Vec<String> = FROZEN_PRINCIPLES.iter().map(|p| p.to_string()).collect();
        let pinned = hash_principles(&principles);
        Self { principles, pinned }
    }

    /// Freeze the built-in table against an externally pinned hex digest
    pub fn with_pinned_hex(hex: &str) -> Result<Self, ReasonError> {
        let pinned = from_hex(hex)?;
        Ok(Self {
            pinned,
            ..Self::new()
        })
    }

    /// Freeze an arbitrary table against an arbitrary digest
    pub fn with_principles(principles: Vec<String>, pinned: [u8; 32]) -> Self {
        Self { principles, pinned }
    }

    /// Hex digest of the built-in table
    pub fn builtin_digest_hex() -> String {
        to_hex(&Self::new().pinned)
    }

    pub fn principles(&self) -> &[String] {
        &self.principles
    }
}

impl IntegrityVerifier for FrozenPrinciples {
    fn verify(&self) -> IntegrityReport {
        let digest = hash_principles(&self.principles);
        IntegrityReport {
            verified: digest == self.pinned,
            digest: to_hex(&digest),
        }
    }
}

/// Hash principles in order, zero-separated
pub fn hash_principles(principles: &[String]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for principle in principles {
        hasher.update(principle.as_bytes());
        hasher.update([0u8]);
    }
    hasher.finalize().into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(hex: &str) -> Result<[u8; 32], ReasonError> {
    let hex = hex.trim();
    if hex.len() != 64 || !hex.is_ascii() {
        return Err(ReasonError::Config(format!(
            "integrity digest must be 64 hex chars, got {}",
            hex.len()
        )));
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| ReasonError::Config(format!("invalid integrity digest: {}", e)))?;
    }
    Ok(out)
}
