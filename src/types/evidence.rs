//! Elemental evidence produced by the extractors and fused by the classifier

use serde::{Deserialize, Serialize};

use crate::FALLBACK_TAG;

/// Keyword extractor output: element counts plus one tag per hit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEvidence {
    pub fire: u32,
    pub water: u32,
    pub center: u32,
    pub tags: Vec<String>,
}

/// One phonetic pattern hit with its movement energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternHit {
    /// Pattern identifier, e.g. `P01:ホ`
    pub pattern_id: String,
    pub fire_energy: f64,
    pub water_energy: f64,
}

/// Semantic role of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Subject-like, acts outward (fire side)
    Actor,
    /// Object-like, receives (water side)
    Receiver,
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Actor => "ACTOR",
            Role::Receiver => "RECEIVER",
            Role::Other => "OTHER",
        }
    }
}

/// A token with its assigned role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRole {
    pub token: String,
    pub role: Role,
}

impl TokenRole {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }
}

/// Fused per-turn tally.
///
/// Every non-zero fire/water/center contribution has at least one entry in
/// `detected_by`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTally {
    pub fire: u32,
    pub water: u32,
    pub center: u32,
    /// Provenance tags, in extractor order
    pub detected_by: Vec<String>,
}

impl EvidenceTally {
    /// Neutral 1/1 tally used by the fallback trace
    pub fn neutral_fallback() -> Self {
        Self {
            fire: 1,
            water: 1,
            center: 0,
            detected_by: vec![FALLBACK_TAG.to_string()],
        }
    }

    /// |fire - water|
    pub fn polarity_gap(&self) -> u32 {
        self.fire.abs_diff(self.water)
    }
}
