//! Per-session state carried across turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spiral recursion state: the distilled observation of the previous turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spiral {
    pub depth: u32,
    pub next_fact_seed: String,
}

/// thesis / antithesis / tension triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub thesis: String,
    pub antithesis: String,
    pub tension: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FermentationState {
    Fermenting,
}

/// Unresolved tension accumulated while a session stays in center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fermentation {
    pub contradictions: Vec<Contradiction>,
    pub started_at_depth: u32,
    pub started_at: DateTime<Utc>,
    /// Refreshed on every read
    pub elapsed_ms: u64,
    pub unresolved_energy: u32,
    pub state: FermentationState,
}

impl Fermentation {
    pub fn new(contradictions: Vec<Contradiction>, started_at_depth: u32, unresolved_energy: u32) -> Self {
        Self {
            contradictions,
            started_at_depth,
            started_at: Utc::now(),
            elapsed_ms: 0,
            unresolved_energy,
            state: FermentationState::Fermenting,
        }
    }

    /// Copy with `elapsed_ms` measured against `now`
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Self {
        let elapsed = (now - self.started_at).num_milliseconds().max(0) as u64;
        Self {
            elapsed_ms: elapsed,
            ..self.clone()
        }
    }
}

/// Loop detector verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopResult {
    pub loop_detected: bool,
    pub count: u32,
}

/// Stored state of one session, as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spiral: Option<Spiral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fermentation: Option<Fermentation>,
}
