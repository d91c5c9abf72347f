//! Spiral recursion: each turn's observation becomes the next turn's premise
//!
//! Injection runs before any extractor; feedback runs after composition.

use std::time::Duration;

use crate::core::store::SessionStore;
use crate::error::ReasonError;
use crate::types::{Fermentation, ReasonCode, Spiral};

pub const PRIOR_FACT_LABEL: &str = "[PRIOR FACT]";
pub const FERMENTING_LABEL: &str = "[FERMENTING]";
pub const CURRENT_LABEL: &str = "[CURRENT PHENOMENON]";

/// Per-session spiral state
#[derive(Debug)]
pub struct SpiralStore {
    spirals: SessionStore<Spiral>,
}

impl Default for SpiralStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiralStore {
    pub fn new() -> Self {
        Self {
            spirals: SessionStore::new("spiral"),
        }
    }

    pub fn get(&self, session_id: &str) -> Result<Option<Spiral>, ReasonError> {
        self.spirals.get(session_id)
    }

    pub fn set(&self, session_id: &str, spiral: Spiral) -> Result<(), ReasonError> {
        self.spirals.set(session_id, spiral)
    }

    pub fn remove(&self, session_id: &str) -> Result<Option<Spiral>, ReasonError> {
        self.spirals.remove(session_id)
    }

    pub fn evict_idle(&self, ttl: Duration) -> Result<usize, ReasonError> {
        self.spirals.evict_idle(ttl)
    }

    pub fn len(&self) -> usize {
        self.spirals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spirals.is_empty()
    }
}

/// Effective input for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub text: String,
    /// Depth read from the prior spiral (0 without one)
    pub depth: u32,
    pub reason: Option<ReasonCode>,
}

/// Build the effective input.
///
/// A fermentation summary replaces the prior-fact block for this turn.
pub fn inject(input: &str, prior: Option<&Spiral>, fermentation: Option<&Fermentation>) -> Injection {
    let depth = prior.map(|s| s.depth).unwrap_or(0);

    if let Some(ferment) = fermentation {
        return Injection {
            text: format!(
                "{} {} contradictions held for {}ms, unresolved energy {}\n{}\n{}",
                FERMENTING_LABEL,
                ferment.contradictions.len(),
                ferment.elapsed_ms,
                ferment.unresolved_energy,
                CURRENT_LABEL,
                input
            ),
            depth,
            reason: Some(ReasonCode::K001_FERMENTATION_INJECTED),
        };
    }

    match prior {
        Some(spiral) => Injection {
            text: format!(
                "{}\n{}\n{}\n{}",
                PRIOR_FACT_LABEL, spiral.next_fact_seed, CURRENT_LABEL, input
            ),
            depth,
            reason: Some(ReasonCode::K001_SPIRAL_INJECTED),
        },
        None => Injection {
            text: input.to_string(),
            depth,
            reason: None,
        },
    }
}

/// Whether feedback advances the depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPolicy {
    /// Normal turn: depth + 1
    Advance,
    /// Failed turn: depth stays where it was
    Hold,
}

/// Distill an observation into the next spiral
pub fn feedback(description: &str, depth: u32, policy: DepthPolicy, max_chars: usize) -> Spiral {
    let seed: String = description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect();

    let depth = match policy {
        DepthPolicy::Advance => depth.saturating_add(1),
        DepthPolicy::Hold => depth,
    };

    Spiral {
        depth,
        next_fact_seed: seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Contradiction;

    #[test]
    fn test_no_prior_keeps_input() {
        let injection = inject("hello", None, None);
        assert_eq!(injection.text, "hello");
        assert_eq!(injection.depth, 0);
        assert_eq!(injection.reason, None);
    }

    #[test]
    fn test_prior_fact_is_prepended() {
        let prior = Spiral {
            depth: 4,
            next_fact_seed: "seen before".to_string(),
        };
        let injection = inject("now", Some(&prior), None);
        assert_eq!(
            injection.text,
            "[PRIOR FACT]\nseen before\n[CURRENT PHENOMENON]\nnow"
        );
        assert_eq!(injection.depth, 4);
        assert_eq!(injection.reason, Some(ReasonCode::K001_SPIRAL_INJECTED));
        assert!(injection.text.ends_with("\nnow"));
    }

    #[test]
    fn test_fermentation_overrides_prior_fact() {
        let prior = Spiral {
            depth: 2,
            next_fact_seed: "seen before".to_string(),
        };
        let mut ferment = Fermentation::new(
            vec![Contradiction {
                thesis: "a".into(),
                antithesis: "b".into(),
                tension: 0.5,
            }],
            2,
            3,
        );
        ferment.elapsed_ms = 40;

        let injection = inject("now", Some(&prior), Some(&ferment));
        assert!(!injection.text.contains("seen before"));
        assert!(injection
            .text
            .starts_with("[FERMENTING] 1 contradictions held for 40ms, unresolved energy 3"));
        assert_eq!(injection.depth, 2);
        assert_eq!(injection.reason, Some(ReasonCode::K001_FERMENTATION_INJECTED));
        assert!(injection.text.ends_with("\nnow"));
    }

    #[test]
    fn test_feedback_advances() {
        let spiral = feedback("  a   distilled\nobservation ", 3, DepthPolicy::Advance, 100);
        assert_eq!(spiral.depth, 4);
        assert_eq!(spiral.next_fact_seed, "a distilled observation");
    }

    #[test]
    fn test_feedback_hold_keeps_depth() {
        let spiral = feedback("fallback", 3, DepthPolicy::Hold, 100);
        assert_eq!(spiral.depth, 3);
    }

    #[test]
    fn test_feedback_truncates_on_char_boundary() {
        let spiral = feedback("正中正中正中", 0, DepthPolicy::Advance, 4);
        assert_eq!(spiral.next_fact_seed, "正中正中");
    }

    #[test]
    fn test_store_roundtrip() {
        let store = SpiralStore::new();
        assert_eq!(store.get("s").unwrap(), None);
        store
            .set("s", Spiral { depth: 1, next_fact_seed: "x".into() })
            .unwrap();
        assert_eq!(store.get("s").unwrap().map(|s| s.depth), Some(1));
        assert_eq!(store.len(), 1);
        store.remove("s").unwrap();
        assert!(store.is_empty());
    }
}
