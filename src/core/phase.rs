//! Phase resolver
//!
//! Resolution order:
//! 1. rise / fall / open / close: threshold comparisons on the tally
//! 2. center: integrity failure OR loop OR center evidence OR fire == water > tie
//! 3. spirit: center AND center evidence >= SPIRIT_EVIDENCE_MIN
//!
//! center is computed last and never clears the polarity flags.

use crate::types::{EvidenceTally, PhaseDescriptor, ReasonCode};
use crate::{CLOSE_THRESHOLD, OPEN_THRESHOLD, SPIRIT_EVIDENCE_MIN, TIE_THRESHOLD};

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseResolution {
    pub phase: PhaseDescriptor,
    /// Center triggers that fired, in resolution order
    pub triggers: Vec<ReasonCode>,
    /// `Some(1)` when the spirit signal is raised
    pub spirit: Option<u32>,
}

#[derive(Debug, Default)]
pub struct PhaseResolver;

impl PhaseResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        tally: &EvidenceTally,
        integrity_verified: bool,
        loop_detected: bool,
    ) -> PhaseResolution {
        let (fire, water) = (tally.fire, tally.water);

        let mut triggers = Vec::new();
        if !integrity_verified {
            triggers.push(ReasonCode::K003_INTEGRITY_VIOLATION);
        }
        if loop_detected {
            triggers.push(ReasonCode::K003_LOOP_DETECTED);
        }
        if tally.center > 0 {
            triggers.push(ReasonCode::K003_CENTER_EVIDENCE);
        }
        if fire == water && fire > TIE_THRESHOLD {
            triggers.push(ReasonCode::K003_POLARITY_TIE);
        }

        let phase = PhaseDescriptor {
            rise: fire > water,
            fall: water > fire,
            open: fire > OPEN_THRESHOLD,
            close: water > CLOSE_THRESHOLD,
            center: !triggers.is_empty(),
        };

        let spirit = (phase.center && tally.center >= SPIRIT_EVIDENCE_MIN).then_some(1);

        PhaseResolution {
            phase,
            triggers,
            spirit,
        }
    }
}
