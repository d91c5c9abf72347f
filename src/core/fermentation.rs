//! Fermentation lifecycle: ABSENT -> FERMENTING -> ABSENT
//!
//! - ABSENT -> FERMENTING: center turn, no record yet
//! - FERMENTING stays while turns remain in center
//! - FERMENTING -> ABSENT: first non-center turn; the record is discarded

use std::time::Duration;

use chrono::Utc;

use crate::core::store::SessionStore;
use crate::error::ReasonError;
use crate::types::{Contradiction, EvidenceTally, Fermentation, PhaseDescriptor, ReasonCode};

/// What a turn did to the fermentation record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FermentationTransition {
    Started,
    Continued,
    Released,
    Idle,
}

impl FermentationTransition {
    /// A record exists after this transition
    pub fn is_fermenting(&self) -> bool {
        matches!(self, Self::Started | Self::Continued)
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Started => Some(ReasonCode::K004_FERMENTATION_STARTED),
            Self::Continued => Some(ReasonCode::K004_FERMENTATION_CONTINUED),
            Self::Released => Some(ReasonCode::K004_FERMENTATION_RELEASED),
            Self::Idle => None,
        }
    }
}

#[derive(Debug)]
pub struct FermentationStore {
    records: SessionStore<Fermentation>,
}

impl Default for FermentationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FermentationStore {
    pub fn new() -> Self {
        Self {
            records: SessionStore::new("fermentation"),
        }
    }

    /// Current record with `elapsed_ms` measured now
    pub fn get(&self, session_id: &str) -> Result<Option<Fermentation>, ReasonError> {
        let now = Utc::now();
        Ok(self
            .records
            .get(session_id)?
            .map(|record| record.snapshot_at(now)))
    }

    /// Apply this turn's phase to the record.
    ///
    /// On start the record is seeded with `seed`, `unresolved_energy` is
    /// `|fire - water| + center` and `started_at_depth` is `depth + 1`.
    pub fn transition(
        &self,
        session_id: &str,
        phase: &PhaseDescriptor,
        tally: &EvidenceTally,
        depth: u32,
        seed: Vec<Contradiction>,
    ) -> Result<FermentationTransition, ReasonError> {
        self.records.update(session_id, |slot| match (phase.center, slot.is_some()) {
            (true, false) => {
                *slot = Some(Fermentation::new(
                    seed,
                    depth.saturating_add(1),
                    tally.polarity_gap() + tally.center,
                ));
                FermentationTransition::Started
            }
            (true, true) => FermentationTransition::Continued,
            (false, true) => {
                *slot = None;
                FermentationTransition::Released
            }
            (false, false) => FermentationTransition::Idle,
        })
    }

    /// Add a contradiction to an active record; no-op without one
    pub fn append(&self, session_id: &str, contradiction: Contradiction) -> Result<bool, ReasonError> {
        self.records.update(session_id, |slot| match slot {
            Some(record) => {
                record.contradictions.push(contradiction);
                true
            }
            None => false,
        })
    }

    pub fn remove(&self, session_id: &str) -> Result<Option<Fermentation>, ReasonError> {
        self.records.remove(session_id)
    }

    pub fn evict_idle(&self, ttl: Duration) -> Result<usize, ReasonError> {
        self.records.evict_idle(ttl)
    }
}
