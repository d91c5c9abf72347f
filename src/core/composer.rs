//! Observation composer
//!
//! Describes what was seen; never concludes. The unresolved list is never
//! empty.

use crate::error::ReasonError;
use crate::types::{Observation, TraceDraft};

/// Unresolved point used when nothing else is left open
pub const HELD_OPEN: &str = "contradictions are held and keep turning";

pub trait ObservationComposer: Send + Sync {
    fn compose(&self, draft: &TraceDraft) -> Result<Observation, ReasonError>;
}

/// Default composer: describes the form, tally and held contradictions
#[derive(Debug, Default)]
pub struct CircleComposer;

impl CircleComposer {
    pub fn new() -> Self {
        Self
    }
}

impl ObservationComposer for CircleComposer {
    fn compose(&self, draft: &TraceDraft) -> Result<Observation, ReasonError> {
        // Plain vocabulary only: the description is re-read as next turn's premise
        let mut description = format!(
            "Observed {} at depth {} ({}:{}:{})",
            draft.form, draft.depth, draft.tally.fire, draft.tally.water, draft.tally.center
        );
        if !draft.contradictions.is_empty() {
            description.push_str(&format!(
                "; holding {} contradiction(s)",
                draft.contradictions.len()
            ));
        }
        if let Some(ferment) = &draft.fermentation {
            description.push_str(&format!(
                "; fermenting since depth {}",
                ferment.started_at_depth
            ));
        }

        let mut unresolved: Vec<String> = draft
            .contradictions
            .iter()
            .map(|c| format!("{} ⇄ {}", c.thesis, c.antithesis))
            .collect();
        if draft.loop_result.loop_detected {
            unresolved.push(format!(
                "the same turn has returned {} time(s)",
                draft.loop_result.count
            ));
        }
        if unresolved.is_empty() {
            unresolved.push(HELD_OPEN.to_string());
        }

        Ok(Observation {
            description,
            unresolved,
        })
    }
}
