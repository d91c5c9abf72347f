//! Loop detection over a bounded per-session history

use std::collections::VecDeque;
use std::time::Duration;

use crate::core::store::SessionStore;
use crate::error::ReasonError;
use crate::types::{LoopResult, Role, TokenRole};
use crate::{LOOP_HISTORY_LIMIT, LOOP_REPEAT_THRESHOLD};

/// Reports whether a session is repeating itself.
///
/// Implementations keep their own session-scoped history and update it on
/// every `detect` call. `loop_detected` stays true for as long as the
/// repetition continues.
pub trait LoopDetector: Send + Sync {
    fn detect(
        &self,
        session_id: &str,
        input: &str,
        roles: &[TokenRole],
    ) -> Result<LoopResult, ReasonError>;

    /// Drop the history of one session
    fn forget(&self, _session_id: &str) -> Result<(), ReasonError> {
        Ok(())
    }

    /// Drop histories idle for at least `ttl`
    fn evict_idle(&self, _ttl: Duration) -> Result<usize, ReasonError> {
        Ok(0)
    }
}

/// Detects consecutive repeats of the same (input, role signature) pair
#[derive(Debug)]
pub struct HistoryLoopDetector {
    history: SessionStore<VecDeque<String>>,
    limit: usize,
    threshold: u32,
}

impl Default for HistoryLoopDetector {
    fn default() -> Self {
        Self::new(LOOP_HISTORY_LIMIT, LOOP_REPEAT_THRESHOLD)
    }
}

impl HistoryLoopDetector {
    /// `limit` entries are kept per session; a loop is reported once the
    /// same turn occurs `threshold` times in a row.
    pub fn new(limit: usize, threshold: u32) -> Self {
        Self {
            history: SessionStore::new("loop history"),
            limit: limit.max(1),
            threshold,
        }
    }

    /// Normalized input plus the role sequence
    fn signature(input: &str, roles: &[TokenRole]) -> String {
        let text = input
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let roles: String = roles
            .iter()
            .map(|r| match r.role {
                Role::Actor => 'A',
                Role::Receiver => 'R',
                Role::Other => '-',
            })
            .collect();
        format!("{}|{}", text, roles)
    }
}

impl LoopDetector for HistoryLoopDetector {
    fn detect(
        &self,
        session_id: &str,
        input: &str,
        roles: &[TokenRole],
    ) -> Result<LoopResult, ReasonError> {
        let signature = Self::signature(input, roles);
        let limit = self.limit;

        let run = self.history.update(session_id, |slot| {
            let history = slot.get_or_insert_with(VecDeque::new);
            history.push_back(signature);
            while history.len() > limit {
                history.pop_front();
            }

            let latest = history.back();
            history
                .iter()
                .rev()
                .take_while(|entry| Some(*entry) == latest)
                .count() as u32
        })?;

        let loop_detected = run >= self.threshold;
        Ok(LoopResult {
            loop_detected,
            count: if loop_detected { run - 1 } else { 0 },
        })
    }

    fn forget(&self, session_id: &str) -> Result<(), ReasonError> {
        self.history.remove(session_id).map(|_| ())
    }

    fn evict_idle(&self, ttl: Duration) -> Result<usize, ReasonError> {
        self.history.evict_idle(ttl)
    }
}
