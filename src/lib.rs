//! Kanagi: symbolic fire/water reasoning pipeline
//!
//! One utterance in, one `ReasoningTrace` out. Evidence extractors feed the
//! elemental classifier, the phase resolver decides rise/fall/open/close/center,
//! and the per-session spiral and fermentation stores carry state across turns.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::ReasonerConfig;
pub use error::{GenerationError, ReasonError};

// =============================================================================
// PHASE THRESHOLDS
// =============================================================================

/// fire above this opens the phase
pub const OPEN_THRESHOLD: u32 = 2;

/// water above this closes the phase
pub const CLOSE_THRESHOLD: u32 = 2;

/// fire == water above this is an unresolved polarity tie (forces center)
pub const TIE_THRESHOLD: u32 = 2;

/// Minimum center evidence for the spirit signal
pub const SPIRIT_EVIDENCE_MIN: u32 = 2;

// =============================================================================
// SESSION STATE
// =============================================================================

/// Loop history entries kept per session
pub const LOOP_HISTORY_LIMIT: usize = 8;

/// Consecutive identical turns before a loop is reported
pub const LOOP_REPEAT_THRESHOLD: u32 = 2;

/// Maximum characters carried forward as the next fact seed
pub const FACT_SEED_MAX_CHARS: usize = 480;

/// Idle sessions are evicted after this many seconds
pub const SESSION_TTL_SECS: u64 = 3600;

/// How often the server sweeps idle sessions
pub const SWEEP_INTERVAL_SECS: u64 = 60;

// =============================================================================
// FALLBACK
// =============================================================================

/// Observation used when a turn falls back to the circular state
pub const FALLBACK_DESCRIPTION: &str =
    "Reasoning fell back to the circular state. Contradictions are held and the turn keeps circling.";

/// Unresolved point attached to every fallback observation
pub const FALLBACK_UNRESOLVED: &str =
    "The turn was interrupted by an internal failure; the circular state is maintained.";

/// Provenance tag of the neutral fallback tally
pub const FALLBACK_TAG: &str = "ERROR_FALLBACK";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
