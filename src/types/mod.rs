//! Core types for Kanagi

mod evidence;
mod phase;
mod reason;
mod session;
mod trace;

pub use evidence::{EvidenceTally, KeywordEvidence, PatternHit, Role, TokenRole};
pub use phase::{Dominant, Form, PhaseDescriptor};
pub use reason::ReasonCode;
pub use session::{Contradiction, Fermentation, FermentationState, LoopResult, SessionSnapshot, Spiral};
pub use trace::{CenterProcess, ElementalLedger, Observation, ReasoningTrace, TraceDraft, TraceMeta};
