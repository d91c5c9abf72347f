//! Core pipeline for kanagi

pub mod store;
pub mod keywords;
pub mod patterns;
pub mod roles;
pub mod classifier;
pub mod phase;
pub mod loops;
pub mod integrity;
pub mod spiral;
pub mod fermentation;
pub mod generator;
pub mod composer;
pub mod reasoner;
pub mod api;

pub use store::{SessionLocks, SessionStore};
pub use keywords::{KeywordExtractor, KeywordMatcher};
pub use patterns::{PatternExtractor, SoundPatternMatcher};
pub use roles::{ParticleRoleAssigner, RoleAssigner};
pub use classifier::{ElementalClassifier, Fusion};
pub use phase::{PhaseResolution, PhaseResolver};
pub use loops::{HistoryLoopDetector, LoopDetector};
pub use integrity::{FrozenPrinciples, IntegrityReport, IntegrityVerifier};
pub use spiral::{DepthPolicy, Injection, SpiralStore};
pub use fermentation::{FermentationStore, FermentationTransition};
pub use generator::{ContradictionGenerator, ContrastContradictionGenerator};
pub use composer::{CircleComposer, ObservationComposer};
pub use reasoner::{Collaborators, FusionReasoner};
pub use api::{create_router, router, run_server, spawn_sweeper, sweep, AppState};
