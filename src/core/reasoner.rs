//! Fusion reasoner: the orchestrator of one reasoning turn
//!
//! Fixed order per turn:
//! integrity -> injection -> extraction + fusion -> loop detection ->
//! phase resolution -> fermentation transition -> contradiction generation ->
//! draft assembly -> observation -> spiral feedback -> persistence.
//!
//! `reason` never fails. Integrity failure forces center; generator failure
//! drops the new contradiction; anything else yields the fallback trace with
//! the spiral depth held at its pre-call value.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::ReasonerConfig;
use crate::core::classifier::ElementalClassifier;
use crate::core::composer::{CircleComposer, ObservationComposer};
use crate::core::fermentation::{FermentationStore, FermentationTransition};
use crate::core::generator::{ContradictionGenerator, ContrastContradictionGenerator};
use crate::core::integrity::{FrozenPrinciples, IntegrityVerifier};
use crate::core::keywords::{KeywordExtractor, KeywordMatcher};
use crate::core::loops::{HistoryLoopDetector, LoopDetector};
use crate::core::patterns::{PatternExtractor, SoundPatternMatcher};
use crate::core::phase::PhaseResolver;
use crate::core::roles::{ParticleRoleAssigner, RoleAssigner};
use crate::core::spiral::{self, DepthPolicy, SpiralStore};
use crate::core::store::SessionLocks;
use crate::error::ReasonError;
use crate::types::{
    CenterProcess, ElementalLedger, Form, LoopResult, ReasonCode, ReasoningTrace, SessionSnapshot,
    TraceDraft,
};
use crate::FALLBACK_DESCRIPTION;

/// The external collaborators of the pipeline
pub struct Collaborators {
    pub keywords: Box<dyn KeywordExtractor>,
    pub patterns: Box<dyn PatternExtractor>,
    pub roles: Box<dyn RoleAssigner>,
    pub loops: Box<dyn LoopDetector>,
    pub generator: Box<dyn ContradictionGenerator>,
    pub composer: Box<dyn ObservationComposer>,
    pub integrity: Box<dyn IntegrityVerifier>,
}

impl Collaborators {
    /// Built-in collaborators configured from `config`
    pub fn defaults(config: &ReasonerConfig) -> Result<Self, ReasonError> {
        let integrity = match &config.integrity_digest {
            Some(hex) => FrozenPrinciples::with_pinned_hex(hex)?,
            None => FrozenPrinciples::new(),
        };
        Ok(Self {
            keywords: Box::new(KeywordMatcher::new()),
            patterns: Box::new(SoundPatternMatcher::new()),
            roles: Box::new(ParticleRoleAssigner::new()),
            loops: Box::new(HistoryLoopDetector::new(
                config.loop_history_limit,
                config.loop_repeat_threshold,
            )),
            generator: Box::new(ContrastContradictionGenerator::new()),
            composer: Box::new(CircleComposer::new()),
            integrity: Box::new(integrity),
        })
    }
}

pub struct FusionReasoner {
    collaborators: Collaborators,
    classifier: ElementalClassifier,
    resolver: PhaseResolver,
    spirals: SpiralStore,
    fermentations: FermentationStore,
    locks: SessionLocks,
    config: ReasonerConfig,
}

impl FusionReasoner {
    /// Reasoner with the built-in collaborators
    pub fn new(config: ReasonerConfig) -> Result<Self, ReasonError> {
        config.validate()?;
        let collaborators = Collaborators::defaults(&config)?;
        Ok(Self::with_collaborators(config, collaborators))
    }

    pub fn with_collaborators(config: ReasonerConfig, collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            classifier: ElementalClassifier::new(),
            resolver: PhaseResolver::new(),
            spirals: SpiralStore::new(),
            fermentations: FermentationStore::new(),
            locks: SessionLocks::new(),
            config,
        }
    }

    pub fn with_keywords(mut self, keywords: impl KeywordExtractor + 'static) -> Self {
        self.collaborators.keywords = Box::new(keywords);
        self
    }

    pub fn with_patterns(mut self, patterns: impl PatternExtractor + 'static) -> Self {
        self.collaborators.patterns = Box::new(patterns);
        self
    }

    pub fn with_roles(mut self, roles: impl RoleAssigner + 'static) -> Self {
        self.collaborators.roles = Box::new(roles);
        self
    }

    pub fn with_loop_detector(mut self, loops: impl LoopDetector + 'static) -> Self {
        self.collaborators.loops = Box::new(loops);
        self
    }

    pub fn with_generator(mut self, generator: impl ContradictionGenerator + 'static) -> Self {
        self.collaborators.generator = Box::new(generator);
        self
    }

    pub fn with_composer(mut self, composer: impl ObservationComposer + 'static) -> Self {
        self.collaborators.composer = Box::new(composer);
        self
    }

    pub fn with_integrity(mut self, integrity: impl IntegrityVerifier + 'static) -> Self {
        self.collaborators.integrity = Box::new(integrity);
        self
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Reason over one utterance.
    ///
    /// Turns of the same session run one at a time, in submission order.
    /// Without a session id nothing is read from or written to the stores.
    pub async fn reason(&self, input: &str, session_id: Option<&str>) -> ReasoningTrace {
        let _turn = match session_id {
            Some(id) => Some(self.locks.acquire(id).await),
            None => None,
        };

        let prior_depth = match session_id {
            Some(id) => self
                .spirals
                .get(id)
                .ok()
                .flatten()
                .map(|s| s.depth)
                .unwrap_or(0),
            None => 0,
        };

        let outcome = AssertUnwindSafe(self.run_pipeline(input, session_id))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(trace)) => {
                info!(
                    session = session_id.unwrap_or("-"),
                    form = %trace.form,
                    fire = trace.tally.fire,
                    water = trace.tally.water,
                    center = trace.phase.center,
                    depth = trace.spiral.depth,
                    "turn reasoned"
                );
                trace
            }
            Ok(Err(e)) => {
                error!(
                    session = session_id.unwrap_or("-"),
                    error = %e,
                    "reasoning failed, falling back to circular state"
                );
                self.fallback(input, session_id, prior_depth)
            }
            Err(_) => {
                error!(
                    session = session_id.unwrap_or("-"),
                    "reasoning panicked, falling back to circular state"
                );
                self.fallback(input, session_id, prior_depth)
            }
        }
    }

    async fn run_pipeline(
        &self,
        input: &str,
        session_id: Option<&str>,
    ) -> Result<ReasoningTrace, ReasonError> {
        let c = &self.collaborators;
        let mut reasons = Vec::new();

        let integrity = c.integrity.verify();
        if !integrity.verified {
            error!(
                digest = %integrity.digest,
                "CRITICAL: frozen principles failed integrity check, forcing center"
            );
        }

        let (prior, fermentation) = match session_id {
            Some(id) => (self.spirals.get(id)?, self.fermentations.get(id)?),
            None => (None, None),
        };
        let injection = spiral::inject(input, prior.as_ref(), fermentation.as_ref());
        reasons.extend(injection.reason);
        let depth = injection.depth;
        debug!(depth, text = %injection.text, "effective input");

        let keywords = c.keywords.extract(&injection.text)?;
        let pattern_hits = c.patterns.extract(&injection.text)?;
        let roles = c.roles.assign(&injection.text)?;
        let fusion = self
            .classifier
            .fuse(&injection.text, &keywords, &pattern_hits, &roles);
        if fusion.water_defaulted {
            reasons.push(ReasonCode::K002_DEFAULT_WATER);
        }
        let tally = fusion.tally;
        debug!(evidence = ?tally.detected_by, "evidence fused");

        // loop signatures see the raw utterance, never the injected premise
        let loop_result = match session_id {
            Some(id) => c.loops.detect(id, input, &c.roles.assign(input)?)?,
            None => LoopResult::default(),
        };

        let resolution = self
            .resolver
            .resolve(&tally, integrity.verified, loop_result.loop_detected);
        reasons.extend(resolution.triggers.iter().copied());
        if resolution.spirit.is_some() {
            reasons.push(ReasonCode::K003_SPIRIT_SIGNAL);
        }
        let phase = resolution.phase;
        let form = Form::from_phase(&phase);

        let transition = match session_id {
            Some(id) => self
                .fermentations
                .transition(id, &phase, &tally, depth, Vec::new())?,
            None => FermentationTransition::Idle,
        };
        reasons.extend(transition.reason());

        // contradictions come from the utterance itself, never the injected premise
        let generated = match c.generator.generate(input).await {
            Ok(contradiction) => contradiction,
            Err(e) => {
                warn!(error = %e, "contradiction generation failed, continuing without");
                reasons.push(ReasonCode::K005_GENERATION_FAILED);
                None
            }
        };

        let (contradictions, fermentation) = match session_id {
            Some(id) if transition.is_fermenting() => {
                if let Some(contradiction) = generated {
                    self.fermentations.append(id, contradiction)?;
                }
                let record = self.fermentations.get(id)?;
                let held = record
                    .as_ref()
                    .map(|r| r.contradictions.clone())
                    .unwrap_or_default();
                (held, record)
            }
            _ => (generated.into_iter().collect(), None),
        };

        let center_process = phase.center.then(|| CenterProcess {
            triggers: resolution.triggers.clone(),
            fermenting: fermentation.is_some(),
        });

        let draft = TraceDraft {
            input: injection.text,
            ledger: ElementalLedger {
                fire: tally.fire,
                water: tally.water,
                spirit: resolution.spirit,
                roles,
                evidence: tally.detected_by.clone(),
            },
            tally,
            phase,
            form,
            pattern_hits,
            contradictions,
            center_process,
            loop_result,
            fermentation,
            reasons,
            depth,
        };

        let observation = c.composer.compose(&draft)?;
        if observation.unresolved.is_empty() {
            return Err(ReasonError::InvalidObservation);
        }

        let next = spiral::feedback(
            &observation.description,
            depth,
            DepthPolicy::Advance,
            self.config.fact_seed_max_chars,
        );
        if let Some(id) = session_id {
            self.spirals.set(id, next.clone())?;
        }

        Ok(draft.into_trace(observation, next))
    }

    /// Fallback trace; the stored spiral keeps its pre-call depth
    fn fallback(&self, input: &str, session_id: Option<&str>, prior_depth: u32) -> ReasoningTrace {
        let next = spiral::feedback(
            FALLBACK_DESCRIPTION,
            prior_depth,
            DepthPolicy::Hold,
            self.config.fact_seed_max_chars,
        );
        if let Some(id) = session_id {
            if let Err(e) = self.spirals.set(id, next.clone()) {
                error!(session = id, error = %e, "could not persist fallback spiral");
            }
        }
        ReasoningTrace::fallback(input, next, prior_depth)
    }

    /// Stored state of a session, `None` when nothing is stored
    pub fn session_snapshot(&self, session_id: &str) -> Result<Option<SessionSnapshot>, ReasonError> {
        let spiral = self.spirals.get(session_id)?;
        let fermentation = self.fermentations.get(session_id)?;
        if spiral.is_none() && fermentation.is_none() {
            return Ok(None);
        }
        Ok(Some(SessionSnapshot {
            session_id: session_id.to_string(),
            spiral,
            fermentation,
        }))
    }

    /// Close a session: drop spiral, fermentation, loop history and lock.
    /// Returns whether anything was stored.
    pub async fn evict_session(&self, session_id: &str) -> Result<bool, ReasonError> {
        let guard = self.locks.acquire(session_id).await;
        let spiral = self.spirals.remove(session_id)?;
        let fermentation = self.fermentations.remove(session_id)?;
        self.collaborators.loops.forget(session_id)?;
        drop(guard);
        self.locks.release(session_id);

        let existed = spiral.is_some() || fermentation.is_some();
        if existed {
            info!(session = session_id, "session evicted");
        }
        Ok(existed)
    }

    /// Drop everything idle for longer than the configured TTL.
    /// Returns the number of spirals evicted.
    pub fn evict_idle(&self) -> Result<usize, ReasonError> {
        let ttl = self.config.session_ttl();
        let evicted = self.spirals.evict_idle(ttl)?;
        self.fermentations.evict_idle(ttl)?;
        self.collaborators.loops.evict_idle(ttl)?;
        self.locks.sweep();
        if evicted > 0 {
            info!(evicted, "idle sessions evicted");
        }
        Ok(evicted)
    }

    /// Sessions with a stored spiral
    pub fn active_sessions(&self) -> usize {
        self.spirals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasoner() -> FusionReasoner {
        FusionReasoner::new(ReasonerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_default_stack_reasons() {
        let trace = reasoner().reason("The fire will rise and burn bright", None).await;
        assert_eq!(trace.form, Form::Line);
        assert!(trace.phase.rise && trace.phase.open);
        assert!(!trace.phase.center);
        assert!(trace.provisional);
        assert!(!trace.observation.unresolved.is_empty());
        assert_eq!(trace.spiral.depth, 1);
    }

    #[tokio::test]
    async fn test_sessionless_turn_stores_nothing() {
        let r = reasoner();
        r.reason("火と水の対立", None).await;
        assert_eq!(r.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_depth_advances_per_turn() {
        let r = reasoner();
        let first = r.reason("calm water", Some("s")).await;
        let second = r.reason("a rising flame", Some("s")).await;
        assert_eq!(first.spiral.depth, 1);
        assert_eq!(second.meta.spiral_depth, 1);
        assert_eq!(second.spiral.depth, 2);
        assert!(second.input.starts_with(spiral::PRIOR_FACT_LABEL));
        assert!(second.reasons.contains(&ReasonCode::K001_SPIRAL_INJECTED));
    }

    #[tokio::test]
    async fn test_repeat_input_goes_to_center() {
        let r = reasoner();
        r.reason("same question", Some("loop")).await;
        let second = r.reason("same question", Some("loop")).await;
        assert!(second.loop_result.loop_detected);
        assert!(second.phase.center);
        assert_eq!(second.form, Form::Well);
    }

    #[tokio::test]
    async fn test_evict_session() {
        let r = reasoner();
        r.reason("calm water", Some("s")).await;
        assert!(r.session_snapshot("s").unwrap().is_some());

        assert!(r.evict_session("s").await.unwrap());
        assert!(r.session_snapshot("s").unwrap().is_none());
        assert!(!r.evict_session("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_evict_idle_with_zero_ttl() {
        let config = ReasonerConfig {
            session_ttl_secs: 0,
            ..Default::default()
        };
        let r = FusionReasoner::new(config).unwrap();
        r.reason("calm water", Some("a")).await;
        r.reason("calm water", Some("b")).await;
        assert_eq!(r.evict_idle().unwrap(), 2);
        assert_eq!(r.active_sessions(), 0);
    }

    #[test]
    fn test_bad_pinned_digest_is_rejected() {
        let config = ReasonerConfig {
            integrity_digest: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(FusionReasoner::new(config).is_err());
    }
}
