//! The per-turn reasoning trace and its parts

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::types::{
    Contradiction, EvidenceTally, Fermentation, Form, LoopResult, PatternHit, PhaseDescriptor,
    ReasonCode, Spiral, TokenRole,
};
use crate::{FALLBACK_DESCRIPTION, FALLBACK_TAG, FALLBACK_UNRESOLVED};

/// Composed observation: never a conclusion, always something left open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub description: String,
    /// Non-empty
    pub unresolved: Vec<String>,
}

/// Marks a turn that went through the center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterProcess {
    /// What forced center, in resolution order
    pub triggers: Vec<ReasonCode>,
    /// A fermentation record is active for the session
    pub fermenting: bool,
}

/// Elemental ledger: the tally as bookkeeping, plus roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementalLedger {
    pub fire: u32,
    pub water: u32,
    /// Set to 1 only when center is backed by strong center evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spirit: Option<u32>,
    pub roles: Vec<TokenRole>,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMeta {
    pub provisional: bool,
    /// Depth this turn reasoned at (before feedback)
    pub spiral_depth: u32,
}

/// Output of one `reason` call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub timestamp: DateTime<Utc>,
    /// Text actually reasoned over (after spiral injection)
    pub input: String,
    pub tally: EvidenceTally,
    pub phase: PhaseDescriptor,
    pub form: Form,
    pub pattern_hits: Vec<PatternHit>,
    pub contradictions: Vec<Contradiction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_process: Option<CenterProcess>,
    pub observation: Observation,
    /// Spiral after feedback (what the next turn will see)
    pub spiral: Spiral,
    pub ledger: ElementalLedger,
    #[serde(rename = "loop")]
    pub loop_result: LoopResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fermentation: Option<Fermentation>,
    pub reasons: Vec<ReasonCode>,
    pub provisional: bool,
    pub meta: TraceMeta,
}

/// Everything but the observation and the fed-back spiral; what the
/// composer sees.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceDraft {
    pub input: String,
    pub tally: EvidenceTally,
    pub phase: PhaseDescriptor,
    pub form: Form,
    pub pattern_hits: Vec<PatternHit>,
    pub contradictions: Vec<Contradiction>,
    pub center_process: Option<CenterProcess>,
    pub ledger: ElementalLedger,
    pub loop_result: LoopResult,
    pub fermentation: Option<Fermentation>,
    pub reasons: Vec<ReasonCode>,
    /// Depth this turn reasons at
    pub depth: u32,
}

impl TraceDraft {
    pub fn into_trace(self, observation: Observation, spiral: Spiral) -> ReasoningTrace {
        ReasoningTrace {
            timestamp: Utc::now(),
            input: self.input,
            tally: self.tally,
            phase: self.phase,
            form: self.form,
            pattern_hits: self.pattern_hits,
            contradictions: self.contradictions,
            center_process: self.center_process,
            observation,
            spiral,
            ledger: self.ledger,
            loop_result: self.loop_result,
            fermentation: self.fermentation,
            reasons: self.reasons,
            provisional: true,
            meta: TraceMeta {
                provisional: true,
                spiral_depth: self.depth,
            },
        }
    }
}

impl ReasoningTrace {
    /// Fixed circular-state trace returned when a turn fails.
    ///
    /// Neutral 1/1 tally, cleared phase and loop, no contradictions, no
    /// fermentation.
    pub fn fallback(input: &str, spiral: Spiral, depth: u32) -> Self {
        let tally = EvidenceTally::neutral_fallback();
        Self {
            timestamp: Utc::now(),
            input: input.to_string(),
            ledger: ElementalLedger {
                fire: tally.fire,
                water: tally.water,
                spirit: None,
                roles: Vec::new(),
                evidence: vec![FALLBACK_TAG.to_string()],
            },
            tally,
            phase: PhaseDescriptor::cleared(),
            form: Form::Circle,
            pattern_hits: Vec::new(),
            contradictions: Vec::new(),
            center_process: None,
            observation: Observation {
                description: FALLBACK_DESCRIPTION.to_string(),
                unresolved: vec![FALLBACK_UNRESOLVED.to_string()],
            },
            spiral,
            loop_result: LoopResult::default(),
            fermentation: None,
            reasons: vec![ReasonCode::K005_PIPELINE_FALLBACK],
            provisional: true,
            meta: TraceMeta {
                provisional: true,
                spiral_depth: depth,
            },
        }
    }

    /// True when this trace is the fixed fallback
    pub fn is_fallback(&self) -> bool {
        self.reasons.contains(&ReasonCode::K005_PIPELINE_FALLBACK)
    }

    fn colored_form(&self) -> ColoredString {
        let label = format!("{} {}", self.form.glyph(), self.form);
        match self.form {
            Form::Well => label.cyan().bold(),
            Form::Line => label.red(),
            Form::Dot => label.blue(),
            Form::Circle => label.bright_black(),
        }
    }

    /// Set phase flags joined by `+`, or `-` when none are set
    pub fn phase_flags(&self) -> String {
        let flags = [
            ("rise", self.phase.rise),
            ("fall", self.phase.fall),
            ("open", self.phase.open),
            ("close", self.phase.close),
            ("center", self.phase.center),
        ];
        let on: Vec<&str> = flags
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect();
        if on.is_empty() {
            "-".to_string()
        } else {
            on.join("+")
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        format!(
            "{} fire={} water={} center={} | phase={} | depth={} | {}",
            self.colored_form(),
            self.tally.fire,
            self.tally.water,
            self.tally.center,
            self.phase_flags(),
            self.spiral.depth,
            self.observation.description.italic()
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "form={} | fire={} | water={} | center={} | phase={} | depth={} | loop={} | fermenting={}",
            self.form,
            self.tally.fire,
            self.tally.water,
            self.tally.center,
            self.phase_flags(),
            self.spiral.depth,
            self.loop_result.count,
            self.fermentation.is_some()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let spiral = Spiral {
            depth: 3,
            next_fact_seed: FALLBACK_DESCRIPTION.to_string(),
        };
        let trace = ReasoningTrace::fallback("boom", spiral, 3);

        assert!(trace.is_fallback());
        assert_eq!(trace.form, Form::Circle);
        assert_eq!((trace.tally.fire, trace.tally.water), (1, 1));
        assert_eq!(trace.tally.detected_by, vec![FALLBACK_TAG.to_string()]);
        assert_eq!(trace.phase, PhaseDescriptor::cleared());
        assert!(trace.contradictions.is_empty());
        assert!(!trace.loop_result.loop_detected);
        assert!(trace.fermentation.is_none());
        assert!(!trace.observation.unresolved.is_empty());
        assert_eq!(trace.spiral.depth, 3);
        assert!(trace.provisional);
    }

    #[test]
    fn test_fallback_json_shape() {
        let trace = ReasoningTrace::fallback("x", Spiral::default(), 0);
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["form"], "CIRCLE");
        assert_eq!(json["loop"]["loop_detected"], false);
        assert!(json.get("fermentation").is_none());
        assert!(json.get("center_process").is_none());
        assert_eq!(json["reasons"][0], "K005_PIPELINE_FALLBACK");
    }

    #[test]
    fn test_parseable_string() {
        let trace = ReasoningTrace::fallback("x", Spiral::default(), 0);
        assert_eq!(
            trace.to_parseable_string(),
            "form=CIRCLE | fire=1 | water=1 | center=0 | phase=- | depth=0 | loop=0 | fermenting=false"
        );
    }
}
