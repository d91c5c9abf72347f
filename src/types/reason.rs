//! Reason codes explaining why a turn looks the way it does
//! Grouped K0xx by pipeline stage

use serde::{Deserialize, Serialize};

/// Reason codes attached to every trace, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // K001: Input assembly
    // =========================================================================
    /// Prior fact seed injected ahead of the input
    K001_SPIRAL_INJECTED,
    /// Fermentation summary injected (overrides the prior fact)
    K001_FERMENTATION_INJECTED,

    // =========================================================================
    // K002: Classification
    // =========================================================================
    /// No fire/water evidence, water defaulted to 1
    K002_DEFAULT_WATER,

    // =========================================================================
    // K003: Center triggers
    // =========================================================================
    /// Frozen principles failed verification
    K003_INTEGRITY_VIOLATION,
    /// Session is repeating itself
    K003_LOOP_DETECTED,
    /// Center keywords present
    K003_CENTER_EVIDENCE,
    /// fire == water above the tie threshold
    K003_POLARITY_TIE,
    /// Center with strong center evidence
    K003_SPIRIT_SIGNAL,

    // =========================================================================
    // K004: Fermentation lifecycle
    // =========================================================================
    K004_FERMENTATION_STARTED,
    K004_FERMENTATION_CONTINUED,
    K004_FERMENTATION_RELEASED,

    // =========================================================================
    // K005: Failures
    // =========================================================================
    /// Contradiction generator failed, no new contradiction
    K005_GENERATION_FAILED,
    /// Pipeline failed, fallback trace returned
    K005_PIPELINE_FALLBACK,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::K001_SPIRAL_INJECTED => "K001_SPIRAL_INJECTED",
            Self::K001_FERMENTATION_INJECTED => "K001_FERMENTATION_INJECTED",
            Self::K002_DEFAULT_WATER => "K002_DEFAULT_WATER",
            Self::K003_INTEGRITY_VIOLATION => "K003_INTEGRITY_VIOLATION",
            Self::K003_LOOP_DETECTED => "K003_LOOP_DETECTED",
            Self::K003_CENTER_EVIDENCE => "K003_CENTER_EVIDENCE",
            Self::K003_POLARITY_TIE => "K003_POLARITY_TIE",
            Self::K003_SPIRIT_SIGNAL => "K003_SPIRIT_SIGNAL",
            Self::K004_FERMENTATION_STARTED => "K004_FERMENTATION_STARTED",
            Self::K004_FERMENTATION_CONTINUED => "K004_FERMENTATION_CONTINUED",
            Self::K004_FERMENTATION_RELEASED => "K004_FERMENTATION_RELEASED",
            Self::K005_GENERATION_FAILED => "K005_GENERATION_FAILED",
            Self::K005_PIPELINE_FALLBACK => "K005_PIPELINE_FALLBACK",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::K001_SPIRAL_INJECTED => "Prior fact re-injected",
            Self::K001_FERMENTATION_INJECTED => "Fermentation context re-injected",
            Self::K002_DEFAULT_WATER => "Silence defaults to water",
            Self::K003_INTEGRITY_VIOLATION => "Integrity check failed",
            Self::K003_LOOP_DETECTED => "Session is looping",
            Self::K003_CENTER_EVIDENCE => "Center evidence present",
            Self::K003_POLARITY_TIE => "Fire and water tied above threshold",
            Self::K003_SPIRIT_SIGNAL => "Spirit signal raised",
            Self::K004_FERMENTATION_STARTED => "Fermentation started",
            Self::K004_FERMENTATION_CONTINUED => "Fermentation continuing",
            Self::K004_FERMENTATION_RELEASED => "Fermentation released",
            Self::K005_GENERATION_FAILED => "Contradiction generation failed",
            Self::K005_PIPELINE_FALLBACK => "Fell back to circular state",
        }
    }

    /// True for the codes that force the center flag
    pub fn is_center_trigger(&self) -> bool {
        matches!(
            self,
            Self::K003_INTEGRITY_VIOLATION
                | Self::K003_LOOP_DETECTED
                | Self::K003_CENTER_EVIDENCE
                | Self::K003_POLARITY_TIE
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
