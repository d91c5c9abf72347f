//! Phase descriptor and the symbolic form derived from it

use serde::{Deserialize, Serialize};

/// Independent phase flags for one turn.
///
/// The flags are NOT mutually exclusive: `center` can be true together with
/// any of the others. `center` never clears the other flags; it only decides
/// routing (see [`PhaseDescriptor::dominant`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    pub rise: bool,
    pub fall: bool,
    pub open: bool,
    pub close: bool,
    pub center: bool,
}

/// Routing decision, computed separately from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dominant {
    Center,
    Rise,
    Fall,
    Balanced,
}

impl PhaseDescriptor {
    /// All flags cleared (fallback)
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Center dominates; otherwise the polarity decides.
    pub fn dominant(&self) -> Dominant {
        if self.center {
            Dominant::Center
        } else if self.rise {
            Dominant::Rise
        } else if self.fall {
            Dominant::Fall
        } else {
            Dominant::Balanced
        }
    }
}

/// Symbolic form of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Form {
    /// Converging on the center
    Well,
    /// Outward, fire-led
    Line,
    /// Inward, water-led
    Dot,
    /// Unresolved, circling (also the fallback form)
    Circle,
}

impl Form {
    pub fn from_phase(phase: &PhaseDescriptor) -> Self {
        match phase.dominant() {
            Dominant::Center => Form::Well,
            Dominant::Rise => Form::Line,
            Dominant::Fall => Form::Dot,
            Dominant::Balanced => Form::Circle,
        }
    }

    /// Glyph for terminal display
    pub fn glyph(&self) -> &'static str {
        match self {
            Form::Well => "◎",
            Form::Line => "│",
            Form::Dot => "・",
            Form::Circle => "○",
        }
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Form::Well => "WELL",
            Form::Line => "LINE",
            Form::Dot => "DOT",
            Form::Circle => "CIRCLE",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_dominates_without_clearing() {
        let phase = PhaseDescriptor {
            rise: true,
            fall: false,
            open: true,
            close: false,
            center: true,
        };
        assert_eq!(phase.dominant(), Dominant::Center);
        assert_eq!(Form::from_phase(&phase), Form::Well);
        assert!(phase.rise && phase.open);
    }

    #[test]
    fn test_polar_forms() {
        let rise = PhaseDescriptor { rise: true, ..Default::default() };
        let fall = PhaseDescriptor { fall: true, ..Default::default() };
        assert_eq!(Form::from_phase(&rise), Form::Line);
        assert_eq!(Form::from_phase(&fall), Form::Dot);
        assert_eq!(Form::from_phase(&PhaseDescriptor::cleared()), Form::Circle);
    }

    #[test]
    fn test_form_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Form::Circle).unwrap(), "\"CIRCLE\"");
        assert_eq!(Form::Well.to_string(), "WELL");
    }
}
