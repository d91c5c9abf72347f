//! Elemental classifier: fuses all extractor evidence by summation
//!
//! No source overrides another. Every non-zero contribution leaves at least
//! one provenance tag.

use crate::types::{EvidenceTally, KeywordEvidence, PatternHit, Role, TokenRole};

/// Provenance tag for the water default
pub const DEFAULT_WATER_TAG: &str = "default:water";

/// Result of fusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fusion {
    pub tally: EvidenceTally,
    /// Silence resolved to water
    pub water_defaulted: bool,
}

#[derive(Debug, Default)]
pub struct ElementalClassifier;

impl ElementalClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Sum keyword, pattern and role evidence into one tally.
    ///
    /// Non-empty text with no fire and no water resolves to `water = 1`.
    pub fn fuse(
        &self,
        text: &str,
        keywords: &KeywordEvidence,
        hits: &[PatternHit],
        roles: &[TokenRole],
    ) -> Fusion {
        let mut tally = EvidenceTally::default();

        // keyword source
        tally.fire += keywords.fire;
        tally.water += keywords.water;
        tally.center += keywords.center;
        tally.detected_by.extend(keywords.tags.iter().cloned());
        for (element, count) in [
            ("fire", keywords.fire),
            ("water", keywords.water),
            ("center", keywords.center),
        ] {
            if count > 0 {
                tally.detected_by.push(format!("keyword:{}*{}", element, count));
            }
        }

        // pattern source: energies sum first, then round once
        let (fire_energy, water_energy) = hits
            .iter()
            .fold((0.0_f64, 0.0_f64), |(f, w), hit| (f + hit.fire_energy, w + hit.water_energy));
        let pattern_fire = fire_energy.round().max(0.0) as u32;
        let pattern_water = water_energy.round().max(0.0) as u32;
        tally.fire += pattern_fire;
        tally.water += pattern_water;
        for hit in hits.iter().filter(|h| h.fire_energy > 0.0 || h.water_energy > 0.0) {
            tally.detected_by.push(format!("pattern:{}", hit.pattern_id));
        }
        if pattern_fire > 0 {
            tally.detected_by.push(format!("pattern:fire*{}", pattern_fire));
        }
        if pattern_water > 0 {
            tally.detected_by.push(format!("pattern:water*{}", pattern_water));
        }

        // role source
        for token in roles {
            match token.role {
                Role::Actor => tally.fire += 1,
                Role::Receiver => tally.water += 1,
                Role::Other => continue,
            }
            tally
                .detected_by
                .push(format!("role:{}:{}", token.role.as_str(), token.token));
        }

        let water_defaulted = !text.trim().is_empty() && tally.fire == 0 && tally.water == 0;
        if water_defaulted {
            tally.water = 1;
            tally.detected_by.push(DEFAULT_WATER_TAG.to_string());
        }

        Fusion {
            tally,
            water_defaulted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(fire: u32, water: u32, center: u32) -> KeywordEvidence {
        KeywordEvidence {
            fire,
            water,
            center,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_silence_defaults_to_water() {
        let fusion = ElementalClassifier::new().fuse("123456", &keywords(0, 0, 0), &[], &[]);
        assert!(fusion.water_defaulted);
        assert_eq!(fusion.tally.fire, 0);
        assert_eq!(fusion.tally.water, 1);
        assert_eq!(fusion.tally.detected_by, vec![DEFAULT_WATER_TAG.to_string()]);
    }

    #[test]
    fn test_center_only_still_defaults_water() {
        let fusion = ElementalClassifier::new().fuse("balance", &keywords(0, 0, 1), &[], &[]);
        assert_eq!(fusion.tally.water, 1);
        assert_eq!(fusion.tally.center, 1);
    }

    #[test]
    fn test_empty_text_does_not_default() {
        let fusion = ElementalClassifier::new().fuse("  ", &keywords(0, 0, 0), &[], &[]);
        assert!(!fusion.water_defaulted);
        assert_eq!(fusion.tally.water, 0);
    }

    #[test]
    fn test_sources_add_up() {
        let hits = vec![
            PatternHit { pattern_id: "P16:ヒ".into(), fire_energy: 2.0, water_energy: 0.0 },
            PatternHit { pattern_id: "P17:ミ".into(), fire_energy: 0.0, water_energy: 1.5 },
        ];
        let roles = vec![
            TokenRole::new("we", Role::Actor),
            TokenRole::new("them", Role::Receiver),
            TokenRole::new("and", Role::Other),
        ];
        let fusion = ElementalClassifier::new().fuse("x", &keywords(3, 1, 2), &hits, &roles);

        assert_eq!(fusion.tally.fire, 3 + 2 + 1);
        assert_eq!(fusion.tally.water, 1 + 2 + 1);
        assert_eq!(fusion.tally.center, 2);
        assert!(!fusion.water_defaulted);
    }

    #[test]
    fn test_every_contribution_is_tagged() {
        let hits = vec![PatternHit { pattern_id: "P02:ア".into(), fire_energy: 1.0, water_energy: 0.0 }];
        let roles = vec![TokenRole::new("them", Role::Receiver)];
        let fusion = ElementalClassifier::new().fuse("x", &keywords(2, 0, 1), &hits, &roles);

        // keyword fire, keyword center, pattern fire, role water
        let contributions = 4;
        assert!(fusion.tally.detected_by.len() >= contributions);
        assert!(fusion.tally.detected_by.iter().any(|t| t.starts_with("keyword:fire")));
        assert!(fusion.tally.detected_by.iter().any(|t| t.starts_with("keyword:center")));
        assert!(fusion.tally.detected_by.iter().any(|t| t.starts_with("pattern:")));
        assert!(fusion.tally.detected_by.iter().any(|t| t == "role:RECEIVER:them"));
    }
}
