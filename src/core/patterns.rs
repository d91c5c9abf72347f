//! Sound-pattern evidence from kana
//!
//! Each kana maps to a numbered pattern with rotational movements.
//! Outward movements carry fire energy, inward movements water energy;
//! right-hand rotation weighs double.

use crate::error::ReasonError;
use crate::types::PatternHit;

/// Converts text into pattern hits with movement energy
pub trait PatternExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<PatternHit>, ReasonError>;
}

/// Rotational movement of a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    LeftIn,
    LeftOut,
    RightIn,
    RightOut,
}

impl Movement {
    /// (fire, water) energy of one movement
    pub fn energy(&self) -> (f64, f64) {
        match self {
            Movement::LeftOut => (0.5, 0.0),
            Movement::RightOut => (1.0, 0.0),
            Movement::LeftIn => (0.0, 0.5),
            Movement::RightIn => (0.0, 1.0),
        }
    }
}

use self::Movement::{LeftIn, LeftOut, RightIn, RightOut};

/// (katakana, pattern number, movements)
const SOUND_TABLE: &[(char, u32, &[Movement])] = &[
    ('ホ', 1, &[LeftIn, RightOut]),
    ('ア', 2, &[RightOut]),
    ('イ', 3, &[LeftOut]),
    ('ウ', 4, &[LeftIn]),
    ('エ', 5, &[RightIn, RightOut]),
    ('オ', 6, &[RightIn]),
    ('カ', 7, &[RightOut, LeftOut]),
    ('サ', 8, &[LeftOut]),
    ('タ', 9, &[RightOut]),
    ('ナ', 10, &[LeftIn]),
    ('ハ', 11, &[RightOut]),
    ('マ', 12, &[RightIn]),
    ('ヤ', 13, &[LeftOut, RightIn]),
    ('ラ', 14, &[LeftIn, RightIn]),
    ('ワ', 15, &[RightIn]),
    ('ヒ', 16, &[RightOut, RightOut]),
    ('ミ', 17, &[LeftIn, RightIn]),
    ('ス', 18, &[LeftIn]),
    ('ン', 19, &[]),
];

/// Kana sound-pattern matcher
#[derive(Debug, Default)]
pub struct SoundPatternMatcher;

impl SoundPatternMatcher {
    /// Create new matcher
    pub fn new() -> Self {
        Self
    }

    /// Look up a single sound (hiragana is folded to katakana)
    pub fn lookup(&self, sound: char) -> Option<(u32, &'static [Movement])> {
        let sound = to_katakana(sound);
        SOUND_TABLE
            .iter()
            .find(|(kana, _, _)| *kana == sound)
            .map(|(_, number, movements)| (*number, *movements))
    }
}

impl PatternExtractor for SoundPatternMatcher {
    fn extract(&self, text: &str) -> Result<Vec<PatternHit>, ReasonError> {
        let mut hits = Vec::new();

        for c in text.chars() {
            let Some((number, movements)) = self.lookup(c) else {
                continue;
            };
            let (fire_energy, water_energy) = movements
                .iter()
                .map(Movement::energy)
                .fold((0.0, 0.0), |(f, w), (df, dw)| (f + df, w + dw));

            hits.push(PatternHit {
                pattern_id: format!("P{:02}:{}", number, to_katakana(c)),
                fire_energy,
                water_energy,
            });
        }

        Ok(hits)
    }
}

/// Fold hiragana into the katakana block
fn to_katakana(c: char) -> char {
    match c {
        'ぁ'..='ゖ' => char::from_u32(c as u32 + 0x60).unwrap_or(c),
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_kana_no_hits() {
        let hits = SoundPatternMatcher::new().extract("123456 plain ascii").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ho_is_pattern_one() {
        let matcher = SoundPatternMatcher::new();
        let (number, movements) = matcher.lookup('ホ').unwrap();
        assert_eq!(number, 1);
        assert!(!movements.is_empty());
    }

    #[test]
    fn test_hiragana_folds_to_katakana() {
        let hits = SoundPatternMatcher::new().extract("ひ").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pattern_id, "P16:ヒ");
        assert_eq!(hits[0].fire_energy, 2.0);
        assert_eq!(hits[0].water_energy, 0.0);
    }

    #[test]
    fn test_water_sound() {
        let hits = SoundPatternMatcher::new().extract("ミ").unwrap();
        assert_eq!(hits[0].fire_energy, 0.0);
        assert_eq!(hits[0].water_energy, 1.5);
    }

    #[test]
    fn test_unknown_kana_skipped() {
        // と and の are not in the table
        let hits = SoundPatternMatcher::new().extract("とのホ").unwrap();
        assert_eq!(hits.len(), 1);
    }
}
