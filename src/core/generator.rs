//! Contradiction generation
//!
//! The generator is fallible and may be slow or non-deterministic. The
//! reasoner treats any error as "no new contradiction this turn".

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::GenerationError;
use crate::types::Contradiction;

/// Proposes a thesis / antithesis / tension triple for the raw utterance
#[async_trait]
pub trait ContradictionGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> Result<Option<Contradiction>, GenerationError>;
}

lazy_static! {
    static ref RE_CONTRAST: Regex = Regex::new(
        r"(?i)\b(but|however|yet|although|though)\b|(しかし|でも|けれど|けど|だが)"
    ).unwrap();
}

/// Splits the utterance at its first contrast marker
#[derive(Debug, Default)]
pub struct ContrastContradictionGenerator;

impl ContrastContradictionGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContradictionGenerator for ContrastContradictionGenerator {
    async fn generate(&self, text: &str) -> Result<Option<Contradiction>, GenerationError> {
        let Some(marker) = RE_CONTRAST.find(text) else {
            return Ok(None);
        };

        let trim = |s: &str| {
            s.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '、' || c == '。')
                .to_string()
        };
        let thesis = trim(&text[..marker.start()]);
        let antithesis = trim(&text[marker.end()..]);
        if thesis.is_empty() || antithesis.is_empty() {
            return Ok(None);
        }

        Ok(Some(Contradiction {
            tension: tension(&thesis, &antithesis),
            thesis,
            antithesis,
        }))
    }
}

/// 1.0 when both sides weigh the same, falling toward 0 as one dominates
fn tension(thesis: &str, antithesis: &str) -> f64 {
    let a = thesis.chars().count() as f64;
    let b = antithesis.chars().count() as f64;
    let longest = a.max(b);
    if longest == 0.0 {
        return 0.0;
    }
    (1.0 - (a - b).abs() / longest).clamp(0.0, 1.0)
}
