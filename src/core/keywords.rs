//! Keyword evidence: fire / water / center dictionaries
//!
//! English terms match on word boundaries, Japanese terms match anywhere.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ReasonError;
use crate::types::KeywordEvidence;

/// Converts text into keyword-based elemental evidence
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<KeywordEvidence, ReasonError>;
}

lazy_static! {
    // =========================================================================
    // Fire: rising, opening, outward, heat and light
    // =========================================================================
    static ref RE_FIRE: Regex = Regex::new(
        r"(?i)\b(fire|flame|flames|burn|burning|blaze|heat|hot|light|bright|rise|rising|ascend|expand|outward|spark|sun|passion)\b|(火|炎|燃|熱|光|昇|開|陽)"
    ).unwrap();

    // =========================================================================
    // Water: falling, closing, inward, cold and calm
    // =========================================================================
    static ref RE_WATER: Regex = Regex::new(
        r"(?i)\b(water|wave|waves|flow|rain|river|sea|ocean|cold|cool|calm|quiet|sink|fall|falling|descend|inward|moon|rest)\b|(水|流|雨|海|冷|静|沈|降|閉|月)"
    ).unwrap();

    // =========================================================================
    // Center: balance, the middle, held opposites
    // =========================================================================
    static ref RE_CENTER: Regex = Regex::new(
        r"(?i)\b(center|centre|middle|balance|between|paradox|pivot|axis)\b|(正中|中心|均衡|矛盾|中庸)"
    ).unwrap();
}

/// Dictionary-based keyword matcher
#[derive(Debug, Default)]
pub struct KeywordMatcher;

impl KeywordMatcher {
    /// Create new matcher
    pub fn new() -> Self {
        Self
    }
}

impl KeywordExtractor for KeywordMatcher {
    fn extract(&self, text: &str) -> Result<KeywordEvidence, ReasonError> {
        let mut evidence = KeywordEvidence::default();

        evidence.fire = collect_hits(&RE_FIRE, "fire", text, &mut evidence.tags);
        evidence.water = collect_hits(&RE_WATER, "water", text, &mut evidence.tags);
        evidence.center = collect_hits(&RE_CENTER, "center", text, &mut evidence.tags);

        Ok(evidence)
    }
}

/// Count matches and push one `keyword:<element>:<term>` tag per match
fn collect_hits(regex: &Regex, element: &str, text: &str, tags: &mut Vec<String>) -> u32 {
    let mut count = 0;
    for m in regex.find_iter(text) {
        tags.push(format!("keyword:{}:{}", element, m.as_str().to_lowercase()));
        count += 1;
    }
    count
}
