//! Token role assignment
//!
//! Subject-like tokens are ACTOR, object/target-like tokens are RECEIVER.
//! English pronouns decide by case; Japanese tokens by their trailing particle.

use crate::error::ReasonError;
use crate::types::{Role, TokenRole};

/// Assigns a semantic role to every token
pub trait RoleAssigner: Send + Sync {
    fn assign(&self, text: &str) -> Result<Vec<TokenRole>, ReasonError>;
}

const ACTOR_WORDS: &[&str] = &["i", "we", "he", "she", "they", "私", "僕", "俺"];
const RECEIVER_WORDS: &[&str] = &["me", "us", "him", "her", "them", "you"];
const ACTOR_PARTICLES: &[char] = &['が', 'は'];
const RECEIVER_PARTICLES: &[char] = &['を', 'に', 'へ'];

/// Pronoun and particle based role assigner
#[derive(Debug, Default)]
pub struct ParticleRoleAssigner;

impl ParticleRoleAssigner {
    pub fn new() -> Self {
        Self
    }

    fn role_of(token: &str) -> Role {
        let lower = token.to_lowercase();
        if ACTOR_WORDS.contains(&lower.as_str()) {
            return Role::Actor;
        }
        if RECEIVER_WORDS.contains(&lower.as_str()) {
            return Role::Receiver;
        }
        // a bare particle is not a role holder
        if token.chars().count() > 1 {
            if let Some(last) = token.chars().last() {
                if ACTOR_PARTICLES.contains(&last) {
                    return Role::Actor;
                }
                if RECEIVER_PARTICLES.contains(&last) {
                    return Role::Receiver;
                }
            }
        }
        Role::Other
    }
}

impl RoleAssigner for ParticleRoleAssigner {
    fn assign(&self, text: &str) -> Result<Vec<TokenRole>, ReasonError> {
        Ok(text
            .split_whitespace()
            .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .map(|token| TokenRole::new(token, Self::role_of(token)))
            .collect())
    }
}
