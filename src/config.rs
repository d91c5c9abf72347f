//! Runtime configuration for the reasoner.
//!
//! Defaults come from the crate-level constants; a JSON file can override
//! any subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReasonError;
use crate::{FACT_SEED_MAX_CHARS, LOOP_HISTORY_LIMIT, LOOP_REPEAT_THRESHOLD, SESSION_TTL_SECS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Idle sessions older than this are evicted by the sweeper
    pub session_ttl_secs: u64,
    /// Loop history entries kept per session
    pub loop_history_limit: usize,
    /// Consecutive repeats before a loop is reported
    pub loop_repeat_threshold: u32,
    /// Maximum characters of the next fact seed
    pub fact_seed_max_chars: usize,
    /// Hex SHA-256 the frozen principles must hash to. `None` pins the
    /// digest computed at startup.
    pub integrity_digest: Option<String>,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: SESSION_TTL_SECS,
            loop_history_limit: LOOP_HISTORY_LIMIT,
            loop_repeat_threshold: LOOP_REPEAT_THRESHOLD,
            fact_seed_max_chars: FACT_SEED_MAX_CHARS,
            integrity_digest: None,
        }
    }
}

impl ReasonerConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ReasonError> {
        let content = std::fs::read_to_string(path)?;
        let config: ReasonerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ReasonError> {
        if self.loop_history_limit == 0 {
            return Err(ReasonError::Config(
                "loop_history_limit must be at least 1".to_string(),
            ));
        }
        if self.loop_repeat_threshold < 2 {
            return Err(ReasonError::Config(
                "loop_repeat_threshold must be at least 2".to_string(),
            ));
        }
        if self.fact_seed_max_chars == 0 {
            return Err(ReasonError::Config(
                "fact_seed_max_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
