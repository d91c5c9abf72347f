//! Error types for the reasoning pipeline.

/// Failures that abort the normal path of a turn.
///
/// `FusionReasoner::reason` never returns these; they are turned into the
/// fallback trace at the top level.
#[derive(Debug, thiserror::Error)]
pub enum ReasonError {
    #[error("session store error: {0}")]
    Store(String),
    #[error("{source_name} extraction failed: {message}")]
    Extraction {
        source_name: &'static str,
        message: String,
    },
    #[error("observation composition failed: {0}")]
    Composition(String),
    #[error("observation has no unresolved points")]
    InvalidObservation,
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReasonError {
    /// Shorthand for a failed extractor.
    pub fn extraction(source_name: &'static str, message: impl Into<String>) -> Self {
        ReasonError::Extraction {
            source_name,
            message: message.into(),
        }
    }
}

/// Failure of the contradiction generator.
///
/// Non-fatal: the turn proceeds with no new contradiction.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generator returned malformed output: {0}")]
    Malformed(String),
}
