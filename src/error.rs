//! Error taxonomy for the natural-language search pipeline.
//!
//! The sanitizer, schema gate, and model client each report a
//! [`FilterError`]. The translator wraps whichever one occurred in a single
//! [`TranslationFailed`], which is the only error the search orchestration
//! and the HTTP layer need to recognize.
//!
//! CRUD plumbing (config, database, CLI) uses `anyhow` instead.

use thiserror::Error;

/// Failure talking to the language-model endpoint.
#[derive(Debug, Error)]
pub enum ModelInvocationError {
    #[error("language model is disabled (set [llm] provider in config)")]
    Disabled,

    #[error("environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("request to language model timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("language model API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("invalid response from language model: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ModelInvocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelInvocationError::Timeout
        } else if err.is_decode() {
            ModelInvocationError::InvalidResponse(err.to_string())
        } else {
            ModelInvocationError::Network(err.to_string())
        }
    }
}

/// A single step of filter translation failed.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The model output contained no parseable JSON object.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// The JSON parsed but does not fit the filter schema.
    #[error("filter schema validation failed: {0}")]
    SchemaValidationFailed(String),

    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelInvocationError),
}

/// Translating a user query into a filter failed.
///
/// Carries the root cause so callers can report it without caring which
/// sub-step produced it.
#[derive(Debug, Error)]
#[error("translation failed: {source}")]
pub struct TranslationFailed {
    #[source]
    pub source: FilterError,
}

impl From<FilterError> for TranslationFailed {
    fn from(source: FilterError) -> Self {
        Self { source }
    }
}

impl From<ModelInvocationError> for TranslationFailed {
    fn from(err: ModelInvocationError) -> Self {
        Self {
            source: FilterError::ModelInvocation(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_failed_carries_cause_text() {
        let err = TranslationFailed::from(FilterError::MalformedResponse(
            "no valid JSON found".to_string(),
        ));
        let msg = err.to_string();
        assert!(msg.contains("translation failed"));
        assert!(msg.contains("no valid JSON found"));
    }

    #[test]
    fn test_model_error_wraps_through() {
        let err = TranslationFailed::from(ModelInvocationError::Status {
            status: 503,
            body: "overloaded".to_string(),
        });
        assert!(matches!(
            err.source,
            FilterError::ModelInvocation(ModelInvocationError::Status { status: 503, .. })
        ));
        assert!(err.to_string().contains("overloaded"));
    }
}
