//! Explicit result types for every failure the assistant can hit. Upstream
//! failures are recovered by the callers (fallback template, empty image
//! set); only configuration problems are fatal.

/// One or more required form fields were left empty. Reported back to the
/// host; no upstream call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// A call to the generative-text or image-search service failed.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream returned an empty response")]
    Empty,
}

/// Startup configuration problem. Halts before any interaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required credential {0}; set it in the environment")]
    MissingCredential(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_fields() {
        let err = ValidationError {
            missing: vec!["style", "rooms"],
        };
        assert_eq!(err.to_string(), "missing required fields: style, rooms");
    }

    #[test]
    fn test_config_error_names_credential() {
        let err = ConfigError::MissingCredential("GENAI_API_KEY");
        assert!(err.to_string().contains("GENAI_API_KEY"));
    }
}
