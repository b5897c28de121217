//! Error handling for the geo enrichment pipeline
//!
//! Library code returns typed errors built with thiserror; the orchestrator
//! and the binaries wrap them with anyhow context at the call site.

use thiserror::Error;

/// Errors raised while talking to the Wikidata Query Service.
#[derive(Error, Debug)]
pub enum WdqsError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WDQS returned status {status}: {body_prefix}")]
    Status { status: u16, body_prefix: String },

    #[error("query failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Top-level error type for the pipeline.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("query error: {0}")]
    Wdqs(#[from] WdqsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type aliases for convenience
pub type WdqsResult<T> = Result<T, WdqsError>;
pub type EnrichResult<T> = Result<T, EnrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wdqs_error_wraps_into_enrich_error() {
        let err: EnrichError = WdqsError::RetriesExhausted { attempts: 3 }.into();
        assert!(matches!(err, EnrichError::Wdqs(_)));
        assert_eq!(err.to_string(), "query error: query failed after 3 attempts");
    }

    #[test]
    fn test_status_error_display() {
        let err = WdqsError::Status {
            status: 500,
            body_prefix: "java.util.concurrent.TimeoutException".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }
}
