// src/core/gateway.rs
//! Contract between the analysis workflow and the analysis service.
//!
//! Every endpoint the client talks to is one method here. Implementations
//! return a decoded, validated payload or a `GatewayError`; nothing else
//! leaks past this boundary, so callers drive their state by matching on
//! the result.

use async_trait::async_trait;

use crate::core::downloads::ArtifactKind;
use crate::input::{AnalysisRequest, ResumeContent, ResumeFile};
use crate::types::analysis::{AnalysisDetails, AnalysisResult, HistoryEntry};

/// Message shown for failures that never produced a server response.
pub const RETRYABLE_MESSAGE: &str =
    "Could not reach the analysis service. Check your connection and try again.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The request never reached the server or the connection dropped.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response, or a 2xx body flagged `success: false`.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The body arrived but does not match the expected schema.
    #[error("Unexpected response from the analysis service: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Text suitable for an error panel or inline alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => RETRYABLE_MESSAGE.to_string(),
            Self::Backend { message, .. } => message.clone(),
            Self::Decode(_) => {
                "The analysis service returned an unexpected response.".to_string()
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// `POST /analyze/text`
    async fn analyze_text(
        &self,
        resume_text: &str,
        target_role: &str,
        user_id: Option<&str>,
    ) -> GatewayResult<AnalysisResult>;

    /// `POST /analyze/file`
    async fn analyze_file(
        &self,
        file: &ResumeFile,
        target_role: &str,
        user_id: Option<&str>,
    ) -> GatewayResult<AnalysisResult>;

    /// `GET /analyses/{userId}`, newest first.
    async fn history(&self, user_id: &str) -> GatewayResult<Vec<HistoryEntry>>;

    /// `GET /analysis/{analysisId}`
    async fn analysis_details(&self, analysis_id: &str) -> GatewayResult<AnalysisDetails>;

    /// `DELETE /analysis/{analysisId}`
    async fn delete_analysis(&self, analysis_id: &str) -> GatewayResult<()>;

    /// `GET /download/{kind}/{analysisId}`
    async fn fetch_artifact(&self, kind: ArtifactKind, analysis_id: &str)
        -> GatewayResult<Vec<u8>>;

    /// Send one request to whichever analyze endpoint matches its content.
    async fn analyze(&self, request: &AnalysisRequest) -> GatewayResult<AnalysisResult> {
        let user_id = request.user_id.as_deref();
        match &request.content {
            ResumeContent::Text(text) => {
                self.analyze_text(text, &request.target_role, user_id).await
            }
            ResumeContent::File(file) => {
                self.analyze_file(file, &request.target_role, user_id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_use_generic_message() {
        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), RETRYABLE_MESSAGE);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_backend_errors_surface_verbatim() {
        let err = GatewayError::Backend {
            status: 422,
            message: "Resume text is too short".to_string(),
        };
        assert_eq!(err.user_message(), "Resume text is too short");
        assert_eq!(err.to_string(), "Resume text is too short");
        assert!(!err.is_retryable());

        let err = GatewayError::Backend {
            status: 503,
            message: "busy".to_string(),
        };
        assert!(err.is_retryable());
    }
}
