// src/types/response.rs
//! Raw payloads as the analysis service sends them.
//!
//! Nothing outside the gateway touches these; they are validated into the
//! types in `types::analysis` as soon as they are decoded.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::analysis::InputType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultResponse {
    pub success: Option<bool>,
    pub error: Option<String>,
    pub analysis_id: Option<String>,
    pub score: Option<f64>,
    pub analysis: Option<AnalysisFeedbackResponse>,
    pub rewritten_resume: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFeedbackResponse {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub ats_score: Option<f64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistoryResponse {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub file_name: Option<String>,
    pub file_type: Option<InputType>,
    pub target_role: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetailsResponse {
    #[serde(rename = "_id", alias = "id", alias = "analysisId")]
    pub id: String,
    pub file_name: Option<String>,
    pub file_type: Option<InputType>,
    pub target_role: Option<String>,
    pub score: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub analysis: Option<AnalysisFeedbackResponse>,
    pub rewritten_resume: Option<String>,
    pub cover_letter: Option<String>,
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Backend message from a raw error body, if one can be found.
    pub fn message_from_body(body: &str) -> Option<String> {
        let parsed: ErrorResponse = serde_json::from_str(body).ok()?;
        parsed
            .error
            .or(parsed.message)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}
