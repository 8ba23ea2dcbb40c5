// src/types/analysis.rs
//! Analysis data model as the client consumes it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::response::{
    AnalysisDetailsResponse, AnalysisFeedbackResponse, AnalysisHistoryResponse,
    AnalysisResultResponse,
};
use crate::core::gateway::GatewayError;

/// History label used for analyses submitted as pasted text.
pub const PASTED_RESUME_LABEL: &str = "Pasted Resume";

// ===== Scores =====

/// Round a wire score and check it lands in 0..=100.
pub fn normalize_score(raw: f64, field: &str) -> Result<u8, GatewayError> {
    let rounded = raw.round();
    if !rounded.is_finite() || !(0.0..=100.0).contains(&rounded) {
        return Err(GatewayError::Decode(format!(
            "{} out of range: {}",
            field, raw
        )));
    }
    Ok(rounded as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsImprovement => "needs improvement",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent match! Your resume aligns well with the role.",
            Self::Good => "Good match with room for improvement",
            Self::NeedsImprovement => "Consider enhancing your resume for better alignment",
        }
    }
}

/// Five-star rating for a 0-100 score.
pub fn stars(score: u8) -> f32 {
    f32::from(score) / 20.0
}

// ===== Analysis =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    File,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisFeedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub keywords: Vec<String>,
    pub ats_score: Option<u8>,
    pub suggestions: Vec<String>,
}

impl TryFrom<AnalysisFeedbackResponse> for AnalysisFeedback {
    type Error = GatewayError;

    fn try_from(raw: AnalysisFeedbackResponse) -> Result<Self, Self::Error> {
        let ats_score = raw
            .ats_score
            .map(|s| normalize_score(s, "atsScore"))
            .transpose()?;

        Ok(Self {
            strengths: raw.strengths,
            improvements: raw.improvements,
            keywords: raw.keywords,
            ats_score,
            suggestions: raw.suggestions,
        })
    }
}

/// One successful analysis. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    pub score: u8,
    pub analysis: AnalysisFeedback,
    pub rewritten_resume: String,
    pub cover_letter: String,
}

impl AnalysisResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

impl TryFrom<AnalysisResultResponse> for AnalysisResult {
    type Error = GatewayError;

    fn try_from(raw: AnalysisResultResponse) -> Result<Self, Self::Error> {
        if raw.success == Some(false) {
            return Err(GatewayError::Backend {
                status: 200,
                message: raw
                    .error
                    .unwrap_or_else(|| "Failed to analyze resume".to_string()),
            });
        }

        let analysis_id = raw
            .analysis_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| GatewayError::Decode("missing analysisId".to_string()))?;

        let score = raw
            .score
            .ok_or_else(|| GatewayError::Decode("missing score".to_string()))
            .and_then(|s| normalize_score(s, "score"))?;

        Ok(Self {
            analysis_id,
            score,
            analysis: raw.analysis.unwrap_or_default().try_into()?,
            rewritten_resume: raw.rewritten_resume.unwrap_or_default(),
            cover_letter: raw.cover_letter.unwrap_or_default(),
        })
    }
}

// ===== History =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub file_name: String,
    pub target_role: String,
    pub score: u8,
    pub created_at: DateTime<Utc>,
    pub input_type: InputType,
}

impl TryFrom<AnalysisHistoryResponse> for HistoryEntry {
    type Error = GatewayError;

    fn try_from(raw: AnalysisHistoryResponse) -> Result<Self, Self::Error> {
        let input_type = raw.file_type.unwrap_or(InputType::File);
        let file_name = match raw.file_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None if input_type == InputType::Text => PASTED_RESUME_LABEL.to_string(),
            None => "Untitled".to_string(),
        };

        Ok(Self {
            id: raw.id,
            file_name,
            target_role: raw.target_role,
            score: normalize_score(raw.score, "score")?,
            created_at: raw.created_at,
            input_type,
        })
    }
}

/// Full record behind one history entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDetails {
    pub id: String,
    pub file_name: Option<String>,
    pub target_role: Option<String>,
    pub score: Option<u8>,
    pub created_at: Option<DateTime<Utc>>,
    pub input_type: Option<InputType>,
    pub analysis: Option<AnalysisFeedback>,
    pub rewritten_resume: Option<String>,
    pub cover_letter: Option<String>,
}

impl TryFrom<AnalysisDetailsResponse> for AnalysisDetails {
    type Error = GatewayError;

    fn try_from(raw: AnalysisDetailsResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            file_name: raw.file_name,
            target_role: raw.target_role,
            score: raw
                .score
                .map(|s| normalize_score(s, "score"))
                .transpose()?,
            created_at: raw.created_at,
            input_type: raw.file_type,
            analysis: raw.analysis.map(AnalysisFeedback::try_from).transpose()?,
            rewritten_resume: raw.rewritten_resume,
            cover_letter: raw.cover_letter,
        })
    }
}
