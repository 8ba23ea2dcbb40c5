// src/core/service_client.rs
//! HTTP client for the resume analysis service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, trace, warn};

use crate::core::downloads::ArtifactKind;
use crate::core::gateway::{AnalysisGateway, GatewayError, GatewayResult};
use crate::input::ResumeFile;
use crate::types::analysis::{AnalysisDetails, AnalysisResult, HistoryEntry};
use crate::types::response::{
    AnalysisDetailsResponse, AnalysisHistoryResponse, AnalysisResultResponse, ErrorResponse,
};

const ANALYZE_TEXT_ENDPOINT: [&str; 2] = ["analyze", "text"];
const ANALYZE_FILE_ENDPOINT: [&str; 2] = ["analyze", "file"];
const HISTORY_ENDPOINT: &str = "analyses";
const ANALYSIS_ENDPOINT: &str = "analysis";
const DOWNLOAD_ENDPOINT: &str = "download";

const ANALYZE_FAILED: &str = "Failed to analyze resume";
const HISTORY_FAILED: &str = "Failed to fetch analysis history";
const DETAILS_FAILED: &str = "Failed to fetch analysis details";
const DELETE_FAILED: &str = "Failed to delete analysis";

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextRequest<'a> {
    resume_text: &'a str,
    target_role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ServiceClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid analysis service URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Analysis service URL cannot take paths: {}", base_url);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so ids containing `/` or `..` stay inside their segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> GatewayResult<Response> {
        request.send().await.map_err(|e| {
            error!("Request to analysis service failed: {}", e);
            GatewayError::Transport(e.to_string())
        })
    }

    async fn decode_json<T: DeserializeOwned>(
        response: Response,
        fallback: &str,
    ) -> GatewayResult<T> {
        let response = Self::check_status(response, fallback).await?;
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        trace!("Raw analysis service response: {}", body);

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse analysis service response: {}", e);
            GatewayError::Decode(e.to_string())
        })
    }

    /// Pass 2xx responses through; turn anything else into a backend error.
    async fn check_status(response: Response, fallback: &str) -> GatewayResult<Response> {
        let status = response.status();
        trace!("Response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Analysis service error response {}: {}", status, body);
        Err(backend_error(status, &body, fallback))
    }
}

/// Error for a non-2xx response, preferring the backend's own message.
pub fn backend_error(status: StatusCode, body: &str, fallback: &str) -> GatewayError {
    GatewayError::Backend {
        status: status.as_u16(),
        message: ErrorResponse::message_from_body(body).unwrap_or_else(|| fallback.to_string()),
    }
}

/// Validate history records one by one. Malformed records are logged and
/// skipped so the rest of the list still renders.
fn history_entries(records: Vec<serde_json::Value>) -> Vec<HistoryEntry> {
    let total = records.len();
    let entries: Vec<HistoryEntry> = records
        .into_iter()
        .filter_map(|record| {
            let parsed = serde_json::from_value::<AnalysisHistoryResponse>(record)
                .map_err(|e| GatewayError::Decode(e.to_string()))
                .and_then(HistoryEntry::try_from);
            match parsed {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed history record: {}", e);
                    None
                }
            }
        })
        .collect();

    if entries.len() < total {
        warn!("Kept {} of {} history records", entries.len(), total);
    }
    entries
}

#[async_trait]
impl AnalysisGateway for ServiceClient {
    async fn analyze_text(
        &self,
        resume_text: &str,
        target_role: &str,
        user_id: Option<&str>,
    ) -> GatewayResult<AnalysisResult> {
        let url = self.url(&ANALYZE_TEXT_ENDPOINT);
        info!("Submitting pasted resume for role {}", target_role);

        let payload = AnalyzeTextRequest {
            resume_text,
            target_role,
            user_id,
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        let raw: AnalysisResultResponse = Self::decode_json(response, ANALYZE_FAILED).await?;
        AnalysisResult::try_from(raw)
    }

    async fn analyze_file(
        &self,
        file: &ResumeFile,
        target_role: &str,
        user_id: Option<&str>,
    ) -> GatewayResult<AnalysisResult> {
        let url = self.url(&ANALYZE_FILE_ENDPOINT);
        info!(
            "Uploading resume {} ({} bytes) for role {}",
            file.name,
            file.size(),
            target_role
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| GatewayError::Transport(format!("Failed to create multipart: {}", e)))?;

        let mut form = Form::new()
            .part("resume", part)
            .text("targetRole", target_role.to_string());
        if let Some(user_id) = user_id {
            form = form.text("userId", user_id.to_string());
        }

        let response = self.send(self.client.post(url).multipart(form)).await?;
        let raw: AnalysisResultResponse = Self::decode_json(response, ANALYZE_FAILED).await?;
        AnalysisResult::try_from(raw)
    }

    async fn history(&self, user_id: &str) -> GatewayResult<Vec<HistoryEntry>> {
        let url = self.url(&[HISTORY_ENDPOINT, user_id]);
        debug!("Fetching analysis history: {}", url);

        let response = self.send(self.client.get(url)).await?;
        let records: Vec<serde_json::Value> = Self::decode_json(response, HISTORY_FAILED).await?;

        let mut entries = history_entries(records);
        crate::history::sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn analysis_details(&self, analysis_id: &str) -> GatewayResult<AnalysisDetails> {
        let url = self.url(&[ANALYSIS_ENDPOINT, analysis_id]);
        debug!("Fetching analysis details: {}", url);

        let response = self.send(self.client.get(url)).await?;
        let raw: AnalysisDetailsResponse = Self::decode_json(response, DETAILS_FAILED).await?;
        AnalysisDetails::try_from(raw)
    }

    async fn delete_analysis(&self, analysis_id: &str) -> GatewayResult<()> {
        let url = self.url(&[ANALYSIS_ENDPOINT, analysis_id]);
        info!("Deleting analysis {}", analysis_id);

        let response = self.send(self.client.delete(url)).await?;
        Self::check_status(response, DELETE_FAILED).await?;
        Ok(())
    }

    async fn fetch_artifact(
        &self,
        kind: ArtifactKind,
        analysis_id: &str,
    ) -> GatewayResult<Vec<u8>> {
        let url = self.url(&[DOWNLOAD_ENDPOINT, kind.endpoint(), analysis_id]);
        info!("Downloading {} for analysis {}", kind.display_name(), analysis_id);

        let response = self.send(self.client.get(url)).await?;
        let response = Self::check_status(response, kind.failure_message()).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
