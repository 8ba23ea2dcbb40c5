// src/workflow.rs
//! Analysis workflow: the dashboard's state machine.
//!
//! ```text
//! Collecting --submit--> Submitting --2xx--> Succeeded --reset--> Collecting
//!                             \--error--> Failed --reset/resubmit--^
//! ```
//!
//! The controller owns the form, the displayed result and the loaded history.
//! Every network call goes through the injected `AnalysisGateway`; identity
//! comes from the injected `Identity` and is never written to.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::downloads::{ArtifactKind, ArtifactSaver};
use crate::core::gateway::{AnalysisGateway, GatewayResult};
use crate::input::{AnalysisRequest, FileValidationError, InputForm, InputMode, ResumeFile};
use crate::session::Identity;
use crate::types::analysis::{AnalysisDetails, AnalysisResult, HistoryEntry, InputType};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Collecting,
    Submitting,
    Succeeded(AnalysisResult),
    Failed(String),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

pub struct AnalysisWorkflow {
    gateway: Arc<dyn AnalysisGateway>,
    identity: Arc<dyn Identity>,
    saver: ArtifactSaver,
    form: InputForm,
    state: WorkflowState,
    /// Role and label of the request in flight or last answered.
    submitted: Option<(String, String, InputType)>,
    history: Vec<HistoryEntry>,
    /// Locally created entry not yet confirmed by a history fetch.
    pending_entry: Option<HistoryEntry>,
    history_error: Option<String>,
    download_error: Option<String>,
}

impl AnalysisWorkflow {
    pub fn new(
        gateway: Arc<dyn AnalysisGateway>,
        identity: Arc<dyn Identity>,
        saver: ArtifactSaver,
    ) -> Self {
        Self {
            gateway,
            identity,
            saver,
            form: InputForm::new(),
            state: WorkflowState::Collecting,
            submitted: None,
            history: Vec::new(),
            pending_entry: None,
            history_error: None,
            download_error: None,
        }
    }

    // ===== Read access =====

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn form(&self) -> &InputForm {
        &self.form
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            WorkflowState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn history_error(&self) -> Option<&str> {
        self.history_error.as_deref()
    }

    pub fn download_error(&self) -> Option<&str> {
        self.download_error.as_deref()
    }

    pub fn saver(&self) -> &ArtifactSaver {
        &self.saver
    }

    pub fn is_submitting(&self) -> bool {
        self.state == WorkflowState::Submitting
    }

    /// Whether the analyze action is enabled right now.
    pub fn can_analyze(&self) -> bool {
        self.accepts_edits() && self.form.can_analyze(self.is_submitting())
    }

    /// Role the displayed result was scored against.
    pub fn result_role(&self) -> Option<&str> {
        self.submitted.as_ref().map(|(role, _, _)| role.as_str())
    }

    // ===== Lifecycle =====

    /// Enter the collecting state and load history.
    pub async fn mount(&mut self) {
        self.state = WorkflowState::Collecting;
        self.refresh_history().await;
    }

    /// Discard request and result state. Ignored while a call is in flight.
    pub fn reset(&mut self) {
        if self.is_submitting() {
            debug!("Reset ignored while an analysis is in flight");
            return;
        }
        self.form.clear();
        self.submitted = None;
        self.download_error = None;
        self.state = WorkflowState::Collecting;
    }

    /// Close the error panel, keeping the form for another attempt.
    pub fn dismiss_error(&mut self) {
        if matches!(self.state, WorkflowState::Failed(_)) {
            self.state = WorkflowState::Collecting;
        }
    }

    // ===== Form edits =====

    fn accepts_edits(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Collecting | WorkflowState::Failed(_)
        )
    }

    fn begin_edit(&mut self) -> bool {
        if !self.accepts_edits() {
            debug!("Form edit ignored in state {}", self.state.name());
            return false;
        }
        self.dismiss_error();
        true
    }

    /// Each edit returns whether it was applied.
    pub fn select_mode(&mut self, mode: InputMode) -> bool {
        let applied = self.begin_edit();
        if applied {
            self.form.select_mode(mode);
        }
        applied
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let applied = self.begin_edit();
        if applied {
            self.form.set_text(text);
        }
        applied
    }

    /// `Ok(false)` when the edit is ignored; a rejected file is an error.
    pub fn stage_file(&mut self, file: ResumeFile) -> Result<bool, FileValidationError> {
        if !self.begin_edit() {
            return Ok(false);
        }
        self.form.stage_file(file)?;
        Ok(true)
    }

    pub fn set_role(&mut self, role: impl Into<String>) -> bool {
        let applied = self.begin_edit();
        if applied {
            self.form.set_role(role);
        }
        applied
    }

    // ===== Analyze =====

    /// Enter `Submitting` and hand out the request to send. Returns `None`
    /// when the form is incomplete or a call is already in flight.
    pub fn begin_submit(&mut self) -> Option<AnalysisRequest> {
        if !self.can_analyze() {
            debug!(
                "Analyze ignored in state {} (role: {}, content: {})",
                self.state.name(),
                self.form.has_role(),
                self.form.has_content()
            );
            return None;
        }

        let request = self.form.to_request(self.identity.user_id())?;
        self.submitted = Some((
            request.target_role.clone(),
            request.content.label().to_string(),
            request.content.input_type(),
        ));
        self.download_error = None;
        self.state = WorkflowState::Submitting;
        info!(
            "Analysis submitted for role {} ({})",
            request.target_role,
            request.content.input_type().as_str()
        );
        Some(request)
    }

    /// Apply the settled outcome of the call started by `begin_submit`.
    pub async fn complete_submit(&mut self, outcome: GatewayResult<AnalysisResult>) {
        if !self.is_submitting() {
            warn!("Analysis outcome arrived with no call in flight; dropped");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(
                    "Analysis {} completed with score {}",
                    result.analysis_id, result.score
                );
                if let Some((role, label, input_type)) = &self.submitted {
                    let entry = HistoryEntry {
                        id: result.analysis_id.clone(),
                        file_name: label.clone(),
                        target_role: role.clone(),
                        score: result.score,
                        created_at: chrono::Utc::now(),
                        input_type: *input_type,
                    };
                    self.history.retain(|e| e.id != entry.id);
                    self.history.insert(0, entry.clone());
                    self.pending_entry = Some(entry);
                }
                self.state = WorkflowState::Succeeded(result);
                self.refresh_history().await;
            }
            Err(e) => {
                error!(retryable = e.is_retryable(), "Analysis failed: {}", e);
                self.state = WorkflowState::Failed(e.user_message());
            }
        }
    }

    /// Submit the current form and wait for the outcome. No retry, no
    /// cancellation. A no-op when the analyze action is disabled.
    pub async fn analyze(&mut self) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };
        let outcome = self.gateway.analyze(&request).await;
        self.complete_submit(outcome).await;
        matches!(self.state, WorkflowState::Succeeded(_))
    }

    // ===== History =====

    /// Re-fetch history. Failures are logged and leave the list as it was.
    pub async fn refresh_history(&mut self) {
        let Some(user_id) = self.identity.user_id() else {
            debug!("No signed-in user; history not loaded");
            return;
        };

        match self.gateway.history(&user_id).await {
            Ok(mut entries) => {
                if let Some(pending) = self.pending_entry.take() {
                    if entries.iter().any(|e| e.id == pending.id) {
                        debug!("Analysis {} confirmed by history", pending.id);
                    } else {
                        entries.insert(0, pending.clone());
                        self.pending_entry = Some(pending);
                    }
                }
                debug!("Loaded {} history entries", entries.len());
                self.history = entries;
            }
            Err(e) => warn!("Failed to fetch analysis history: {}", e),
        }
    }

    /// Delete one analysis, then reload the list. Nothing is removed locally
    /// until the backend confirms.
    pub async fn delete_analysis(&mut self, analysis_id: &str) -> bool {
        match self.gateway.delete_analysis(analysis_id).await {
            Ok(()) => {
                info!("Deleted analysis {}", analysis_id);
                self.history_error = None;
                if self
                    .pending_entry
                    .as_ref()
                    .is_some_and(|p| p.id == analysis_id)
                {
                    self.pending_entry = None;
                }
                self.refresh_history().await;
                true
            }
            Err(e) => {
                error!(
                    retryable = e.is_retryable(),
                    "Failed to delete analysis {}: {}", analysis_id, e
                );
                self.history_error = Some(e.user_message());
                false
            }
        }
    }

    pub async fn fetch_details(&self, analysis_id: &str) -> GatewayResult<AnalysisDetails> {
        self.gateway.analysis_details(analysis_id).await
    }

    // ===== Downloads =====

    /// Save one artifact of the displayed result. Failures become an inline
    /// alert; the result itself is left alone.
    pub async fn download(&mut self, kind: ArtifactKind) -> Option<PathBuf> {
        let Some(analysis_id) = self.result().map(|r| r.analysis_id.clone()) else {
            self.download_error = Some("No analysis to download yet".to_string());
            return None;
        };
        let role = self.result_role().map(str::to_string);

        match self
            .saver
            .download(self.gateway.as_ref(), kind, &analysis_id, role.as_deref())
            .await
        {
            Ok(path) => {
                self.download_error = None;
                Some(path)
            }
            Err(e) => {
                error!("Download error: {}", e);
                self.download_error = Some(e.user_message());
                None
            }
        }
    }
}
