//! The four-screen intake flow: form → analyzing → review → success.
//!
//! [`FlowController`] owns one explicit [`FlowState`] record and is the only
//! thing that mutates it, through the named transitions below. Presentation
//! layers read the state by reference and forward participant intents.
//!
//! ```text
//!            submit (CPF complete + file)        extraction ok
//!   ┌──────┐ ───────────────────────────▶ ┌───────────┐ ──────────▶ ┌────────┐
//!   │ form │                              │ analyzing │             │ review │
//!   └──────┘ ◀─────────────────────────── └───────────┘             └────────┘
//!     ▲  ▲        extraction failed                       retake │      │ confirm
//!     │  └───────────────────────────────────────────────────────┘      ▼
//!     │                     submit another                         ┌─────────┐
//!     └────────────────────────────────────────────────────────────│ success │
//!                                                                  └─────────┘
//! ```
//!
//! Suspension happens only while encoding and extracting; the webhook send
//! is spawned and never awaited here. Calling a transition from the wrong
//! screen is ignored and logged.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::FlowConfig;
use crate::error::{BoletimError, ValidationError};
use crate::messages;
use crate::output::{AppStep, ReportCardData};
use crate::pipeline::encode::{self, Preview};
use crate::pipeline::extract::{GeminiExtractor, ScoreExtractor};
use crate::pipeline::input::{self, SelectedFile};
use crate::pipeline::review::ReviewIntent;
use crate::pipeline::submit::{
    DeliveryHandle, SubmissionDispatcher, SubmissionPayload, SubmissionSink, WebhookSink,
};
use crate::progress::{NoopObserver, SharedObserver};

/// Everything the screens need to render.
#[derive(Debug, Default)]
pub struct FlowState {
    step: AppStep,
    cpf: String,
    file: Option<SelectedFile>,
    preview: Option<Preview>,
    result: Option<ReportCardData>,
    error: Option<String>,
}

impl FlowState {
    pub fn step(&self) -> AppStep {
        self.step
    }

    /// The masked CPF as typed so far.
    pub fn cpf(&self) -> &str {
        &self.cpf
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// Location of the preview copy, while one exists.
    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(Preview::path)
    }

    pub fn result(&self) -> Option<&ReportCardData> {
        self.result.as_ref()
    }

    /// Message shown on the form, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit button is enabled (something typed and a file chosen).
    pub fn can_submit(&self) -> bool {
        !self.cpf.is_empty() && self.file.is_some()
    }

    /// Back on the form after a failed analysis, with the attempt's inputs
    /// still filled in. Only a new participant action may submit again.
    pub fn awaiting_retry(&self) -> bool {
        self.step == AppStep::Form
            && self.error.as_deref() == Some(messages::ANALYSIS_FAILED)
    }
}

/// Drives one participant through the intake flow.
pub struct FlowController {
    state: FlowState,
    extractor: Arc<dyn ScoreExtractor>,
    dispatcher: SubmissionDispatcher,
    observer: SharedObserver,
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("state", &self.state)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl FlowController {
    pub fn new(extractor: Arc<dyn ScoreExtractor>, sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            state: FlowState::default(),
            extractor,
            dispatcher: SubmissionDispatcher::new(sink),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Controller backed by Gemini and the configured webhook.
    pub fn from_config(config: &FlowConfig) -> Result<Self, BoletimError> {
        Ok(Self::new(
            Arc::new(GeminiExtractor::new(config)?),
            Arc::new(WebhookSink::new(config)?),
        ))
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn step(&self) -> AppStep {
        self.state.step
    }

    // ── Form ─────────────────────────────────────────────────────────────

    /// Store `raw` through the CPF mask and return the masked value.
    pub fn input_cpf(&mut self, raw: &str) -> &str {
        if self.guard(AppStep::Form, "input_cpf") {
            self.state.cpf = input::normalize_cpf(raw);
        }
        &self.state.cpf
    }

    /// Select a boletim, replacing (and releasing the preview of) any
    /// earlier selection. Clears the form message.
    pub fn select_file(&mut self, file: SelectedFile) {
        if !self.guard(AppStep::Form, "select_file") {
            return;
        }
        // The preview is cosmetic; a failure to create one must not block
        // the selection.
        let preview = Preview::create(&file)
            .map_err(|e| warn!("No preview for {}: {}", file.name(), e))
            .ok();
        info!("Selected {} ({})", file.name(), file.content_type());
        self.state.preview = preview;
        self.state.file = Some(file);
        self.state.error = None;
    }

    /// Check the `form → analyzing` guard. The CPF is checked first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !input::is_cpf_complete(&self.state.cpf) {
            return Err(ValidationError::CpfIncomplete);
        }
        if self.state.file.is_none() {
            return Err(ValidationError::FileMissing);
        }
        Ok(())
    }

    /// Submit the form: validate, then encode and extract.
    ///
    /// Returns the step the flow ends on: `Review` on success, `Form` when
    /// the guard refused the transition or the analysis failed (the message
    /// is in [`FlowState::error_message`]).
    pub async fn submit(&mut self) -> AppStep {
        if !self.guard(AppStep::Form, "submit") {
            return self.state.step;
        }
        if let Err(e) = self.validate() {
            info!("Submission refused: {}", e);
            self.state.error = Some(e.to_string());
            return self.state.step;
        }
        let Some(file) = self.state.file.clone() else {
            return self.state.step;
        };

        self.state.error = None;
        self.transition(AppStep::Analyzing);

        match self.analyze(&file).await {
            Ok(data) => {
                self.state.result = Some(data);
                self.transition(AppStep::Review);
            }
            Err(e) => {
                error!("Analysis of {} failed: {}", file.name(), e);
                self.observer.on_analysis_failed(&e);
                self.state.result = None;
                self.state.error = Some(messages::ANALYSIS_FAILED.to_string());
                self.transition(AppStep::Form);
            }
        }
        self.state.step
    }

    async fn analyze(&self, file: &SelectedFile) -> Result<ReportCardData, BoletimError> {
        let document = encode::encode_document(file).await?;
        self.extractor.extract(&document).await
    }

    // ── Review ───────────────────────────────────────────────────────────

    /// Apply the participant's choice on the review screen.
    pub fn handle_review(&mut self, intent: ReviewIntent) -> Option<DeliveryHandle> {
        match intent {
            ReviewIntent::Confirm => self.confirm(),
            ReviewIntent::Retake => {
                self.retake();
                None
            }
        }
    }

    /// Send the confirmed scores and move to the success screen.
    ///
    /// The send is scheduled, not awaited: the flow reaches `Success`
    /// whatever happens to the delivery.
    pub fn confirm(&mut self) -> Option<DeliveryHandle> {
        if !self.guard(AppStep::Review, "confirm") {
            return None;
        }
        let handle = self.state.result.as_ref().map(|data| {
            let payload = SubmissionPayload::now(&self.state.cpf, data);
            let handle = self.dispatcher.dispatch(payload.clone());
            self.observer.on_submission_dispatched(&payload);
            handle
        });
        self.transition(AppStep::Success);
        handle
    }

    /// Discard the document and scores, keep the CPF, return to the form.
    pub fn retake(&mut self) {
        if !self.guard(AppStep::Review, "retake") {
            return;
        }
        self.state.file = None;
        self.state.preview = None;
        self.state.result = None;
        self.transition(AppStep::Form);
    }

    // ── Success ──────────────────────────────────────────────────────────

    /// Start over with an empty form, CPF included.
    pub fn submit_another(&mut self) {
        if !self.guard(AppStep::Success, "submit_another") {
            return;
        }
        self.state = FlowState::default();
        self.observer.on_step_change(AppStep::Success, AppStep::Form);
        info!("Flow: {} -> {}", AppStep::Success, AppStep::Form);
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn guard(&self, expected: AppStep, action: &str) -> bool {
        if self.state.step == expected {
            true
        } else {
            warn!(
                "Ignoring {} while on {} (only valid on {})",
                action, self.state.step, expected
            );
            false
        }
    }

    fn transition(&mut self, to: AppStep) {
        let from = self.state.step;
        self.state.step = to;
        info!("Flow: {} -> {}", from, to);
        self.observer.on_step_change(from, to);
    }
}
