//! Multi-step application form controller.
//!
//! One controller serves all three flows; the flow decides the source tag,
//! how the job title is obtained, and whether an admin session is required.
//!
//! Transitions:
//!   Step(n) --advance, valid, n < N--> Step(n+1)
//!   Step(n) --advance/submit, invalid--> Step(n), errors set
//!   Step(N) --submit, valid--> backend --ok--> Step(1), reset
//!                                      --err--> Step(N), draft kept
//!   Step(n) --retreat, n > 1--> Step(n-1), errors untouched
//!
//! All mutating operations take `&mut self`, so a form cannot have two
//! transitions or submissions in flight at once.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::admin::session::AdminSession;
use crate::form::attachment::{Attachment, AttachmentEncoder, AttachmentError, SelectedFile};
use crate::form::draft::{CandidateDraft, Source};
use crate::form::lookups::{LookupService, Lookups};
use crate::form::state::FormState;
use crate::form::steps::{ErrorFieldMapper, FieldKey, FieldPath, Step};
use crate::form::submission::{SubmissionAssembler, SubmitEndpoint, SubmitError};
use crate::form::validation::{StepValidator, ValidationResult};

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please correct the highlighted fields")]
    Invalid(ValidationResult),

    #[error("Submission is only possible from the final step (currently on step {})", .0.index())]
    NotOnFinalStep(Step),

    #[error("'{0}' cannot be edited in this form")]
    NotEditable(FieldKey),

    #[error("Admin session is missing or expired")]
    Unauthorized,

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Submission(#[from] SubmitError),
}

/// Which application flow a form belongs to.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Open résumé upload, not tied to a vacancy.
    General,
    /// Application to an advertised vacancy; the title comes from the listing.
    Vacancy { job_title: String },
    /// Application entered by an admin on a candidate's behalf.
    Admin { session: AdminSession },
}

impl Flow {
    pub fn source(&self) -> Source {
        match self {
            Flow::General => Source::General,
            Flow::Vacancy { .. } => Source::Vacancy,
            Flow::Admin { .. } => Source::Admin,
        }
    }

    pub fn admin_session(&self) -> Option<&AdminSession> {
        match self {
            Flow::Admin { session } => Some(session),
            _ => None,
        }
    }
}

pub struct ApplicationForm {
    flow: Flow,
    state: FormState,
    validator: StepValidator,
    encoder: AttachmentEncoder,
    attachment: Option<Attachment>,
    submitter: Arc<dyn SubmitEndpoint>,
}

impl ApplicationForm {
    /// Creates a form at step 1 and fetches the lookup lists once.
    pub async fn mount(
        flow: Flow,
        lookups: &dyn LookupService,
        submitter: Arc<dyn SubmitEndpoint>,
        encoder: AttachmentEncoder,
    ) -> Self {
        let Lookups {
            degrees,
            job_positions,
        } = Lookups::load(lookups).await;

        info!("Mounted {} application form", flow.source().as_str());

        Self {
            validator: StepValidator::new(flow.source(), degrees, job_positions),
            flow,
            state: FormState::new(),
            encoder,
            attachment: None,
            submitter,
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn source(&self) -> Source {
        self.flow.source()
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step()
    }

    pub fn draft(&self) -> &CandidateDraft {
        self.state.draft()
    }

    pub fn field_errors(&self) -> &BTreeMap<FieldPath, String> {
        self.state.field_errors()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn degrees(&self) -> &[String] {
        self.validator.degrees()
    }

    pub fn job_positions(&self) -> &[String] {
        self.validator.job_positions()
    }

    /// Title the application will be filed under, if the flow has one.
    pub fn job_title(&self) -> Option<&str> {
        match &self.flow {
            Flow::General => None,
            Flow::Vacancy { job_title } => Some(job_title.as_str()),
            Flow::Admin { .. } => self.state.draft().professional_details.job_title.as_deref(),
        }
    }

    /// Updates a text field of the draft. Errors are left until the step is
    /// validated again.
    pub fn set_field(&mut self, key: FieldKey, value: String) -> Result<(), FormError> {
        if key == FieldKey::JobTitle && self.source() != Source::Admin {
            return Err(FormError::NotEditable(key));
        }
        if !self.state.draft_mut().set_field(key, value) {
            return Err(FormError::NotEditable(key));
        }
        Ok(())
    }

    /// Validates the current step without moving.
    pub fn validate_current(&self) -> ValidationResult {
        self.validator.validate(self.state.draft(), self.state.current_step())
    }

    /// Validates the current step and moves forward on success. On the last
    /// step a successful validation stays put; `submit` finishes the form.
    pub fn advance(&mut self) -> Result<Step, FormError> {
        let step = self.state.current_step();
        let result = self.validate_current();
        self.record_validation(step, &result);

        if !result.valid() {
            debug!(
                "Step {} rejected: {} field error(s)",
                step.index(),
                result.errors().len()
            );
            return Err(FormError::Invalid(result));
        }

        let next = self.state.advance();
        debug!("Step {} -> {}", step.index(), next.index());
        Ok(next)
    }

    /// Moves back one step. Errors are left untouched.
    pub fn retreat(&mut self) -> Step {
        self.state.retreat()
    }

    /// Checks and encodes the selected résumé. Presence and type are checked
    /// before any read so the error surfaces immediately. A failed selection
    /// drops any previously encoded attachment.
    pub async fn select_attachment(
        &mut self,
        file: Option<SelectedFile>,
    ) -> Result<&Attachment, FormError> {
        let path = FieldKey::PdfData.path();

        if let Err(e) = AttachmentEncoder::check(file.as_ref()) {
            self.attachment = None;
            self.state.set_field_error(path, e.to_string());
            return Err(e.into());
        }

        match self.encoder.encode(file).await {
            Ok(attachment) => {
                self.state.clear_field_error(path);
                Ok(&*self.attachment.insert(attachment))
            }
            Err(e) => {
                self.attachment = None;
                self.state.set_field_error(path, e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Final-step submission.
    ///
    /// Re-validates the step, requires an encoded attachment, assembles the
    /// payload and sends it. Success resets the form to its initial state;
    /// failure keeps the draft and attachment for a retry and surfaces the
    /// backend's message.
    pub async fn submit(&mut self) -> Result<serde_json::Value, FormError> {
        let step = self.state.current_step();
        if !step.is_last() {
            return Err(FormError::NotOnFinalStep(step));
        }

        if let Some(session) = self.flow.admin_session() {
            if session.is_expired(Utc::now()) {
                return Err(FormError::Unauthorized);
            }
        }

        let result = self.validate_current();
        self.record_validation(step, &result);
        if !result.valid() {
            return Err(FormError::Invalid(result));
        }

        let payload = match SubmissionAssembler::assemble(
            self.state.draft(),
            self.attachment.as_ref(),
            self.source(),
            self.job_title(),
        ) {
            Ok(payload) => payload,
            Err(e) => {
                self.state.set_field_error(FieldKey::PdfData.path(), e.to_string());
                return Err(e.into());
            }
        };

        info!("Submitting {} application", payload.source().as_str());

        match self.submitter.submit(&payload).await {
            Ok(record) => {
                info!("{} application accepted", payload.source().as_str());
                self.state.reset();
                self.attachment = None;
                Ok(record)
            }
            Err(e) => {
                warn!("Submission rejected (status {:?}): {}", e.status, e.message);
                for (key, message) in &e.details {
                    match ErrorFieldMapper::resolve(key) {
                        Ok(path) => self.state.set_field_error(path, message.clone()),
                        Err(_) => debug!("Ignoring backend detail for unknown field '{key}'"),
                    }
                }
                Err(FormError::Submission(e))
            }
        }
    }

    /// Replaces the step's validation errors, keeping any attachment error.
    fn record_validation(&mut self, step: Step, result: &ValidationResult) {
        let mut errors = result.field_errors();
        let pdf_path = FieldKey::PdfData.path();
        if pdf_path.step() == step {
            if let Some(message) = self.state.field_errors().get(&pdf_path) {
                errors.insert(pdf_path, message.clone());
            }
        }
        self.state.set_field_errors(step, errors);
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::form::submission::SubmissionPayload;

    /// Records payloads and answers with a fixed outcome.
    pub struct FakeSubmitter {
        pub received: Mutex<Vec<SubmissionPayload>>,
        pub outcome: Mutex<Result<serde_json::Value, SubmitError>>,
    }

    impl FakeSubmitter {
        pub fn accepting() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                outcome: Mutex::new(Ok(serde_json::json!({"_id": "abc123"}))),
            })
        }

        pub fn rejecting(error: SubmitError) -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                outcome: Mutex::new(Err(error)),
            })
        }

        pub fn set_outcome(&self, outcome: Result<serde_json::Value, SubmitError>) {
            *self.outcome.lock().unwrap() = outcome;
        }

        pub fn received(&self) -> Vec<SubmissionPayload> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubmitEndpoint for FakeSubmitter {
        async fn submit(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<serde_json::Value, SubmitError> {
            self.received.lock().unwrap().push(payload.clone());
            self.outcome.lock().unwrap().clone()
        }
    }
}
