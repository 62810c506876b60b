//! Final payload assembly and the submit endpoint contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::attachment::{Attachment, AttachmentError};
use crate::form::draft::{CandidateDraft, EducationalDetails, PersonalDetails, Source};

/// Shown when the backend's failure body cannot be understood.
pub const GENERIC_SUBMIT_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalPayload {
    pub experience: String,
    pub source: Source,
    pub pdf_data: Attachment,
}

/// Body sent once per successful final-step submit. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub personal_details: PersonalDetails,
    pub educational_details: EducationalDetails,
    pub professional_details: ProfessionalPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl SubmissionPayload {
    pub fn source(&self) -> Source {
        self.professional_details.source
    }
}

/// Backend rejection or transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmitError {
    /// HTTP status, if a response arrived at all.
    pub status: Option<u16>,
    pub message: String,
    /// Backend field errors keyed by bare field name.
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Keeps the `field: "message"` entries of a details object. Other shapes
/// carry nothing a field can display.
fn string_details(details: Option<serde_json::Value>) -> BTreeMap<String, String> {
    match details {
        Some(serde_json::Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(message) => Some((key, message)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

impl SubmitError {
    /// Builds an error from a non-2xx response body shaped as
    /// `{error, details?}`. Anything else gets the generic message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.error.trim().is_empty() => Self {
                status: Some(status),
                message: parsed.error,
                details: string_details(parsed.details),
            },
            _ => Self {
                status: Some(status),
                message: GENERIC_SUBMIT_FAILURE.to_string(),
                details: BTreeMap::new(),
            },
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }
}

/// The backend collaborator that stores applications.
///
/// Carried in `AppState` as `Arc<dyn SubmitEndpoint>`.
#[async_trait]
pub trait SubmitEndpoint: Send + Sync {
    /// Returns the created record on 2xx.
    async fn submit(&self, payload: &SubmissionPayload)
        -> Result<serde_json::Value, SubmitError>;
}

pub struct SubmissionAssembler;

impl SubmissionAssembler {
    /// Merges the draft, the encoded attachment, the source tag and the job
    /// title (vacancy and admin applications only) into the wire payload.
    pub fn assemble(
        draft: &CandidateDraft,
        attachment: Option<&Attachment>,
        source: Source,
        job_title: Option<&str>,
    ) -> Result<SubmissionPayload, AttachmentError> {
        let attachment = attachment.ok_or(AttachmentError::NoFileSelected)?;

        Ok(SubmissionPayload {
            personal_details: draft.personal_details.clone(),
            educational_details: draft.educational_details.clone(),
            professional_details: ProfessionalPayload {
                experience: draft.professional_details.experience.clone(),
                source,
                pdf_data: attachment.clone(),
            },
            job_title: job_title.map(str::to_string),
        })
    }
}
