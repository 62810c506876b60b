use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::admin::session::AdminError;
use crate::form::attachment::AttachmentError;
use crate::form::controller::FormError;
use crate::form::registry::RegistryError;
use crate::form::steps::{ErrorFieldMapper, FieldKey};
use crate::form::submission::SubmitError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level failures keyed by UI binding path.
    #[error("{message}")]
    InvalidFields {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The recruitment backend refused or could not be reached.
    #[error("Submission failed: {message}")]
    Submission {
        status: Option<u16>,
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(ref result) => AppError::InvalidFields {
                message: err.to_string(),
                fields: result
                    .field_errors()
                    .into_iter()
                    .map(|(path, message)| (path.to_string(), message))
                    .collect(),
            },
            FormError::NotOnFinalStep(_) | FormError::NotEditable(_) => {
                AppError::Validation(err.to_string())
            }
            FormError::Unauthorized => AppError::Unauthorized,
            FormError::Attachment(e) => e.into(),
            FormError::Submission(e) => e.into(),
        }
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        if let AttachmentError::Encoding(e) = &err {
            tracing::error!("Attachment encoding error: {e}");
        }
        let message = err.to_string();
        AppError::InvalidFields {
            fields: BTreeMap::from([(FieldKey::PdfData.path().to_string(), message.clone())]),
            message,
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        let fields = err
            .details
            .iter()
            .filter_map(|(key, message)| {
                ErrorFieldMapper::resolve(key)
                    .ok()
                    .map(|path| (path.to_string(), message.clone()))
            })
            .collect();
        AppError::Submission {
            status: err.status,
            message: err.message,
            fields,
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RegistryError::Busy(_) => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(_: AdminError) -> Self {
        AppError::Unauthorized
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            AppError::InvalidFields { message, fields } => (
                StatusCode::BAD_REQUEST,
                "INVALID_FIELDS",
                message,
                Some(fields),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            AppError::Submission {
                status,
                message,
                fields,
            } => {
                tracing::warn!("Submission error (backend status {status:?}): {message}");
                // Backend 4xx means the application itself was refused.
                let status = match status {
                    Some(s) if (400..500).contains(&s) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "SUBMISSION_FAILED", message, Some(fields))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(fields) = fields.filter(|f| !f.is_empty()) {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submission_error_keeps_backend_message() {
        let err: AppError = SubmitError::from_response(
            409,
            r#"{"error":"Duplicate email","details":{"email":"taken"}}"#,
        )
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Duplicate email");
        assert_eq!(body["error"]["fields"]["personalDetails.email"], "taken");
    }

    #[tokio::test]
    async fn test_transport_failure_is_bad_gateway() {
        let err: AppError = SubmitError::transport("connection refused").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].get("fields").is_none());
    }

    #[tokio::test]
    async fn test_attachment_error_points_at_pdf_field() {
        let err: AppError = AttachmentError::NoFileSelected.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["fields"]["professionalDetails.pdfData"],
            "Please upload a PDF file"
        );
    }

    #[test]
    fn test_busy_form_is_conflict() {
        let err: AppError = RegistryError::Busy(uuid::Uuid::nil()).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
