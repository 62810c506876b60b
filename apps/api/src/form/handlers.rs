//! Axum route handlers for the application form API.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::info;
use uuid::Uuid;

use crate::admin::bearer_token;
use crate::errors::AppError;
use crate::form::attachment::{AttachmentEncoder, SelectedFile};
use crate::form::controller::{ApplicationForm, Flow, FormError};
use crate::form::draft::{CandidateDraft, Source};
use crate::form::steps::{FieldKey, FieldPath, StepDefinition, STEPS};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormRequest {
    pub source: Source,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub file_name: String,
    pub content_type: String,
    pub encoded_length: usize,
}

/// Everything a view needs to render the current step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub form_id: Uuid,
    pub source: Source,
    pub current_step: usize,
    pub step_title: &'static str,
    pub total_steps: usize,
    pub job_title: Option<String>,
    pub draft: CandidateDraft,
    pub field_errors: BTreeMap<FieldPath, String>,
    pub degrees: Vec<String>,
    pub job_positions: Vec<String>,
    pub attachment: Option<AttachmentSummary>,
}

impl FormView {
    pub fn new(form_id: Uuid, form: &ApplicationForm) -> Self {
        let step = form.current_step();
        Self {
            form_id,
            source: form.source(),
            current_step: step.index(),
            step_title: step.title(),
            total_steps: STEPS.len(),
            job_title: form.job_title().map(str::to_string),
            draft: form.draft().clone(),
            field_errors: form.field_errors().clone(),
            degrees: form.degrees().to_vec(),
            job_positions: form.job_positions().to_vec(),
            attachment: form.attachment().map(|a| AttachmentSummary {
                file_name: a.file_name.clone(),
                content_type: a.content_type.clone(),
                encoded_length: a.data.len(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub record: serde_json::Value,
    pub form: FormView,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Mounts a form for `flow` and registers it.
pub(crate) async fn mount_form(
    state: &AppState,
    flow: Flow,
) -> Result<(StatusCode, Json<FormView>), AppError> {
    let form = ApplicationForm::mount(
        flow,
        state.lookups.as_ref(),
        state.submitter.clone(),
        AttachmentEncoder::new(state.config.max_upload_bytes),
    )
    .await;

    let id = Uuid::new_v4();
    let view = FormView::new(id, &form);
    state.forms.insert(id, form);
    info!("Form {id} mounted ({} live)", state.forms.len());
    Ok((StatusCode::CREATED, Json(view)))
}

/// Locks the form for this request. Admin-entered forms also need the
/// bearer token of the session that created them, and that session must
/// still be live.
fn acquire(
    state: &AppState,
    id: Uuid,
    headers: &HeaderMap,
) -> Result<OwnedMutexGuard<ApplicationForm>, AppError> {
    let form = state.forms.acquire(id)?;
    if let Some(session) = form.flow().admin_session() {
        let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
        if token != session.token {
            return Err(AppError::Unauthorized);
        }
        state.admin.validate(token, Utc::now())?;
    }
    Ok(form)
}

/// Pulls the first file part out of a multipart body. An empty part (a
/// file input submitted with nothing chosen) counts as no selection.
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<SelectedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        if file_name.is_empty() && data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(SelectedFile::from_bytes(file_name, content_type, data)));
    }
    Ok(None)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/steps
pub async fn handle_list_steps() -> Json<&'static [StepDefinition]> {
    Json(&STEPS)
}

/// POST /api/v1/forms
///
/// Mounts a general or vacancy form. Admin-entered forms go through
/// /api/v1/admin/forms.
pub async fn handle_create_form(
    State(state): State<AppState>,
    Json(request): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormView>), AppError> {
    let flow = match request.source {
        Source::General => Flow::General,
        Source::Vacancy => {
            let job_title = request
                .job_title
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    AppError::Validation("jobTitle is required for vacancy applications".to_string())
                })?;
            Flow::Vacancy { job_title }
        }
        Source::Admin => {
            return Err(AppError::Validation(
                "Admin applications are created via /api/v1/admin/forms".to_string(),
            ))
        }
    };

    mount_form(&state, flow).await
}

/// GET /api/v1/forms/:id
pub async fn handle_get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<FormView>, AppError> {
    let form = acquire(&state, id, &headers)?;
    Ok(Json(FormView::new(id, &form)))
}

/// PATCH /api/v1/forms/:id/fields
///
/// Body: `{ "<bareKey>": "<value>", ... }`. Unknown or read-only keys reject
/// the whole update.
pub async fn handle_update_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Result<Json<FormView>, AppError> {
    let updates = fields
        .into_iter()
        .map(|(key, value)| {
            key.parse::<FieldKey>()
                .map(|field| (field, value))
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut form = acquire(&state, id, &headers)?;
    let source = form.source();
    if let Some((field, _)) = updates.iter().find(|(field, _)| {
        *field == FieldKey::PdfData || (*field == FieldKey::JobTitle && source != Source::Admin)
    }) {
        return Err(FormError::NotEditable(*field).into());
    }
    for (field, value) in updates {
        form.set_field(field, value)?;
    }
    Ok(Json(FormView::new(id, &form)))
}

/// POST /api/v1/forms/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<FormView>, AppError> {
    let mut form = acquire(&state, id, &headers)?;
    form.advance()?;
    Ok(Json(FormView::new(id, &form)))
}

/// POST /api/v1/forms/:id/retreat
pub async fn handle_retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<FormView>, AppError> {
    let mut form = acquire(&state, id, &headers)?;
    form.retreat();
    Ok(Json(FormView::new(id, &form)))
}

/// PUT /api/v1/forms/:id/attachment
///
/// Multipart body with a single file part.
pub async fn handle_select_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<FormView>, AppError> {
    let mut form = acquire(&state, id, &headers)?;
    let file = read_file_part(&mut multipart).await?;
    form.select_attachment(file).await?;
    Ok(Json(FormView::new(id, &form)))
}

/// DELETE /api/v1/forms/:id/attachment
pub async fn handle_clear_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<FormView>, AppError> {
    let mut form = acquire(&state, id, &headers)?;
    form.clear_attachment();
    Ok(Json(FormView::new(id, &form)))
}

/// POST /api/v1/forms/:id/submit
///
/// The form stays locked until the backend answers, so concurrent requests
/// for the same form get 409.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let mut form = acquire(&state, id, &headers)?;
    let record = form.submit().await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            record,
            form: FormView::new(id, &form),
        }),
    ))
}

/// DELETE /api/v1/forms/:id
pub async fn handle_delete_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    drop(acquire(&state, id, &headers)?);
    state.forms.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}
