//! Backend client: the single point of contact with the recruitment backend.
//!
//! Implements both collaborator contracts the form controller consumes:
//! `SubmitEndpoint` (store an application) and `LookupService` (degree and
//! job position lists).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::form::draft::Source;
use crate::form::lookups::{LookupError, LookupService};
use crate::form::submission::{SubmissionPayload, SubmitEndpoint, SubmitError};

const DEGREES_PATH: &str = "/api/degrees";
const JOB_POSITIONS_PATH: &str = "/api/positions";

fn submit_path(source: Source) -> &'static str {
    match source {
        Source::General => "/api/resumes",
        Source::Vacancy => "/api/applications",
        Source::Admin => "/api/admin/applications",
    }
}

/// Lookup entries arrive either as bare strings or as `{name}` documents.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupEntry {
    Plain(String),
    Named { name: String },
}

impl LookupEntry {
    fn into_name(self) -> String {
        match self {
            LookupEntry::Plain(name) | LookupEntry::Named { name } => name,
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    admin_token: Option<String>,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        admin_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_list(&self, list: &'static str, path: &str) -> Result<Vec<String>, LookupError> {
        let fail = |message: String| LookupError { list, message };

        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("backend returned {status}")));
        }

        let entries: Vec<LookupEntry> = response.json().await.map_err(|e| fail(e.to_string()))?;
        Ok(entries.into_iter().map(LookupEntry::into_name).collect())
    }
}

#[async_trait]
impl SubmitEndpoint for BackendClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<serde_json::Value, SubmitError> {
        let source = payload.source();
        let mut request = self.client.post(self.url(submit_path(source))).json(payload);
        if source == Source::Admin {
            if let Some(token) = &self.admin_token {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await.map_err(|e| {
            warn!("Backend unreachable: {e}");
            SubmitError::transport(format!("Could not reach the application service: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SubmitError::from_response(status.as_u16(), &body));
        }

        debug!("Backend accepted {} application ({status})", source.as_str());

        // An empty or non-JSON 2xx body still counts as success.
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl LookupService for BackendClient {
    async fn fetch_degrees(&self) -> Result<Vec<String>, LookupError> {
        self.fetch_list("degrees", DEGREES_PATH).await
    }

    async fn fetch_job_positions(&self) -> Result<Vec<String>, LookupError> {
        self.fetch_list("job positions", JOB_POSITIONS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::form::attachment::Attachment;
    use crate::form::draft::CandidateDraft;
    use crate::form::submission::SubmissionAssembler;

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    /// Starts an in-process stand-in for the recruitment backend.
    async fn spawn_backend(seen: Seen) -> String {
        let record = |path: &'static str, seen: Seen| {
            move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let duplicate = body["personalDetails"]["email"] == "taken@x.com";
                    seen.lock().unwrap().push((path.to_string(), auth, body));
                    if duplicate {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({"error": "Email already exists"})),
                        );
                    }
                    (StatusCode::CREATED, Json(json!({"_id": "665f1c"})))
                }
            }
        };

        let app = Router::new()
            .route("/api/degrees", get(|| async { Json(json!(["B.Tech", "MBA"])) }))
            .route(
                "/api/positions",
                get(|| async { Json(json!([{"name": "Recruiter"}, {"name": "Welder"}])) }),
            )
            .route("/api/resumes", post(record("/api/resumes", seen.clone())))
            .route(
                "/api/admin/applications",
                post(record("/api/admin/applications", seen.clone())),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> BackendClient {
        BackendClient::new(
            base_url,
            Some("backend-secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn payload(email: &str, source: Source) -> SubmissionPayload {
        let mut draft = CandidateDraft::default();
        draft.personal_details.email = email.to_string();
        let attachment = Attachment {
            file_name: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: "JVBERi0=".to_string(),
        };
        let job_title = (source == Source::Admin).then_some("Recruiter");
        SubmissionAssembler::assemble(&draft, Some(&attachment), source, job_title).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_plain_and_named_lookup_lists() {
        let base = spawn_backend(Seen::default()).await;
        let client = client(&base);
        assert_eq!(client.fetch_degrees().await.unwrap(), vec!["B.Tech", "MBA"]);
        assert_eq!(
            client.fetch_job_positions().await.unwrap(),
            vec!["Recruiter", "Welder"]
        );
    }

    #[tokio::test]
    async fn test_submit_posts_payload_to_source_route() {
        let seen = Seen::default();
        let base = spawn_backend(seen.clone()).await;

        let record = client(&base)
            .submit(&payload("jane@x.com", Source::General))
            .await
            .unwrap();
        assert_eq!(record["_id"], "665f1c");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "/api/resumes");
        assert_eq!(seen[0].1, None);
        assert_eq!(seen[0].2["professionalDetails"]["pdfData"]["fileName"], "cv.pdf");
    }

    #[tokio::test]
    async fn test_admin_submission_carries_bearer_token() {
        let seen = Seen::default();
        let base = spawn_backend(seen.clone()).await;

        client(&base)
            .submit(&payload("jane@x.com", Source::Admin))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "/api/admin/applications");
        assert_eq!(seen[0].1.as_deref(), Some("Bearer backend-secret"));
        assert_eq!(seen[0].2["jobTitle"], "Recruiter");
    }

    #[tokio::test]
    async fn test_backend_rejection_message_is_verbatim() {
        let base = spawn_backend(Seen::default()).await;
        let err = client(&base)
            .submit(&payload("taken@x.com", Source::General))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(409));
        assert_eq!(err.message, "Email already exists");
    }

    #[tokio::test]
    async fn test_missing_route_is_lookup_error() {
        let base = spawn_backend(Seen::default()).await;
        let client = client(&format!("{base}/nowhere"));
        let err = client.fetch_degrees().await.unwrap_err();
        assert_eq!(err.list, "degrees");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client = client("http://127.0.0.1:9");
        let err = client
            .submit(&payload("jane@x.com", Source::General))
            .await
            .unwrap_err();
        assert_eq!(err.status, None);
    }
}
