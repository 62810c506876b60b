use std::sync::Arc;

use crate::admin::session::AdminSessions;
use crate::config::Config;
use crate::form::lookups::LookupService;
use crate::form::registry::FormRegistry;
use crate::form::submission::SubmitEndpoint;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Live form sessions, one per mounted form.
    pub forms: FormRegistry,
    pub admin: AdminSessions,
    /// Backend collaborators. `BackendClient` in production, fakes in tests.
    pub submitter: Arc<dyn SubmitEndpoint>,
    pub lookups: Arc<dyn LookupService>,
}
