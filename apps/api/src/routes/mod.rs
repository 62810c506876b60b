pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::admin::handlers as admin;
use crate::form::handlers;
use crate::state::AppState;

/// Multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/steps", get(handlers::handle_list_steps))
        // Admin session
        .route(
            "/api/v1/admin/session",
            post(admin::handle_login).delete(admin::handle_logout),
        )
        .route("/api/v1/admin/forms", post(admin::handle_create_admin_form))
        // Form lifecycle
        .route("/api/v1/forms", post(handlers::handle_create_form))
        .route(
            "/api/v1/forms/:id",
            get(handlers::handle_get_form).delete(handlers::handle_delete_form),
        )
        .route(
            "/api/v1/forms/:id/fields",
            patch(handlers::handle_update_fields),
        )
        .route("/api/v1/forms/:id/advance", post(handlers::handle_advance))
        .route("/api/v1/forms/:id/retreat", post(handlers::handle_retreat))
        .route(
            "/api/v1/forms/:id/attachment",
            put(handlers::handle_select_attachment)
                .delete(handlers::handle_clear_attachment)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/forms/:id/submit", post(handlers::handle_submit))
        .with_state(state)
}
