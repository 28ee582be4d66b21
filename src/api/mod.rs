// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Identity,
    error::ErrorBody,
    models::{ManualTableRequest, RefreshResponse, TableResponse, UploadResponse},
    state::AppState,
    storage::{AuditEvent, AuditEventType},
    vault::{Category, DeleteOutcome, ListView, ListedEntry, UploadReceipt, UploadSnapshot, UploadState},
};

pub mod health;
pub mod identity;
pub mod upload;
pub mod vault;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/identity", get(identity::get_identity))
        .route("/vault/files", post(upload::upload_file))
        .route(
            "/vault/upload",
            get(upload::upload_status).delete(upload::discard_upload),
        )
        .route("/vault/upload/table", post(upload::provide_table))
        .route("/vault/entries", get(vault::list_entries))
        .route("/vault/entries/{entry_id}", delete(vault::delete_entry))
        .route("/vault/refresh", post(vault::refresh))
        .route(
            "/vault/table",
            get(vault::get_table)
                .put(vault::set_table)
                .delete(vault::forget_table),
        )
        .route("/vault/tables", post(vault::create_table))
        .route("/vault/audit", get(vault::audit_events));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        identity::get_identity,
        upload::upload_file,
        upload::upload_status,
        upload::provide_table,
        upload::discard_upload,
        vault::list_entries,
        vault::delete_entry,
        vault::refresh,
        vault::get_table,
        vault::set_table,
        vault::forget_table,
        vault::create_table,
        vault::audit_events
    ),
    components(
        schemas(
            Identity,
            Category,
            ErrorBody,
            UploadState,
            UploadSnapshot,
            UploadReceipt,
            UploadResponse,
            ManualTableRequest,
            ListedEntry,
            ListView,
            DeleteOutcome,
            TableResponse,
            RefreshResponse,
            AuditEvent,
            AuditEventType,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Identity", description = "Connected wallet identity"),
        (name = "Upload", description = "Encrypt, sign and store documents"),
        (name = "Vault", description = "List, filter and delete stored entries")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn app() -> (tempfile::TempDir, Harness, Router) {
        let dir = tempfile::TempDir::new().unwrap();
        let harness = Harness::new().await;
        let app = router(AppState::for_tests(&harness, dir.path()));
        (dir, harness, app)
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn identity_and_health_are_routed() {
        let (_dir, _harness, app) = app().await;

        let response = app
            .clone()
            .oneshot(Request::get("/v1/identity").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["isAuthenticated"], true);

        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_pauses_then_entries_list_empty() {
        let (_dir, _harness, app) = app().await;

        let request = Request::post("/v1/vault/files?name=scan.png&category=Realtors")
            .header(CONTENT_TYPE, "image/png")
            .body(Body::from(vec![0x89, b'P', b'N', b'G']))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json(response).await;
        assert_eq!(body["state"], "awaiting_manual_table");
        assert_eq!(
            body["status"],
            "Could not find a Vault Table. Please enter it manually below."
        );

        let response = app
            .oneshot(Request::get("/v1/vault/entries").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unconfirmed_delete_is_rejected() {
        let (_dir, _harness, app) = app().await;
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/v1/vault/entries/1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error_code"], "confirmation_required");
    }

    #[test]
    fn openapi_lists_vault_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/vault/files"));
        assert!(doc.paths.paths.contains_key("/v1/vault/entries/{entry_id}"));
    }
}
