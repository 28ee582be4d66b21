// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use chrono::{NaiveDate, Utc};

use crate::{
    error::{ApiError, ErrorBody},
    models::{
        AuditQuery, DeleteQuery, EntriesQuery, ManualTableRequest, RefreshResponse, TableResponse,
    },
    state::AppState,
    storage::{AuditEvent, AuditRepository, StorageError},
    vault::{CategoryFilter, DeleteOutcome, ListView, VaultError},
};

/// The owner's entries, newest first, optionally filtered by category.
#[utoipa::path(
    get,
    path = "/v1/vault/entries",
    params(EntriesQuery),
    tag = "Vault",
    responses(
        (status = 200, body = ListView),
        (status = 401, body = ErrorBody),
        (status = 502, description = "Table service read failed", body = ErrorBody)
    )
)]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<ListView>, ApiError> {
    let filter = match query.category.as_deref() {
        Some(raw) => raw.parse::<CategoryFilter>()?,
        None => CategoryFilter::All,
    };

    if query.refresh || !state.list.entries(CategoryFilter::All).loaded {
        state.list.refresh().await?;
    }
    Ok(Json(state.list.entries(filter)))
}

/// Delete one entry. Requires `confirm=true` and the target network.
#[utoipa::path(
    delete,
    path = "/v1/vault/entries/{entry_id}",
    params(
        ("entry_id" = u64, Path, description = "Row id within the vault table"),
        DeleteQuery
    ),
    tag = "Vault",
    responses(
        (status = 200, body = DeleteOutcome),
        (status = 400, description = "Not confirmed", body = ErrorBody),
        (status = 404, description = "No vault table known", body = ErrorBody),
        (status = 409, description = "Wrong network", body = ErrorBody),
        (status = 502, description = "Table service rejected the delete", body = ErrorBody)
    )
)]
pub async fn delete_entry(
    Path(entry_id): Path<u64>,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    if !query.confirm {
        return Err(VaultError::ConfirmationRequired.into());
    }
    let list = state.list.clone();
    let outcome = tokio::spawn(async move { list.delete(entry_id, true).await })
        .await
        .map_err(|e| ApiError::internal(format!("delete task failed: {e}")))??;
    Ok(Json(outcome))
}

/// Broadcast the vault-refresh event.
#[utoipa::path(
    post,
    path = "/v1/vault/refresh",
    tag = "Vault",
    responses((status = 200, body = RefreshResponse))
)]
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    Json(RefreshResponse {
        listeners: state.vault.bus.publish(),
    })
}

/// The cached vault table reference.
#[utoipa::path(
    get,
    path = "/v1/vault/table",
    tag = "Vault",
    responses((status = 200, body = TableResponse))
)]
pub async fn get_table(State(state): State<AppState>) -> Result<Json<TableResponse>, ApiError> {
    let table = state.vault.resolver.cached()?;
    Ok(Json(TableResponse {
        table: table.map(|t| t.to_string()),
    }))
}

/// Set the vault table by hand.
#[utoipa::path(
    put,
    path = "/v1/vault/table",
    request_body = ManualTableRequest,
    tag = "Vault",
    responses(
        (status = 200, body = TableResponse),
        (status = 404, description = "Not a usable table name", body = ErrorBody)
    )
)]
pub async fn set_table(
    State(state): State<AppState>,
    Json(request): Json<ManualTableRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let owner = state.vault.identity.session().map(|s| s.address());
    let table = state.vault.resolver.remember(&request.table_name, owner)?;
    state.vault.bus.publish();
    Ok(Json(TableResponse {
        table: Some(table.to_string()),
    }))
}

/// Forget the cached vault table; the next load rediscovers it.
#[utoipa::path(
    delete,
    path = "/v1/vault/table",
    tag = "Vault",
    responses((status = 204), (status = 500, body = ErrorBody))
)]
pub async fn forget_table(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.vault.resolver.forget()?;
    state.vault.bus.publish();
    Ok(StatusCode::NO_CONTENT)
}

/// Create a new vault table owned by the connected wallet and cache it.
#[utoipa::path(
    post,
    path = "/v1/vault/tables",
    tag = "Vault",
    responses(
        (status = 201, body = TableResponse),
        (status = 401, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
pub async fn create_table(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TableResponse>), ApiError> {
    let session = state
        .vault
        .identity
        .session()
        .ok_or(VaultError::NotAuthenticated)?;
    let table = state.vault.resolver.create(session.address()).await?;
    state.vault.bus.publish();
    Ok((
        StatusCode::CREATED,
        Json(TableResponse {
            table: Some(table.to_string()),
        }),
    ))
}

/// Audit events recorded for the connected wallet on one UTC day.
#[utoipa::path(
    get,
    path = "/v1/vault/audit",
    params(AuditQuery),
    tag = "Vault",
    responses(
        (status = 200, body = Vec<AuditEvent>),
        (status = 400, description = "Malformed date", body = ErrorBody),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn audit_events(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    let session = state
        .vault
        .identity
        .session()
        .ok_or(VaultError::NotAuthenticated)?;
    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, "invalid_date", format!("{raw}: {e}"))
        })?,
        None => Utc::now().date_naive(),
    };

    let repo = AuditRepository::new(&state.storage);
    let owner = session.address().to_string();
    match repo.search_by_owner(&owner, &date.format("%Y-%m-%d").to_string()) {
        Ok(events) => Ok(Json(events)),
        Err(StorageError::NotFound(_)) => Ok(Json(Vec::new())),
        Err(e) => Err(ApiError::internal(format!("audit log unreadable: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AuditEventType, AuditTrail};
    use crate::testing::{Harness, OTHER, OWNER};
    use crate::vault::{Category, StagedFile, UploadOutcome};

    async fn setup() -> (tempfile::TempDir, Harness, AppState) {
        let dir = tempfile::TempDir::new().unwrap();
        let harness = Harness::new().await;
        let state = AppState::for_tests(&harness, dir.path());
        (dir, harness, state)
    }

    async fn upload(state: &AppState, name: &str, category: Category) -> u64 {
        let file = StagedFile::new(name, None, b"data".to_vec()).unwrap();
        match state.upload.upload(file, category).await.unwrap() {
            UploadOutcome::Stored(receipt) => receipt.entry_id.unwrap(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_table_then_list_filtered() {
        let (_dir, _harness, state) = setup().await;

        let (status, Json(created)) = create_table(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let Json(cached) = get_table(State(state.clone())).await.unwrap();
        assert_eq!(cached, created);

        upload(&state, "nda.pdf", Category::Lawyers).await;
        upload(&state, "w2.png", Category::Accountants).await;

        let Json(view) = list_entries(
            State(state.clone()),
            Query(EntriesQuery {
                category: Some("Lawyers".to_string()),
                refresh: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].name, "nda.pdf");

        let Json(all) = list_entries(State(state), Query(EntriesQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.entries.len(), 2);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let (_dir, _harness, state) = setup().await;
        create_table(State(state.clone())).await.unwrap();
        let id = upload(&state, "deed.pdf", Category::Realtors).await;

        let err = delete_entry(
            Path(id),
            State(state.clone()),
            Query(DeleteQuery { confirm: false }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let Json(outcome) = delete_entry(
            Path(id),
            State(state.clone()),
            Query(DeleteQuery { confirm: true }),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));

        let Json(view) = list_entries(State(state), Query(EntriesQuery::default()))
            .await
            .unwrap();
        assert!(view.entries.is_empty());
    }

    #[tokio::test]
    async fn set_table_sanitizes_and_rejects_garbage() {
        let (_dir, harness, state) = setup().await;
        let table = harness.tables.create_for(OWNER).await;

        let Json(response) = set_table(
            State(state.clone()),
            Json(ManualTableRequest {
                table_name: format!("Vault Table Found: {table}"),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.table.as_deref(), Some(table.as_str()));

        assert_eq!(
            forget_table(State(state.clone())).await.unwrap(),
            StatusCode::NO_CONTENT
        );
        let Json(cached) = get_table(State(state.clone())).await.unwrap();
        assert!(cached.table.is_none());

        let err = set_table(
            State(state),
            Json(ManualTableRequest {
                table_name: "Vault Table Created:".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_requires_a_wallet() {
        let (_dir, harness, state) = setup().await;
        harness.identity.sign_out();
        let err = list_entries(State(state), Query(EntriesQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn audit_lists_own_events_for_the_day() {
        let (_dir, _harness, state) = setup().await;
        let trail = AuditTrail::new(state.storage.clone());
        trail.record(AuditEvent::new(AuditEventType::TableCreated).with_owner(OWNER.to_string()));
        trail.record(AuditEvent::new(AuditEventType::UploadStored).with_owner(OTHER.to_string()));

        let Json(events) = audit_events(State(state.clone()), Query(AuditQuery::default()))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::TableCreated);

        let Json(events) = audit_events(
            State(state.clone()),
            Query(AuditQuery {
                date: Some("2001-01-01".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(events.is_empty());

        let err = audit_events(
            State(state),
            Query(AuditQuery {
                date: Some("yesterday".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "invalid_date");
    }

    #[tokio::test]
    async fn refresh_reports_listener_count() {
        let (_dir, _harness, state) = setup().await;
        let _rx = state.vault.bus.subscribe();
        let Json(response) = refresh(State(state)).await;
        assert_eq!(response.listeners, 1);
    }
}
