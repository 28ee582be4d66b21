// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{auth::Identity, state::AppState};

/// Identity of the connected wallet (anonymous when none is connected).
#[utoipa::path(
    get,
    path = "/v1/identity",
    tag = "Identity",
    responses((status = 200, body = Identity))
)]
pub async fn get_identity(State(state): State<AppState>) -> Json<Identity> {
    Json(state.vault.identity.identity())
}
