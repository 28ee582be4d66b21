// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::vault::{UnknownCategory, VaultError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<VaultError> for ApiError {
    fn from(error: VaultError) -> Self {
        let status = match &error {
            VaultError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            VaultError::SignatureRejected => StatusCode::FORBIDDEN,
            VaultError::TableNotFound => StatusCode::NOT_FOUND,
            VaultError::WrongNetwork(_)
            | VaultError::UploadInProgress
            | VaultError::NothingToResume => StatusCode::CONFLICT,
            VaultError::UnsupportedFile(_) | VaultError::MetadataParseFailed => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            VaultError::ConfirmationRequired => StatusCode::BAD_REQUEST,
            VaultError::EncryptionFailed(_)
            | VaultError::StorageWriteFailed(_)
            | VaultError::StorageReadFailed(_)
            | VaultError::StorageDeleteFailed(_)
            | VaultError::NetworkUnavailable(_) => StatusCode::BAD_GATEWAY,
            VaultError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.error_code(), error.to_string())
    }
}

impl From<UnknownCategory> for ApiError {
    fn from(error: UnknownCategory) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "unknown_category",
            error.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
