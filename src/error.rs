/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status + {success, data, message} envelope)
 * - RepoError / TokenError を統一的に変換
 *
 * Messages are Spanish on purpose: the existing frontends display them verbatim.
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ApiResponse;
use crate::repos::error::RepoError;
use crate::services::auth::token::TokenError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// No (valid) session for a route that requires one.
    #[error("No autenticado. Inicie sesión para continuar.")]
    Unauthenticated,

    /// Bearer token carries the logout marker.
    #[error("Sesión cerrada. Inicie sesión nuevamente.")]
    SessionClosed,

    /// 401 with a flow-specific message (login failures etc.).
    #[error("{0}")]
    Unauthorized(String),

    #[error("No tiene permisos para realizar esta acción.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("El cuerpo de la solicitud excede el tamaño permitido")]
    PayloadTooLarge,

    #[error("Error interno del servidor")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::SessionClosed | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::<()>::error(self.to_string());

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::bad_request("El nombre de usuario ya está en uso"),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database operation failed");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        // 詳細 (serde の位置情報など) は log のみ。client には固定文言を返す
        tracing::debug!(error = %rejection.body_text(), "request body rejected");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::bad_request("El cuerpo de la solicitud no es un JSON válido")
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        // Only the signing path reaches here; verification failures never become AppError.
        tracing::error!(error = %e, "failed to sign token");
        AppError::Internal
    }
}
