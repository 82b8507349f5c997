use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::cache::CacheError;
use crate::source::SourceError;

#[derive(Debug)]
pub enum AppError {
    /// Contenido no encontrado upstream
    NotFound { group: String, item: String },

    /// Parametros invalidos
    BadRequest(String),

    /// El upstream fallo y no habia valor en cache
    BadGateway(String),

    /// Error interno
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Upstream(source) => match source.downcast_ref::<SourceError>() {
                Some(SourceError::NotFound { group, item }) => AppError::NotFound {
                    group: group.clone(),
                    item: item.clone(),
                },
                _ => AppError::BadGateway(format!("{source:#}")),
            },
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::NotFound { group, item } => (
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("Content not found for {}/{}", group, item),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "Bad Gateway", msg),
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    msg,
                )
            },
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
