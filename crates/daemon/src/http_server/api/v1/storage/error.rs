use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use store::error::StoreError;

/// Transport mapping for the store's error taxonomy. Provider failures
/// surface as 503 (storage unavailable) and are logged; everything
/// else is a deterministic result of current state and carries its own
/// message.
#[derive(Debug, thiserror::Error)]
pub enum StorageApiError {
    #[error(transparent)]
    Store(#[from] StoreError<sqlx::Error>),
}

impl IntoResponse for StorageApiError {
    fn into_response(self) -> Response {
        let StorageApiError::Store(err) = self;

        let status = match &err {
            StoreError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::NotHolder { .. } => StatusCode::FORBIDDEN,
            StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            e if e.is_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let msg = match &err {
            StoreError::Provider(e) => {
                tracing::error!("storage provider failure: {}", e);
                "storage unavailable".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "msg": msg }))).into_response()
    }
}
