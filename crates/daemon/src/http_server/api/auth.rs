use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::request::Parts;
use http::StatusCode;

/// Caller identity, resolved from the `x-caller-id` header.
///
/// Identity is threaded explicitly into every operation that needs
/// one (rent, return, uploads); there is no ambient request context.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

pub const CALLER_HEADER: &str = "x-caller-id";

fn forbidden(msg: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(serde_json::json!({ "msg": msg }))).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match caller {
            Some(id) => Ok(Caller(id.to_string())),
            None => Err(forbidden("missing x-caller-id header")),
        }
    }
}

/// Elevated authorization for force operations: the request must carry
/// `Authorization: Bearer <token>` matching the configured admin
/// token. With no token configured, force operations are refused.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[async_trait]
impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<crate::http_server::Config>()
            .ok_or_else(|| forbidden("admin authorization unavailable"))?;

        let Some(expected) = config.admin_token.as_deref() else {
            return Err(forbidden("force operations are disabled"));
        };

        let presented = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == expected => Ok(Admin),
            _ => Err(forbidden("admin authorization required")),
        }
    }
}
