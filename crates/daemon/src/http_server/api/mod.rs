use axum::Router;

pub mod auth;
pub mod client;
pub mod v1;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/v1", v1::router(state.clone()))
        .with_state(state)
}
