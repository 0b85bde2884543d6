use axum::Router;

pub mod storage;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .merge(storage::router(state.clone()))
        .with_state(state)
}
