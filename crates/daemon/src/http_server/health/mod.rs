use axum::routing::get;
use axum::Router;

mod data_source;
mod liveness;
mod readiness;

pub use data_source::{DataSource, DataSourceError, StateDataSource};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/readyz", get(readiness::handler))
        .with_state(state)
}
