use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::checkout::BulkRent;

use super::{storage_path, ScopeParams, StorageApiError};
use crate::http_server::api::auth::Caller;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Rent every node under the scope root for the caller. Partial
/// failure is per node: the response lists each node's outcome.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RentAllRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// Advisory checkout lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentAllBody {
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentAllResponse {
    pub results: Vec<BulkRent>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
    Caller(caller): Caller,
    body: Option<Json<RentAllBody>>,
) -> Result<impl IntoResponse, StorageApiError> {
    let ttl = body
        .and_then(|Json(b)| b.ttl_secs)
        .map(|secs| time::Duration::seconds(secs as i64));
    let results = state
        .checkouts()
        .rent_all(&params.scope(), &caller, ttl)
        .await?;
    Ok((http::StatusCode::OK, Json(RentAllResponse { results })).into_response())
}

impl ApiRequest for RentAllRequest {
    type Response = RentAllResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, "rent_all/");
        let body = RentAllBody {
            ttl_secs: self.ttl_secs,
        };
        client.post(base_url.join(&path).unwrap()).json(&body)
    }
}
