use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::checkout::BulkRelease;

use super::{storage_path, ScopeParams, StorageApiError};
use crate::http_server::api::auth::Caller;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Return every node under the scope root held by the caller. Nodes
/// held by someone else report Forbidden, per node.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ReturnAllRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnAllResponse {
    pub results: Vec<BulkRelease>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, StorageApiError> {
    let results = state
        .checkouts()
        .release_all(&params.scope(), &caller)
        .await?;
    Ok((http::StatusCode::OK, Json(ReturnAllResponse { results })).into_response())
}

impl ApiRequest for ReturnAllRequest {
    type Response = ReturnAllResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, "return_all/");
        client.post(base_url.join(&path).unwrap())
    }
}
