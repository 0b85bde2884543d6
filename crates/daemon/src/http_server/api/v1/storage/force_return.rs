use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::auth::Admin;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Release a checkout regardless of its holder. Requires the admin
/// bearer token; idempotent when the node is already available.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ForceReturnRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// File node ID
    #[arg(long)]
    pub fid: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceReturnResponse {
    pub fid: Uuid,
    pub released: bool,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
    _admin: Admin,
) -> Result<impl IntoResponse, StorageApiError> {
    state
        .checkouts()
        .force_release(&params.scope(), params.fid)
        .await?;
    Ok((
        http::StatusCode::OK,
        Json(ForceReturnResponse {
            fid: params.fid,
            released: true,
        }),
    )
        .into_response())
}

impl ApiRequest for ForceReturnRequest {
    type Response = ForceReturnResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/force_return/", self.fid));
        client.post(base_url.join(&path).unwrap())
    }
}
