use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Delete a node and its subtree. Conflicts while any node in the
/// subtree is checked out.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeleteRequest {
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
pub struct DeleteResponse {
    /// Every node id removed, the addressed node included.
    pub deleted: Vec<Uuid>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let deleted = state.tree().delete(&params.scope(), params.fid).await?;
    Ok((http::StatusCode::OK, Json(DeleteResponse { deleted })).into_response())
}

impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/", self.fid));
        client.delete(base_url.join(&path).unwrap())
    }
}
