use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::FileNode;

use super::{storage_path, ScopeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Provision the storage root for a scope. Idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct InitRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let root = state.tree().init(&params.scope()).await?;
    Ok((http::StatusCode::OK, Json(root)).into_response())
}

impl ApiRequest for InitRequest {
    type Response = FileNode;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, "");
        client.post(base_url.join(&path).unwrap())
    }
}
