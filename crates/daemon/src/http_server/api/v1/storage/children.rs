use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::FileNode;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// List a folder's direct children, insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ChildrenRequest {
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
pub struct ChildrenResponse {
    pub children: Vec<FileNode>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let children = state.tree().children(&params.scope(), params.fid).await?;
    Ok((http::StatusCode::OK, Json(ChildrenResponse { children })).into_response())
}

impl ApiRequest for ChildrenRequest {
    type Response = ChildrenResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/children/", self.fid));
        client.get(base_url.join(&path).unwrap())
    }
}
