use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::FileNode;

use super::{storage_path, NodeParams, ScopeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Resolve a node's metadata; omitting `fid` addresses the scope root.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct MetadataRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// File node ID (defaults to the storage root)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub fid: Option<Uuid>,
}

pub async fn root_handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let node = state.tree().get_metadata(&params.scope(), None).await?;
    Ok((http::StatusCode::OK, Json(node)).into_response())
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let node = state
        .tree()
        .get_metadata(&params.scope(), Some(params.fid))
        .await?;
    Ok((http::StatusCode::OK, Json(node)).into_response())
}

impl ApiRequest for MetadataRequest {
    type Response = FileNode;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let rest = match self.fid {
            Some(fid) => format!("{}/", fid),
            None => String::new(),
        };
        let path = storage_path(self.pid, self.nid, &rest);
        client.get(base_url.join(&path).unwrap())
    }
}
