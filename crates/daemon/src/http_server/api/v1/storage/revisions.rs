use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::Revision;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// List a node's revision history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RevisionsRequest {
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
pub struct RevisionsResponse {
    pub revisions: Vec<Revision>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let revisions = state.revisions().list(&params.scope(), params.fid).await?;
    Ok((http::StatusCode::OK, Json(RevisionsResponse { revisions })).into_response())
}

impl ApiRequest for RevisionsRequest {
    type Response = RevisionsResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/revisions/", self.fid));
        client.get(base_url.join(&path).unwrap())
    }
}
