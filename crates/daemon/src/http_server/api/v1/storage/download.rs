use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::Revision;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Resolve the content reference for a download. The bytes themselves
/// live in the external object store; callers follow `content_ref`.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DownloadRequest {
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

    /// Revision sequence number (defaults to the latest)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    pub revision: Option<u64>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, StorageApiError> {
    let revision = state
        .revisions()
        .download(&params.scope(), params.fid, query.revision)
        .await?;
    Ok((http::StatusCode::OK, Json(revision)).into_response())
}

impl ApiRequest for DownloadRequest {
    type Response = Revision;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let rest = match self.revision {
            Some(seq) => format!("{}/download/?revision={}", self.fid, seq),
            None => format!("{}/download/", self.fid),
        };
        let path = storage_path(self.pid, self.nid, &rest);
        client.get(base_url.join(&path).unwrap())
    }
}
