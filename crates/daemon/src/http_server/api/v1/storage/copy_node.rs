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

/// Copy hook: deep-clone a subtree under a new parent. Clones carry
/// only the latest revision reference and never checkout state.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct CopyRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// Node to copy
    #[arg(long)]
    pub fid: Uuid,

    /// Destination folder
    #[arg(long)]
    pub to_parent: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyBody {
    pub fid: Uuid,
    pub to_parent: Uuid,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
    Json(body): Json<CopyBody>,
) -> Result<impl IntoResponse, StorageApiError> {
    let copied = state
        .tree()
        .copy(&params.scope(), body.fid, body.to_parent)
        .await?;
    Ok((http::StatusCode::CREATED, Json(copied)).into_response())
}

impl ApiRequest for CopyRequest {
    type Response = FileNode;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, "hooks/copy/");
        let body = CopyBody {
            fid: self.fid,
            to_parent: self.to_parent,
        };
        client.post(base_url.join(&path).unwrap()).json(&body)
    }
}
