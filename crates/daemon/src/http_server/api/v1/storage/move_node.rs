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

/// Move hook: re-parent a node within its scope. Conflicts on cyclic
/// placements and on checked-out destination folders.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct MoveRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// Node to move
    #[arg(long)]
    pub fid: Uuid,

    /// Destination folder
    #[arg(long)]
    pub to_parent: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveBody {
    pub fid: Uuid,
    pub to_parent: Uuid,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
    Json(body): Json<MoveBody>,
) -> Result<impl IntoResponse, StorageApiError> {
    let moved = state
        .tree()
        .mv(&params.scope(), body.fid, body.to_parent)
        .await?;
    Ok((http::StatusCode::OK, Json(moved)).into_response())
}

impl ApiRequest for MoveRequest {
    type Response = FileNode;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, "hooks/move/");
        let body = MoveBody {
            fid: self.fid,
            to_parent: self.to_parent,
        };
        client.post(base_url.join(&path).unwrap()).json(&body)
    }
}
