use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::{ChildAttrs, FileNode, NodeKind};

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Insert a new child under a folder.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct CreateChildRequest {
    /// Project ID
    #[arg(long)]
    pub pid: Uuid,

    /// Optional sub-node ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub nid: Option<Uuid>,

    /// Parent folder ID
    #[arg(long)]
    pub fid: Uuid,

    /// Name for the new node
    #[arg(long)]
    pub name: String,

    /// Whether to create a folder instead of a file
    #[serde(default)]
    #[arg(long)]
    pub folder: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChildBody {
    pub name: String,
    #[serde(default)]
    pub kind: Option<NodeKind>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
    Json(body): Json<CreateChildBody>,
) -> Result<impl IntoResponse, StorageApiError> {
    let attrs = ChildAttrs {
        name: body.name,
        kind: body.kind.unwrap_or(NodeKind::File),
    };
    let node = state
        .tree()
        .create_child(&params.scope(), params.fid, attrs)
        .await?;
    Ok((http::StatusCode::CREATED, Json(node)).into_response())
}

impl ApiRequest for CreateChildRequest {
    type Response = FileNode;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/children/", self.fid));
        let body = CreateChildBody {
            name: self.name,
            kind: Some(if self.folder {
                NodeKind::Folder
            } else {
                NodeKind::File
            }),
        };
        client.post(base_url.join(&path).unwrap()).json(&body)
    }
}
