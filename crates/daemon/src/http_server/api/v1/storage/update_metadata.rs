use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::{FileNode, Revision};

use super::{ScopeParams, StorageApiError};
use crate::http_server::api::auth::Caller;
use crate::ServiceState;

/// External storage callback: the object store reports a rename, a new
/// content version, or both for a node it finished processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMetadataBody {
    pub fid: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_ref: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMetadataResponse {
    pub node: FileNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<ScopeParams>,
    Caller(caller): Caller,
    Json(body): Json<UpdateMetadataBody>,
) -> Result<impl IntoResponse, StorageApiError> {
    let scope = params.scope();

    if let Some(ref name) = body.name {
        state.tree().rename(&scope, body.fid, name).await?;
    }

    let revision = match body.content_ref {
        Some(ref content_ref) => Some(
            state
                .revisions()
                .add(
                    &scope,
                    body.fid,
                    content_ref,
                    body.checksum.as_deref(),
                    &caller,
                )
                .await?,
        ),
        None => None,
    };

    let node = state.tree().get_metadata(&scope, Some(body.fid)).await?;
    Ok((
        http::StatusCode::OK,
        Json(UpdateMetadataResponse { node, revision }),
    )
        .into_response())
}
