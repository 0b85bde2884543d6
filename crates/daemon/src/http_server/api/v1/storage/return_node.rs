use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::auth::Caller;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Give a checkout back. Forbidden when the caller is not the holder.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ReturnRequest {
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
pub struct ReturnResponse {
    pub fid: Uuid,
    pub released: bool,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, StorageApiError> {
    state
        .checkouts()
        .release(&params.scope(), params.fid, &caller)
        .await?;
    Ok((
        http::StatusCode::OK,
        Json(ReturnResponse {
            fid: params.fid,
            released: true,
        }),
    )
        .into_response())
}

impl ApiRequest for ReturnRequest {
    type Response = ReturnResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/return/", self.fid));
        client.post(base_url.join(&path).unwrap())
    }
}
