use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::Checkout;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Read-only query of a node's checkout state. Expired checkouts read
/// as available.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RentedRequest {
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
pub struct RentedResponse {
    pub fid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<Checkout>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
) -> Result<impl IntoResponse, StorageApiError> {
    let checkout = state.checkouts().rented(&params.scope(), params.fid).await?;
    Ok((
        http::StatusCode::OK,
        Json(RentedResponse {
            fid: params.fid,
            checkout,
        }),
    )
        .into_response())
}

impl ApiRequest for RentedRequest {
    type Response = RentedResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/rented/", self.fid));
        client.get(base_url.join(&path).unwrap())
    }
}
