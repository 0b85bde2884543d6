use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use store::node::Checkout;

use super::{storage_path, NodeParams, StorageApiError};
use crate::http_server::api::auth::Caller;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Take the exclusive checkout on a node for the caller.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RentRequest {
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

    /// Advisory checkout lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentBody {
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[axum::debug_handler]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(params): Path<NodeParams>,
    Caller(caller): Caller,
    body: Option<Json<RentBody>>,
) -> Result<impl IntoResponse, StorageApiError> {
    let ttl = body
        .and_then(|Json(b)| b.ttl_secs)
        .map(|secs| time::Duration::seconds(secs as i64));
    let checkout = state
        .checkouts()
        .rent(&params.scope(), params.fid, &caller, ttl)
        .await?;
    Ok((http::StatusCode::OK, Json(checkout)).into_response())
}

impl ApiRequest for RentRequest {
    type Response = Checkout;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = storage_path(self.pid, self.nid, &format!("{}/rent/", self.fid));
        let body = RentBody {
            ttl_secs: self.ttl_secs,
        };
        client.post(base_url.join(&path).unwrap()).json(&body)
    }
}
