//! Storage addon API: hierarchy, revisions, and rent/return checkouts
//! for project file trees.
//!
//! Every project-scoped operation is reachable both as
//! `/project/:pid/osfstorage/...` and, narrowed to a sub-node, as
//! `/project/:pid/node/:nid/osfstorage/...`.

use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use store::node::Scope;

use crate::ServiceState;

pub mod children;
pub mod copy_node;
pub mod create_child;
pub mod delete;
pub mod download;
mod error;
pub mod force_return;
pub mod init;
pub mod lineage;
pub mod metadata;
pub mod move_node;
pub mod rent;
pub mod rent_all;
pub mod rented;
pub mod return_all;
pub mod return_node;
pub mod revisions;
pub mod update_metadata;

pub use error::StorageApiError;

// Re-export for convenience
pub use create_child::CreateChildRequest;
pub use metadata::MetadataRequest;
pub use rent::RentRequest;

/// Path parameters addressing a scope.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeParams {
    pub pid: Uuid,
    pub nid: Option<Uuid>,
}

impl ScopeParams {
    pub fn scope(&self) -> Scope {
        Scope {
            pid: self.pid,
            nid: self.nid,
        }
    }
}

/// Path parameters addressing a node within a scope.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeParams {
    pub pid: Uuid,
    pub nid: Option<Uuid>,
    pub fid: Uuid,
}

impl NodeParams {
    pub fn scope(&self) -> Scope {
        Scope {
            pid: self.pid,
            nid: self.nid,
        }
    }
}

/// Client-side path construction, mirroring the route table below.
pub(crate) fn storage_path(pid: Uuid, nid: Option<Uuid>, rest: &str) -> String {
    match nid {
        Some(nid) => format!("/api/v1/project/{}/node/{}/osfstorage/{}", pid, nid, rest),
        None => format!("/api/v1/project/{}/osfstorage/{}", pid, rest),
    }
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let mut router = Router::new();

    // each route is registered for both scoping variants
    for prefix in [
        "/project/:pid/osfstorage",
        "/project/:pid/node/:nid/osfstorage",
    ] {
        router = router
            .route(
                &format!("{}/", prefix),
                post(init::handler).get(metadata::root_handler),
            )
            .route(
                &format!("{}/rent_all/", prefix),
                post(rent_all::handler),
            )
            .route(
                &format!("{}/return_all/", prefix),
                post(return_all::handler),
            )
            .route(
                &format!("{}/hooks/metadata/", prefix),
                put(update_metadata::handler),
            )
            .route(
                &format!("{}/hooks/move/", prefix),
                post(move_node::handler),
            )
            .route(
                &format!("{}/hooks/copy/", prefix),
                post(copy_node::handler),
            )
            .route(
                &format!("{}/:fid/", prefix),
                get(metadata::handler).delete(delete::handler),
            )
            .route(
                &format!("{}/:fid/download/", prefix),
                get(download::handler),
            )
            .route(
                &format!("{}/:fid/revisions/", prefix),
                get(revisions::handler),
            )
            .route(
                &format!("{}/:fid/lineage/", prefix),
                get(lineage::handler),
            )
            .route(
                &format!("{}/:fid/children/", prefix),
                post(create_child::handler).get(children::handler),
            )
            .route(&format!("{}/:fid/rent/", prefix), post(rent::handler))
            .route(
                &format!("{}/:fid/return/", prefix),
                post(return_node::handler),
            )
            .route(&format!("{}/:fid/rented/", prefix), get(rented::handler))
            .route(
                &format!("{}/:fid/force_return/", prefix),
                post(force_return::handler),
            );
    }

    router.with_state(state)
}
