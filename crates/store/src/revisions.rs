use uuid::Uuid;

use crate::error::StoreError;
use crate::node::{Revision, Scope};
use crate::provider::NodeStore;
use crate::tree::resolve_in_scope;

/// Append-only, totally ordered version history per file node.
#[derive(Debug, Clone)]
pub struct Revisions<S: NodeStore> {
    store: S,
}

impl<S: NodeStore> Revisions<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All revisions for a node, newest first.
    pub async fn list(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<Vec<Revision>, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        self.store.revisions(fid).await
    }

    /// Append a revision with the next sequence number.
    ///
    /// Fails `NotFolder` for folders and `CheckedOut` when the node is
    /// checked out by a holder other than `creator` — a checkout exists
    /// precisely to keep other parties from modifying the node.
    pub async fn add(
        &self,
        scope: &Scope,
        fid: Uuid,
        content_ref: &str,
        checksum: Option<&str>,
        creator: &str,
    ) -> Result<Revision, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        let revision = self
            .store
            .append_revision(fid, content_ref, checksum, creator)
            .await?;
        tracing::info!(scope = %scope, fid = %fid, seq = revision.seq, "appended revision");
        Ok(revision)
    }

    /// Resolve the content reference to serve for a download: the
    /// latest revision when `seq` is omitted, else the exact sequence
    /// number.
    pub async fn download(
        &self,
        scope: &Scope,
        fid: Uuid,
        seq: Option<u64>,
    ) -> Result<Revision, StoreError<S::Error>> {
        let revisions = self.list(scope, fid).await?;
        match seq {
            None => revisions
                .into_iter()
                .next()
                .ok_or(StoreError::NoRevisions(fid)),
            Some(seq) => revisions
                .into_iter()
                .find(|r| r.seq == seq)
                .ok_or(StoreError::RevisionNotFound { fid, seq }),
        }
    }
}
