use std::fmt::{Debug, Display};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::node::{Checkout, FileNode, Revision, Scope};

/// Persistence contract for the hierarchical store.
///
/// Providers own per-node atomicity: every compound method below
/// (ensure_root, insert_child, reparent, remove_subtree, rename,
/// append_revision, acquire, release) must perform its read-modify-write
/// inside a single critical section or transaction, so that concurrent
/// mutations of the same node are serialized. Nothing here spans more
/// than one compound operation; bulk walks are the managers' business
/// and are explicitly not atomic.
#[async_trait]
pub trait NodeStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug;

    async fn get(&self, fid: Uuid) -> Result<Option<FileNode>, StoreError<Self::Error>>;

    /// The root folder of a scope, if the scope has been provisioned.
    async fn root(&self, scope: &Scope) -> Result<Option<FileNode>, StoreError<Self::Error>>;

    /// Get-or-create the scope root. Idempotent: concurrent callers all
    /// observe the same root node.
    async fn ensure_root(&self, scope: &Scope) -> Result<FileNode, StoreError<Self::Error>>;

    /// Direct children in insertion order.
    ///
    /// Fails `NodeNotFound` if the parent does not exist.
    async fn children(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>>;

    /// Every node strictly below `fid`, in stable creation order.
    async fn descendants(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>>;

    /// Insert `node` as the last child of `parent_fid`.
    ///
    /// Fails `NodeNotFound` if the parent is missing and `NotFolder` if
    /// the parent is a file.
    async fn insert_child(
        &self,
        parent_fid: Uuid,
        node: FileNode,
    ) -> Result<FileNode, StoreError<Self::Error>>;

    /// Re-home `fid` as the last child of `new_parent_fid`.
    ///
    /// Must fail, atomically with the parent swap:
    /// * `Cycle` when `new_parent_fid` is `fid` or one of its descendants
    /// * `CheckedOut` when the new parent holds a live checkout
    /// * `NotFolder` when the new parent is a file
    /// * `RootImmutable` when `fid` is a scope root
    async fn reparent(
        &self,
        fid: Uuid,
        new_parent_fid: Uuid,
    ) -> Result<FileNode, StoreError<Self::Error>>;

    /// Delete `fid` and its whole subtree, cascading revisions and
    /// checkouts. Returns the removed node ids.
    ///
    /// Fails `CheckedOut` if any node in the subtree holds a live
    /// checkout, and `RootImmutable` for scope roots.
    async fn remove_subtree(&self, fid: Uuid) -> Result<Vec<Uuid>, StoreError<Self::Error>>;

    /// Rename a node in place. Fails `CheckedOut` while a live checkout
    /// is held. Name validation is the caller's job.
    async fn rename(&self, fid: Uuid, name: &str) -> Result<FileNode, StoreError<Self::Error>>;

    /// All revisions for a node, newest first.
    ///
    /// Fails `NodeNotFound` if the node does not exist.
    async fn revisions(&self, fid: Uuid) -> Result<Vec<Revision>, StoreError<Self::Error>>;

    /// Append a revision with the next sequence number (1-based).
    /// Sequencing is atomic per node: sequential appends are gap-free
    /// even under concurrent callers.
    async fn append_revision(
        &self,
        fid: Uuid,
        content_ref: &str,
        checksum: Option<&str>,
        creator: &str,
    ) -> Result<Revision, StoreError<Self::Error>>;

    /// Raw checkout state; expiry is not filtered here.
    async fn checkout(&self, fid: Uuid) -> Result<Option<Checkout>, StoreError<Self::Error>>;

    /// Acquire the checkout for `holder`.
    ///
    /// Must behave as an atomic compare-and-set:
    /// * unheld or expired -> new checkout
    /// * held by `holder`  -> the existing checkout, unchanged
    /// * held by another   -> `CheckedOut`
    async fn acquire(
        &self,
        fid: Uuid,
        holder: &str,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<Checkout, StoreError<Self::Error>>;

    /// Release the checkout. `Some(holder)` fails `NotHolder` when a
    /// live checkout belongs to someone else; `None` releases
    /// unconditionally. Returns whether a live checkout was removed;
    /// releasing an unheld node is a successful no-op.
    async fn release(
        &self,
        fid: Uuid,
        holder: Option<&str>,
    ) -> Result<bool, StoreError<Self::Error>>;
}
