use uuid::Uuid;

use crate::error::StoreError;
use crate::node::{ChildAttrs, FileNode, NodeKind, Scope};
use crate::provider::NodeStore;

/// Maintains the parent/child hierarchy and lineage for the file nodes
/// of a scope. All operations resolve identity through the scope first:
/// a `fid` that exists but belongs to a different project or sub-node
/// is reported as not found, exactly like one that does not exist.
#[derive(Debug, Clone)]
pub struct FileTree<S: NodeStore> {
    store: S,
}

/// Look up `fid` and check it is addressable through `scope`.
pub(crate) async fn resolve_in_scope<S: NodeStore>(
    store: &S,
    scope: &Scope,
    fid: Uuid,
) -> Result<FileNode, StoreError<S::Error>> {
    match store.get(fid).await? {
        Some(node) if node.in_scope(scope) => Ok(node),
        _ => Err(StoreError::NodeNotFound(fid)),
    }
}

fn validate_name<E>(name: &str) -> Result<(), StoreError<E>> {
    if name.is_empty() {
        return Err(StoreError::InvalidName("name cannot be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(StoreError::InvalidName(format!(
            "'{}' is a reserved name",
            name
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(StoreError::InvalidName(format!(
            "'{}' contains a path separator",
            name
        )));
    }
    if name.contains('\0') {
        return Err(StoreError::InvalidName("name contains NUL".into()));
    }
    Ok(())
}

impl<S: NodeStore> FileTree<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Provision the root folder for a scope. Idempotent.
    pub async fn init(&self, scope: &Scope) -> Result<FileNode, StoreError<S::Error>> {
        let root = self.store.ensure_root(scope).await?;
        tracing::debug!(scope = %scope, root = %root.fid, "storage root ready");
        Ok(root)
    }

    /// Resolve a node by scope and optional file id; `None` addresses
    /// the scope root.
    pub async fn get_metadata(
        &self,
        scope: &Scope,
        fid: Option<Uuid>,
    ) -> Result<FileNode, StoreError<S::Error>> {
        match fid {
            Some(fid) => resolve_in_scope(&self.store, scope, fid).await,
            None => self
                .store
                .root(scope)
                .await?
                .ok_or(StoreError::RootNotFound(*scope)),
        }
    }

    /// Remove a node and its whole subtree. Fails `CheckedOut` when any
    /// node in the subtree holds a live checkout. Returns removed ids.
    pub async fn delete(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<Vec<Uuid>, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        let removed = self.store.remove_subtree(fid).await?;
        tracing::info!(scope = %scope, fid = %fid, count = removed.len(), "deleted subtree");
        Ok(removed)
    }

    /// Insert a new child under `parent_fid`.
    pub async fn create_child(
        &self,
        scope: &Scope,
        parent_fid: Uuid,
        attrs: ChildAttrs,
    ) -> Result<FileNode, StoreError<S::Error>> {
        validate_name(&attrs.name)?;
        let parent = resolve_in_scope(&self.store, scope, parent_fid).await?;
        let node = FileNode::child(scope, parent.fid, attrs.name, attrs.kind);
        self.store.insert_child(parent.fid, node).await
    }

    /// Direct children, insertion order.
    pub async fn children(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<Vec<FileNode>, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        self.store.children(fid).await
    }

    /// Ancestor chain from the node up to the scope root, inclusive.
    pub async fn lineage(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<Vec<FileNode>, StoreError<S::Error>> {
        let mut chain = vec![resolve_in_scope(&self.store, scope, fid).await?];
        while let Some(parent_fid) = chain.last().and_then(|n| n.parent) {
            let parent = self
                .store
                .get(parent_fid)
                .await?
                .ok_or(StoreError::NodeNotFound(parent_fid))?;
            chain.push(parent);
        }
        Ok(chain)
    }

    /// Re-parent `fid` under `new_parent_fid`, within the same scope.
    /// Fails `Cycle` when the new parent sits inside the moved subtree
    /// and `CheckedOut` when the new parent is checked out.
    pub async fn mv(
        &self,
        scope: &Scope,
        fid: Uuid,
        new_parent_fid: Uuid,
    ) -> Result<FileNode, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        resolve_in_scope(&self.store, scope, new_parent_fid).await?;
        let moved = self.store.reparent(fid, new_parent_fid).await?;
        tracing::info!(scope = %scope, fid = %fid, new_parent = %new_parent_fid, "moved node");
        Ok(moved)
    }

    /// Deep-clone the subtree at `fid` under `new_parent_fid`. Every
    /// clone gets a fresh id; files carry over their latest revision
    /// reference (sequence restarts at 1); checkout state is not cloned.
    pub async fn copy(
        &self,
        scope: &Scope,
        fid: Uuid,
        new_parent_fid: Uuid,
    ) -> Result<FileNode, StoreError<S::Error>> {
        let source = resolve_in_scope(&self.store, scope, fid).await?;
        if source.is_root() {
            return Err(StoreError::RootImmutable(fid));
        }
        resolve_in_scope(&self.store, scope, new_parent_fid).await?;

        let top = self.clone_one(scope, &source, new_parent_fid).await?;

        // walk the rest of the subtree iteratively, pairing each source
        // node with its freshly created parent
        let mut pending = vec![(source.fid, top.fid)];
        while let Some((src_fid, dst_fid)) = pending.pop() {
            for child in self.store.children(src_fid).await? {
                let cloned = self.clone_one(scope, &child, dst_fid).await?;
                if child.kind == NodeKind::Folder {
                    pending.push((child.fid, cloned.fid));
                }
            }
        }

        tracing::info!(scope = %scope, fid = %fid, copy = %top.fid, "copied subtree");
        Ok(top)
    }

    /// Rename a node in place. Fails `CheckedOut` while the node holds
    /// a live checkout.
    pub async fn rename(
        &self,
        scope: &Scope,
        fid: Uuid,
        name: &str,
    ) -> Result<FileNode, StoreError<S::Error>> {
        validate_name(name)?;
        resolve_in_scope(&self.store, scope, fid).await?;
        self.store.rename(fid, name).await
    }

    async fn clone_one(
        &self,
        scope: &Scope,
        source: &FileNode,
        dest_parent: Uuid,
    ) -> Result<FileNode, StoreError<S::Error>> {
        let node = FileNode::child(scope, dest_parent, source.name.clone(), source.kind);
        let cloned = self.store.insert_child(dest_parent, node).await?;
        if source.kind == NodeKind::File {
            if let Some(latest) = self.store.revisions(source.fid).await?.into_iter().next() {
                self.store
                    .append_revision(
                        cloned.fid,
                        &latest.content_ref,
                        latest.checksum.as_deref(),
                        &latest.creator,
                    )
                    .await?;
            }
        }
        Ok(cloned)
    }
}
