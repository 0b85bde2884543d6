use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::node::{Checkout, FileNode, NodeKind, Revision, Scope};
use crate::provider::NodeStore;

/// In-memory node store backed by HashMaps behind a single RwLock.
///
/// Every trait method runs entirely inside one lock section, which
/// gives the per-node atomicity the provider contract requires.
#[derive(Debug, Clone)]
pub struct MemoryNodeStore {
    inner: Arc<RwLock<MemoryNodeStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryNodeStoreInner {
    nodes: HashMap<Uuid, FileNode>,
    /// parent fid -> ordered child fids (insertion order)
    child_order: HashMap<Uuid, Vec<Uuid>>,
    /// scope -> root fid
    roots: HashMap<Scope, Uuid>,
    /// fid -> revisions, oldest first
    revisions: HashMap<Uuid, Vec<Revision>>,
    checkouts: HashMap<Uuid, Checkout>,
    /// fid -> global insertion counter, for stable creation order
    arrival: HashMap<Uuid, u64>,
    counter: u64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryNodeStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryNodeStoreInner::default())),
        }
    }

    fn read(
        &self,
    ) -> Result<
        std::sync::RwLockReadGuard<'_, MemoryNodeStoreInner>,
        StoreError<MemoryNodeStoreError>,
    > {
        self.inner.read().map_err(|e| {
            StoreError::Provider(MemoryNodeStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write(
        &self,
    ) -> Result<
        std::sync::RwLockWriteGuard<'_, MemoryNodeStoreInner>,
        StoreError<MemoryNodeStoreError>,
    > {
        self.inner.write().map_err(|e| {
            StoreError::Provider(MemoryNodeStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }
}

impl Default for MemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNodeStoreInner {
    fn track(&mut self, node: FileNode) {
        self.counter += 1;
        self.arrival.insert(node.fid, self.counter);
        self.child_order.entry(node.fid).or_default();
        self.nodes.insert(node.fid, node);
    }

    /// The subtree rooted at `fid`, including `fid` itself.
    fn subtree(&self, fid: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut stack = vec![fid];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            if let Some(children) = self.child_order.get(&cur) {
                // reversed so pop() visits children in insertion order
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// Whether `candidate` is `fid` or sits below it.
    fn is_within(&self, fid: Uuid, candidate: Uuid) -> bool {
        let mut cur = Some(candidate);
        while let Some(id) = cur {
            if id == fid {
                return true;
            }
            cur = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn live_checkout(&self, fid: Uuid, now: OffsetDateTime) -> Option<&Checkout> {
        self.checkouts.get(&fid).filter(|c| !c.is_expired(now))
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    type Error = MemoryNodeStoreError;

    async fn get(&self, fid: Uuid) -> Result<Option<FileNode>, StoreError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner.nodes.get(&fid).cloned())
    }

    async fn root(&self, scope: &Scope) -> Result<Option<FileNode>, StoreError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner
            .roots
            .get(scope)
            .and_then(|fid| inner.nodes.get(fid))
            .cloned())
    }

    async fn ensure_root(&self, scope: &Scope) -> Result<FileNode, StoreError<Self::Error>> {
        let mut inner = self.write()?;
        if let Some(existing) = inner.roots.get(scope).and_then(|fid| inner.nodes.get(fid)) {
            return Ok(existing.clone());
        }
        let root = FileNode::root(scope);
        inner.roots.insert(*scope, root.fid);
        inner.track(root.clone());
        Ok(root)
    }

    async fn children(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>> {
        let inner = self.read()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        Ok(inner
            .child_order
            .get(&fid)
            .into_iter()
            .flatten()
            .filter_map(|cid| inner.nodes.get(cid))
            .cloned()
            .collect())
    }

    async fn descendants(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>> {
        let inner = self.read()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        let mut ids = inner.subtree(fid);
        ids.retain(|id| *id != fid);
        // stable creation order across the whole subtree
        ids.sort_by_key(|id| inner.arrival.get(id).copied().unwrap_or(u64::MAX));
        Ok(ids
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id))
            .cloned()
            .collect())
    }

    async fn insert_child(
        &self,
        parent_fid: Uuid,
        node: FileNode,
    ) -> Result<FileNode, StoreError<Self::Error>> {
        let mut inner = self.write()?;
        let parent = inner
            .nodes
            .get(&parent_fid)
            .ok_or(StoreError::NodeNotFound(parent_fid))?;
        if !parent.kind.is_folder() {
            return Err(StoreError::NotFolder(parent_fid));
        }
        inner
            .child_order
            .entry(parent_fid)
            .or_default()
            .push(node.fid);
        inner.track(node.clone());
        Ok(node)
    }

    async fn reparent(
        &self,
        fid: Uuid,
        new_parent_fid: Uuid,
    ) -> Result<FileNode, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;

        let node = inner
            .nodes
            .get(&fid)
            .ok_or(StoreError::NodeNotFound(fid))?
            .clone();
        let old_parent = node.parent.ok_or(StoreError::RootImmutable(fid))?;

        let new_parent = inner
            .nodes
            .get(&new_parent_fid)
            .ok_or(StoreError::NodeNotFound(new_parent_fid))?;
        if !new_parent.kind.is_folder() {
            return Err(StoreError::NotFolder(new_parent_fid));
        }
        if inner.is_within(fid, new_parent_fid) {
            return Err(StoreError::Cycle {
                fid,
                new_parent: new_parent_fid,
            });
        }
        if let Some(held) = inner.live_checkout(new_parent_fid, now) {
            return Err(StoreError::CheckedOut {
                fid: new_parent_fid,
                holder: held.holder.clone(),
            });
        }

        if let Some(siblings) = inner.child_order.get_mut(&old_parent) {
            siblings.retain(|id| *id != fid);
        }
        inner
            .child_order
            .entry(new_parent_fid)
            .or_default()
            .push(fid);
        let moved = inner
            .nodes
            .get_mut(&fid)
            .ok_or(StoreError::NodeNotFound(fid))?;
        moved.parent = Some(new_parent_fid);
        Ok(moved.clone())
    }

    async fn remove_subtree(&self, fid: Uuid) -> Result<Vec<Uuid>, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;

        let node = inner
            .nodes
            .get(&fid)
            .ok_or(StoreError::NodeNotFound(fid))?;
        let parent = node.parent.ok_or(StoreError::RootImmutable(fid))?;

        let doomed = inner.subtree(fid);
        for id in &doomed {
            if let Some(held) = inner.live_checkout(*id, now) {
                return Err(StoreError::CheckedOut {
                    fid: *id,
                    holder: held.holder.clone(),
                });
            }
        }

        if let Some(siblings) = inner.child_order.get_mut(&parent) {
            siblings.retain(|id| *id != fid);
        }
        for id in &doomed {
            inner.nodes.remove(id);
            inner.child_order.remove(id);
            inner.revisions.remove(id);
            inner.checkouts.remove(id);
            inner.arrival.remove(id);
        }
        Ok(doomed)
    }

    async fn rename(&self, fid: Uuid, name: &str) -> Result<FileNode, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;
        if let Some(held) = inner.live_checkout(fid, now) {
            return Err(StoreError::CheckedOut {
                fid,
                holder: held.holder.clone(),
            });
        }
        let node = inner
            .nodes
            .get_mut(&fid)
            .ok_or(StoreError::NodeNotFound(fid))?;
        node.name = name.to_string();
        Ok(node.clone())
    }

    async fn revisions(&self, fid: Uuid) -> Result<Vec<Revision>, StoreError<Self::Error>> {
        let inner = self.read()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        let mut revs = inner.revisions.get(&fid).cloned().unwrap_or_default();
        revs.reverse();
        Ok(revs)
    }

    async fn append_revision(
        &self,
        fid: Uuid,
        content_ref: &str,
        checksum: Option<&str>,
        creator: &str,
    ) -> Result<Revision, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;
        let node = inner
            .nodes
            .get(&fid)
            .ok_or(StoreError::NodeNotFound(fid))?;
        if node.kind == NodeKind::Folder {
            return Err(StoreError::NotFolder(fid));
        }
        if let Some(held) = inner.live_checkout(fid, now) {
            if held.holder != creator {
                return Err(StoreError::CheckedOut {
                    fid,
                    holder: held.holder.clone(),
                });
            }
        }
        let revs = inner.revisions.entry(fid).or_default();
        let seq = revs.last().map(|r| r.seq).unwrap_or(0) + 1;
        let revision = Revision {
            fid,
            seq,
            content_ref: content_ref.to_string(),
            checksum: checksum.map(str::to_string),
            creator: creator.to_string(),
            created_at: now,
        };
        revs.push(revision.clone());
        Ok(revision)
    }

    async fn checkout(&self, fid: Uuid) -> Result<Option<Checkout>, StoreError<Self::Error>> {
        let inner = self.read()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        Ok(inner.checkouts.get(&fid).cloned())
    }

    async fn acquire(
        &self,
        fid: Uuid,
        holder: &str,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<Checkout, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        if let Some(held) = inner.live_checkout(fid, now) {
            if held.holder == holder {
                return Ok(held.clone());
            }
            return Err(StoreError::CheckedOut {
                fid,
                holder: held.holder.clone(),
            });
        }
        let checkout = Checkout::new(fid, holder.to_string(), expires_at);
        inner.checkouts.insert(fid, checkout.clone());
        Ok(checkout)
    }

    async fn release(
        &self,
        fid: Uuid,
        holder: Option<&str>,
    ) -> Result<bool, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.write()?;
        if !inner.nodes.contains_key(&fid) {
            return Err(StoreError::NodeNotFound(fid));
        }
        let live = inner.live_checkout(fid, now).cloned();
        match (live, holder) {
            (Some(held), Some(party)) if held.holder != party => Err(StoreError::NotHolder {
                fid,
                holder: held.holder,
            }),
            (Some(_), _) => {
                inner.checkouts.remove(&fid);
                Ok(true)
            }
            (None, _) => {
                // expired leftovers are dropped on the way out
                inner.checkouts.remove(&fid);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    async fn seeded() -> (MemoryNodeStore, Scope, FileNode) {
        let store = MemoryNodeStore::new();
        let scope = Scope::project(Uuid::new_v4());
        let root = store.ensure_root(&scope).await.unwrap();
        (store, scope, root)
    }

    #[tokio::test]
    async fn test_ensure_root_idempotent() {
        let (store, scope, root) = seeded().await;
        let again = store.ensure_root(&scope).await.unwrap();
        assert_eq!(again.fid, root.fid);
    }

    #[tokio::test]
    async fn test_insert_child_rejects_file_parent() {
        let (store, scope, root) = seeded().await;
        let file = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();

        let result = store
            .insert_child(
                file.fid,
                FileNode::child(&scope, file.fid, "b.txt".into(), NodeKind::File),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFolder(f)) if f == file.fid));
    }

    #[tokio::test]
    async fn test_revision_sequence() {
        let (store, scope, root) = seeded().await;
        let file = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();

        let r1 = store
            .append_revision(file.fid, "blob:v1", None, "alice")
            .await
            .unwrap();
        let r2 = store
            .append_revision(file.fid, "blob:v2", Some("abc123"), "alice")
            .await
            .unwrap();
        assert_eq!(r1.seq, 1);
        assert_eq!(r2.seq, 2);

        // newest first
        let revs = store.revisions(file.fid).await.unwrap();
        assert_eq!(
            revs.iter().map(|r| r.seq).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[tokio::test]
    async fn test_acquire_conflict_and_idempotency() {
        let (store, scope, root) = seeded().await;
        let file = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();

        let first = store.acquire(file.fid, "alice", None).await.unwrap();
        // repeated acquire by the same holder returns the same checkout
        let second = store.acquire(file.fid, "alice", None).await.unwrap();
        assert_eq!(first, second);

        let result = store.acquire(file.fid, "bob", None).await;
        assert!(
            matches!(result, Err(StoreError::CheckedOut { holder, .. }) if holder == "alice")
        );
    }

    #[tokio::test]
    async fn test_expired_checkout_does_not_block() {
        let (store, scope, root) = seeded().await;
        let file = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();

        let lapsed = OffsetDateTime::now_utc() - Duration::seconds(5);
        store
            .acquire(file.fid, "alice", Some(lapsed))
            .await
            .unwrap();

        let taken = store.acquire(file.fid, "bob", None).await.unwrap();
        assert_eq!(taken.holder, "bob");
    }

    #[tokio::test]
    async fn test_remove_subtree_cascades() {
        let (store, scope, root) = seeded().await;
        let dir = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "docs".into(), NodeKind::Folder),
            )
            .await
            .unwrap();
        let file = store
            .insert_child(
                dir.fid,
                FileNode::child(&scope, dir.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();
        store
            .append_revision(file.fid, "blob:v1", None, "alice")
            .await
            .unwrap();

        let removed = store.remove_subtree(dir.fid).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.get(file.fid).await.unwrap().is_none());
        assert!(matches!(
            store.revisions(file.fid).await,
            Err(StoreError::NodeNotFound(_))
        ));
        // root is untouched
        assert!(store.get(root.fid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_subtree_blocked_by_checkout() {
        let (store, scope, root) = seeded().await;
        let dir = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "docs".into(), NodeKind::Folder),
            )
            .await
            .unwrap();
        let file = store
            .insert_child(
                dir.fid,
                FileNode::child(&scope, dir.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();
        store.acquire(file.fid, "alice", None).await.unwrap();

        let result = store.remove_subtree(dir.fid).await;
        assert!(
            matches!(result, Err(StoreError::CheckedOut { fid, .. }) if fid == file.fid)
        );
    }

    #[tokio::test]
    async fn test_root_is_immutable() {
        let (store, _, root) = seeded().await;
        assert!(matches!(
            store.remove_subtree(root.fid).await,
            Err(StoreError::RootImmutable(_))
        ));
        assert!(matches!(
            store.reparent(root.fid, root.fid).await,
            Err(StoreError::RootImmutable(_))
        ));
    }

    #[tokio::test]
    async fn test_descendants_creation_order() {
        let (store, scope, root) = seeded().await;
        let dir = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "docs".into(), NodeKind::Folder),
            )
            .await
            .unwrap();
        let a = store
            .insert_child(
                dir.fid,
                FileNode::child(&scope, dir.fid, "a.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();
        let b = store
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, "b.txt".into(), NodeKind::File),
            )
            .await
            .unwrap();

        let all = store.descendants(root.fid).await.unwrap();
        assert_eq!(
            all.iter().map(|n| n.fid).collect::<Vec<_>>(),
            vec![dir.fid, a.fid, b.fid]
        );
    }
}
