//! Integration tests for hierarchy operations: metadata, children,
//! lineage, move, copy, delete.

mod common;

use store::prelude::*;
use uuid::Uuid;

#[tokio::test]
async fn test_get_metadata_root_and_node() {
    let t = common::setup().await;

    // no fid resolves the scope root
    let root = t.tree.get_metadata(&t.scope, None).await.unwrap();
    assert_eq!(root.fid, t.root.fid);
    assert!(root.is_root());

    let file = t.file(t.root.fid, "a.txt").await;
    let found = t.tree.get_metadata(&t.scope, Some(file.fid)).await.unwrap();
    assert_eq!(found.name, "a.txt");
    assert_eq!(found.parent, Some(t.root.fid));
}

#[tokio::test]
async fn test_metadata_scope_mismatch_is_not_found() {
    let t = common::setup().await;
    let file = t.file(t.root.fid, "a.txt").await;

    // same fid addressed through a different project
    let other = Scope::project(Uuid::new_v4());
    let result = t.tree.get_metadata(&other, Some(file.fid)).await;
    assert!(matches!(result, Err(StoreError::NodeNotFound(_))));

    // or through a sub-node of the right project
    let component = Scope::node(t.scope.pid, Uuid::new_v4());
    let result = t.tree.get_metadata(&component, Some(file.fid)).await;
    assert!(matches!(result, Err(StoreError::NodeNotFound(_))));
}

#[tokio::test]
async fn test_unprovisioned_scope_root_is_not_found() {
    let t = common::setup().await;
    let other = Scope::project(Uuid::new_v4());
    let result = t.tree.get_metadata(&other, None).await;
    assert!(matches!(result, Err(StoreError::RootNotFound(_))));
}

#[tokio::test]
async fn test_create_child_rejects_bad_names() {
    let t = common::setup().await;
    for name in ["", ".", "..", "a/b", "a\\b"] {
        let result = t
            .tree
            .create_child(
                &t.scope,
                t.root.fid,
                ChildAttrs {
                    name: name.to_string(),
                    kind: NodeKind::File,
                },
            )
            .await;
        assert!(
            matches!(result, Err(StoreError::InvalidName(_))),
            "expected InvalidName for {:?}",
            name
        );
    }
}

#[tokio::test]
async fn test_children_insertion_order() {
    let t = common::setup().await;
    let b = t.file(t.root.fid, "b.txt").await;
    let a = t.file(t.root.fid, "a.txt").await;
    let c = t.file(t.root.fid, "c.txt").await;

    let children = t.tree.children(&t.scope, t.root.fid).await.unwrap();
    // insertion order, not name order
    assert_eq!(
        children.iter().map(|n| n.fid).collect::<Vec<_>>(),
        vec![b.fid, a.fid, c.fid]
    );
}

#[tokio::test]
async fn test_lineage_terminates_at_root() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let nested = t.folder(docs.fid, "nested").await;
    let file = t.file(nested.fid, "a.txt").await;

    let lineage = t.tree.lineage(&t.scope, file.fid).await.unwrap();
    assert_eq!(
        lineage.iter().map(|n| n.fid).collect::<Vec<_>>(),
        vec![file.fid, nested.fid, docs.fid, t.root.fid]
    );
    assert!(lineage.last().unwrap().is_root());

    // no repeated nodes
    let mut fids: Vec<_> = lineage.iter().map(|n| n.fid).collect();
    fids.dedup();
    assert_eq!(fids.len(), lineage.len());
}

#[tokio::test]
async fn test_mv_reparents_and_lineage_follows() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let file = t.file(t.root.fid, "a.txt").await;

    let moved = t.tree.mv(&t.scope, file.fid, docs.fid).await.unwrap();
    assert_eq!(moved.parent, Some(docs.fid));

    let lineage = t.tree.lineage(&t.scope, file.fid).await.unwrap();
    assert_eq!(
        lineage.iter().map(|n| n.fid).collect::<Vec<_>>(),
        vec![file.fid, docs.fid, t.root.fid]
    );
}

#[tokio::test]
async fn test_mv_into_own_subtree_is_conflict() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let nested = t.folder(docs.fid, "nested").await;

    // direct descendant
    let result = t.tree.mv(&t.scope, docs.fid, nested.fid).await;
    assert!(matches!(result, Err(StoreError::Cycle { .. })));

    // fid itself
    let result = t.tree.mv(&t.scope, docs.fid, docs.fid).await;
    assert!(matches!(result, Err(StoreError::Cycle { .. })));
}

#[tokio::test]
async fn test_mv_to_checked_out_parent_is_conflict() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let file = t.file(t.root.fid, "a.txt").await;

    t.checkouts
        .rent(&t.scope, docs.fid, "alice", None)
        .await
        .unwrap();

    let result = t.tree.mv(&t.scope, file.fid, docs.fid).await;
    assert!(matches!(result, Err(StoreError::CheckedOut { .. })));
}

#[tokio::test]
async fn test_mv_into_file_is_rejected() {
    let t = common::setup().await;
    let a = t.file(t.root.fid, "a.txt").await;
    let b = t.file(t.root.fid, "b.txt").await;

    let result = t.tree.mv(&t.scope, a.fid, b.fid).await;
    assert!(matches!(result, Err(StoreError::NotFolder(_))));
}

#[tokio::test]
async fn test_copy_deep_clones_subtree() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let file = t.file(docs.fid, "a.txt").await;
    t.revisions
        .add(&t.scope, file.fid, "blob:v1", None, "alice")
        .await
        .unwrap();
    t.revisions
        .add(&t.scope, file.fid, "blob:v2", None, "alice")
        .await
        .unwrap();
    let dest = t.folder(t.root.fid, "backup").await;

    let copied = t.tree.copy(&t.scope, docs.fid, dest.fid).await.unwrap();
    assert_ne!(copied.fid, docs.fid);
    assert_eq!(copied.name, "docs");
    assert_eq!(copied.parent, Some(dest.fid));

    let children = t.tree.children(&t.scope, copied.fid).await.unwrap();
    assert_eq!(children.len(), 1);
    let copied_file = &children[0];
    assert_ne!(copied_file.fid, file.fid);

    // only the latest revision reference travels, renumbered from 1
    let revs = t
        .revisions
        .list(&t.scope, copied_file.fid)
        .await
        .unwrap();
    assert_eq!(revs.len(), 1);
    assert_eq!(revs[0].seq, 1);
    assert_eq!(revs[0].content_ref, "blob:v2");

    // the original keeps its full history
    let revs = t.revisions.list(&t.scope, file.fid).await.unwrap();
    assert_eq!(revs.len(), 2);
}

#[tokio::test]
async fn test_copy_does_not_clone_checkout_state() {
    let t = common::setup().await;
    let file = t.file(t.root.fid, "a.txt").await;
    t.checkouts
        .rent(&t.scope, file.fid, "alice", None)
        .await
        .unwrap();
    let dest = t.folder(t.root.fid, "backup").await;

    let copied = t.tree.copy(&t.scope, file.fid, dest.fid).await.unwrap();
    let state = t.checkouts.rented(&t.scope, copied.fid).await.unwrap();
    assert!(state.is_none());
}

#[tokio::test]
async fn test_delete_removes_subtree() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let file = t.file(docs.fid, "a.txt").await;

    let removed = t.tree.delete(&t.scope, docs.fid).await.unwrap();
    assert_eq!(removed.len(), 2);

    let result = t.tree.get_metadata(&t.scope, Some(file.fid)).await;
    assert!(matches!(result, Err(StoreError::NodeNotFound(_))));
    assert!(t
        .tree
        .children(&t.scope, t.root.fid)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_blocked_by_descendant_checkout() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;
    let file = t.file(docs.fid, "a.txt").await;
    t.checkouts
        .rent(&t.scope, file.fid, "alice", None)
        .await
        .unwrap();

    let result = t.tree.delete(&t.scope, docs.fid).await;
    assert!(matches!(result, Err(StoreError::CheckedOut { .. })));

    // nothing was removed
    assert!(t
        .tree
        .get_metadata(&t.scope, Some(file.fid))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_root_cannot_be_deleted_or_moved() {
    let t = common::setup().await;
    let docs = t.folder(t.root.fid, "docs").await;

    let result = t.tree.delete(&t.scope, t.root.fid).await;
    assert!(matches!(result, Err(StoreError::RootImmutable(_))));

    let result = t.tree.mv(&t.scope, t.root.fid, docs.fid).await;
    assert!(matches!(result, Err(StoreError::RootImmutable(_))));

    let result = t.tree.copy(&t.scope, t.root.fid, docs.fid).await;
    assert!(matches!(result, Err(StoreError::RootImmutable(_))));
}

#[tokio::test]
async fn test_rename_blocked_while_checked_out() {
    let t = common::setup().await;
    let file = t.file(t.root.fid, "a.txt").await;
    t.checkouts
        .rent(&t.scope, file.fid, "alice", None)
        .await
        .unwrap();

    let result = t.tree.rename(&t.scope, file.fid, "b.txt").await;
    assert!(matches!(result, Err(StoreError::CheckedOut { .. })));

    t.checkouts
        .release(&t.scope, file.fid, "alice")
        .await
        .unwrap();
    let renamed = t.tree.rename(&t.scope, file.fid, "b.txt").await.unwrap();
    assert_eq!(renamed.name, "b.txt");
}

#[tokio::test]
async fn test_lineage_stable_after_accepted_moves() {
    let t = common::setup().await;
    let a = t.folder(t.root.fid, "a").await;
    let b = t.folder(t.root.fid, "b").await;
    let c = t.folder(a.fid, "c").await;

    // shuffle the tree through a few accepted moves
    t.tree.mv(&t.scope, c.fid, b.fid).await.unwrap();
    t.tree.mv(&t.scope, a.fid, c.fid).await.unwrap();

    for fid in [a.fid, b.fid, c.fid] {
        let lineage = t.tree.lineage(&t.scope, fid).await.unwrap();
        assert!(lineage.last().unwrap().is_root());
        let mut seen: Vec<Uuid> = lineage.iter().map(|n| n.fid).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), lineage.len(), "repeated node in lineage");
    }
}
