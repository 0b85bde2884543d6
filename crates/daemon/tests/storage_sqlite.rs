//! Integration tests for the SQLite NodeStore provider. These mirror
//! the scenarios the in-memory provider covers, run against a real
//! (in-memory) database so the SQL paths stay honest.

use time::Duration;
use uuid::Uuid;

use stacks_daemon::Database;
use store::prelude::*;

/// Create an in-memory test database
async fn setup_test_db() -> Database {
    let db_url = url::Url::parse("sqlite::memory:").unwrap();
    Database::connect(&db_url).await.unwrap()
}

async fn setup() -> (Database, Scope, FileNode) {
    let db = setup_test_db().await;
    let scope = Scope::project(Uuid::new_v4());
    let root = db.ensure_root(&scope).await.unwrap();
    (db, scope, root)
}

#[tokio::test]
async fn test_ensure_root_idempotent() {
    let (db, scope, root) = setup().await;
    let again = db.ensure_root(&scope).await.unwrap();
    assert_eq!(again.fid, root.fid);

    // a different scope gets a different root
    let other = Scope::node(scope.pid, Uuid::new_v4());
    let other_root = db.ensure_root(&other).await.unwrap();
    assert_ne!(other_root.fid, root.fid);
}

#[tokio::test]
async fn test_children_keep_insertion_order() {
    let (db, scope, root) = setup().await;
    let mut expected = Vec::new();
    for name in ["b.txt", "a.txt", "c.txt"] {
        let node = db
            .insert_child(
                root.fid,
                FileNode::child(&scope, root.fid, name.into(), NodeKind::File),
            )
            .await
            .unwrap();
        expected.push(node.fid);
    }

    let children = db.children(root.fid).await.unwrap();
    assert_eq!(
        children.iter().map(|n| n.fid).collect::<Vec<_>>(),
        expected
    );
}

#[tokio::test]
async fn test_insert_child_parent_checks() {
    let (db, scope, root) = setup().await;
    let file = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();

    let result = db
        .insert_child(
            file.fid,
            FileNode::child(&scope, file.fid, "b.txt".into(), NodeKind::File),
        )
        .await;
    assert!(matches!(result, Err(StoreError::NotFolder(_))));

    let missing = Uuid::new_v4();
    let result = db
        .insert_child(
            missing,
            FileNode::child(&scope, missing, "c.txt".into(), NodeKind::File),
        )
        .await;
    assert!(matches!(result, Err(StoreError::NodeNotFound(_))));
}

#[tokio::test]
async fn test_revision_sequence_and_order() {
    let (db, scope, root) = setup().await;
    let file = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();

    for i in 1..=3u64 {
        let rev = db
            .append_revision(file.fid, &format!("blob:v{}", i), None, "alice")
            .await
            .unwrap();
        assert_eq!(rev.seq, i);
    }

    let revs = db.revisions(file.fid).await.unwrap();
    assert_eq!(revs.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(revs[0].content_ref, "blob:v3");
}

#[tokio::test]
async fn test_acquire_and_release_semantics() {
    let (db, scope, root) = setup().await;
    let file = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();

    let first = db.acquire(file.fid, "alice", None).await.unwrap();
    // repeated acquire by the same holder is a no-op success
    let second = db.acquire(file.fid, "alice", None).await.unwrap();
    assert_eq!(first.fid, second.fid);
    assert_eq!(second.holder, "alice");

    let result = db.acquire(file.fid, "bob", None).await;
    assert!(matches!(result, Err(StoreError::CheckedOut { holder, .. }) if holder == "alice"));

    let result = db.release(file.fid, Some("bob")).await;
    assert!(matches!(result, Err(StoreError::NotHolder { .. })));

    assert!(db.release(file.fid, Some("alice")).await.unwrap());
    let taken = db.acquire(file.fid, "bob", None).await.unwrap();
    assert_eq!(taken.holder, "bob");

    // force release ignores the holder
    assert!(db.release(file.fid, None).await.unwrap());
    assert!(db.checkout(file.fid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_checkout_is_reclaimable() {
    let (db, scope, root) = setup().await;
    let file = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();

    let lapsed = time::OffsetDateTime::now_utc() - Duration::seconds(5);
    db.acquire(file.fid, "alice", Some(lapsed)).await.unwrap();

    let taken = db.acquire(file.fid, "bob", None).await.unwrap();
    assert_eq!(taken.holder, "bob");
}

#[tokio::test]
async fn test_remove_subtree_cascades_and_respects_checkouts() {
    let (db, scope, root) = setup().await;
    let dir = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "docs".into(), NodeKind::Folder),
        )
        .await
        .unwrap();
    let file = db
        .insert_child(
            dir.fid,
            FileNode::child(&scope, dir.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();
    db.append_revision(file.fid, "blob:v1", None, "alice")
        .await
        .unwrap();

    // a live checkout anywhere in the subtree blocks deletion
    db.acquire(file.fid, "alice", None).await.unwrap();
    let result = db.remove_subtree(dir.fid).await;
    assert!(matches!(result, Err(StoreError::CheckedOut { .. })));

    db.release(file.fid, None).await.unwrap();
    let removed = db.remove_subtree(dir.fid).await.unwrap();
    assert_eq!(removed.len(), 2);

    assert!(db.get(dir.fid).await.unwrap().is_none());
    assert!(db.get(file.fid).await.unwrap().is_none());
    assert!(matches!(
        db.revisions(file.fid).await,
        Err(StoreError::NodeNotFound(_))
    ));
}

#[tokio::test]
async fn test_reparent_cycle_and_root_guards() {
    let (db, scope, root) = setup().await;
    let a = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "a".into(), NodeKind::Folder),
        )
        .await
        .unwrap();
    let b = db
        .insert_child(
            a.fid,
            FileNode::child(&scope, a.fid, "b".into(), NodeKind::Folder),
        )
        .await
        .unwrap();

    let result = db.reparent(a.fid, b.fid).await;
    assert!(matches!(result, Err(StoreError::Cycle { .. })));

    let result = db.reparent(a.fid, a.fid).await;
    assert!(matches!(result, Err(StoreError::Cycle { .. })));

    let result = db.reparent(root.fid, a.fid).await;
    assert!(matches!(result, Err(StoreError::RootImmutable(_))));

    // a legal move lands at the end of the new parent's children
    let c = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "c".into(), NodeKind::Folder),
        )
        .await
        .unwrap();
    let moved = db.reparent(c.fid, a.fid).await.unwrap();
    assert_eq!(moved.parent, Some(a.fid));
    let children = db.children(a.fid).await.unwrap();
    assert_eq!(
        children.iter().map(|n| n.fid).collect::<Vec<_>>(),
        vec![b.fid, c.fid]
    );
}

#[tokio::test]
async fn test_descendants_creation_order() {
    let (db, scope, root) = setup().await;
    let dir = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "docs".into(), NodeKind::Folder),
        )
        .await
        .unwrap();
    let a = db
        .insert_child(
            dir.fid,
            FileNode::child(&scope, dir.fid, "a.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();
    let b = db
        .insert_child(
            root.fid,
            FileNode::child(&scope, root.fid, "b.txt".into(), NodeKind::File),
        )
        .await
        .unwrap();

    let all = db.descendants(root.fid).await.unwrap();
    assert_eq!(
        all.iter().map(|n| n.fid).collect::<Vec<_>>(),
        vec![dir.fid, a.fid, b.fid]
    );
}

#[tokio::test]
async fn test_managers_run_on_sqlite() {
    // the full manager stack over the SQLite provider: the rent/return
    // scenario end to end
    let db = setup_test_db().await;
    let scope = Scope::project(Uuid::new_v4());
    let tree = FileTree::new(db.clone());
    let checkouts = Checkouts::new(db.clone());
    let revisions = Revisions::new(db.clone());

    let root = tree.init(&scope).await.unwrap();
    let f1 = tree
        .create_child(
            &scope,
            root.fid,
            ChildAttrs {
                name: "f1.txt".into(),
                kind: NodeKind::File,
            },
        )
        .await
        .unwrap();
    let f2 = tree
        .create_child(
            &scope,
            root.fid,
            ChildAttrs {
                name: "f2.txt".into(),
                kind: NodeKind::File,
            },
        )
        .await
        .unwrap();

    revisions
        .add(&scope, f1.fid, "blob:v1", None, "alice")
        .await
        .unwrap();
    revisions
        .add(&scope, f1.fid, "blob:v2", None, "alice")
        .await
        .unwrap();
    let latest = revisions.download(&scope, f1.fid, None).await.unwrap();
    assert_eq!(latest.content_ref, "blob:v2");
    let first = revisions.download(&scope, f1.fid, Some(1)).await.unwrap();
    assert_eq!(first.content_ref, "blob:v1");

    checkouts.rent(&scope, f2.fid, "bob", None).await.unwrap();
    let results = checkouts.rent_all(&scope, "alice", None).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        &results[0].outcome,
        store::checkout::RentOutcome::Rented { checkout } if checkout.holder == "alice"
    ));
    assert!(matches!(
        &results[1].outcome,
        store::checkout::RentOutcome::Held { holder } if holder == "bob"
    ));
}
