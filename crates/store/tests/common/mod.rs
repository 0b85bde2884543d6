//! Shared test utilities for the store integration tests
#![allow(dead_code)]

use store::prelude::*;
use uuid::Uuid;

pub struct TestStore {
    pub tree: FileTree<MemoryNodeStore>,
    pub revisions: Revisions<MemoryNodeStore>,
    pub checkouts: Checkouts<MemoryNodeStore>,
    pub scope: Scope,
    pub root: FileNode,
}

/// Set up a fresh in-memory store with one provisioned project scope.
pub async fn setup() -> TestStore {
    let store = MemoryNodeStore::new();
    let scope = Scope::project(Uuid::new_v4());

    let tree = FileTree::new(store.clone());
    let root = tree.init(&scope).await.unwrap();

    TestStore {
        tree,
        revisions: Revisions::new(store.clone()),
        checkouts: Checkouts::new(store),
        scope,
        root,
    }
}

impl TestStore {
    pub async fn file(&self, parent: Uuid, name: &str) -> FileNode {
        self.tree
            .create_child(
                &self.scope,
                parent,
                ChildAttrs {
                    name: name.to_string(),
                    kind: NodeKind::File,
                },
            )
            .await
            .unwrap()
    }

    pub async fn folder(&self, parent: Uuid, name: &str) -> FileNode {
        self.tree
            .create_child(
                &self.scope,
                parent,
                ChildAttrs {
                    name: name.to_string(),
                    kind: NodeKind::Folder,
                },
            )
            .await
            .unwrap()
    }
}
