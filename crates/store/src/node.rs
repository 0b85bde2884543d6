use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/**
 * Entities
 * ========
 * A project's storage addon is a tree of file nodes. Every node
 *  belongs to exactly one scope (a project, optionally narrowed to
 *  one of its sub-nodes) and carries an explicit parent pointer;
 *  the scope root is the single node with no parent. Revisions are
 *  an append-only sequence per file node, and a checkout is an
 *  exclusive, possibly-expiring reservation on a node.
 */

/// Addressing context for a storage tree: the owning project plus
/// an optional sub-node (component) of that project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub pid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nid: Option<Uuid>,
}

impl Scope {
    pub fn project(pid: Uuid) -> Self {
        Self { pid, nid: None }
    }

    pub fn node(pid: Uuid, nid: Uuid) -> Self {
        Self {
            pid,
            nid: Some(nid),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.nid {
            Some(nid) => write!(f, "{}/{}", self.pid, nid),
            None => write!(f, "{}", self.pid),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Folder => "folder",
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeKind::File),
            "folder" => Ok(NodeKind::Folder),
            other => Err(format!("unknown node kind: {}", other)),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file or folder entity in the hierarchical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub fid: Uuid,
    pub pid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nid: Option<Uuid>,
    /// None means this node is the scope root.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<Uuid>,
    pub name: String,
    pub kind: NodeKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FileNode {
    /// The root folder of a scope's storage tree.
    pub fn root(scope: &Scope) -> Self {
        Self {
            fid: Uuid::new_v4(),
            pid: scope.pid,
            nid: scope.nid,
            parent: None,
            name: String::new(),
            kind: NodeKind::Folder,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// A fresh child entry under the given parent. The caller is
    /// responsible for name validation and for inserting the node
    /// through the provider.
    pub fn child(scope: &Scope, parent: Uuid, name: String, kind: NodeKind) -> Self {
        Self {
            fid: Uuid::new_v4(),
            pid: scope.pid,
            nid: scope.nid,
            parent: Some(parent),
            name,
            kind,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this node is addressable through the given scope.
    pub fn in_scope(&self, scope: &Scope) -> bool {
        self.pid == scope.pid && self.nid == scope.nid
    }

    pub fn scope(&self) -> Scope {
        Scope {
            pid: self.pid,
            nid: self.nid,
        }
    }
}

/// Requested attributes for a new child node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildAttrs {
    pub name: String,
    pub kind: NodeKind,
}

/// An immutable, sequence-numbered snapshot of a file node's content.
///
/// Sequence numbers are 1-based, strictly increasing, and never reused
/// for a given node. The content itself lives in an external object
/// store; `content_ref` is an opaque reference into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub fid: Uuid,
    pub seq: u64,
    pub content_ref: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub checksum: Option<String>,
    pub creator: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Exclusive reservation on a file node.
///
/// Expiry is advisory: it is consulted when the checkout is read or
/// contended, never enforced by a background sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkout {
    pub fid: Uuid,
    pub holder: String,
    #[serde(with = "time::serde::rfc3339")]
    pub acquired_at: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub expires_at: Option<OffsetDateTime>,
}

impl Checkout {
    pub fn new(fid: Uuid, holder: String, expires_at: Option<OffsetDateTime>) -> Self {
        Self {
            fid,
            holder,
            acquired_at: OffsetDateTime::now_utc(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expires_at {
            Some(at) => at <= now,
            None => false,
        }
    }

    /// A checkout blocks a party iff it is live and held by someone else.
    pub fn blocks(&self, party: &str, now: OffsetDateTime) -> bool {
        !self.is_expired(now) && self.holder != party
    }
}
