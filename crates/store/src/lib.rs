/**
 * Checkout (rent/return) state machine for file nodes,
 *  including the bulk per-scope walk.
 */
pub mod checkout;
/**
 * Error taxonomy shared by the managers and the
 *  NodeStore providers.
 */
pub mod error;
/**
 * In-memory NodeStore provider. Used by tests and
 *  ephemeral daemon runs.
 */
pub mod memory;
/**
 * Core entity types: scopes, file nodes, revisions,
 *  checkouts.
 */
pub mod node;
/**
 * The NodeStore persistence trait. Providers implement
 *  per-node atomicity; managers orchestrate on top.
 */
pub mod provider;
/**
 * Append-only revision history per file node.
 */
pub mod revisions;
/**
 * Parent/child hierarchy and lineage, scoped to a
 *  project (and optional sub-node).
 */
pub mod tree;

pub mod prelude {
    pub use crate::checkout::{BulkRelease, BulkRent, Checkouts, ReleaseOutcome, RentOutcome};
    pub use crate::error::StoreError;
    pub use crate::memory::MemoryNodeStore;
    pub use crate::node::{Checkout, ChildAttrs, FileNode, NodeKind, Revision, Scope};
    pub use crate::provider::NodeStore;
    pub use crate::revisions::Revisions;
    pub use crate::tree::FileTree;
}
