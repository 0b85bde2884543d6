use std::fmt::{Debug, Display};

use uuid::Uuid;

use crate::node::Scope;

/// Errors surfaced by the managers and NodeStore providers.
///
/// Domain variants are deterministic results of current state and are
/// returned to the caller as the operation's outcome, never retried
/// internally. `Provider` wraps unexpected persistence-layer failures
/// and is the only variant that maps to a transport-level "storage
/// unavailable" condition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError<T> {
    #[error("unhandled node store provider error: {0}")]
    Provider(#[from] T),
    #[error("node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("no storage root for scope {0}")]
    RootNotFound(Scope),
    #[error("revision {seq} not found for node {fid}")]
    RevisionNotFound { fid: Uuid, seq: u64 },
    #[error("node {0} has no revisions")]
    NoRevisions(Uuid),
    #[error("node {fid} is checked out by {holder}")]
    CheckedOut { fid: Uuid, holder: String },
    #[error("node {fid} is held by {holder}, not the caller")]
    NotHolder { fid: Uuid, holder: String },
    #[error("cannot move {fid} under its own descendant {new_parent}")]
    Cycle { fid: Uuid, new_parent: Uuid },
    #[error("node {0} is not a folder")]
    NotFolder(Uuid),
    #[error("the storage root {0} cannot be moved, copied, or deleted")]
    RootImmutable(Uuid),
    #[error("invalid name: {0}")]
    InvalidName(String),
}

impl<T: Display + Debug> StoreError<T> {
    /// True for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NodeNotFound(_)
                | StoreError::RootNotFound(_)
                | StoreError::RevisionNotFound { .. }
                | StoreError::NoRevisions(_)
        )
    }

    /// True for state conflicts (checkout contention, cyclic moves,
    /// structurally impossible placements).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::CheckedOut { .. }
                | StoreError::Cycle { .. }
                | StoreError::NotFolder(_)
                | StoreError::RootImmutable(_)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_classification() {
        let nf: StoreError<Boom> = StoreError::NodeNotFound(Uuid::new_v4());
        assert!(nf.is_not_found());
        assert!(!nf.is_conflict());

        let held: StoreError<Boom> = StoreError::CheckedOut {
            fid: Uuid::new_v4(),
            holder: "alice".into(),
        };
        assert!(held.is_conflict());
        assert!(!held.is_not_found());

        let provider: StoreError<Boom> = Boom.into();
        assert!(!provider.is_conflict());
        assert!(!provider.is_not_found());
    }
}
