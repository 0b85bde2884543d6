use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::StoreError;
use crate::node::{Checkout, Scope};
use crate::provider::NodeStore;
use crate::tree::resolve_in_scope;

/// Exclusive rent/return reservations per file node.
///
/// State machine per node: AVAILABLE -> CHECKED_OUT -> AVAILABLE.
/// Expiry is advisory and evaluated on read; an expired checkout never
/// blocks a new rent.
#[derive(Debug, Clone)]
pub struct Checkouts<S: NodeStore> {
    store: S,
}

/// Per-node outcome of a bulk rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RentOutcome {
    Rented { checkout: Checkout },
    Held { holder: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRent {
    pub fid: Uuid,
    #[serde(flatten)]
    pub outcome: RentOutcome,
}

/// Per-node outcome of a bulk release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ReleaseOutcome {
    Released,
    Forbidden { holder: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRelease {
    pub fid: Uuid,
    #[serde(flatten)]
    pub outcome: ReleaseOutcome,
}

impl<S: NodeStore> Checkouts<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Take the checkout for `holder`. Fails `CheckedOut` when a
    /// different holder has a live checkout; repeating the rent as the
    /// current holder returns the existing checkout unchanged.
    pub async fn rent(
        &self,
        scope: &Scope,
        fid: Uuid,
        holder: &str,
        ttl: Option<Duration>,
    ) -> Result<Checkout, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        let expires_at = ttl.map(|d| OffsetDateTime::now_utc() + d);
        let checkout = self.store.acquire(fid, holder, expires_at).await?;
        tracing::info!(scope = %scope, fid = %fid, holder = holder, "rented node");
        Ok(checkout)
    }

    /// Give the checkout back. Fails `NotHolder` when the caller does
    /// not hold it; returning an unheld node succeeds as a no-op.
    pub async fn release(
        &self,
        scope: &Scope,
        fid: Uuid,
        holder: &str,
    ) -> Result<(), StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        self.store.release(fid, Some(holder)).await?;
        tracing::info!(scope = %scope, fid = %fid, holder = holder, "returned node");
        Ok(())
    }

    /// Release regardless of holder. Idempotent; authorization is the
    /// transport layer's concern.
    pub async fn force_release(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<(), StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        let was_held = self.store.release(fid, None).await?;
        tracing::info!(scope = %scope, fid = %fid, was_held = was_held, "force-returned node");
        Ok(())
    }

    /// Current checkout state; expired checkouts read as `None`.
    pub async fn rented(
        &self,
        scope: &Scope,
        fid: Uuid,
    ) -> Result<Option<Checkout>, StoreError<S::Error>> {
        resolve_in_scope(&self.store, scope, fid).await?;
        let now = OffsetDateTime::now_utc();
        Ok(self
            .store
            .checkout(fid)
            .await?
            .filter(|c| !c.is_expired(now)))
    }

    /// Rent every node under the scope root, in creation order. Not
    /// atomic: each node is attempted independently and the caller gets
    /// a per-node outcome list. Nodes deleted mid-walk are skipped.
    pub async fn rent_all(
        &self,
        scope: &Scope,
        holder: &str,
        ttl: Option<Duration>,
    ) -> Result<Vec<BulkRent>, StoreError<S::Error>> {
        let root = self
            .store
            .root(scope)
            .await?
            .ok_or(StoreError::RootNotFound(*scope))?;
        let expires_at = ttl.map(|d| OffsetDateTime::now_utc() + d);

        let mut results = Vec::new();
        for node in self.store.descendants(root.fid).await? {
            match self.store.acquire(node.fid, holder, expires_at).await {
                Ok(checkout) => results.push(BulkRent {
                    fid: node.fid,
                    outcome: RentOutcome::Rented { checkout },
                }),
                Err(StoreError::CheckedOut { holder, .. }) => results.push(BulkRent {
                    fid: node.fid,
                    outcome: RentOutcome::Held { holder },
                }),
                Err(StoreError::NodeNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        tracing::info!(scope = %scope, holder = holder, count = results.len(), "bulk rent");
        Ok(results)
    }

    /// Symmetric bulk release with the same partial-failure semantics.
    /// Unheld nodes report `Released`.
    pub async fn release_all(
        &self,
        scope: &Scope,
        holder: &str,
    ) -> Result<Vec<BulkRelease>, StoreError<S::Error>> {
        let root = self
            .store
            .root(scope)
            .await?
            .ok_or(StoreError::RootNotFound(*scope))?;

        let mut results = Vec::new();
        for node in self.store.descendants(root.fid).await? {
            match self.store.release(node.fid, Some(holder)).await {
                Ok(_) => results.push(BulkRelease {
                    fid: node.fid,
                    outcome: ReleaseOutcome::Released,
                }),
                Err(StoreError::NotHolder { holder, .. }) => results.push(BulkRelease {
                    fid: node.fid,
                    outcome: ReleaseOutcome::Forbidden { holder },
                }),
                Err(StoreError::NodeNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        tracing::info!(scope = %scope, holder = holder, count = results.len(), "bulk return");
        Ok(results)
    }
}
