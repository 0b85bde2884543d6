use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use store::error::StoreError;
use store::node::{Checkout, FileNode, NodeKind, Revision, Scope};
use store::provider::NodeStore;

use crate::database::Database;

/// SQLite rendition of the NodeStore contract. Every compound
/// operation runs inside a single transaction, which is the per-node
/// serialization boundary the provider contract asks for.

const NODE_COLUMNS: &str = "fid, pid, nid, parent_fid, name, kind, created_at";
const REVISION_COLUMNS: &str = "fid, seq, content_ref, checksum, creator, created_at";
const CHECKOUT_COLUMNS: &str = "fid, holder, acquired_at, expires_at";

const SUBTREE_CTE: &str = r#"
    WITH RECURSIVE subtree(fid) AS (
        SELECT fid FROM file_nodes WHERE fid = ?1
        UNION ALL
        SELECT f.fid FROM file_nodes f JOIN subtree s ON f.parent_fid = s.fid
    )
"#;

#[derive(Debug, FromRow)]
struct NodeRow {
    fid: String,
    pid: String,
    nid: Option<String>,
    parent_fid: Option<String>,
    name: String,
    kind: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct RevisionRow {
    fid: String,
    seq: i64,
    content_ref: String,
    checksum: Option<String>,
    creator: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct CheckoutRow {
    fid: String,
    holder: String,
    acquired_at: OffsetDateTime,
    expires_at: Option<OffsetDateTime>,
}

fn parse_uuid(s: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl NodeRow {
    fn into_node(self) -> Result<FileNode, sqlx::Error> {
        Ok(FileNode {
            fid: parse_uuid(&self.fid)?,
            pid: parse_uuid(&self.pid)?,
            nid: self.nid.as_deref().map(parse_uuid).transpose()?,
            parent: self.parent_fid.as_deref().map(parse_uuid).transpose()?,
            name: self.name,
            kind: self
                .kind
                .parse::<NodeKind>()
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: self.created_at,
        })
    }
}

impl RevisionRow {
    fn into_revision(self) -> Result<Revision, sqlx::Error> {
        Ok(Revision {
            fid: parse_uuid(&self.fid)?,
            seq: self.seq as u64,
            content_ref: self.content_ref,
            checksum: self.checksum,
            creator: self.creator,
            created_at: self.created_at,
        })
    }
}

impl CheckoutRow {
    fn into_checkout(self) -> Result<Checkout, sqlx::Error> {
        Ok(Checkout {
            fid: parse_uuid(&self.fid)?,
            holder: self.holder,
            acquired_at: self.acquired_at,
            expires_at: self.expires_at,
        })
    }
}

async fn fetch_node(
    conn: &mut SqliteConnection,
    fid: Uuid,
) -> Result<Option<FileNode>, sqlx::Error> {
    let row = sqlx::query_as::<_, NodeRow>(&format!(
        "SELECT {} FROM file_nodes WHERE fid = ?1",
        NODE_COLUMNS
    ))
    .bind(fid.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    row.map(NodeRow::into_node).transpose()
}

/// The checkout on `fid` that still blocks other parties, if any.
async fn live_checkout(
    conn: &mut SqliteConnection,
    fid: Uuid,
    now: OffsetDateTime,
) -> Result<Option<Checkout>, sqlx::Error> {
    let row = sqlx::query_as::<_, CheckoutRow>(&format!(
        "SELECT {} FROM checkouts WHERE fid = ?1",
        CHECKOUT_COLUMNS
    ))
    .bind(fid.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row
        .map(CheckoutRow::into_checkout)
        .transpose()?
        .filter(|c| !c.is_expired(now)))
}

async fn insert_node(conn: &mut SqliteConnection, node: &FileNode) -> Result<(), sqlx::Error> {
    let position = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM file_nodes WHERE parent_fid = ?1",
    )
    .bind(node.parent.map(|p| p.to_string()))
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO file_nodes (fid, pid, nid, parent_fid, name, kind, position, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(node.fid.to_string())
    .bind(node.pid.to_string())
    .bind(node.nid.map(|n| n.to_string()))
    .bind(node.parent.map(|p| p.to_string()))
    .bind(&node.name)
    .bind(node.kind.as_str())
    .bind(position)
    .bind(node.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn select_root(
    conn: &mut SqliteConnection,
    scope: &Scope,
) -> Result<Option<FileNode>, sqlx::Error> {
    let row = sqlx::query_as::<_, NodeRow>(&format!(
        "SELECT {} FROM file_nodes WHERE pid = ?1 AND nid IS ?2 AND parent_fid IS NULL",
        NODE_COLUMNS
    ))
    .bind(scope.pid.to_string())
    .bind(scope.nid.map(|n| n.to_string()))
    .fetch_optional(&mut *conn)
    .await?;
    row.map(NodeRow::into_node).transpose()
}

#[async_trait]
impl NodeStore for Database {
    type Error = sqlx::Error;

    async fn get(&self, fid: Uuid) -> Result<Option<FileNode>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        Ok(fetch_node(&mut conn, fid).await?)
    }

    async fn root(&self, scope: &Scope) -> Result<Option<FileNode>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        Ok(select_root(&mut conn, scope).await?)
    }

    async fn ensure_root(&self, scope: &Scope) -> Result<FileNode, StoreError<Self::Error>> {
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        if let Some(existing) = select_root(&mut tx, scope).await? {
            tx.commit().await.map_err(StoreError::Provider)?;
            return Ok(existing);
        }

        let root = FileNode::root(scope);
        match insert_node(&mut tx, &root).await {
            Ok(()) => {
                tx.commit().await.map_err(StoreError::Provider)?;
                Ok(root)
            }
            // a concurrent init won the unique root index; read theirs
            Err(sqlx::Error::Database(ref db_error)) if db_error.constraint().is_some() => {
                drop(tx);
                let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
                select_root(&mut conn, scope)
                    .await?
                    .ok_or(StoreError::RootNotFound(*scope))
            }
            Err(e) => Err(StoreError::Provider(e)),
        }
    }

    async fn children(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        if fetch_node(&mut conn, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        let rows = sqlx::query_as::<_, NodeRow>(&format!(
            "SELECT {} FROM file_nodes WHERE parent_fid = ?1 ORDER BY position",
            NODE_COLUMNS
        ))
        .bind(fid.to_string())
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter()
            .map(|r| r.into_node().map_err(StoreError::Provider))
            .collect()
    }

    async fn descendants(&self, fid: Uuid) -> Result<Vec<FileNode>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        if fetch_node(&mut conn, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        let rows = sqlx::query_as::<_, NodeRow>(&format!(
            r#"{}
            SELECT f.fid, f.pid, f.nid, f.parent_fid, f.name, f.kind, f.created_at
            FROM file_nodes f JOIN subtree s ON f.fid = s.fid
            WHERE f.fid <> ?1
            ORDER BY f.rowid
            "#,
            SUBTREE_CTE
        ))
        .bind(fid.to_string())
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter()
            .map(|r| r.into_node().map_err(StoreError::Provider))
            .collect()
    }

    async fn insert_child(
        &self,
        parent_fid: Uuid,
        node: FileNode,
    ) -> Result<FileNode, StoreError<Self::Error>> {
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        let parent = fetch_node(&mut tx, parent_fid)
            .await?
            .ok_or(StoreError::NodeNotFound(parent_fid))?;
        if !parent.kind.is_folder() {
            return Err(StoreError::NotFolder(parent_fid));
        }

        insert_node(&mut tx, &node).await?;
        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(node)
    }

    async fn reparent(
        &self,
        fid: Uuid,
        new_parent_fid: Uuid,
    ) -> Result<FileNode, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        let node = fetch_node(&mut tx, fid)
            .await?
            .ok_or(StoreError::NodeNotFound(fid))?;
        if node.is_root() {
            return Err(StoreError::RootImmutable(fid));
        }

        let new_parent = fetch_node(&mut tx, new_parent_fid)
            .await?
            .ok_or(StoreError::NodeNotFound(new_parent_fid))?;
        if !new_parent.kind.is_folder() {
            return Err(StoreError::NotFolder(new_parent_fid));
        }

        // is the new parent inside the subtree being moved?
        let in_subtree = sqlx::query_scalar::<_, i64>(&format!(
            "{} SELECT COUNT(*) FROM subtree WHERE fid = ?2",
            SUBTREE_CTE
        ))
        .bind(fid.to_string())
        .bind(new_parent_fid.to_string())
        .fetch_one(&mut *tx)
        .await?;
        if in_subtree > 0 {
            return Err(StoreError::Cycle {
                fid,
                new_parent: new_parent_fid,
            });
        }

        if let Some(held) = live_checkout(&mut tx, new_parent_fid, now).await? {
            return Err(StoreError::CheckedOut {
                fid: new_parent_fid,
                holder: held.holder,
            });
        }

        let position = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM file_nodes WHERE parent_fid = ?1",
        )
        .bind(new_parent_fid.to_string())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE file_nodes SET parent_fid = ?1, position = ?2 WHERE fid = ?3")
            .bind(new_parent_fid.to_string())
            .bind(position)
            .bind(fid.to_string())
            .execute(&mut *tx)
            .await?;

        let moved = fetch_node(&mut tx, fid)
            .await?
            .ok_or(StoreError::NodeNotFound(fid))?;
        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(moved)
    }

    async fn remove_subtree(&self, fid: Uuid) -> Result<Vec<Uuid>, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        let node = fetch_node(&mut tx, fid)
            .await?
            .ok_or(StoreError::NodeNotFound(fid))?;
        if node.is_root() {
            return Err(StoreError::RootImmutable(fid));
        }

        let doomed = sqlx::query_scalar::<_, String>(&format!(
            "{} SELECT fid FROM subtree",
            SUBTREE_CTE
        ))
        .bind(fid.to_string())
        .fetch_all(&mut *tx)
        .await?;

        let held = sqlx::query_as::<_, CheckoutRow>(&format!(
            "{} SELECT c.fid, c.holder, c.acquired_at, c.expires_at
               FROM checkouts c JOIN subtree s ON c.fid = s.fid",
            SUBTREE_CTE
        ))
        .bind(fid.to_string())
        .fetch_all(&mut *tx)
        .await?;
        for row in held {
            let checkout = row.into_checkout().map_err(StoreError::Provider)?;
            if !checkout.is_expired(now) {
                return Err(StoreError::CheckedOut {
                    fid: checkout.fid,
                    holder: checkout.holder,
                });
            }
        }

        // parent_fid cascades take the subtree, revisions, and checkouts
        sqlx::query("DELETE FROM file_nodes WHERE fid = ?1")
            .bind(fid.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await.map_err(StoreError::Provider)?;

        doomed
            .iter()
            .map(|s| parse_uuid(s).map_err(StoreError::Provider))
            .collect()
    }

    async fn rename(&self, fid: Uuid, name: &str) -> Result<FileNode, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        if fetch_node(&mut tx, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        if let Some(held) = live_checkout(&mut tx, fid, now).await? {
            return Err(StoreError::CheckedOut {
                fid,
                holder: held.holder,
            });
        }

        sqlx::query("UPDATE file_nodes SET name = ?1 WHERE fid = ?2")
            .bind(name)
            .bind(fid.to_string())
            .execute(&mut *tx)
            .await?;

        let renamed = fetch_node(&mut tx, fid)
            .await?
            .ok_or(StoreError::NodeNotFound(fid))?;
        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(renamed)
    }

    async fn revisions(&self, fid: Uuid) -> Result<Vec<Revision>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        if fetch_node(&mut conn, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        let rows = sqlx::query_as::<_, RevisionRow>(&format!(
            "SELECT {} FROM revisions WHERE fid = ?1 ORDER BY seq DESC",
            REVISION_COLUMNS
        ))
        .bind(fid.to_string())
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter()
            .map(|r| r.into_revision().map_err(StoreError::Provider))
            .collect()
    }

    async fn append_revision(
        &self,
        fid: Uuid,
        content_ref: &str,
        checksum: Option<&str>,
        creator: &str,
    ) -> Result<Revision, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        let node = fetch_node(&mut tx, fid)
            .await?
            .ok_or(StoreError::NodeNotFound(fid))?;
        if node.kind == NodeKind::Folder {
            return Err(StoreError::NotFolder(fid));
        }
        if let Some(held) = live_checkout(&mut tx, fid, now).await? {
            if held.holder != creator {
                return Err(StoreError::CheckedOut {
                    fid,
                    holder: held.holder,
                });
            }
        }

        let seq = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM revisions WHERE fid = ?1",
        )
        .bind(fid.to_string())
        .fetch_one(&mut *tx)
        .await?;

        let revision = Revision {
            fid,
            seq: seq as u64,
            content_ref: content_ref.to_string(),
            checksum: checksum.map(str::to_string),
            creator: creator.to_string(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO revisions (fid, seq, content_ref, checksum, creator, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(fid.to_string())
        .bind(seq)
        .bind(&revision.content_ref)
        .bind(revision.checksum.as_deref())
        .bind(&revision.creator)
        .bind(revision.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(revision)
    }

    async fn checkout(&self, fid: Uuid) -> Result<Option<Checkout>, StoreError<Self::Error>> {
        let mut conn = self.0.acquire().await.map_err(StoreError::Provider)?;
        if fetch_node(&mut conn, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        let row = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {} FROM checkouts WHERE fid = ?1",
            CHECKOUT_COLUMNS
        ))
        .bind(fid.to_string())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row
            .map(|r| r.into_checkout().map_err(StoreError::Provider))
            .transpose()?)
    }

    async fn acquire(
        &self,
        fid: Uuid,
        holder: &str,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<Checkout, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        if fetch_node(&mut tx, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }
        if let Some(held) = live_checkout(&mut tx, fid, now).await? {
            if held.holder == holder {
                tx.commit().await.map_err(StoreError::Provider)?;
                return Ok(held);
            }
            return Err(StoreError::CheckedOut {
                fid,
                holder: held.holder,
            });
        }

        let checkout = Checkout {
            fid,
            holder: holder.to_string(),
            acquired_at: now,
            expires_at,
        };
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO checkouts (fid, holder, acquired_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(fid.to_string())
        .bind(&checkout.holder)
        .bind(checkout.acquired_at)
        .bind(checkout.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(checkout)
    }

    async fn release(
        &self,
        fid: Uuid,
        holder: Option<&str>,
    ) -> Result<bool, StoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await.map_err(StoreError::Provider)?;

        if fetch_node(&mut tx, fid).await?.is_none() {
            return Err(StoreError::NodeNotFound(fid));
        }

        let live = live_checkout(&mut tx, fid, now).await?;
        if let (Some(held), Some(party)) = (&live, holder) {
            if held.holder != *party {
                return Err(StoreError::NotHolder {
                    fid,
                    holder: held.holder.clone(),
                });
            }
        }

        // expired leftovers are dropped on the way out
        sqlx::query("DELETE FROM checkouts WHERE fid = ?1")
            .bind(fid.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await.map_err(StoreError::Provider)?;
        Ok(live.is_some())
    }
}
