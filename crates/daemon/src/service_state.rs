use url::Url;

use store::checkout::Checkouts;
use store::revisions::Revisions;
use store::tree::FileTree;

use crate::database::{Database, DatabaseSetupError};
use crate::service_config::Config;

/// Main service state - the database plus the managers layered on it.
///
/// The managers all share the same `Database` handle; it is the
/// NodeStore provider for the whole process.
#[derive(Clone)]
pub struct State {
    database: Database,
    tree: FileTree<Database>,
    revisions: Revisions<Database>,
    checkouts: Checkouts<Database>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // the parent directory must exist; the file itself is
                // created on first connect
                if let Some(parent) = path.parent() {
                    if !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        Ok(Self::new(database))
    }

    pub fn new(database: Database) -> Self {
        Self {
            tree: FileTree::new(database.clone()),
            revisions: Revisions::new(database.clone()),
            checkouts: Checkouts::new(database.clone()),
            database,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn tree(&self) -> &FileTree<Database> {
        &self.tree
    }

    pub fn revisions(&self) -> &Revisions<Database> {
        &self.revisions
    }

    pub fn checkouts(&self) -> &Checkouts<Database> {
        &self.checkouts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("database path parent directory does not exist")]
    DatabasePathDoesNotExist,

    #[error("invalid database URL")]
    InvalidDatabaseUrl,

    #[error("database setup error: {0}")]
    DatabaseSetup(#[from] DatabaseSetupError),
}
