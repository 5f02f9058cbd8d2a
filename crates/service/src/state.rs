use url::Url;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};

use common::client::Fdp;
use common::store::BlobsStore;

/// A protocol client backed by iroh-blobs and the SQLite registry
pub type ServiceFdp = Fdp<BlobsStore, Database>;

/// Main service state
#[derive(Clone, Debug)]
pub struct State {
    fdp: ServiceFdp,
    database: Database,
    blobs: BlobsStore,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // the database file may be created, its directory must exist
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                // parse the path into a URL
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup blobs store
        tracing::debug!("ServiceState::from_config - loading blobs store");
        let blobs = match config.blobs_path {
            Some(ref path) => BlobsStore::fs(path).await,
            None => BlobsStore::memory().await,
        }
        .map_err(|e| StateSetupError::BlobsStoreError(e.to_string()))?;
        tracing::debug!("ServiceState::from_config - blobs store loaded successfully");

        // 3. Wire the protocol client
        let fdp = Fdp::new(blobs.clone(), database.clone(), config.protocol.clone());

        Ok(Self {
            fdp,
            database,
            blobs,
        })
    }

    pub fn fdp(&self) -> &ServiceFdp {
        &self.fdp
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn blobs(&self) -> &BlobsStore {
        &self.blobs
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Blobs store error: {0}")]
    BlobsStoreError(String),
}
