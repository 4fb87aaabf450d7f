use std::{future::Future, path::PathBuf, sync::Arc};

use tracing::{info, warn};

use crate::auth::password::Hasher;
use crate::config::{AppConfig, HashConfig, JwtConfig, StorageBackend, UploadConfig, DEFAULT_MAX_FILE_BYTES};
use crate::error::AppError;
use crate::storage::{LocalStorage, S3Storage, StorageClient};
use crate::students::{memory::MemoryStudentStore, pg::PgStudentStore, repo::StudentStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn StudentStore>,
    pub storage: Arc<dyn StorageClient>,
    pub hasher: Hasher,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let store = match &config.database_url {
            Some(url) => Arc::new(
                PgStudentStore::connect(url, config.db_max_connections, config.operation_timeout())
                    .await?,
            ) as Arc<dyn StudentStore>,
            None => {
                warn!("DATABASE_URL not set; student records are kept in memory only");
                Arc::new(MemoryStudentStore::new()) as Arc<dyn StudentStore>
            }
        };

        let storage = match &config.uploads.backend {
            StorageBackend::Local { dir } => {
                info!(dir = %dir, "storing uploads on local disk");
                Arc::new(LocalStorage::new(dir)) as Arc<dyn StorageClient>
            }
            StorageBackend::S3(s3) => {
                info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "storing uploads in s3");
                Arc::new(S3Storage::new(s3).await?) as Arc<dyn StorageClient>
            }
        };

        let hasher = Hasher::new(config.hash)?;

        Ok(Self::from_parts(config, store, storage, hasher))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn StudentStore>,
        storage: Arc<dyn StorageClient>,
        hasher: Hasher,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            hasher,
        }
    }

    /// In-memory store, local uploads under `upload_dir`, cheap hashing.
    /// Meant for tests and local experiments.
    pub fn in_memory(upload_dir: impl Into<PathBuf>, default_active: bool) -> Self {
        let upload_dir = upload_dir.into();
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 7 * 24 * 60,
            },
            hash: HashConfig {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
            uploads: UploadConfig {
                backend: StorageBackend::Local {
                    dir: upload_dir.display().to_string(),
                },
                max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            },
            default_active,
            operation_timeout_secs: 10,
            cors_origins: Vec::new(),
        });
        let hasher = Hasher::new(config.hash).unwrap_or_default();
        Self::from_parts(
            config,
            Arc::new(MemoryStudentStore::new()),
            Arc::new(LocalStorage::new(upload_dir)),
            hasher,
        )
    }

    /// Runs `fut` under the configured operation timeout. Expiry is final.
    pub async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.config.operation_timeout(), fut)
            .await
            .map_err(|_| {
                warn!(op, "operation timed out");
                AppError::Timeout { op }
            })
    }
}
