use std::{str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost parameters for the credential hasher.
#[derive(Debug, Clone, Copy)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local { dir: String },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub backend: StorageBackend,
    pub max_file_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` assembles the in-memory record store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub uploads: UploadConfig,
    /// Activation flag given to freshly registered students.
    pub default_active: bool,
    pub operation_timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_TTL_MINUTES: i64 = 7 * 24 * 60;
const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

fn check_ttl(minutes: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "student-records".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "student-records-users".into()),
            ttl_minutes: check_ttl(parse_env("JWT_TTL_MINUTES", DEFAULT_TTL_MINUTES)?)?,
        };

        let hash = HashConfig {
            memory_kib: parse_env("ARGON2_MEMORY_KIB", argon2::Params::DEFAULT_M_COST)?,
            iterations: parse_env("ARGON2_ITERATIONS", argon2::Params::DEFAULT_T_COST)?,
            parallelism: parse_env("ARGON2_PARALLELISM", argon2::Params::DEFAULT_P_COST)?,
        };

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local {
                dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            },
            "s3" => StorageBackend::S3(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            other => anyhow::bail!("STORAGE_BACKEND must be `local` or `s3`, got `{other}`"),
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("APP_PORT", 5000)?,
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            jwt,
            hash,
            uploads: UploadConfig {
                backend,
                max_file_bytes: parse_env("UPLOAD_MAX_BYTES", DEFAULT_MAX_FILE_BYTES)?,
            },
            default_active: parse_env("REGISTRATION_DEFAULT_ACTIVE", false)?,
            operation_timeout_secs: parse_env("OPERATION_TIMEOUT_SECS", 10)?,
            cors_origins,
        })
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        _ => Ok(default),
    }
}
