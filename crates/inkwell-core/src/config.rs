//! Configuration module
//!
//! Configuration is read from the environment (after loading `.env` with
//! dotenvy). Every value has a default except the ones a backend genuinely
//! cannot run without; those are checked in [`Config::validate`].

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const SMTP_PORT: u16 = 587;
const LOCAL_STORAGE_PATH: &str = "./data/media";

/// Default name of the channel non-owning processes use to reach the mail queue owner.
pub const DEFAULT_PIPE_NAME: &str = "inkwell-email-queue";
const PIPE_CONNECT_TIMEOUT_MS: u64 = 15_000;
const PIPE_RETRY_DELAY_MS: u64 = 1_000;
const PIPE_MAX_INSTANCES: usize = 1;
const PIPE_LISTENER_BACKOFF_MS: u64 = 1_000;
const DRAIN_INTERVAL_SECS: u64 = 10;
const DEDUP_RETENTION_HOURS: u64 = 24;

/// Which side of the cross-process mail bridge this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailQueueRole {
    /// Holds the in-process FIFO and accepts messages from clients.
    Server,
    /// Forwards every message to the server over the named channel.
    Client,
}

impl FromStr for MailQueueRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" | "owner" => Ok(MailQueueRole::Server),
            "client" => Ok(MailQueueRole::Client),
            _ => Err(anyhow::anyhow!("Invalid mail queue role: {}", s)),
        }
    }
}

impl Display for MailQueueRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MailQueueRole::Server => write!(f, "server"),
            MailQueueRole::Client => write!(f, "client"),
        }
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "compact" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Settings shared by both binaries
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub log_format: LogFormat,
}

/// Object storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Image upload validation and temp-file settings
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub temp_dir: PathBuf,
}

/// Email queue and cross-process bridge settings
#[derive(Clone, Debug)]
pub struct MailQueueConfig {
    pub role: MailQueueRole,
    pub pipe_name: String,
    pub connect_timeout: Duration,
    pub retry_delay: Duration,
    /// Only one inbound connection is served at a time.
    pub max_instances: usize,
    pub listener_backoff: Duration,
    pub drain_interval: Duration,
    pub dedup_retention: Duration,
}

impl Default for MailQueueConfig {
    fn default() -> Self {
        Self {
            role: MailQueueRole::Server,
            pipe_name: DEFAULT_PIPE_NAME.to_string(),
            connect_timeout: Duration::from_millis(PIPE_CONNECT_TIMEOUT_MS),
            retry_delay: Duration::from_millis(PIPE_RETRY_DELAY_MS),
            max_instances: PIPE_MAX_INSTANCES,
            listener_backoff: Duration::from_millis(PIPE_LISTENER_BACKOFF_MS),
            drain_interval: Duration::from_secs(DRAIN_INTERVAL_SECS),
            dedup_retention: Duration::from_secs(DEDUP_RETENTION_HOURS * 3600),
        }
    }
}

/// SMTP delivery settings (used by the mailer process only)
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub tls: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub mail: MailQueueConfig,
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper around this; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parse_or = |key: &str, default: u64| -> u64 {
            var(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
        };
        let list_or = |key: &str, default: &str| -> Vec<String> {
            var(key)
                .unwrap_or_else(|| default.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let bool_or = |key: &str, default: bool| -> bool {
            var(key)
                .map(|s| s.to_lowercase().parse().unwrap_or(default))
                .unwrap_or(default)
        };

        let base = BaseConfig {
            server_port: match var("PORT") {
                Some(port) => port
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            database_url: var("DATABASE_URL"),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS as u64) as u32,
            db_timeout_seconds: parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            log_format: var("LOG_FORMAT")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(LogFormat::Pretty),
        };

        let storage = StorageConfig {
            backend: var("STORAGE_BACKEND")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(StorageBackend::Local),
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: Some(
                var("LOCAL_STORAGE_PATH").unwrap_or_else(|| LOCAL_STORAGE_PATH.to_string()),
            ),
            local_storage_base_url: Some(var("LOCAL_STORAGE_BASE_URL").unwrap_or_else(|| {
                format!("http://localhost:{}/media", base.server_port)
            })),
        };

        let upload = UploadConfig {
            max_file_size_bytes: parse_or("MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB as u64) as usize
                * 1024
                * 1024,
            allowed_extensions: list_or("ALLOWED_EXTENSIONS", "jpg,jpeg,png,gif,webp"),
            allowed_content_types: list_or(
                "ALLOWED_CONTENT_TYPES",
                "image/jpeg,image/png,image/gif,image/webp",
            ),
            temp_dir: var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        };

        let mail = MailQueueConfig {
            role: var("MAIL_QUEUE_ROLE")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(MailQueueRole::Server),
            pipe_name: var("MAIL_PIPE_NAME").unwrap_or_else(|| DEFAULT_PIPE_NAME.to_string()),
            connect_timeout: Duration::from_millis(parse_or(
                "MAIL_PIPE_CONNECT_TIMEOUT_MS",
                PIPE_CONNECT_TIMEOUT_MS,
            )),
            retry_delay: Duration::from_millis(parse_or(
                "MAIL_PIPE_RETRY_DELAY_MS",
                PIPE_RETRY_DELAY_MS,
            )),
            max_instances: parse_or("MAIL_PIPE_MAX_INSTANCES", PIPE_MAX_INSTANCES as u64) as usize,
            listener_backoff: Duration::from_millis(parse_or(
                "MAIL_PIPE_LISTENER_BACKOFF_MS",
                PIPE_LISTENER_BACKOFF_MS,
            )),
            drain_interval: Duration::from_secs(parse_or(
                "MAIL_DRAIN_INTERVAL_SECS",
                DRAIN_INTERVAL_SECS,
            )),
            dedup_retention: Duration::from_secs(
                parse_or("MAIL_DEDUP_RETENTION_HOURS", DEDUP_RETENTION_HOURS) * 3600,
            ),
        };

        let smtp = SmtpConfig {
            host: var("SMTP_HOST"),
            port: var("SMTP_PORT")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(SMTP_PORT),
            user: var("SMTP_USER"),
            password: var("SMTP_PASSWORD"),
            from: var("SMTP_FROM"),
            tls: bool_or("SMTP_TLS", true),
        };

        let config = Config {
            base,
            storage,
            upload,
            mail,
            smtp,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.mail.max_instances == 0 {
            return Err(anyhow::anyhow!(
                "MAIL_PIPE_MAX_INSTANCES must be at least 1"
            ));
        }

        if self.mail.drain_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "MAIL_DRAIN_INTERVAL_SECS must be greater than 0"
            ));
        }

        if self.mail.pipe_name.contains(['/', '\\']) {
            return Err(anyhow::anyhow!(
                "MAIL_PIPE_NAME must be a bare name, not a path"
            ));
        }

        if let Some(ref url) = self.base.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        Ok(())
    }

    /// SMTP must be fully configured before the mailer can deliver anything.
    pub fn validate_smtp(&self) -> Result<(), anyhow::Error> {
        if self.smtp.host.is_none() || self.smtp.from.is_none() {
            return Err(anyhow::anyhow!(
                "The mailer requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(
            self.base.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn database_url(&self) -> Option<&str> {
        self.base.database_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn local_storage() -> Vec<(&'static str, &'static str)> {
        vec![
            ("LOCAL_STORAGE_PATH", "/tmp/inkwell-test"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:4000/media"),
        ]
    }

    #[test]
    fn mail_defaults_match_bridge_contract() {
        let config = Config::from_lookup(lookup(&local_storage())).unwrap();
        assert_eq!(config.mail.role, MailQueueRole::Server);
        assert_eq!(config.mail.pipe_name, DEFAULT_PIPE_NAME);
        assert_eq!(config.mail.connect_timeout, Duration::from_millis(15_000));
        assert_eq!(config.mail.retry_delay, Duration::from_millis(1_000));
        assert_eq!(config.mail.max_instances, 1);
        assert_eq!(config.mail.drain_interval, Duration::from_secs(10));
        assert_eq!(config.mail.dedup_retention, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn upload_defaults() {
        let config = Config::from_lookup(lookup(&local_storage())).unwrap();
        assert_eq!(config.upload.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.upload.allowed_extensions,
            vec!["jpg", "jpeg", "png", "gif", "webp"]
        );
        assert!(config
            .upload
            .allowed_content_types
            .contains(&"image/webp".to_string()));
    }

    #[test]
    fn local_storage_defaults_follow_port() {
        let config = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(
            config.storage.local_storage_path.as_deref(),
            Some("./data/media")
        );
        assert_eq!(
            config.storage.local_storage_base_url.as_deref(),
            Some("http://localhost:8080/media")
        );
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let err = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "s3")])).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "blog-images"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.storage.s3_region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn client_role_and_overrides() {
        let mut pairs = local_storage();
        pairs.push(("MAIL_QUEUE_ROLE", "client"));
        pairs.push(("MAIL_PIPE_NAME", "custom-pipe"));
        pairs.push(("MAIL_PIPE_CONNECT_TIMEOUT_MS", "250"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.mail.role, MailQueueRole::Client);
        assert_eq!(config.mail.pipe_name, "custom-pipe");
        assert_eq!(config.mail.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_unusable_mail_settings() {
        let mut pairs = local_storage();
        pairs.push(("MAIL_PIPE_MAX_INSTANCES", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = local_storage();
        pairs.push(("MAIL_PIPE_NAME", "../escape"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = local_storage();
        pairs.push(("MAIL_DRAIN_INTERVAL_SECS", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn smtp_validation_is_separate() {
        let config = Config::from_lookup(lookup(&local_storage())).unwrap();
        assert!(config.validate_smtp().is_err());

        let mut pairs = local_storage();
        pairs.push(("SMTP_HOST", "smtp.example.com"));
        pairs.push(("SMTP_FROM", "blog@example.com"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.validate_smtp().is_ok());
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.tls);
    }
}
