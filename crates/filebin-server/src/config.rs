//! Server configuration from `FILEBIN_*` environment variables

use crate::error::{Result, ServerError};
use filebin_registry::RegistryConfig;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// The single shared credential guarding uploads, listing and deletes
#[derive(Clone)]
pub struct Credentials {
    pub realm: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("realm", &self.realm)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub storage_dir: PathBuf,
    pub id_length: usize,
    pub max_age: Duration,
    /// Request body limit in bytes
    pub upload_max_size: usize,
    /// Prefix for file URLs in upload and list responses; empty prints bare ids
    pub base_url: String,
    pub credentials: Credentials,
    pub sweep_interval: Duration,
    pub event_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_listen_addr(
            &lookup("FILEBIN_LISTEN_ADDR").unwrap_or_else(|| ":8000".to_string()),
        )?;

        let storage_dir = lookup("FILEBIN_STORAGE_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ServerError::Config(
                    "no data backend configured, set FILEBIN_STORAGE_DIR".to_string(),
                )
            })?;

        let id_length: usize = parse_number(&lookup, "FILEBIN_ID_LENGTH", 8)?;
        if !(filebin_registry::MIN_ID_LENGTH..=255).contains(&id_length) {
            return Err(ServerError::Config(format!(
                "FILEBIN_ID_LENGTH must be between {} and 255",
                filebin_registry::MIN_ID_LENGTH
            )));
        }

        let max_age_hours: u64 = parse_number(&lookup, "FILEBIN_MAX_AGE", 24 * 14)?;
        if max_age_hours == 0 {
            return Err(ServerError::Config(
                "FILEBIN_MAX_AGE must be > 0".to_string(),
            ));
        }
        let max_age_secs = max_age_hours.checked_mul(60 * 60).ok_or_else(|| {
            ServerError::Config(format!("FILEBIN_MAX_AGE is too large: {} hours", max_age_hours))
        })?;

        let upload_max_size_mb: usize = parse_number(&lookup, "FILEBIN_UPLOAD_MAX_SIZE_MB", 10)?;
        if upload_max_size_mb == 0 {
            return Err(ServerError::Config(
                "FILEBIN_UPLOAD_MAX_SIZE_MB must be > 0".to_string(),
            ));
        }
        let upload_max_size = upload_max_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            ServerError::Config(format!(
                "FILEBIN_UPLOAD_MAX_SIZE_MB is too large: {} MB",
                upload_max_size_mb
            ))
        })?;

        let base_url = lookup("FILEBIN_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let credentials = Credentials {
            realm: lookup("FILEBIN_AUTH_REALM").unwrap_or_else(|| "filebin".to_string()),
            username: required(&lookup, "FILEBIN_AUTH_USERNAME")?,
            password: required(&lookup, "FILEBIN_AUTH_PASSWORD")?,
        };

        let sweep_interval_secs: u64 = parse_number(&lookup, "FILEBIN_SWEEP_INTERVAL_SECS", 3600)?;
        let event_timeout_secs: u64 = parse_number(&lookup, "FILEBIN_EVENT_TIMEOUT_SECS", 300)?;
        if sweep_interval_secs == 0 || event_timeout_secs == 0 {
            return Err(ServerError::Config(
                "FILEBIN_SWEEP_INTERVAL_SECS and FILEBIN_EVENT_TIMEOUT_SECS must be > 0"
                    .to_string(),
            ));
        }

        Ok(Self {
            listen_addr,
            storage_dir,
            id_length,
            max_age: Duration::from_secs(max_age_secs),
            upload_max_size,
            base_url,
            credentials,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            event_timeout: Duration::from_secs(event_timeout_secs),
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            id_length: self.id_length,
            max_age: self.max_age,
            sweep_interval: self.sweep_interval,
            ..Default::default()
        }
    }

    /// Public URL of a file, or the bare id when no base URL is set
    pub fn file_url(&self, id: &str) -> String {
        if self.base_url.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", self.base_url, id)
        }
    }
}

/// Accepts `host:port` or a bare `:port`, which listens on all interfaces.
fn parse_listen_addr(value: &str) -> Result<SocketAddr> {
    let full = if value.starts_with(':') {
        format!("0.0.0.0{}", value)
    } else {
        value.to_string()
    };
    full.parse()
        .map_err(|e| ServerError::Config(format!("Invalid FILEBIN_LISTEN_ADDR {:?}: {}", value, e)))
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid {} {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(ServerError::Config(format!("{} is empty", key))),
        None => Err(ServerError::Config(format!("{} missing", key))),
    }
}
