//! Configuration management
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file) with the defaults below, then validated once at startup.

use crate::credential::{Credential, Credentials};
use crate::error::{IngestError, Result};
use crate::http::{env_parse, HttpConfig};
use crate::sources::SourceKind;
use dashsync_common::types::TenantId;
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Store Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/dashsync";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Destination store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Supabase,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Postgres => "postgres",
            StoreKind::Supabase => "supabase",
            StoreKind::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreKind {
    type Err = IngestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "supabase" => Ok(StoreKind::Supabase),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(IngestError::Config(format!(
                "Invalid store '{}'. Expected one of: postgres, supabase, memory",
                s
            ))),
        }
    }
}

/// Direct Postgres connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Supabase REST settings; the service key is redacted in `Debug`
#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    pub url: Option<Url>,
    pub service_key: Option<Credential>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub database: DatabaseConfig,
    pub supabase: SupabaseConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ThreeCxConfig {
    pub base_url: Option<Url>,
}

/// Process configuration for the ingest binary
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    /// Tenant used when a run does not name one
    pub tenant_id: Option<TenantId>,
    pub store: StoreConfig,
    pub http: HttpConfig,
    pub threecx: ThreeCxConfig,
    pub credentials: Credentials,
}

fn env_url(key: &str) -> Result<Option<Url>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => Url::parse(raw.trim())
            .map(Some)
            .map_err(|e| IngestError::Config(format!("{} is not a valid URL: {}", key, e))),
        _ => Ok(None),
    }
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Read the environment without validating
    pub fn from_env() -> Result<Self> {
        let tenant_id = match std::env::var("DASHSYNC_TENANT_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.parse::<TenantId>()?),
            _ => None,
        };

        let kind = match std::env::var("DASHSYNC_STORE") {
            Ok(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => StoreKind::default(),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
            connect_timeout_secs: env_parse("DATABASE_CONNECT_TIMEOUT")
                .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
        };

        let supabase = SupabaseConfig {
            url: env_url("SUPABASE_URL")?,
            service_key: Credential::from_raw(std::env::var("SUPABASE_SERVICE_KEY").ok().as_deref()),
        };

        Ok(Self {
            tenant_id,
            store: StoreConfig {
                kind,
                database,
                supabase,
            },
            http: HttpConfig::from_env(),
            threecx: ThreeCxConfig {
                base_url: env_url("DASHSYNC_THREECX_BASE_URL")?,
            },
            credentials: Credentials::from_env(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;

        match self.store.kind {
            StoreKind::Postgres => {
                if self.store.database.url.trim().is_empty() {
                    return Err(IngestError::Config("DATABASE_URL cannot be empty".to_string()));
                }
                if self.store.database.max_connections == 0 {
                    return Err(IngestError::Config(
                        "DATABASE_MAX_CONNECTIONS must be greater than 0".to_string(),
                    ));
                }
            },
            StoreKind::Supabase => {
                if self.store.supabase.url.is_none() {
                    return Err(IngestError::Config(
                        "SUPABASE_URL is required when DASHSYNC_STORE=supabase".to_string(),
                    ));
                }
                if self.store.supabase.service_key.is_none() {
                    return Err(IngestError::Config(
                        "SUPABASE_SERVICE_KEY is required when DASHSYNC_STORE=supabase".to_string(),
                    ));
                }
            },
            StoreKind::Memory => {},
        }

        if self.credentials.contains(SourceKind::ThreeCx) && self.threecx.base_url.is_none() {
            return Err(IngestError::Config(format!(
                "DASHSYNC_THREECX_BASE_URL is required when {} is set",
                SourceKind::ThreeCx.credential_env_var()
            )));
        }

        Ok(())
    }
}
