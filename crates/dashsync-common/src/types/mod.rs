//! Common types used across Dashsync

use crate::error::DashsyncError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the tenant (dashboard account) a row belongs to.
///
/// Every destination table is keyed on `(tenant_id, <natural key>)`, so the
/// same external record synced for two tenants never collides.
///
/// # Examples
///
/// ```rust
/// use dashsync_common::types::TenantId;
///
/// let tenant: TenantId = "7b0c1d8e-3f4a-4c5b-9d6e-0f1a2b3c4d5e".parse().unwrap();
/// assert_eq!(tenant.to_string(), "7b0c1d8e-3f4a-4c5b-9d6e-0f1a2b3c4d5e");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for TenantId {
    type Err = DashsyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DashsyncError::InvalidTenant(format!("'{}': {}", s, e)))
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-row sync status stored in the `sync_status` column.
///
/// Rows move `pending -> synced | error`; the loader only ever writes `synced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = DashsyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            "error" => Ok(SyncStatus::Error),
            _ => Err(DashsyncError::InvalidSyncStatus(s.to_string())),
        }
    }
}
