use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{ApiKeyId, TenantId};

/// Stored API key; the secret itself is only known to its holder.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub last_used_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewApiKey {
    pub tenant_id: TenantId,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
}
