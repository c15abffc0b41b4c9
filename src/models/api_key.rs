use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::api_key::{ApiKey as DomainApiKey, NewApiKey as DomainNewApiKey};
use crate::domain::types::{ApiKeyId, TenantId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::api_keys)]
pub struct ApiKey {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub last_used_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::api_keys)]
pub struct NewApiKey<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub key_hash: &'a str,
    pub key_prefix: &'a str,
}

impl TryFrom<ApiKey> for DomainApiKey {
    type Error = TypeConstraintError;

    fn try_from(key: ApiKey) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ApiKeyId::try_from(key.id)?,
            tenant_id: TenantId::try_from(key.tenant_id)?,
            name: key.name,
            key_hash: key.key_hash,
            key_prefix: key.key_prefix,
            last_used_at: key.last_used_at,
            created_at: key.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewApiKey> for NewApiKey<'a> {
    fn from(key: &'a DomainNewApiKey) -> Self {
        Self {
            tenant_id: key.tenant_id.get(),
            name: &key.name,
            key_hash: &key.key_hash,
            key_prefix: &key.key_prefix,
        }
    }
}
