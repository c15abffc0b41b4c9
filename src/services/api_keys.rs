use crate::auth::{display_prefix, generate_api_key, hash_api_key};
use crate::domain::api_key::{ApiKey, NewApiKey};
use crate::domain::types::{ApiKeyId, TenantId};
use crate::dto::api_key::CreatedApiKey;
use crate::forms::api_key::ApiKeyPayload;
use crate::repository::{ApiKeyReader, ApiKeyWriter};
use crate::services::{ServiceError, ServiceResult};

pub fn list_api_keys<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<ApiKey>>
where
    R: ApiKeyReader + ?Sized,
{
    Ok(repo.list_api_keys(tenant_id)?)
}

/// Issues a key. Only its hash is stored; the plain key is returned once.
pub fn create_api_key<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: ApiKeyPayload,
) -> ServiceResult<CreatedApiKey>
where
    R: ApiKeyWriter + ?Sized,
{
    let name = payload.name()?;
    if name.is_empty() {
        return Err(ServiceError::Validation("Key name is required".to_string()));
    }
    let key = generate_api_key();
    let api_key = repo
        .create_api_key(&NewApiKey {
            tenant_id,
            name,
            key_hash: hash_api_key(&key),
            key_prefix: display_prefix(&key),
        })
        .map_err(|err| {
            log::error!("Failed to create API key for tenant {tenant_id}: {err}");
            err
        })?;
    log::info!("API key {} issued for tenant {tenant_id}", api_key.id);
    Ok(CreatedApiKey { api_key, key })
}

pub fn delete_api_key<R>(repo: &R, tenant_id: TenantId, id: ApiKeyId) -> ServiceResult<()>
where
    R: ApiKeyReader + ApiKeyWriter + ?Sized,
{
    let exists = repo.list_api_keys(tenant_id)?.iter().any(|key| key.id == id);
    if !exists {
        return Err(ServiceError::not_found("API key"));
    }
    Ok(repo.delete_api_key(id, tenant_id)?)
}
