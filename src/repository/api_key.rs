use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::api_key::{ApiKey, NewApiKey};
use crate::domain::types::{ApiKeyId, TenantId};
use crate::models::api_key::{ApiKey as DbApiKey, NewApiKey as DbNewApiKey};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ApiKeyReader, ApiKeyWriter, DieselRepository};
use crate::schema::api_keys;

impl ApiKeyReader for DieselRepository {
    fn list_api_keys(&self, tenant_id: TenantId) -> RepositoryResult<Vec<ApiKey>> {
        let mut conn = self.conn()?;
        let rows = api_keys::table
            .filter(api_keys::tenant_id.eq(tenant_id.get()))
            .order(api_keys::created_at.desc())
            .load::<DbApiKey>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(ApiKey::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn get_api_key_by_hash(&self, key_hash: &str) -> RepositoryResult<Option<ApiKey>> {
        let mut conn = self.conn()?;
        let row = api_keys::table
            .filter(api_keys::key_hash.eq(key_hash))
            .first::<DbApiKey>(&mut conn)
            .optional()?;
        Ok(row.map(ApiKey::try_from).transpose()?)
    }
}

impl ApiKeyWriter for DieselRepository {
    fn create_api_key(&self, new_key: &NewApiKey) -> RepositoryResult<ApiKey> {
        let mut conn = self.conn()?;
        let insertable: DbNewApiKey = new_key.into();
        let created = diesel::insert_into(api_keys::table)
            .values(&insertable)
            .get_result::<DbApiKey>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn delete_api_key(&self, id: ApiKeyId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            api_keys::table
                .filter(api_keys::id.eq(id.get()))
                .filter(api_keys::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn touch_api_key(&self, id: ApiKeyId, used_at: NaiveDateTime) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(api_keys::table.find(id.get()))
            .set(api_keys::last_used_at.eq(Some(used_at)))
            .execute(&mut conn)?;
        Ok(())
    }
}
