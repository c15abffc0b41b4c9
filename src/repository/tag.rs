use diesel::prelude::*;

use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::types::{TagId, TenantId};
use crate::models::tag::{NewTag as DbNewTag, Tag as DbTag, UpdateTag as DbUpdateTag};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TagReader, TagWriter};
use crate::schema::tags;

impl TagReader for DieselRepository {
    fn get_tag_by_id(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<Option<Tag>> {
        let mut conn = self.conn()?;
        let row = tags::table
            .filter(tags::id.eq(id.get()))
            .filter(tags::tenant_id.eq(tenant_id.get()))
            .first::<DbTag>(&mut conn)
            .optional()?;
        Ok(row.map(Tag::try_from).transpose()?)
    }

    fn list_tags(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Tag>> {
        let mut conn = self.conn()?;
        let rows = tags::table
            .filter(tags::tenant_id.eq(tenant_id.get()))
            .order(tags::name.asc())
            .load::<DbTag>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Tag::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl TagWriter for DieselRepository {
    fn create_tag(&self, new_tag: &NewTag) -> RepositoryResult<Tag> {
        let mut conn = self.conn()?;
        let insertable: DbNewTag = new_tag.into();
        let created = diesel::insert_into(tags::table)
            .values(&insertable)
            .get_result::<DbTag>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn update_tag(
        &self,
        id: TagId,
        tenant_id: TenantId,
        updates: &UpdateTag,
    ) -> RepositoryResult<Tag> {
        let mut conn = self.conn()?;
        let changes: DbUpdateTag = updates.into();
        let updated = diesel::update(
            tags::table
                .filter(tags::id.eq(id.get()))
                .filter(tags::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbTag>(&mut conn)?;
        Ok(updated.try_into()?)
    }

    fn delete_tag(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            tags::table
                .filter(tags::id.eq(id.get()))
                .filter(tags::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
