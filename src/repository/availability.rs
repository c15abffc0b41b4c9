use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::domain::availability::{
    AvailabilityOverride, NewAvailabilityOverride, NewWeeklyHours, WeeklyHours,
};
use crate::domain::types::TenantId;
use crate::models::availability::{
    AvailabilityOverride as DbOverride, NewAvailabilityOverride as DbNewOverride,
    NewWeeklyHoursRow, WeeklyHours as DbWeeklyHours,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{AvailabilityReader, AvailabilityWriter, DieselRepository};
use crate::schema::{availability, availability_overrides};

fn upsert_hours(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    hours: &NewWeeklyHours,
) -> QueryResult<DbWeeklyHours> {
    let row = NewWeeklyHoursRow::new(tenant_id, hours);
    diesel::insert_into(availability::table)
        .values(&row)
        .on_conflict((availability::tenant_id, availability::day_of_week))
        .do_update()
        .set((
            availability::start_time.eq(excluded(availability::start_time)),
            availability::end_time.eq(excluded(availability::end_time)),
            availability::active.eq(excluded(availability::active)),
        ))
        .get_result::<DbWeeklyHours>(conn)
}

impl AvailabilityReader for DieselRepository {
    fn list_weekly_hours(&self, tenant_id: TenantId) -> RepositoryResult<Vec<WeeklyHours>> {
        let mut conn = self.conn()?;
        let rows = availability::table
            .filter(availability::tenant_id.eq(tenant_id.get()))
            .order(availability::day_of_week.asc())
            .load::<DbWeeklyHours>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(WeeklyHours::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn get_override_for_date(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<AvailabilityOverride>> {
        let mut conn = self.conn()?;
        let row = availability_overrides::table
            .filter(availability_overrides::tenant_id.eq(tenant_id.get()))
            .filter(availability_overrides::date.eq(date))
            .first::<DbOverride>(&mut conn)
            .optional()?;
        Ok(row.map(AvailabilityOverride::try_from).transpose()?)
    }

    fn list_overrides(
        &self,
        tenant_id: TenantId,
        from: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<AvailabilityOverride>> {
        let mut conn = self.conn()?;
        let mut query = availability_overrides::table
            .filter(availability_overrides::tenant_id.eq(tenant_id.get()))
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(availability_overrides::date.ge(from));
        }
        let rows = query
            .order(availability_overrides::date.asc())
            .load::<DbOverride>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(AvailabilityOverride::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl AvailabilityWriter for DieselRepository {
    fn upsert_weekly_hours(
        &self,
        tenant_id: TenantId,
        hours: &NewWeeklyHours,
    ) -> RepositoryResult<WeeklyHours> {
        let mut conn = self.conn()?;
        let row = upsert_hours(&mut conn, tenant_id, hours)?;
        Ok(row.try_into()?)
    }

    fn replace_weekly_hours(
        &self,
        tenant_id: TenantId,
        hours: &[NewWeeklyHours],
    ) -> RepositoryResult<Vec<WeeklyHours>> {
        let mut conn = self.conn()?;
        let rows = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(availability::table.filter(availability::tenant_id.eq(tenant_id.get())))
                .execute(conn)?;
            hours
                .iter()
                .map(|h| upsert_hours(conn, tenant_id, h))
                .collect::<QueryResult<Vec<_>>>()
        })?;
        Ok(rows
            .into_iter()
            .map(WeeklyHours::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn upsert_override(
        &self,
        new_override: &NewAvailabilityOverride,
    ) -> RepositoryResult<AvailabilityOverride> {
        let mut conn = self.conn()?;
        let insertable: DbNewOverride = new_override.into();
        let row = diesel::insert_into(availability_overrides::table)
            .values(&insertable)
            .on_conflict((
                availability_overrides::tenant_id,
                availability_overrides::date,
            ))
            .do_update()
            .set(&insertable)
            .get_result::<DbOverride>(&mut conn)?;
        Ok(row.try_into()?)
    }

    fn delete_override(&self, id: i32, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            availability_overrides::table
                .filter(availability_overrides::id.eq(id))
                .filter(availability_overrides::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
