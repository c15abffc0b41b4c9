use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::booking::{Booking, BookingStatus, NewBooking, UpdateBooking};
use crate::domain::types::{BookingId, PublicId, TenantId};
use crate::models::booking::{
    Booking as DbBooking, NewBooking as DbNewBooking, UpdateBooking as DbUpdateBooking,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    BookingListQuery, BookingReader, BookingWriter, DieselRepository, count_to_usize,
};
use crate::schema::bookings;

fn into_domain(rows: Vec<DbBooking>) -> RepositoryResult<Vec<Booking>> {
    Ok(rows
        .into_iter()
        .map(Booking::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

fn active_statuses() -> Vec<&'static str> {
    BookingStatus::ACTIVE.iter().map(|s| s.as_str()).collect()
}

impl BookingReader for DieselRepository {
    fn get_booking_by_id(
        &self,
        id: BookingId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Booking>> {
        let mut conn = self.conn()?;
        let row = bookings::table
            .filter(bookings::id.eq(id.get()))
            .filter(bookings::tenant_id.eq(tenant_id.get()))
            .first::<DbBooking>(&mut conn)
            .optional()?;
        Ok(row.map(Booking::try_from).transpose()?)
    }

    fn get_booking_by_public_id(&self, public_id: PublicId) -> RepositoryResult<Option<Booking>> {
        let mut conn = self.conn()?;
        let row = bookings::table
            .filter(bookings::public_id.eq(public_id.to_string()))
            .first::<DbBooking>(&mut conn)
            .optional()?;
        Ok(row.map(Booking::try_from).transpose()?)
    }

    fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = bookings::table
                .filter(bookings::tenant_id.eq(query.tenant_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(contact_id) = query.contact_id {
                items = items.filter(bookings::contact_id.eq(contact_id.get()));
            }
            if let Some(status) = query.status {
                items = items.filter(bookings::status.eq(status.as_str()));
            }
            if let Some(from) = query.from {
                items = items.filter(bookings::scheduled_at.ge(from));
            }
            if let Some(to) = query.to {
                items = items.filter(bookings::scheduled_at.lt(to));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)?;

        let mut items = query_builder().order(bookings::scheduled_at.asc());
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let rows = items.load::<DbBooking>(&mut conn)?;
        Ok((count_to_usize(total), into_domain(rows)?))
    }

    fn list_active_bookings_between(
        &self,
        tenant_id: TenantId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<Booking>> {
        let mut conn = self.conn()?;
        let rows = bookings::table
            .filter(bookings::tenant_id.eq(tenant_id.get()))
            .filter(bookings::status.eq_any(active_statuses()))
            .filter(bookings::scheduled_at.ge(from))
            .filter(bookings::scheduled_at.lt(to))
            .order(bookings::scheduled_at.asc())
            .load::<DbBooking>(&mut conn)?;
        into_domain(rows)
    }

    fn get_bookings_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[BookingId],
    ) -> RepositoryResult<Vec<Booking>> {
        let mut conn = self.conn()?;
        let ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let rows = bookings::table
            .filter(bookings::tenant_id.eq(tenant_id.get()))
            .filter(bookings::id.eq_any(&ids))
            .order(bookings::scheduled_at.asc())
            .load::<DbBooking>(&mut conn)?;
        into_domain(rows)
    }
}

impl BookingWriter for DieselRepository {
    fn create_booking(&self, new_booking: &NewBooking) -> RepositoryResult<Booking> {
        let mut conn = self.conn()?;
        let insertable: DbNewBooking = new_booking.into();
        let created = diesel::insert_into(bookings::table)
            .values(&insertable)
            .get_result::<DbBooking>(&mut conn)?;
        Ok(created.try_into()?)
    }

    fn update_booking(
        &self,
        id: BookingId,
        tenant_id: TenantId,
        updates: &UpdateBooking,
    ) -> RepositoryResult<Booking> {
        let mut conn = self.conn()?;
        let changes: DbUpdateBooking = updates.into();
        let updated = diesel::update(
            bookings::table
                .filter(bookings::id.eq(id.get()))
                .filter(bookings::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbBooking>(&mut conn)?;
        Ok(updated.try_into()?)
    }

    fn update_booking_status(
        &self,
        id: BookingId,
        tenant_id: TenantId,
        status: BookingStatus,
    ) -> RepositoryResult<Booking> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            bookings::table
                .filter(bookings::id.eq(id.get()))
                .filter(bookings::tenant_id.eq(tenant_id.get())),
        )
        .set((
            bookings::status.eq(status.as_str()),
            bookings::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .get_result::<DbBooking>(&mut conn)?;
        Ok(updated.try_into()?)
    }

    fn delete_booking(&self, id: BookingId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            bookings::table
                .filter(bookings::id.eq(id.get()))
                .filter(bookings::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
