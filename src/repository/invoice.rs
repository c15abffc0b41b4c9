use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::booking::BookingPaymentUpdate;
use crate::domain::invoice::{
    Invoice, InvoicePaymentUpdate, InvoiceStatus, NewInvoice, UpdateInvoice,
};
use crate::domain::payment::{NewPayment, Payment};
use crate::domain::types::{BookingId, InvoiceId, TenantId};
use crate::models::booking::UpdateBookingPayment;
use crate::models::invoice::{
    Invoice as DbInvoice, InvoiceBooking, NewInvoice as DbNewInvoice,
    UpdateInvoice as DbUpdateInvoice, UpdateInvoicePayment, invoice_number,
};
use crate::models::payment::{NewPayment as DbNewPayment, Payment as DbPayment};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, InvoiceListQuery, InvoiceReader, InvoiceWriter, count_to_usize,
};
use crate::schema::{bookings, invoice_bookings, invoices, payments};

/// Next free `INV-xxxxx` number for the tenant.
fn next_invoice_number(conn: &mut SqliteConnection, tenant_id: i32) -> QueryResult<String> {
    let existing: i64 = invoices::table
        .filter(invoices::tenant_id.eq(tenant_id))
        .count()
        .get_result(conn)?;
    let mut sequence = existing + 1;
    loop {
        let candidate = invoice_number(sequence);
        let taken: i64 = invoices::table
            .filter(invoices::tenant_id.eq(tenant_id))
            .filter(invoices::invoice_number.eq(&candidate))
            .count()
            .get_result(conn)?;
        if taken == 0 {
            return Ok(candidate);
        }
        sequence += 1;
    }
}

impl InvoiceReader for DieselRepository {
    fn get_invoice_by_id(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Invoice>> {
        let mut conn = self.conn()?;
        let row = invoices::table
            .filter(invoices::id.eq(id.get()))
            .filter(invoices::tenant_id.eq(tenant_id.get()))
            .first::<DbInvoice>(&mut conn)
            .optional()?;
        row.map(Invoice::try_from).transpose()
    }

    fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = invoices::table
                .filter(invoices::tenant_id.eq(query.tenant_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(contact_id) = query.contact_id {
                items = items.filter(invoices::contact_id.eq(contact_id.get()));
            }
            if let Some(status) = query.status {
                items = items.filter(invoices::status.eq(status.as_str()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)?;

        let mut items = query_builder()
            .order(invoices::created_at.desc())
            .then_order_by(invoices::id.desc());
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let invoices = items
            .load::<DbInvoice>(&mut conn)?
            .into_iter()
            .map(Invoice::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((count_to_usize(total), invoices))
    }

    fn list_invoice_booking_ids(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<BookingId>> {
        let mut conn = self.conn()?;
        let ids = invoice_bookings::table
            .filter(invoice_bookings::invoice_id.eq(invoice_id.get()))
            .select(invoice_bookings::booking_id)
            .load::<i32>(&mut conn)?;
        Ok(ids
            .into_iter()
            .map(BookingId::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl InvoiceWriter for DieselRepository {
    fn create_invoice(&self, new_invoice: &NewInvoice) -> RepositoryResult<Invoice> {
        let mut conn = self.conn()?;
        let tenant_id = new_invoice.tenant_id.get();
        let booking_ids: Vec<i32> = new_invoice.booking_ids.iter().map(|id| id.get()).collect();

        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let number = next_invoice_number(conn, tenant_id)?;
            let insertable = DbNewInvoice::new(new_invoice, number)?;
            let row = diesel::insert_into(invoices::table)
                .values(&insertable)
                .get_result::<DbInvoice>(conn)?;

            let owned: Vec<i32> = bookings::table
                .filter(bookings::tenant_id.eq(tenant_id))
                .filter(bookings::id.eq_any(&booking_ids))
                .select(bookings::id)
                .load(conn)?;
            let links: Vec<InvoiceBooking> = owned
                .into_iter()
                .map(|booking_id| InvoiceBooking {
                    invoice_id: row.id,
                    booking_id,
                })
                .collect();
            if !links.is_empty() {
                diesel::insert_into(invoice_bookings::table)
                    .values(&links)
                    .execute(conn)?;
            }
            Ok(row)
        })?;

        row.try_into()
    }

    fn update_invoice(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
        updates: &UpdateInvoice,
    ) -> RepositoryResult<Invoice> {
        let mut conn = self.conn()?;
        let changes = DbUpdateInvoice::try_from(updates)?;
        let updated = diesel::update(
            invoices::table
                .filter(invoices::id.eq(id.get()))
                .filter(invoices::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbInvoice>(&mut conn)?;
        updated.try_into()
    }

    fn delete_invoice(&self, id: InvoiceId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            invoices::table
                .filter(invoices::id.eq(id.get()))
                .filter(invoices::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn mark_invoice_sent(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
        sent_at: NaiveDateTime,
    ) -> RepositoryResult<Invoice> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            invoices::table
                .filter(invoices::id.eq(id.get()))
                .filter(invoices::tenant_id.eq(tenant_id.get())),
        )
        .set((
            invoices::status.eq(InvoiceStatus::Sent.as_str()),
            invoices::sent_at.eq(Some(sent_at)),
            invoices::updated_at.eq(sent_at),
        ))
        .get_result::<DbInvoice>(&mut conn)?;
        updated.try_into()
    }

    fn record_invoice_payment(
        &self,
        payment: &NewPayment,
        invoice_id: InvoiceId,
        invoice_update: &InvoicePaymentUpdate,
        booking_updates: &[BookingPaymentUpdate],
    ) -> RepositoryResult<Payment> {
        let mut conn = self.conn()?;
        let insertable: DbNewPayment = payment.into();
        let invoice_changes: UpdateInvoicePayment = invoice_update.into();
        let tenant_id = payment.tenant_id.get();

        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let updated = diesel::update(
                invoices::table
                    .filter(invoices::id.eq(invoice_id.get()))
                    .filter(invoices::tenant_id.eq(tenant_id))
                    .filter(invoices::amount_paid_cents.eq(invoice_update.previous_paid_cents))
                    .filter(invoices::status.ne(InvoiceStatus::Cancelled.as_str())),
            )
            .set(&invoice_changes)
            .execute(conn)?;
            if updated == 0 {
                return Err(RepositoryError::StaleWrite(format!(
                    "invoice {invoice_id} changed before the payment was recorded"
                )));
            }

            let row = diesel::insert_into(payments::table)
                .values(&insertable)
                .get_result::<DbPayment>(conn)?;

            for update in booking_updates {
                let changes: UpdateBookingPayment = update.into();
                diesel::update(
                    bookings::table
                        .filter(bookings::id.eq(update.booking_id.get()))
                        .filter(bookings::tenant_id.eq(tenant_id)),
                )
                .set(&changes)
                .execute(conn)?;
            }
            Ok(row)
        })?;

        Ok(row.try_into()?)
    }
}
