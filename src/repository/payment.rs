use diesel::prelude::*;

use crate::domain::invoice::InvoicePaymentUpdate;
use crate::domain::payment::{Payment, PaymentRefund};
use crate::domain::types::{InvoiceId, PaymentId, TenantId};
use crate::models::invoice::UpdateInvoicePayment;
use crate::models::payment::{Payment as DbPayment, UpdatePaymentRefund};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, PaymentListQuery, PaymentReader, PaymentWriter, count_to_usize,
};
use crate::schema::{invoices, payments};

impl PaymentReader for DieselRepository {
    fn get_payment_by_id(
        &self,
        id: PaymentId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Payment>> {
        let mut conn = self.conn()?;
        let row = payments::table
            .filter(payments::id.eq(id.get()))
            .filter(payments::tenant_id.eq(tenant_id.get()))
            .first::<DbPayment>(&mut conn)
            .optional()?;
        Ok(row.map(Payment::try_from).transpose()?)
    }

    fn list_payments(&self, query: PaymentListQuery) -> RepositoryResult<(usize, Vec<Payment>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = payments::table
                .filter(payments::tenant_id.eq(query.tenant_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(contact_id) = query.contact_id {
                items = items.filter(payments::contact_id.eq(contact_id.get()));
            }
            if let Some(invoice_id) = query.invoice_id {
                items = items.filter(payments::invoice_id.eq(invoice_id.get()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)?;

        let mut items = query_builder()
            .order(payments::created_at.desc())
            .then_order_by(payments::id.desc());
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let payments = items
            .load::<DbPayment>(&mut conn)?
            .into_iter()
            .map(Payment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((count_to_usize(total), payments))
    }
}

impl PaymentWriter for DieselRepository {
    fn refund_payment(
        &self,
        id: PaymentId,
        refund: &PaymentRefund,
        invoice_update: Option<(InvoiceId, InvoicePaymentUpdate)>,
    ) -> RepositoryResult<Payment> {
        let mut conn = self.conn()?;
        let changes: UpdatePaymentRefund = refund.into();

        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let row = diesel::update(
                payments::table
                    .filter(payments::id.eq(id.get()))
                    .filter(payments::refunded_cents.eq(refund.previous_refunded_cents)),
            )
            .set(&changes)
            .get_result::<DbPayment>(conn)
            .optional()?
            .ok_or_else(|| RepositoryError::StaleWrite(format!("payment {id} refund changed")))?;

            if let Some((invoice_id, update)) = &invoice_update {
                let invoice_changes: UpdateInvoicePayment = update.into();
                let updated = diesel::update(
                    invoices::table
                        .filter(invoices::id.eq(invoice_id.get()))
                        .filter(invoices::tenant_id.eq(row.tenant_id))
                        .filter(invoices::amount_paid_cents.eq(update.previous_paid_cents)),
                )
                .set(&invoice_changes)
                .execute(conn)?;
                if updated == 0 {
                    return Err(RepositoryError::StaleWrite(format!(
                        "invoice {invoice_id} balance changed"
                    )));
                }
            }
            Ok(row)
        })?;

        Ok(row.try_into()?)
    }
}
