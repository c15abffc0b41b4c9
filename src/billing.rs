//! Invoice arithmetic and allocation of payments across linked bookings.

use crate::domain::booking::{Booking, BookingPaymentStatus, BookingPaymentUpdate};
use crate::domain::invoice::{InvoiceStatus, InvoiceTotals, LineItem};
use crate::domain::types::{BookingId, TypeConstraintError};

/// Share of a payment assigned to one booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub booking_id: BookingId,
    pub allocated_cents: i32,
}

/// Splits `amount_cents` across `bookings` in proportion to their prices.
///
/// Bookings are visited from the most to the least expensive; each receives
/// `round(amount * price / invoice_total)` except the last, which receives
/// whatever is left so the allocations always sum to `amount_cents`. A zero
/// invoice total allocates nothing.
pub fn calculate_proportional_allocation(
    invoice_total_cents: i32,
    bookings: &[Booking],
    amount_cents: i32,
) -> Vec<Allocation> {
    if bookings.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Booking> = bookings.iter().collect();
    sorted.sort_by(|a, b| b.total_price_cents.cmp(&a.total_price_cents));

    if invoice_total_cents == 0 {
        return sorted
            .into_iter()
            .map(|b| Allocation {
                booking_id: b.id,
                allocated_cents: 0,
            })
            .collect();
    }

    let last = sorted.len() - 1;
    let mut remaining = amount_cents;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, booking)| {
            let allocated_cents = if index == last {
                remaining
            } else {
                let share = f64::from(amount_cents) * f64::from(booking.total_price_cents)
                    / f64::from(invoice_total_cents);
                share.round() as i32
            };
            remaining -= allocated_cents;
            Allocation {
                booking_id: booking.id,
                allocated_cents,
            }
        })
        .collect()
}

/// Payment status of a booking from its running totals.
pub fn booking_payment_status(
    total_cents: i32,
    deposit_allocated_cents: i32,
    amount_paid_cents: i32,
) -> BookingPaymentStatus {
    if amount_paid_cents >= total_cents {
        BookingPaymentStatus::Paid
    } else if deposit_allocated_cents > 0 || amount_paid_cents > 0 {
        BookingPaymentStatus::DepositPaid
    } else {
        BookingPaymentStatus::Unpaid
    }
}

pub fn booking_balance_due(total_cents: i32, amount_paid_cents: i32) -> i32 {
    (total_cents - amount_paid_cents).max(0)
}

/// Applies a non-deposit payment to a booking.
pub fn apply_balance_payment(booking: &Booking, amount_cents: i32) -> BookingPaymentUpdate {
    let amount_paid_cents = booking.amount_paid_cents + amount_cents;
    let payment_status = if amount_paid_cents >= booking.total_price_cents {
        BookingPaymentStatus::Paid
    } else {
        BookingPaymentStatus::DepositPaid
    };
    BookingPaymentUpdate {
        booking_id: booking.id,
        amount_paid_cents,
        deposit_allocated_cents: booking.deposit_allocated_cents,
        payment_status,
    }
}

/// Applies a deposit share to a booking, tracking it as allocated deposit.
pub fn apply_deposit_payment(booking: &Booking, amount_cents: i32) -> BookingPaymentUpdate {
    let amount_paid_cents = booking.amount_paid_cents + amount_cents;
    let deposit_allocated_cents = booking.deposit_allocated_cents + amount_cents;
    BookingPaymentUpdate {
        booking_id: booking.id,
        amount_paid_cents,
        deposit_allocated_cents,
        payment_status: booking_payment_status(
            booking.total_price_cents,
            deposit_allocated_cents,
            amount_paid_cents,
        ),
    }
}

/// Distributes an invoice payment across its bookings and returns the
/// resulting booking updates.
pub fn allocate_invoice_payment(
    invoice_total_cents: i32,
    bookings: &[Booking],
    amount_cents: i32,
    is_deposit: bool,
) -> Vec<BookingPaymentUpdate> {
    calculate_proportional_allocation(invoice_total_cents, bookings, amount_cents)
        .into_iter()
        .filter_map(|allocation| {
            let booking = bookings.iter().find(|b| b.id == allocation.booking_id)?;
            Some(if is_deposit {
                apply_deposit_payment(booking, allocation.allocated_cents)
            } else {
                apply_balance_payment(booking, allocation.allocated_cents)
            })
        })
        .collect()
}

/// Subtotal, tax and total of a set of line items. `tax_rate_bp` is in basis
/// points (825 = 8.25 %).
pub fn calculate_invoice_totals(
    line_items: &[LineItem],
    tax_rate_bp: i32,
) -> Result<InvoiceTotals, TypeConstraintError> {
    let subtotal: i64 = line_items.iter().map(LineItem::amount_cents).sum();
    let tax = ((subtotal as f64) * f64::from(tax_rate_bp) / 10_000.0).round() as i64;
    let too_large = || TypeConstraintError::InvalidValue("invoice total is too large".to_string());
    Ok(InvoiceTotals {
        subtotal_cents: i32::try_from(subtotal).map_err(|_| too_large())?,
        tax_cents: i32::try_from(tax).map_err(|_| too_large())?,
        total_cents: i32::try_from(subtotal + tax).map_err(|_| too_large())?,
    })
}

/// Invoice status once `amount_paid_cents` has been received in total.
pub fn invoice_status_after_payment(total_cents: i32, amount_paid_cents: i32) -> InvoiceStatus {
    if amount_paid_cents >= total_cents {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::DepositPaid
    }
}

/// Invoice status after money has been returned to the payer.
pub fn invoice_status_after_refund(
    total_cents: i32,
    amount_paid_cents: i32,
    was_sent: bool,
) -> InvoiceStatus {
    if amount_paid_cents <= 0 {
        if was_sent {
            InvoiceStatus::Sent
        } else {
            InvoiceStatus::Draft
        }
    } else {
        invoice_status_after_payment(total_cents, amount_paid_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::BookingStatus;
    use crate::domain::types::{ContactId, PublicId, TenantId};
    use chrono::NaiveDate;

    fn booking(id: i32, price: i32, paid: i32) -> Booking {
        let at = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Booking {
            id: BookingId::new(id).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            contact_id: ContactId::new(1).unwrap(),
            service_id: None,
            package_id: None,
            public_id: PublicId::new(),
            scheduled_at: at,
            duration_minutes: 60,
            total_price_cents: price,
            status: BookingStatus::Confirmed,
            payment_status: BookingPaymentStatus::Unpaid,
            amount_paid_cents: paid,
            deposit_allocated_cents: 0,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn allocation_is_proportional_and_sums_to_payment() {
        let bookings = vec![booking(1, 10_000, 0), booking(2, 20_000, 0), booking(3, 3_333, 0)];
        let allocations = calculate_proportional_allocation(33_333, &bookings, 10_000);

        assert_eq!(allocations[0].booking_id.get(), 2);
        assert_eq!(allocations[0].allocated_cents, 6_000);
        assert_eq!(allocations[1].booking_id.get(), 1);
        assert_eq!(allocations[1].allocated_cents, 3_000);
        assert_eq!(allocations[2].allocated_cents, 1_000);
        let sum: i32 = allocations.iter().map(|a| a.allocated_cents).sum();
        assert_eq!(sum, 10_000);
    }

    #[test]
    fn zero_total_allocates_nothing() {
        let bookings = vec![booking(1, 0, 0), booking(2, 0, 0)];
        let allocations = calculate_proportional_allocation(0, &bookings, 500);
        assert!(allocations.iter().all(|a| a.allocated_cents == 0));
        assert!(calculate_proportional_allocation(100, &[], 50).is_empty());
    }

    #[test]
    fn payment_status_follows_totals() {
        assert_eq!(booking_payment_status(100, 0, 0), BookingPaymentStatus::Unpaid);
        assert_eq!(booking_payment_status(100, 20, 20), BookingPaymentStatus::DepositPaid);
        assert_eq!(booking_payment_status(100, 0, 100), BookingPaymentStatus::Paid);
        assert_eq!(booking_balance_due(100, 130), 0);
        assert_eq!(booking_balance_due(100, 30), 70);
    }

    #[test]
    fn balance_and_deposit_payments_update_bookings() {
        let target = booking(1, 5_000, 1_000);
        let update = apply_balance_payment(&target, 4_000);
        assert_eq!(update.amount_paid_cents, 5_000);
        assert_eq!(update.payment_status, BookingPaymentStatus::Paid);

        let deposit = apply_deposit_payment(&booking(2, 5_000, 0), 1_500);
        assert_eq!(deposit.deposit_allocated_cents, 1_500);
        assert_eq!(deposit.payment_status, BookingPaymentStatus::DepositPaid);
    }

    #[test]
    fn invoice_totals_round_tax() {
        let items = vec![
            LineItem {
                description: "Session".to_string(),
                quantity: 2,
                unit_price_cents: 4_999,
            },
            LineItem {
                description: "Travel".to_string(),
                quantity: 1,
                unit_price_cents: 1_001,
            },
        ];
        let totals = calculate_invoice_totals(&items, 825).unwrap();
        assert_eq!(totals.subtotal_cents, 10_999);
        assert_eq!(totals.tax_cents, 907);
        assert_eq!(totals.total_cents, 11_906);
    }

    #[test]
    fn invoice_status_transitions() {
        assert_eq!(invoice_status_after_payment(1_000, 400), InvoiceStatus::DepositPaid);
        assert_eq!(invoice_status_after_payment(1_000, 1_000), InvoiceStatus::Paid);
        assert_eq!(invoice_status_after_refund(1_000, 0, true), InvoiceStatus::Sent);
        assert_eq!(invoice_status_after_refund(1_000, 0, false), InvoiceStatus::Draft);
        assert_eq!(invoice_status_after_refund(1_000, 500, true), InvoiceStatus::DepositPaid);
    }
}
