use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefundPayload {
    /// Defaults to the full refundable amount.
    #[validate(range(min = 1))]
    pub amount_cents: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListParams {
    pub contact_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
