//! Persistence traits and their Diesel implementation.
//!
//! Each aggregate gets a reader/writer trait pair; [`DieselRepository`]
//! implements all of them over a single connection pool so services can ask
//! for exactly the capabilities they need.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::db::{DbConnection, DbPool};
use crate::domain::api_key::{ApiKey, NewApiKey};
use crate::domain::availability::{
    AvailabilityOverride, NewAvailabilityOverride, NewWeeklyHours, WeeklyHours,
};
use crate::domain::booking::{
    Booking, BookingPaymentUpdate, BookingStatus, NewBooking, UpdateBooking,
};
use crate::domain::catalog::{
    NewPackage, NewService, Package, Service, UpdatePackage, UpdateService,
};
use crate::domain::contact::{Contact, ContactStatus, NewContact, UpdateContact};
use crate::domain::email_template::{EmailTemplate, NewEmailTemplate, UpdateEmailTemplate};
use crate::domain::invoice::{
    Invoice, InvoicePaymentUpdate, InvoiceStatus, NewInvoice, UpdateInvoice,
};
use crate::domain::payment::{NewPayment, Payment, PaymentRefund};
use crate::domain::reminder::{BookingReminder, NewBookingReminder, ReminderStatus};
use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::tenant::{NewTenant, Tenant, UpdateTenant};
use crate::domain::types::{
    ApiKeyId, BookingId, ContactEmail, ContactId, EmailTemplateId, InvoiceId, PackageId,
    PaymentId, PublicId, ReminderId, ServiceId, TagId, TenantId, WebhookId, WorkflowId,
    WorkflowRunId,
};
use crate::domain::webhook::{
    NewWebhook, NewWebhookDelivery, UpdateWebhook, Webhook, WebhookDelivery, WebhookEvent,
};
use crate::domain::workflow::{
    NewWorkflow, NewWorkflowRun, UpdateWorkflow, Workflow, WorkflowRun, WorkflowRunStatus,
    WorkflowTrigger,
};
use crate::repository::errors::RepositoryResult;

pub mod api_key;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod contact;
pub mod email_template;
pub mod errors;
pub mod invoice;
pub mod payment;
pub mod reminder;
pub mod tag;
pub mod tenant;
pub mod webhook;
pub mod workflow;

#[cfg(feature = "test-mocks")]
pub mod mock;

/// Default page size for paginated listings.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub(crate) fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub(crate) fn offset(&self) -> i64 {
        ((self.page.max(1) - 1) * self.per_page) as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub tag_id: Option<TagId>,
    pub status: Option<ContactStatus>,
    pub pagination: Option<Pagination>,
}

impl ContactListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            tag_id: None,
            status: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn status(mut self, status: ContactStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingListQuery {
    pub tenant_id: TenantId,
    pub contact_id: Option<ContactId>,
    pub status: Option<BookingStatus>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub pagination: Option<Pagination>,
}

impl BookingListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            contact_id: None,
            status: None,
            from: None,
            to: None,
            pagination: None,
        }
    }

    pub fn contact(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn between(mut self, from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceListQuery {
    pub tenant_id: TenantId,
    pub contact_id: Option<ContactId>,
    pub status: Option<InvoiceStatus>,
    pub pagination: Option<Pagination>,
}

impl InvoiceListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            contact_id: None,
            status: None,
            pagination: None,
        }
    }

    pub fn contact(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentListQuery {
    pub tenant_id: TenantId,
    pub contact_id: Option<ContactId>,
    pub invoice_id: Option<InvoiceId>,
    pub pagination: Option<Pagination>,
}

impl PaymentListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            contact_id: None,
            invoice_id: None,
            pagination: None,
        }
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }
}

pub trait TenantReader {
    fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>>;
    fn get_tenant_by_slug(&self, slug: &str) -> RepositoryResult<Option<Tenant>>;
    fn get_tenant_by_org_id(&self, org_id: &str) -> RepositoryResult<Option<Tenant>>;
    fn list_tenants(&self) -> RepositoryResult<Vec<Tenant>>;
}

pub trait TenantWriter {
    fn create_tenant(&self, new_tenant: &NewTenant) -> RepositoryResult<Tenant>;
    fn update_tenant(&self, id: TenantId, updates: &UpdateTenant) -> RepositoryResult<Tenant>;
}

pub trait ContactReader {
    fn get_contact_by_id(
        &self,
        id: ContactId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Contact>>;
    fn get_contact_by_email(
        &self,
        email: &ContactEmail,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Contact>>;
    fn list_contacts(&self, query: ContactListQuery) -> RepositoryResult<(usize, Vec<Contact>)>;
    fn list_contact_tags(&self, contact_id: ContactId) -> RepositoryResult<Vec<Tag>>;
}

pub trait ContactWriter {
    fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact>;
    /// Inserts contacts whose email is not yet known for the tenant and returns
    /// the number of rows created.
    fn import_contacts(&self, new_contacts: &[NewContact]) -> RepositoryResult<usize>;
    fn update_contact(
        &self,
        id: ContactId,
        tenant_id: TenantId,
        updates: &UpdateContact,
    ) -> RepositoryResult<Contact>;
    fn delete_contact(&self, id: ContactId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn replace_contact_fields(
        &self,
        id: ContactId,
        fields: &HashMap<String, String>,
    ) -> RepositoryResult<()>;
    /// Returns `false` when the tag was already attached.
    fn add_contact_tag(&self, contact_id: ContactId, tag_id: TagId) -> RepositoryResult<bool>;
    /// Returns `false` when the tag was not attached.
    fn remove_contact_tag(&self, contact_id: ContactId, tag_id: TagId) -> RepositoryResult<bool>;
    /// Sets the contact status, detaches every other status tag and attaches
    /// the tag named after `status` when the tenant has one.
    fn assign_contact_status(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
        status: ContactStatus,
    ) -> RepositoryResult<Option<TagId>>;
}

pub trait ServiceReader {
    fn get_service_by_id(
        &self,
        id: ServiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Service>>;
    fn list_services(&self, tenant_id: TenantId, active_only: bool)
    -> RepositoryResult<Vec<Service>>;
}

pub trait ServiceWriter {
    fn create_service(&self, new_service: &NewService) -> RepositoryResult<Service>;
    fn update_service(
        &self,
        id: ServiceId,
        tenant_id: TenantId,
        updates: &UpdateService,
    ) -> RepositoryResult<Service>;
    fn delete_service(&self, id: ServiceId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait PackageReader {
    fn get_package_by_id(
        &self,
        id: PackageId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Package>>;
    fn list_packages(&self, tenant_id: TenantId, active_only: bool)
    -> RepositoryResult<Vec<Package>>;
}

pub trait PackageWriter {
    fn create_package(&self, new_package: &NewPackage) -> RepositoryResult<Package>;
    fn update_package(
        &self,
        id: PackageId,
        tenant_id: TenantId,
        updates: &UpdatePackage,
    ) -> RepositoryResult<Package>;
    fn delete_package(&self, id: PackageId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait BookingReader {
    fn get_booking_by_id(
        &self,
        id: BookingId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Booking>>;
    fn get_booking_by_public_id(&self, public_id: PublicId) -> RepositoryResult<Option<Booking>>;
    fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)>;
    /// Active bookings starting in `[from, to)`.
    fn list_active_bookings_between(
        &self,
        tenant_id: TenantId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<Booking>>;
    fn get_bookings_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[BookingId],
    ) -> RepositoryResult<Vec<Booking>>;
}

pub trait BookingWriter {
    fn create_booking(&self, new_booking: &NewBooking) -> RepositoryResult<Booking>;
    fn update_booking(
        &self,
        id: BookingId,
        tenant_id: TenantId,
        updates: &UpdateBooking,
    ) -> RepositoryResult<Booking>;
    fn update_booking_status(
        &self,
        id: BookingId,
        tenant_id: TenantId,
        status: BookingStatus,
    ) -> RepositoryResult<Booking>;
    fn delete_booking(&self, id: BookingId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait AvailabilityReader {
    fn list_weekly_hours(&self, tenant_id: TenantId) -> RepositoryResult<Vec<WeeklyHours>>;
    fn get_override_for_date(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<AvailabilityOverride>>;
    fn list_overrides(
        &self,
        tenant_id: TenantId,
        from: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<AvailabilityOverride>>;
}

pub trait AvailabilityWriter {
    fn upsert_weekly_hours(
        &self,
        tenant_id: TenantId,
        hours: &NewWeeklyHours,
    ) -> RepositoryResult<WeeklyHours>;
    fn replace_weekly_hours(
        &self,
        tenant_id: TenantId,
        hours: &[NewWeeklyHours],
    ) -> RepositoryResult<Vec<WeeklyHours>>;
    fn upsert_override(
        &self,
        new_override: &NewAvailabilityOverride,
    ) -> RepositoryResult<AvailabilityOverride>;
    fn delete_override(&self, id: i32, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait InvoiceReader {
    fn get_invoice_by_id(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Invoice>>;
    fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)>;
    fn list_invoice_booking_ids(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<BookingId>>;
}

pub trait InvoiceWriter {
    /// Numbers the invoice `INV-00001`, `INV-00002`, ... per tenant and links
    /// its bookings.
    fn create_invoice(&self, new_invoice: &NewInvoice) -> RepositoryResult<Invoice>;
    fn update_invoice(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
        updates: &UpdateInvoice,
    ) -> RepositoryResult<Invoice>;
    fn delete_invoice(&self, id: InvoiceId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn mark_invoice_sent(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
        sent_at: NaiveDateTime,
    ) -> RepositoryResult<Invoice>;
    /// Stores the payment together with the invoice and booking bookkeeping in
    /// one transaction.
    fn record_invoice_payment(
        &self,
        payment: &NewPayment,
        invoice_id: InvoiceId,
        invoice_update: &InvoicePaymentUpdate,
        booking_updates: &[BookingPaymentUpdate],
    ) -> RepositoryResult<Payment>;
}

pub trait PaymentReader {
    fn get_payment_by_id(
        &self,
        id: PaymentId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Payment>>;
    fn list_payments(&self, query: PaymentListQuery) -> RepositoryResult<(usize, Vec<Payment>)>;
}

pub trait PaymentWriter {
    fn refund_payment(
        &self,
        id: PaymentId,
        refund: &PaymentRefund,
        invoice_update: Option<(InvoiceId, InvoicePaymentUpdate)>,
    ) -> RepositoryResult<Payment>;
}

pub trait TagReader {
    fn get_tag_by_id(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<Option<Tag>>;
    fn list_tags(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Tag>>;
}

pub trait TagWriter {
    fn create_tag(&self, new_tag: &NewTag) -> RepositoryResult<Tag>;
    fn update_tag(&self, id: TagId, tenant_id: TenantId, updates: &UpdateTag)
    -> RepositoryResult<Tag>;
    fn delete_tag(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait WebhookReader {
    fn get_webhook_by_id(
        &self,
        id: WebhookId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Webhook>>;
    fn list_webhooks(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Webhook>>;
    /// Active endpoints of the tenant subscribed to `event`.
    fn list_subscribed_webhooks(
        &self,
        tenant_id: TenantId,
        event: WebhookEvent,
    ) -> RepositoryResult<Vec<Webhook>>;
    fn list_webhook_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: i64,
    ) -> RepositoryResult<Vec<WebhookDelivery>>;
}

pub trait WebhookWriter {
    fn create_webhook(&self, new_webhook: &NewWebhook) -> RepositoryResult<Webhook>;
    fn update_webhook(
        &self,
        id: WebhookId,
        tenant_id: TenantId,
        updates: &UpdateWebhook,
    ) -> RepositoryResult<Webhook>;
    fn delete_webhook(&self, id: WebhookId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn create_webhook_delivery(
        &self,
        delivery: &NewWebhookDelivery,
    ) -> RepositoryResult<WebhookDelivery>;
}

pub trait WorkflowReader {
    fn get_workflow_by_id(
        &self,
        id: WorkflowId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Workflow>>;
    fn list_workflows(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Workflow>>;
    fn list_active_workflows(
        &self,
        tenant_id: TenantId,
        trigger: WorkflowTrigger,
    ) -> RepositoryResult<Vec<Workflow>>;
    fn list_workflow_runs(
        &self,
        workflow_id: WorkflowId,
        limit: i64,
    ) -> RepositoryResult<Vec<WorkflowRun>>;
    /// Pending runs whose `run_at` is not after `now`, oldest first.
    fn list_due_workflow_runs(
        &self,
        now: NaiveDateTime,
        limit: i64,
    ) -> RepositoryResult<Vec<WorkflowRun>>;
}

pub trait WorkflowWriter {
    fn create_workflow(&self, new_workflow: &NewWorkflow) -> RepositoryResult<Workflow>;
    fn update_workflow(
        &self,
        id: WorkflowId,
        tenant_id: TenantId,
        updates: &UpdateWorkflow,
    ) -> RepositoryResult<Workflow>;
    fn delete_workflow(&self, id: WorkflowId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn create_workflow_run(&self, new_run: &NewWorkflowRun) -> RepositoryResult<WorkflowRun>;
    /// Moves a run from pending to running. Returns `false` when another
    /// worker already claimed it.
    fn claim_workflow_run(
        &self,
        id: WorkflowRunId,
        started_at: NaiveDateTime,
    ) -> RepositoryResult<bool>;
    fn finish_workflow_run(
        &self,
        id: WorkflowRunId,
        status: WorkflowRunStatus,
        result: Option<Value>,
        error: Option<String>,
        completed_at: NaiveDateTime,
    ) -> RepositoryResult<()>;
}

pub trait EmailTemplateReader {
    fn get_email_template_by_id(
        &self,
        id: EmailTemplateId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<EmailTemplate>>;
    fn list_email_templates(&self, tenant_id: TenantId) -> RepositoryResult<Vec<EmailTemplate>>;
}

pub trait EmailTemplateWriter {
    fn create_email_template(
        &self,
        new_template: &NewEmailTemplate,
    ) -> RepositoryResult<EmailTemplate>;
    fn update_email_template(
        &self,
        id: EmailTemplateId,
        tenant_id: TenantId,
        updates: &UpdateEmailTemplate,
    ) -> RepositoryResult<EmailTemplate>;
    fn delete_email_template(&self, id: EmailTemplateId, tenant_id: TenantId)
    -> RepositoryResult<()>;
}

pub trait ApiKeyReader {
    fn list_api_keys(&self, tenant_id: TenantId) -> RepositoryResult<Vec<ApiKey>>;
    fn get_api_key_by_hash(&self, key_hash: &str) -> RepositoryResult<Option<ApiKey>>;
}

pub trait ApiKeyWriter {
    fn create_api_key(&self, new_key: &NewApiKey) -> RepositoryResult<ApiKey>;
    fn delete_api_key(&self, id: ApiKeyId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn touch_api_key(&self, id: ApiKeyId, used_at: NaiveDateTime) -> RepositoryResult<()>;
}

pub trait ReminderReader {
    /// Confirmed bookings of the tenant starting in `[from, to)` that have
    /// no reminder yet.
    fn list_bookings_without_reminder(
        &self,
        tenant_id: TenantId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<Booking>>;
    /// Pending reminders whose UTC `send_at` is not after `now`.
    fn list_due_reminders(
        &self,
        now: NaiveDateTime,
        limit: i64,
    ) -> RepositoryResult<Vec<BookingReminder>>;
}

pub trait ReminderWriter {
    fn create_reminder(&self, reminder: &NewBookingReminder) -> RepositoryResult<BookingReminder>;
    fn mark_reminder(
        &self,
        id: ReminderId,
        status: ReminderStatus,
        sent_at: Option<NaiveDateTime>,
        error: Option<String>,
    ) -> RepositoryResult<()>;
}

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Converts a row count into `usize`, clamping negative counts to zero.
pub(crate) fn count_to_usize(count: i64) -> usize {
    usize::try_from(count).unwrap_or_default()
}
