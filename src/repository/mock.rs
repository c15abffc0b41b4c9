//! Mock repository implementations for isolating services in tests.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use mockall::mock;
use serde_json::Value;

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
use crate::domain::invoice::{Invoice, InvoicePaymentUpdate, NewInvoice, UpdateInvoice};
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
use crate::repository::*;

mock! {
    pub Repository {}

    impl TenantReader for Repository {
        fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>>;
        fn get_tenant_by_slug(&self, slug: &str) -> RepositoryResult<Option<Tenant>>;
        fn get_tenant_by_org_id(&self, org_id: &str) -> RepositoryResult<Option<Tenant>>;
        fn list_tenants(&self) -> RepositoryResult<Vec<Tenant>>;
    }

    impl TenantWriter for Repository {
        fn create_tenant(&self, new_tenant: &NewTenant) -> RepositoryResult<Tenant>;
        fn update_tenant(&self, id: TenantId, updates: &UpdateTenant) -> RepositoryResult<Tenant>;
    }

    impl ContactReader for Repository {
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

    impl ContactWriter for Repository {
        fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact>;
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
        fn add_contact_tag(&self, contact_id: ContactId, tag_id: TagId) -> RepositoryResult<bool>;
        fn remove_contact_tag(
            &self,
            contact_id: ContactId,
            tag_id: TagId,
        ) -> RepositoryResult<bool>;
        fn assign_contact_status(
            &self,
            tenant_id: TenantId,
            contact_id: ContactId,
            status: ContactStatus,
        ) -> RepositoryResult<Option<TagId>>;
    }

    impl ServiceReader for Repository {
        fn get_service_by_id(
            &self,
            id: ServiceId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Service>>;
        fn list_services(&self, tenant_id: TenantId, active_only: bool)
        -> RepositoryResult<Vec<Service>>;
    }

    impl ServiceWriter for Repository {
        fn create_service(&self, new_service: &NewService) -> RepositoryResult<Service>;
        fn update_service(
            &self,
            id: ServiceId,
            tenant_id: TenantId,
            updates: &UpdateService,
        ) -> RepositoryResult<Service>;
        fn delete_service(&self, id: ServiceId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl PackageReader for Repository {
        fn get_package_by_id(
            &self,
            id: PackageId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Package>>;
        fn list_packages(&self, tenant_id: TenantId, active_only: bool)
        -> RepositoryResult<Vec<Package>>;
    }

    impl PackageWriter for Repository {
        fn create_package(&self, new_package: &NewPackage) -> RepositoryResult<Package>;
        fn update_package(
            &self,
            id: PackageId,
            tenant_id: TenantId,
            updates: &UpdatePackage,
        ) -> RepositoryResult<Package>;
        fn delete_package(&self, id: PackageId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl BookingReader for Repository {
        fn get_booking_by_id(
            &self,
            id: BookingId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Booking>>;
        fn get_booking_by_public_id(
            &self,
            public_id: PublicId,
        ) -> RepositoryResult<Option<Booking>>;
        fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)>;
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

    impl BookingWriter for Repository {
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

    impl AvailabilityReader for Repository {
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

    impl AvailabilityWriter for Repository {
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

    impl InvoiceReader for Repository {
        fn get_invoice_by_id(
            &self,
            id: InvoiceId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Invoice>>;
        fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)>;
        fn list_invoice_booking_ids(
            &self,
            invoice_id: InvoiceId,
        ) -> RepositoryResult<Vec<BookingId>>;
    }

    impl InvoiceWriter for Repository {
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
        fn record_invoice_payment(
            &self,
            payment: &NewPayment,
            invoice_id: InvoiceId,
            invoice_update: &InvoicePaymentUpdate,
            booking_updates: &[BookingPaymentUpdate],
        ) -> RepositoryResult<Payment>;
    }

    impl PaymentReader for Repository {
        fn get_payment_by_id(
            &self,
            id: PaymentId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Payment>>;
        fn list_payments(&self, query: PaymentListQuery) -> RepositoryResult<(usize, Vec<Payment>)>;
    }

    impl PaymentWriter for Repository {
        fn refund_payment(
            &self,
            id: PaymentId,
            refund: &PaymentRefund,
            invoice_update: Option<(InvoiceId, InvoicePaymentUpdate)>,
        ) -> RepositoryResult<Payment>;
    }

    impl TagReader for Repository {
        fn get_tag_by_id(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<Option<Tag>>;
        fn list_tags(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Tag>>;
    }

    impl TagWriter for Repository {
        fn create_tag(&self, new_tag: &NewTag) -> RepositoryResult<Tag>;
        fn update_tag(&self, id: TagId, tenant_id: TenantId, updates: &UpdateTag)
        -> RepositoryResult<Tag>;
        fn delete_tag(&self, id: TagId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl WebhookReader for Repository {
        fn get_webhook_by_id(
            &self,
            id: WebhookId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Webhook>>;
        fn list_webhooks(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Webhook>>;
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

    impl WebhookWriter for Repository {
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

    impl WorkflowReader for Repository {
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
        fn list_due_workflow_runs(
            &self,
            now: NaiveDateTime,
            limit: i64,
        ) -> RepositoryResult<Vec<WorkflowRun>>;
    }

    impl WorkflowWriter for Repository {
        fn create_workflow(&self, new_workflow: &NewWorkflow) -> RepositoryResult<Workflow>;
        fn update_workflow(
            &self,
            id: WorkflowId,
            tenant_id: TenantId,
            updates: &UpdateWorkflow,
        ) -> RepositoryResult<Workflow>;
        fn delete_workflow(&self, id: WorkflowId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn create_workflow_run(&self, new_run: &NewWorkflowRun) -> RepositoryResult<WorkflowRun>;
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

    impl EmailTemplateReader for Repository {
        fn get_email_template_by_id(
            &self,
            id: EmailTemplateId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<EmailTemplate>>;
        fn list_email_templates(&self, tenant_id: TenantId) -> RepositoryResult<Vec<EmailTemplate>>;
    }

    impl EmailTemplateWriter for Repository {
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

    impl ApiKeyReader for Repository {
        fn list_api_keys(&self, tenant_id: TenantId) -> RepositoryResult<Vec<ApiKey>>;
        fn get_api_key_by_hash(&self, key_hash: &str) -> RepositoryResult<Option<ApiKey>>;
    }

    impl ApiKeyWriter for Repository {
        fn create_api_key(&self, new_key: &NewApiKey) -> RepositoryResult<ApiKey>;
        fn delete_api_key(&self, id: ApiKeyId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn touch_api_key(&self, id: ApiKeyId, used_at: NaiveDateTime) -> RepositoryResult<()>;
    }

    impl ReminderReader for Repository {
        fn list_bookings_without_reminder(
            &self,
            tenant_id: TenantId,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> RepositoryResult<Vec<Booking>>;
        fn list_due_reminders(
            &self,
            now: NaiveDateTime,
            limit: i64,
        ) -> RepositoryResult<Vec<BookingReminder>>;
    }

    impl ReminderWriter for Repository {
        fn create_reminder(
            &self,
            reminder: &NewBookingReminder,
        ) -> RepositoryResult<BookingReminder>;
        fn mark_reminder(
            &self,
            id: ReminderId,
            status: ReminderStatus,
            sent_at: Option<NaiveDateTime>,
            error: Option<String>,
        ) -> RepositoryResult<()>;
    }
}
