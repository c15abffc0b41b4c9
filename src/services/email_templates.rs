//! Tenant email templates, test sends and the starter set.

use crate::domain::email_template::{EmailTemplate, NewEmailTemplate};
use crate::domain::types::{ContactEmail, EmailTemplateId, TemplateText, TenantId};
use crate::email::{
    BookingVariables, ClientVariables, InvoiceVariables, OutgoingEmail, SEED_TEMPLATES,
    TemplateVariables, render_template,
};
use crate::forms::email_template::{EmailTemplatePayload, TestEmailPayload};
use crate::repository::{EmailTemplateReader, EmailTemplateWriter, TenantReader};
use crate::services::{Notifier, ServiceError, ServiceResult};

fn load_template<R>(
    repo: &R,
    tenant_id: TenantId,
    id: EmailTemplateId,
) -> ServiceResult<EmailTemplate>
where
    R: EmailTemplateReader + ?Sized,
{
    repo.get_email_template_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Email template"))
}

/// Renders a template source against placeholder data, surfacing syntax
/// errors as validation failures.
fn check_syntax(subject: &str, body: &str) -> ServiceResult<()> {
    render_template(subject, body, &TemplateVariables::default())
        .map(|_| ())
        .map_err(|e| ServiceError::Validation(format!("Invalid template: {e}")))
}

pub fn list_templates<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<EmailTemplate>>
where
    R: EmailTemplateReader + ?Sized,
{
    Ok(repo.list_email_templates(tenant_id)?)
}

pub fn get_template<R>(
    repo: &R,
    tenant_id: TenantId,
    id: EmailTemplateId,
) -> ServiceResult<EmailTemplate>
where
    R: EmailTemplateReader + ?Sized,
{
    load_template(repo, tenant_id, id)
}

pub fn create_template<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: EmailTemplatePayload,
) -> ServiceResult<EmailTemplate>
where
    R: EmailTemplateWriter + ?Sized,
{
    let new_template = payload.into_new(tenant_id)?;
    check_syntax(&new_template.subject, &new_template.body)?;
    repo.create_email_template(&new_template).map_err(|err| {
        log::error!("Failed to create email template: {err}");
        err.into()
    })
}

pub fn update_template<R>(
    repo: &R,
    tenant_id: TenantId,
    id: EmailTemplateId,
    payload: EmailTemplatePayload,
) -> ServiceResult<EmailTemplate>
where
    R: EmailTemplateReader + EmailTemplateWriter + ?Sized,
{
    load_template(repo, tenant_id, id)?;
    let updates = payload.into_update()?;
    check_syntax(&updates.subject, &updates.body)?;
    Ok(repo.update_email_template(id, tenant_id, &updates)?)
}

pub fn delete_template<R>(repo: &R, tenant_id: TenantId, id: EmailTemplateId) -> ServiceResult<()>
where
    R: EmailTemplateReader + EmailTemplateWriter + ?Sized,
{
    load_template(repo, tenant_id, id)?;
    Ok(repo.delete_email_template(id, tenant_id)?)
}

fn sample_variables(variables: TemplateVariables) -> TemplateVariables {
    TemplateVariables {
        client: ClientVariables {
            name: "Jane Doe".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+15555550100".to_string(),
        },
        booking: BookingVariables {
            service: "Sample Service".to_string(),
            date: "Monday, January 5, 2026".to_string(),
            time: "10:00 AM".to_string(),
            duration: "1h".to_string(),
            price: "$100.00".to_string(),
            confirmation_number: "ABC12345".to_string(),
            status: "confirmed".to_string(),
            ..BookingVariables::default()
        },
        invoice: InvoiceVariables {
            number: "INV-00001".to_string(),
            amount: "$100.00".to_string(),
            balance: "$100.00".to_string(),
            due_date: "January 19, 2026".to_string(),
            paid_date: String::new(),
        },
        ..variables
    }
}

/// Sends the template filled with sample data to `payload.to`, or to the
/// tenant's own address.
pub fn send_test<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: EmailTemplateId,
    payload: TestEmailPayload,
) -> ServiceResult<OutgoingEmail>
where
    R: TenantReader + EmailTemplateReader + ?Sized,
{
    let recipient = payload.recipient()?;
    let template = load_template(repo, tenant_id, id)?;
    let tenant = repo
        .get_tenant_by_id(tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;

    let variables = sample_variables(TemplateVariables::for_tenant(&tenant));
    let rendered = render_template(&template.subject, &template.body, &variables)
        .map_err(|e| ServiceError::Validation(format!("Invalid template: {e}")))?;
    let email = OutgoingEmail {
        to: recipient.map_or(tenant.email, ContactEmail::into_inner),
        subject: format!("[Test] {}", rendered.subject),
        html: rendered.html,
    };
    if !notifier.send_email(email.clone()) {
        return Err(ServiceError::Unavailable(
            "Email delivery is unavailable".to_string(),
        ));
    }
    Ok(email)
}

/// Adds the default templates the tenant does not have yet, matched by name.
pub fn seed_templates<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<EmailTemplate>>
where
    R: EmailTemplateReader + EmailTemplateWriter + ?Sized,
{
    let existing = repo.list_email_templates(tenant_id)?;
    let mut created = Vec::new();
    for default in SEED_TEMPLATES {
        if existing
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(default.name))
        {
            continue;
        }
        let template = repo.create_email_template(&NewEmailTemplate {
            tenant_id,
            name: TemplateText::new(default.name)?,
            subject: TemplateText::new(default.subject)?,
            body: TemplateText::new(default.body)?,
        })?;
        created.push(template);
    }
    log::info!("Seeded {} email templates for tenant {tenant_id}", created.len());
    Ok(created)
}
