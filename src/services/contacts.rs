//! Contact management, custom fields, tagging and CSV import.

use crate::domain::contact::{Contact, ContactStatus};
use crate::domain::tag::Tag;
use crate::domain::types::{ContactId, TagId, TenantId};
use crate::domain::webhook::WebhookEvent;
use crate::domain::workflow::{WorkflowSubject, WorkflowTrigger};
use crate::dto::contact::{ContactDetail, ImportSummary};
use crate::forms::contact::{
    ContactFieldsPayload, ContactListParams, ContactPayload, ContactTagPayload, parse_contacts_csv,
};
use crate::pagination::Paginated;
use crate::repository::{ContactListQuery, ContactReader, ContactWriter};
use crate::services::workflows::{WorkflowStore, trigger_workflows};
use crate::services::{Notifier, ServiceError, ServiceResult, page_params, to_payload, utc_now};

fn load_contact<R>(repo: &R, tenant_id: TenantId, id: ContactId) -> ServiceResult<Contact>
where
    R: ContactReader + ?Sized,
{
    repo.get_contact_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Contact"))
}

fn contact_subject(contact_id: ContactId, tag_id: Option<TagId>) -> WorkflowSubject {
    WorkflowSubject {
        contact_id: Some(contact_id),
        tag_id,
        ..WorkflowSubject::default()
    }
}

pub fn list_contacts<R>(
    repo: &R,
    tenant_id: TenantId,
    params: ContactListParams,
) -> ServiceResult<Paginated<Contact>>
where
    R: ContactReader + ?Sized,
{
    let (page, per_page) = page_params(params.page, params.per_page);
    let mut query = ContactListQuery::new(tenant_id).paginate(page, per_page);
    if let Some(search) = params.search.map(|s| s.trim().to_string())
        && !search.is_empty()
    {
        query = query.search(search);
    }
    if let Some(tag_id) = params.tag_id {
        query = query.tag(TagId::new(tag_id)?);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }

    let (total, contacts) = repo.list_contacts(query).map_err(|err| {
        log::error!("Failed to list contacts: {err}");
        err
    })?;
    Ok(Paginated::new(contacts, total, page, per_page))
}

pub fn get_contact<R>(repo: &R, tenant_id: TenantId, id: ContactId) -> ServiceResult<ContactDetail>
where
    R: ContactReader + ?Sized,
{
    let contact = load_contact(repo, tenant_id, id)?;
    let tags = repo.list_contact_tags(contact.id)?;
    Ok(ContactDetail { contact, tags })
}

/// Creates a contact with its status tag. New leads start the
/// `lead_created` workflows.
pub fn create_contact<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    payload: ContactPayload,
) -> ServiceResult<Contact>
where
    R: WorkflowStore + ?Sized,
{
    let new_contact = payload.into_new(tenant_id)?;
    if repo
        .get_contact_by_email(&new_contact.email, tenant_id)?
        .is_some()
    {
        return Err(ServiceError::Conflict(
            "A contact with this email already exists".to_string(),
        ));
    }

    let contact = repo.create_contact(&new_contact).map_err(|err| {
        log::error!("Failed to create contact: {err}");
        err
    })?;
    repo.assign_contact_status(tenant_id, contact.id, contact.status)?;

    notifier.webhook(repo, tenant_id, WebhookEvent::ContactCreated, to_payload(&contact));
    if contact.status == ContactStatus::Lead {
        trigger_workflows(
            repo,
            notifier,
            tenant_id,
            WorkflowTrigger::LeadCreated,
            contact_subject(contact.id, None),
            utc_now(),
        );
    }
    Ok(contact)
}

pub fn update_contact<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: ContactId,
    payload: ContactPayload,
) -> ServiceResult<Contact>
where
    R: WorkflowStore + ?Sized,
{
    let current = load_contact(repo, tenant_id, id)?;
    let updates = payload.into_update(current.status)?;
    if updates.email != current.email
        && let Some(other) = repo.get_contact_by_email(&updates.email, tenant_id)?
        && other.id != id
    {
        return Err(ServiceError::Conflict(
            "A contact with this email already exists".to_string(),
        ));
    }

    let contact = repo.update_contact(id, tenant_id, &updates)?;
    if contact.status != current.status {
        repo.assign_contact_status(tenant_id, id, contact.status)?;
    }

    notifier.webhook(repo, tenant_id, WebhookEvent::ContactUpdated, to_payload(&contact));
    if contact.status == ContactStatus::Client && current.status != ContactStatus::Client {
        trigger_workflows(
            repo,
            notifier,
            tenant_id,
            WorkflowTrigger::ClientConverted,
            contact_subject(id, None),
            utc_now(),
        );
    }
    Ok(contact)
}

pub fn delete_contact<R>(repo: &R, tenant_id: TenantId, id: ContactId) -> ServiceResult<()>
where
    R: ContactReader + ContactWriter + ?Sized,
{
    load_contact(repo, tenant_id, id)?;
    repo.delete_contact(id, tenant_id).map_err(|err| {
        log::error!("Failed to delete contact {id}: {err}");
        err.into()
    })
}

/// Replaces every custom field of the contact.
pub fn replace_fields<R>(
    repo: &R,
    tenant_id: TenantId,
    id: ContactId,
    payload: ContactFieldsPayload,
) -> ServiceResult<Contact>
where
    R: ContactReader + ContactWriter + ?Sized,
{
    load_contact(repo, tenant_id, id)?;
    let fields = payload.into_fields()?;
    repo.replace_contact_fields(id, &fields)?;
    load_contact(repo, tenant_id, id)
}

pub fn list_contact_tags<R>(repo: &R, tenant_id: TenantId, id: ContactId) -> ServiceResult<Vec<Tag>>
where
    R: ContactReader + ?Sized,
{
    let contact = load_contact(repo, tenant_id, id)?;
    Ok(repo.list_contact_tags(contact.id)?)
}

/// Attaches a tag and returns the contact's tags. Status tags replace the
/// other status tags and update the contact status.
pub fn add_contact_tag<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: ContactId,
    payload: ContactTagPayload,
) -> ServiceResult<Vec<Tag>>
where
    R: WorkflowStore + ?Sized,
{
    let contact = load_contact(repo, tenant_id, id)?;
    let tag = repo
        .get_tag_by_id(TagId::new(payload.tag_id)?, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tag"))?;

    let added = match ContactStatus::from_tag_name(tag.name.as_str()) {
        Some(status) => {
            let attached = repo.list_contact_tags(id)?.iter().any(|t| t.id == tag.id);
            if !attached {
                repo.assign_contact_status(tenant_id, id, status)?;
                if status == ContactStatus::Client && contact.status != ContactStatus::Client {
                    trigger_workflows(
                        repo,
                        notifier,
                        tenant_id,
                        WorkflowTrigger::ClientConverted,
                        contact_subject(id, None),
                        utc_now(),
                    );
                }
            }
            !attached
        }
        None => repo.add_contact_tag(id, tag.id)?,
    };

    if added {
        trigger_workflows(
            repo,
            notifier,
            tenant_id,
            WorkflowTrigger::TagAdded,
            contact_subject(id, Some(tag.id)),
            utc_now(),
        );
    }
    Ok(repo.list_contact_tags(id)?)
}

pub fn remove_contact_tag<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    id: ContactId,
    tag_id: TagId,
) -> ServiceResult<()>
where
    R: WorkflowStore + ?Sized,
{
    load_contact(repo, tenant_id, id)?;
    if !repo.remove_contact_tag(id, tag_id)? {
        return Err(ServiceError::NotFound(
            "Tag is not attached to this contact".to_string(),
        ));
    }
    trigger_workflows(
        repo,
        notifier,
        tenant_id,
        WorkflowTrigger::TagRemoved,
        contact_subject(id, Some(tag_id)),
        utc_now(),
    );
    Ok(())
}

/// Imports contacts from CSV text. Emails already present for the tenant or
/// repeated in the file are skipped. Imported contacts do not start
/// workflows.
pub fn import_contacts<R>(repo: &R, tenant_id: TenantId, data: &str) -> ServiceResult<ImportSummary>
where
    R: ContactWriter + ?Sized,
{
    let parsed = parse_contacts_csv(tenant_id, data)?;
    let total = parsed.contacts.len() + parsed.errors.len() + parsed.duplicates;
    let imported = if parsed.contacts.is_empty() {
        0
    } else {
        repo.import_contacts(&parsed.contacts).map_err(|err| {
            log::error!("Failed to import contacts: {err}");
            err
        })?
    };

    log::info!("Imported {imported} of {total} contacts for tenant {tenant_id}");
    Ok(ImportSummary {
        total,
        imported,
        skipped: total - imported,
        errors: parsed.errors,
    })
}
