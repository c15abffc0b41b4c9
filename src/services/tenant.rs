//! Tenant provisioning and settings.

use crate::auth::AuthenticatedUser;
use crate::domain::contact::ContactStatus;
use crate::domain::email_template::NewEmailTemplate;
use crate::domain::tag::NewTag;
use crate::domain::tenant::Tenant;
use crate::domain::types::{TagName, TemplateText};
use crate::email::SEED_TEMPLATES;
use crate::forms::tenant::{CreateTenantPayload, UpdateTenantPayload};
use crate::repository::{EmailTemplateWriter, TagWriter, TenantReader, TenantWriter};
use crate::services::{ServiceError, ServiceResult};

/// Colors of the status tags created for every new tenant.
const STATUS_TAG_COLORS: [(ContactStatus, &str); 3] = [
    (ContactStatus::Lead, "#3b82f6"),
    (ContactStatus::Client, "#22c55e"),
    (ContactStatus::Inactive, "#6b7280"),
];

fn ensure_slug_available<R>(repo: &R, slug: &str, current: Option<&Tenant>) -> ServiceResult<()>
where
    R: TenantReader + ?Sized,
{
    match repo.get_tenant_by_slug(slug)? {
        Some(other) if current.is_none_or(|t| t.id != other.id) => Err(ServiceError::Conflict(
            format!("The URL `{slug}` is already taken"),
        )),
        _ => Ok(()),
    }
}

/// Creates the tenant of the caller's organization together with its status
/// tags and starter email templates.
pub fn provision_tenant<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payload: CreateTenantPayload,
) -> ServiceResult<Tenant>
where
    R: TenantReader + TenantWriter + TagWriter + EmailTemplateWriter + ?Sized,
{
    let org_id = user
        .org_id
        .as_deref()
        .ok_or_else(|| ServiceError::Validation("An organization is required".to_string()))?;
    if repo.get_tenant_by_org_id(org_id)?.is_some() {
        return Err(ServiceError::Conflict(
            "This organization already has a business".to_string(),
        ));
    }

    let new_tenant = payload.into_domain(org_id, &user.email)?;
    ensure_slug_available(repo, new_tenant.slug.as_str(), None)?;

    let tenant = repo.create_tenant(&new_tenant).map_err(|err| {
        log::error!("Failed to create tenant: {err}");
        err
    })?;

    for (status, color) in STATUS_TAG_COLORS {
        let tag = NewTag {
            tenant_id: tenant.id,
            name: TagName::new(status.tag_name())?,
            color: color.to_string(),
        };
        if let Err(e) = repo.create_tag(&tag) {
            log::error!("Failed to seed tag {} for tenant {}: {e}", tag.name, tenant.id);
        }
    }
    for template in SEED_TEMPLATES {
        let new_template = NewEmailTemplate {
            tenant_id: tenant.id,
            name: TemplateText::new(template.name)?,
            subject: TemplateText::new(template.subject)?,
            body: TemplateText::new(template.body)?,
        };
        if let Err(e) = repo.create_email_template(&new_template) {
            log::error!("Failed to seed template for tenant {}: {e}", tenant.id);
        }
    }

    log::info!("Provisioned tenant {} ({})", tenant.id, tenant.slug);
    Ok(tenant)
}

/// Applies a partial settings update.
pub fn update_tenant<R>(
    repo: &R,
    tenant: &Tenant,
    payload: UpdateTenantPayload,
) -> ServiceResult<Tenant>
where
    R: TenantReader + TenantWriter + ?Sized,
{
    let updates = payload.apply(tenant)?;
    if updates.slug != tenant.slug {
        ensure_slug_available(repo, updates.slug.as_str(), Some(tenant))?;
    }
    repo.update_tenant(tenant.id, &updates).map_err(|err| {
        log::error!("Failed to update tenant {}: {err}", tenant.id);
        err.into()
    })
}
