use crate::domain::tag::Tag;
use crate::domain::types::{TagId, TenantId};
use crate::forms::tag::TagPayload;
use crate::repository::{TagReader, TagWriter};
use crate::services::{ServiceError, ServiceResult};

pub fn list_tags<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<Tag>>
where
    R: TagReader + ?Sized,
{
    Ok(repo.list_tags(tenant_id)?)
}

/// Names are unique per tenant, ignoring case.
pub fn create_tag<R>(repo: &R, tenant_id: TenantId, payload: TagPayload) -> ServiceResult<Tag>
where
    R: TagReader + TagWriter + ?Sized,
{
    let new_tag = payload.into_new(tenant_id)?;
    ensure_unique_name(repo, tenant_id, new_tag.name.as_str(), None)?;
    repo.create_tag(&new_tag).map_err(|err| {
        log::error!("Failed to create tag {}: {err}", new_tag.name);
        err.into()
    })
}

pub fn update_tag<R>(
    repo: &R,
    tenant_id: TenantId,
    id: TagId,
    payload: TagPayload,
) -> ServiceResult<Tag>
where
    R: TagReader + TagWriter + ?Sized,
{
    repo.get_tag_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tag"))?;
    let updates = payload.into_update()?;
    ensure_unique_name(repo, tenant_id, updates.name.as_str(), Some(id))?;
    Ok(repo.update_tag(id, tenant_id, &updates)?)
}

/// Deleting a tag detaches it from every contact.
pub fn delete_tag<R>(repo: &R, tenant_id: TenantId, id: TagId) -> ServiceResult<()>
where
    R: TagReader + TagWriter + ?Sized,
{
    repo.get_tag_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tag"))?;
    Ok(repo.delete_tag(id, tenant_id)?)
}

fn ensure_unique_name<R>(
    repo: &R,
    tenant_id: TenantId,
    name: &str,
    except: Option<TagId>,
) -> ServiceResult<()>
where
    R: TagReader + ?Sized,
{
    let taken = repo
        .list_tags(tenant_id)?
        .iter()
        .any(|tag| Some(tag.id) != except && tag.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(ServiceError::Conflict(format!("Tag \"{name}\" already exists")));
    }
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{self, tenant_id};

    fn payload(name: &str) -> TagPayload {
        TagPayload {
            name: name.to_string(),
            color: Some("#FF0000".to_string()),
        }
    }

    #[test]
    fn duplicate_names_conflict_ignoring_case() {
        let mut repo = MockRepository::new();
        repo.expect_list_tags()
            .returning(|_| Ok(vec![fixtures::tag(1, "VIP")]));
        repo.expect_create_tag().times(0);

        let result = create_tag(&repo, tenant_id(), payload("vip"));
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn renaming_a_tag_to_its_own_name_is_allowed() {
        let mut repo = MockRepository::new();
        repo.expect_get_tag_by_id()
            .returning(|id, _| Ok(Some(fixtures::tag(id.get(), "VIP"))));
        repo.expect_list_tags()
            .returning(|_| Ok(vec![fixtures::tag(1, "VIP")]));
        repo.expect_update_tag()
            .withf(|_, _, updates| updates.color == "#ff0000")
            .times(1)
            .returning(|id, _, _| Ok(fixtures::tag(id.get(), "Vip")));

        let tag = update_tag(&repo, tenant_id(), TagId::new(1).unwrap(), payload("Vip")).unwrap();
        assert_eq!(tag.name.as_str(), "Vip");
    }
}
