use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{TagId, TenantId};
use crate::domain::workflow::{NewWorkflow, WorkflowAction, WorkflowTrigger};
use crate::forms::{FormError, clean_text};

#[derive(Debug, Deserialize, Validate)]
pub struct WorkflowPayload {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub trigger_type: WorkflowTrigger,
    pub trigger_tag_id: Option<i32>,
    /// At most thirty days.
    #[validate(range(min = 0, max = 43200))]
    pub delay_minutes: Option<i32>,
    #[validate(length(min = 1, message = "a workflow needs at least one action"))]
    pub actions: Vec<WorkflowAction>,
    pub active: Option<bool>,
}

impl WorkflowPayload {
    /// The trigger tag only applies to tag triggers and is dropped otherwise.
    pub fn into_domain(self, tenant_id: TenantId) -> Result<NewWorkflow, FormError> {
        self.validate()?;
        let trigger_tag_id = if self.trigger_type.is_tag_trigger() {
            self.trigger_tag_id.map(TagId::new).transpose()?
        } else {
            None
        };
        Ok(NewWorkflow {
            tenant_id,
            name: ammonia::clean(self.name.trim()),
            description: clean_text(self.description),
            trigger_type: self.trigger_type,
            trigger_tag_id,
            delay_minutes: self.delay_minutes.unwrap_or(0),
            actions: self.actions,
            active: self.active.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_id_is_kept_only_for_tag_triggers() {
        let payload = |trigger: &str| -> WorkflowPayload {
            serde_json::from_value(json!({
                "name": "Welcome",
                "trigger_type": trigger,
                "trigger_tag_id": 4,
                "actions": [{"type": "wait"}]
            }))
            .unwrap()
        };
        let tenant = TenantId::new(1).unwrap();
        let tagged = payload("tag_added").into_domain(tenant).unwrap();
        assert_eq!(tagged.trigger_tag_id, Some(TagId::new(4).unwrap()));
        let other = payload("lead_created").into_domain(tenant).unwrap();
        assert_eq!(other.trigger_tag_id, None);
        assert_eq!(other.delay_minutes, 0);
    }

    #[test]
    fn rejects_short_names_and_empty_actions() {
        let payload: WorkflowPayload = serde_json::from_value(json!({
            "name": "W",
            "trigger_type": "lead_created",
            "actions": []
        }))
        .unwrap();
        assert!(matches!(
            payload.into_domain(TenantId::new(1).unwrap()),
            Err(FormError::Validation(_))
        ));
    }
}
