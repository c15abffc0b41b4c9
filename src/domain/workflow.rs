//! Automations run when tenant events fire.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::booking::BookingStatus;
use crate::domain::types::{
    BookingId, ContactId, EmailTemplateId, InvoiceId, TagId, TenantId, WorkflowId, WorkflowRunId,
    text_enum,
};

text_enum!(
    /// Events that start a workflow.
    WorkflowTrigger {
        BookingCreated => "booking_created",
        BookingConfirmed => "booking_confirmed",
        BookingCancelled => "booking_cancelled",
        BookingCompleted => "booking_completed",
        LeadCreated => "lead_created",
        ClientConverted => "client_converted",
        TagAdded => "tag_added",
        TagRemoved => "tag_removed",
        InvoiceSent => "invoice_sent",
        InvoicePaid => "invoice_paid",
        PaymentReceived => "payment_received",
    }
);

impl WorkflowTrigger {
    pub fn is_tag_trigger(self) -> bool {
        matches!(self, WorkflowTrigger::TagAdded | WorkflowTrigger::TagRemoved)
    }
}

text_enum!(
    WorkflowRunStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
);

/// A single step of a workflow.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowAction {
    SendEmail {
        template_id: Option<EmailTemplateId>,
    },
    SendNotification {
        #[serde(default)]
        subject: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    AddTag {
        tag_id: Option<TagId>,
    },
    RemoveTag {
        tag_id: Option<TagId>,
    },
    UpdateStatus {
        status: Option<BookingStatus>,
    },
    Wait,
}

impl WorkflowAction {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowAction::SendEmail { .. } => "send_email",
            WorkflowAction::SendNotification { .. } => "send_notification",
            WorkflowAction::AddTag { .. } => "add_tag",
            WorkflowAction::RemoveTag { .. } => "remove_tag",
            WorkflowAction::UpdateStatus { .. } => "update_status",
            WorkflowAction::Wait => "wait",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Workflow {
    pub id: WorkflowId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: WorkflowTrigger,
    pub trigger_tag_id: Option<TagId>,
    pub delay_minutes: i32,
    pub actions: Vec<WorkflowAction>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Workflow {
    /// Tag triggers only match their configured tag; an unset tag matches any.
    pub fn matches_tag(&self, tag_id: Option<TagId>) -> bool {
        match (self.trigger_tag_id, tag_id) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewWorkflow {
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: WorkflowTrigger,
    pub trigger_tag_id: Option<TagId>,
    pub delay_minutes: i32,
    pub actions: Vec<WorkflowAction>,
    pub active: bool,
}

pub type UpdateWorkflow = NewWorkflow;

/// Records a workflow was triggered for.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct WorkflowSubject {
    pub contact_id: Option<ContactId>,
    pub booking_id: Option<BookingId>,
    pub invoice_id: Option<InvoiceId>,
    /// Tag involved in a tag trigger. Not persisted with delayed runs.
    #[serde(skip)]
    pub tag_id: Option<TagId>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkflowRun {
    pub id: WorkflowRunId,
    pub workflow_id: WorkflowId,
    pub tenant_id: TenantId,
    pub subject: WorkflowSubject,
    pub status: WorkflowRunStatus,
    pub run_at: NaiveDateTime,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewWorkflowRun {
    pub workflow_id: WorkflowId,
    pub tenant_id: TenantId,
    pub subject: WorkflowSubject,
    pub status: WorkflowRunStatus,
    pub run_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
}

/// Outcome of one executed action.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ActionResult {
    pub action: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(action: &'static str) -> Self {
        Self {
            action,
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_with(action: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(action)
        }
    }

    pub fn failed(action: &'static str, error: impl Into<String>) -> Self {
        Self {
            action,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_use_tagged_json() {
        let actions: Vec<WorkflowAction> = serde_json::from_value(json!([
            {"type": "send_email", "template_id": 3},
            {"type": "add_tag", "tag_id": 7},
            {"type": "update_status", "status": "confirmed"},
            {"type": "send_notification"},
            {"type": "wait"}
        ]))
        .unwrap();
        assert_eq!(
            actions[0],
            WorkflowAction::SendEmail {
                template_id: Some(EmailTemplateId::new(3).unwrap())
            }
        );
        assert_eq!(
            actions[2],
            WorkflowAction::UpdateStatus {
                status: Some(BookingStatus::Confirmed)
            }
        );
        assert_eq!(actions[3].kind(), "send_notification");
        assert_eq!(actions[4], WorkflowAction::Wait);
    }

    #[test]
    fn unset_trigger_tag_matches_any_tag() {
        let now = chrono::Utc::now().naive_utc();
        let mut workflow = Workflow {
            id: WorkflowId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            name: "Welcome".to_string(),
            description: None,
            trigger_type: WorkflowTrigger::TagAdded,
            trigger_tag_id: None,
            delay_minutes: 0,
            actions: vec![],
            active: true,
            created_at: now,
            updated_at: now,
        };
        let vip = TagId::new(4).unwrap();
        assert!(workflow.matches_tag(Some(vip)));
        workflow.trigger_tag_id = Some(TagId::new(5).unwrap());
        assert!(!workflow.matches_tag(Some(vip)));
        assert!(!workflow.matches_tag(None));
    }
}
