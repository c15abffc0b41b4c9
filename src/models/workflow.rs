use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{
    BookingId, ContactId, InvoiceId, TagId, TenantId, WorkflowId, WorkflowRunId,
};
use crate::domain::workflow::{
    NewWorkflow as DomainNewWorkflow, NewWorkflowRun as DomainNewRun, Workflow as DomainWorkflow,
    WorkflowRun as DomainRun, WorkflowSubject,
};
use crate::repository::errors::RepositoryError;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::workflows)]
/// Diesel model for [`crate::domain::workflow::Workflow`]. Actions are a JSON
/// array of tagged objects.
pub struct Workflow {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: String,
    pub trigger_tag_id: Option<i32>,
    pub delay_minutes: i32,
    pub actions: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::workflows)]
#[diesel(treat_none_as_null = true)]
pub struct NewWorkflow<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub trigger_type: &'a str,
    pub trigger_tag_id: Option<i32>,
    pub delay_minutes: i32,
    pub actions: String,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::workflow_runs)]
pub struct WorkflowRun {
    pub id: i32,
    pub workflow_id: i32,
    pub tenant_id: i32,
    pub contact_id: Option<i32>,
    pub booking_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub status: String,
    pub run_at: NaiveDateTime,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::workflow_runs)]
pub struct NewWorkflowRun<'a> {
    pub workflow_id: i32,
    pub tenant_id: i32,
    pub contact_id: Option<i32>,
    pub booking_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub status: &'a str,
    pub run_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
}

impl TryFrom<Workflow> for DomainWorkflow {
    type Error = RepositoryError;

    fn try_from(workflow: Workflow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WorkflowId::try_from(workflow.id)?,
            tenant_id: TenantId::try_from(workflow.tenant_id)?,
            name: workflow.name,
            description: workflow.description,
            trigger_type: workflow.trigger_type.parse()?,
            trigger_tag_id: workflow.trigger_tag_id.map(TagId::try_from).transpose()?,
            delay_minutes: workflow.delay_minutes,
            actions: serde_json::from_str(&workflow.actions)?,
            active: workflow.active,
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewWorkflow> for NewWorkflow<'a> {
    type Error = RepositoryError;

    fn try_from(workflow: &'a DomainNewWorkflow) -> Result<Self, Self::Error> {
        Ok(Self {
            tenant_id: workflow.tenant_id.get(),
            name: &workflow.name,
            description: workflow.description.as_deref(),
            trigger_type: workflow.trigger_type.as_str(),
            trigger_tag_id: workflow.trigger_tag_id.map(|id| id.get()),
            delay_minutes: workflow.delay_minutes,
            actions: serde_json::to_string(&workflow.actions)?,
            active: workflow.active,
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }
}

impl TryFrom<WorkflowRun> for DomainRun {
    type Error = RepositoryError;

    fn try_from(run: WorkflowRun) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WorkflowRunId::try_from(run.id)?,
            workflow_id: WorkflowId::try_from(run.workflow_id)?,
            tenant_id: TenantId::try_from(run.tenant_id)?,
            subject: WorkflowSubject {
                contact_id: run.contact_id.map(ContactId::try_from).transpose()?,
                booking_id: run.booking_id.map(BookingId::try_from).transpose()?,
                invoice_id: run.invoice_id.map(InvoiceId::try_from).transpose()?,
                tag_id: None,
            },
            status: run.status.parse()?,
            run_at: run.run_at,
            result: run
                .result
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()?,
            error: run.error,
            started_at: run.started_at,
            completed_at: run.completed_at,
            created_at: run.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewRun> for NewWorkflowRun<'a> {
    fn from(run: &'a DomainNewRun) -> Self {
        Self {
            workflow_id: run.workflow_id.get(),
            tenant_id: run.tenant_id.get(),
            contact_id: run.subject.contact_id.map(|id| id.get()),
            booking_id: run.subject.booking_id.map(|id| id.get()),
            invoice_id: run.subject.invoice_id.map(|id| id.get()),
            status: run.status.as_str(),
            run_at: run.run_at,
            started_at: run.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{WorkflowAction, WorkflowTrigger};

    #[test]
    fn workflow_row_round_trips_actions() {
        let domain = DomainNewWorkflow {
            tenant_id: TenantId::new(1).unwrap(),
            name: "Follow up".to_string(),
            description: None,
            trigger_type: WorkflowTrigger::BookingCompleted,
            trigger_tag_id: None,
            delay_minutes: 1440,
            actions: vec![WorkflowAction::Wait, WorkflowAction::AddTag { tag_id: None }],
            active: true,
        };
        let insert = NewWorkflow::try_from(&domain).unwrap();
        assert_eq!(insert.trigger_type, "booking_completed");

        let now = chrono::Utc::now().naive_utc();
        let row = Workflow {
            id: 1,
            tenant_id: 1,
            name: insert.name.to_string(),
            description: None,
            trigger_type: insert.trigger_type.to_string(),
            trigger_tag_id: None,
            delay_minutes: insert.delay_minutes,
            actions: insert.actions.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let workflow = DomainWorkflow::try_from(row).unwrap();
        assert_eq!(workflow.actions, domain.actions);
    }
}
