use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::types::{TenantId, WorkflowId, WorkflowRunId};
use crate::domain::workflow::{
    NewWorkflow, NewWorkflowRun, UpdateWorkflow, Workflow, WorkflowRun, WorkflowRunStatus,
    WorkflowTrigger,
};
use crate::models::workflow::{
    NewWorkflow as DbNewWorkflow, NewWorkflowRun as DbNewRun, Workflow as DbWorkflow,
    WorkflowRun as DbRun,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, WorkflowReader, WorkflowWriter};
use crate::schema::{workflow_runs, workflows};

impl WorkflowReader for DieselRepository {
    fn get_workflow_by_id(
        &self,
        id: WorkflowId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Workflow>> {
        let mut conn = self.conn()?;
        let row = workflows::table
            .filter(workflows::id.eq(id.get()))
            .filter(workflows::tenant_id.eq(tenant_id.get()))
            .first::<DbWorkflow>(&mut conn)
            .optional()?;
        row.map(Workflow::try_from).transpose()
    }

    fn list_workflows(&self, tenant_id: TenantId) -> RepositoryResult<Vec<Workflow>> {
        let mut conn = self.conn()?;
        workflows::table
            .filter(workflows::tenant_id.eq(tenant_id.get()))
            .order(workflows::created_at.desc())
            .load::<DbWorkflow>(&mut conn)?
            .into_iter()
            .map(Workflow::try_from)
            .collect()
    }

    fn list_active_workflows(
        &self,
        tenant_id: TenantId,
        trigger: WorkflowTrigger,
    ) -> RepositoryResult<Vec<Workflow>> {
        let mut conn = self.conn()?;
        workflows::table
            .filter(workflows::tenant_id.eq(tenant_id.get()))
            .filter(workflows::trigger_type.eq(trigger.as_str()))
            .filter(workflows::active.eq(true))
            .order(workflows::id.asc())
            .load::<DbWorkflow>(&mut conn)?
            .into_iter()
            .map(Workflow::try_from)
            .collect()
    }

    fn list_workflow_runs(
        &self,
        workflow_id: WorkflowId,
        limit: i64,
    ) -> RepositoryResult<Vec<WorkflowRun>> {
        let mut conn = self.conn()?;
        workflow_runs::table
            .filter(workflow_runs::workflow_id.eq(workflow_id.get()))
            .order(workflow_runs::id.desc())
            .limit(limit)
            .load::<DbRun>(&mut conn)?
            .into_iter()
            .map(WorkflowRun::try_from)
            .collect()
    }

    fn list_due_workflow_runs(
        &self,
        now: NaiveDateTime,
        limit: i64,
    ) -> RepositoryResult<Vec<WorkflowRun>> {
        let mut conn = self.conn()?;
        workflow_runs::table
            .filter(workflow_runs::status.eq(WorkflowRunStatus::Pending.as_str()))
            .filter(workflow_runs::run_at.le(now))
            .order(workflow_runs::run_at.asc())
            .limit(limit)
            .load::<DbRun>(&mut conn)?
            .into_iter()
            .map(WorkflowRun::try_from)
            .collect()
    }
}

impl WorkflowWriter for DieselRepository {
    fn create_workflow(&self, new_workflow: &NewWorkflow) -> RepositoryResult<Workflow> {
        let mut conn = self.conn()?;
        let insertable = DbNewWorkflow::try_from(new_workflow)?;
        let created = diesel::insert_into(workflows::table)
            .values(&insertable)
            .get_result::<DbWorkflow>(&mut conn)?;
        created.try_into()
    }

    fn update_workflow(
        &self,
        id: WorkflowId,
        tenant_id: TenantId,
        updates: &UpdateWorkflow,
    ) -> RepositoryResult<Workflow> {
        let mut conn = self.conn()?;
        let changes = DbNewWorkflow::try_from(updates)?;
        let updated = diesel::update(
            workflows::table
                .filter(workflows::id.eq(id.get()))
                .filter(workflows::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbWorkflow>(&mut conn)?;
        updated.try_into()
    }

    fn delete_workflow(&self, id: WorkflowId, tenant_id: TenantId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            workflows::table
                .filter(workflows::id.eq(id.get()))
                .filter(workflows::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn create_workflow_run(&self, new_run: &NewWorkflowRun) -> RepositoryResult<WorkflowRun> {
        let mut conn = self.conn()?;
        let insertable: DbNewRun = new_run.into();
        let created = diesel::insert_into(workflow_runs::table)
            .values(&insertable)
            .get_result::<DbRun>(&mut conn)?;
        created.try_into()
    }

    fn claim_workflow_run(
        &self,
        id: WorkflowRunId,
        started_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let claimed = diesel::update(
            workflow_runs::table
                .filter(workflow_runs::id.eq(id.get()))
                .filter(workflow_runs::status.eq(WorkflowRunStatus::Pending.as_str())),
        )
        .set((
            workflow_runs::status.eq(WorkflowRunStatus::Running.as_str()),
            workflow_runs::started_at.eq(Some(started_at)),
        ))
        .execute(&mut conn)?;
        Ok(claimed == 1)
    }

    fn finish_workflow_run(
        &self,
        id: WorkflowRunId,
        status: WorkflowRunStatus,
        result: Option<Value>,
        error: Option<String>,
        completed_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let result = result.map(|value| value.to_string());
        diesel::update(workflow_runs::table.find(id.get()))
            .set((
                workflow_runs::status.eq(status.as_str()),
                workflow_runs::result.eq(result),
                workflow_runs::error.eq(error),
                workflow_runs::completed_at.eq(Some(completed_at)),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}
