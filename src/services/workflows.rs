//! Workflow CRUD and the tag-triggered executor.
//!
//! A trigger starts every active workflow of the tenant registered for it.
//! Workflows with a delay are stored as pending runs and executed later by
//! [`process_pending_runs`]; the rest run immediately.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde_json::json;

use crate::domain::booking::Booking;
use crate::domain::contact::Contact;
use crate::domain::invoice::Invoice;
use crate::domain::tenant::Tenant;
use crate::domain::types::{TenantId, WorkflowId, WorkflowRunId};
use crate::domain::workflow::{
    ActionResult, NewWorkflow, NewWorkflowRun, Workflow, WorkflowAction, WorkflowRunStatus,
    WorkflowSubject, WorkflowTrigger,
};
use crate::dto::jobs::WorkflowJobReport;
use crate::dto::workflow::{TriggerOutcome, WorkflowDetail};
use crate::email::{OutgoingEmail, TemplateVariables, render_template};
use crate::forms::workflow::WorkflowPayload;
use crate::repository::{
    BookingReader, BookingWriter, ContactReader, ContactWriter, EmailTemplateReader,
    InvoiceReader, PackageReader, ServiceReader, TagReader, TenantReader, WebhookReader,
    WorkflowReader, WorkflowWriter,
};
use crate::services::{Notifier, ServiceError, ServiceResult};

/// Runs shown with a workflow.
const RECENT_RUNS: i64 = 10;
/// Pending runs handled per invocation of [`process_pending_runs`].
const PENDING_BATCH: i64 = 100;

/// Everything the executor reads or writes.
pub trait WorkflowStore:
    TenantReader
    + WorkflowReader
    + WorkflowWriter
    + ContactReader
    + ContactWriter
    + BookingReader
    + BookingWriter
    + InvoiceReader
    + TagReader
    + EmailTemplateReader
    + ServiceReader
    + PackageReader
    + WebhookReader
{
}

impl<T> WorkflowStore for T where
    T: TenantReader
        + WorkflowReader
        + WorkflowWriter
        + ContactReader
        + ContactWriter
        + BookingReader
        + BookingWriter
        + InvoiceReader
        + TagReader
        + EmailTemplateReader
        + ServiceReader
        + PackageReader
        + WebhookReader
        + ?Sized
{
}

/// Records a workflow acts on, reloaded for every run.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub tenant: Tenant,
    pub contact: Option<Contact>,
    pub booking: Option<Booking>,
    pub invoice: Option<Invoice>,
}

/// Name of what a booking reserves, for email variables.
pub(crate) fn booking_item_name<R>(repo: &R, booking: &Booking) -> ServiceResult<String>
where
    R: ServiceReader + PackageReader + ?Sized,
{
    if let Some(id) = booking.service_id
        && let Some(service) = repo.get_service_by_id(id, booking.tenant_id)?
    {
        return Ok(service.name.into_inner());
    }
    if let Some(id) = booking.package_id
        && let Some(package) = repo.get_package_by_id(id, booking.tenant_id)?
    {
        return Ok(package.name.into_inner());
    }
    Ok("Appointment".to_string())
}

/// Template variables describing the run's records.
pub(crate) fn template_variables<R>(
    repo: &R,
    app_url: &str,
    tenant: &Tenant,
    contact: Option<&Contact>,
    booking: Option<&Booking>,
    invoice: Option<&Invoice>,
) -> ServiceResult<TemplateVariables>
where
    R: ServiceReader + PackageReader + ?Sized,
{
    let mut variables = TemplateVariables::for_tenant(tenant);
    if let Some(contact) = contact {
        variables = variables.with_contact(contact);
    }
    if let Some(booking) = booking {
        let item = booking_item_name(repo, booking)?;
        variables = variables.with_booking(booking, &item, app_url, tenant.slug.as_str());
    }
    if let Some(invoice) = invoice {
        variables = variables.with_invoice(invoice);
    }
    Ok(variables)
}

fn load_context<R>(
    repo: &R,
    tenant_id: TenantId,
    subject: &WorkflowSubject,
) -> ServiceResult<RunContext>
where
    R: WorkflowStore + ?Sized,
{
    let tenant = repo
        .get_tenant_by_id(tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;
    let booking = match subject.booking_id {
        Some(id) => repo.get_booking_by_id(id, tenant_id)?,
        None => None,
    };
    let invoice = match subject.invoice_id {
        Some(id) => repo.get_invoice_by_id(id, tenant_id)?,
        None => None,
    };
    let contact_id = subject
        .contact_id
        .or(booking.as_ref().map(|b| b.contact_id))
        .or(invoice.as_ref().and_then(|i| i.contact_id));
    let contact = match contact_id {
        Some(id) => repo.get_contact_by_id(id, tenant_id)?,
        None => None,
    };
    Ok(RunContext {
        tenant,
        contact,
        booking,
        invoice,
    })
}

/// Executes one action. Missing inputs produce a failed [`ActionResult`];
/// storage failures are errors and fail the whole run.
pub fn execute_action<R>(
    repo: &R,
    notifier: &Notifier,
    workflow: &Workflow,
    context: &mut RunContext,
    action: &WorkflowAction,
) -> ServiceResult<ActionResult>
where
    R: WorkflowStore + ?Sized,
{
    let kind = action.kind();
    let tenant_id = context.tenant.id;
    let result = match action {
        WorkflowAction::SendEmail { template_id } => {
            let (Some(template_id), Some(contact)) = (template_id, context.contact.as_ref())
            else {
                return Ok(ActionResult::failed(kind, "Missing template or contact email"));
            };
            let Some(template) = repo.get_email_template_by_id(*template_id, tenant_id)? else {
                return Ok(ActionResult::failed(kind, "Email template not found"));
            };
            let variables = template_variables(
                repo,
                &notifier.app_url,
                &context.tenant,
                Some(contact),
                context.booking.as_ref(),
                context.invoice.as_ref(),
            )?;
            match render_template(&template.subject, &template.body, &variables) {
                Ok(rendered) => {
                    let to = contact.email.to_string();
                    if notifier.send_email(OutgoingEmail {
                        to: to.clone(),
                        subject: rendered.subject,
                        html: rendered.html,
                    }) {
                        ActionResult::ok_with(kind, format!("Email sent to {to}"))
                    } else {
                        ActionResult::failed(kind, "Email could not be queued")
                    }
                }
                Err(e) => ActionResult::failed(kind, format!("Template error: {e}")),
            }
        }
        WorkflowAction::SendNotification { subject, message } => {
            let subject = subject
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Workflow \"{}\" ran", workflow.name));
            let message = message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("You have a new notification");
            let variables = template_variables(
                repo,
                &notifier.app_url,
                &context.tenant,
                context.contact.as_ref(),
                context.booking.as_ref(),
                context.invoice.as_ref(),
            )?;
            match render_template(&subject, &format!("<p>{message}</p>"), &variables) {
                Ok(rendered) => {
                    if notifier.send_email(OutgoingEmail {
                        to: context.tenant.email.clone(),
                        subject: rendered.subject,
                        html: rendered.html,
                    }) {
                        ActionResult::ok_with(kind, "Notification sent")
                    } else {
                        ActionResult::failed(kind, "Notification could not be queued")
                    }
                }
                Err(e) => ActionResult::failed(kind, format!("Template error: {e}")),
            }
        }
        WorkflowAction::AddTag { tag_id } | WorkflowAction::RemoveTag { tag_id } => {
            let (Some(tag_id), Some(contact)) = (tag_id, context.contact.as_ref()) else {
                return Ok(ActionResult::failed(kind, "Missing tag or contact"));
            };
            if repo.get_tag_by_id(*tag_id, tenant_id)?.is_none() {
                return Ok(ActionResult::failed(kind, "Tag not found"));
            }
            if matches!(action, WorkflowAction::AddTag { .. }) {
                if repo.add_contact_tag(contact.id, *tag_id)? {
                    ActionResult::ok(kind)
                } else {
                    ActionResult::ok_with(kind, "Tag already exists on contact")
                }
            } else if repo.remove_contact_tag(contact.id, *tag_id)? {
                ActionResult::ok(kind)
            } else {
                ActionResult::ok_with(kind, "Tag was not on contact")
            }
        }
        WorkflowAction::UpdateStatus { status } => {
            let (Some(status), Some(booking)) = (status, context.booking.as_ref()) else {
                return Ok(ActionResult::failed(kind, "Missing status or booking"));
            };
            if !booking.status.can_transition_to(*status) {
                return Ok(ActionResult::failed(
                    kind,
                    format!("Cannot change booking from {} to {status}", booking.status),
                ));
            }
            let updated = repo.update_booking_status(booking.id, tenant_id, *status)?;
            context.booking = Some(updated);
            ActionResult::ok_with(kind, format!("Booking status set to {status}"))
        }
        WorkflowAction::Wait => ActionResult::ok_with(kind, "Delay already scheduled"),
    };
    Ok(result)
}

/// Runs every action of `workflow` for an already recorded run and stores
/// the outcome.
fn run_workflow<R>(
    repo: &R,
    notifier: &Notifier,
    workflow: &Workflow,
    run_id: WorkflowRunId,
    subject: &WorkflowSubject,
    now: NaiveDateTime,
) -> WorkflowRunStatus
where
    R: WorkflowStore + ?Sized,
{
    let outcome = load_context(repo, workflow.tenant_id, subject).and_then(|mut context| {
        workflow
            .actions
            .iter()
            .map(|action| {
                let result = execute_action(repo, notifier, workflow, &mut context, action)?;
                if !result.success {
                    log::info!(
                        "Workflow {} action {} failed: {}",
                        workflow.id,
                        result.action,
                        result.error.as_deref().unwrap_or_default()
                    );
                }
                Ok(result)
            })
            .collect::<ServiceResult<Vec<_>>>()
    });

    let (status, result, error) = match outcome {
        Ok(results) => (WorkflowRunStatus::Completed, Some(json!(results)), None),
        Err(e) => {
            log::error!("Workflow {} run {run_id} failed: {e}", workflow.id);
            (WorkflowRunStatus::Failed, None, Some(e.to_string()))
        }
    };
    if let Err(e) = repo.finish_workflow_run(run_id, status, result, error, now) {
        log::error!("Failed to record outcome of workflow run {run_id}: {e}");
    }
    status
}

/// Starts the tenant's workflows registered for `trigger`. Never fails; each
/// problem is logged and the remaining workflows still run.
pub fn trigger_workflows<R>(
    repo: &R,
    notifier: &Notifier,
    tenant_id: TenantId,
    trigger: WorkflowTrigger,
    subject: WorkflowSubject,
    now: NaiveDateTime,
) -> TriggerOutcome
where
    R: WorkflowStore + ?Sized,
{
    let workflows = match repo.list_active_workflows(tenant_id, trigger) {
        Ok(workflows) => workflows,
        Err(e) => {
            log::error!("Failed to load workflows for {trigger}: {e}");
            return TriggerOutcome::default();
        }
    };

    let mut outcome = TriggerOutcome::default();
    for workflow in workflows {
        if trigger.is_tag_trigger() && !workflow.matches_tag(subject.tag_id) {
            continue;
        }
        let delayed = workflow.delay_minutes > 0;
        let new_run = NewWorkflowRun {
            workflow_id: workflow.id,
            tenant_id,
            subject,
            status: if delayed {
                WorkflowRunStatus::Pending
            } else {
                WorkflowRunStatus::Running
            },
            run_at: now + Duration::minutes(i64::from(workflow.delay_minutes)),
            started_at: (!delayed).then_some(now),
        };
        let run = match repo.create_workflow_run(&new_run) {
            Ok(run) => run,
            Err(e) => {
                log::error!("Failed to record run of workflow {}: {e}", workflow.id);
                continue;
            }
        };
        if delayed {
            outcome.scheduled += 1;
        } else {
            run_workflow(repo, notifier, &workflow, run.id, &subject, now);
            outcome.executed += 1;
        }
    }
    outcome
}

/// Marks a claimed run as failed without executing it.
fn fail_claimed_run<R>(
    repo: &R,
    run_id: WorkflowRunId,
    reason: String,
    now: NaiveDateTime,
) -> WorkflowRunStatus
where
    R: WorkflowStore + ?Sized,
{
    if let Err(e) =
        repo.finish_workflow_run(run_id, WorkflowRunStatus::Failed, None, Some(reason), now)
    {
        log::error!("Failed to record outcome of workflow run {run_id}: {e}");
    }
    WorkflowRunStatus::Failed
}

/// Executes delayed runs that are due. Each run is claimed before it is
/// executed, so concurrent invocations never run it twice. A run that cannot
/// be executed is finished as failed and the batch carries on.
///
/// Run times are UTC.
pub fn process_pending_runs<R>(
    repo: &R,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> ServiceResult<WorkflowJobReport>
where
    R: WorkflowStore + ?Sized,
{
    let now = now.naive_utc();
    let runs = repo.list_due_workflow_runs(now, PENDING_BATCH)?;
    let mut report = WorkflowJobReport::default();

    for run in runs {
        match repo.claim_workflow_run(run.id, now) {
            Ok(true) => {}
            Ok(false) => {
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                log::error!("Failed to claim workflow run {}: {e}", run.id);
                report.skipped += 1;
                continue;
            }
        }
        report.processed += 1;

        let status = match repo.get_workflow_by_id(run.workflow_id, run.tenant_id) {
            Ok(Some(workflow)) if workflow.active => {
                run_workflow(repo, notifier, &workflow, run.id, &run.subject, now)
            }
            Ok(Some(_)) => fail_claimed_run(repo, run.id, "Workflow is inactive".to_string(), now),
            Ok(None) => {
                fail_claimed_run(repo, run.id, "Workflow no longer exists".to_string(), now)
            }
            Err(e) => {
                log::error!("Failed to load workflow {} for run {}: {e}", run.workflow_id, run.id);
                fail_claimed_run(repo, run.id, format!("Failed to load workflow: {e}"), now)
            }
        };
        match status {
            WorkflowRunStatus::Completed => report.completed += 1,
            _ => report.failed += 1,
        }
    }

    if report.processed > 0 || report.skipped > 0 {
        log::info!(
            "Processed {} workflow runs ({} completed, {} failed, {} skipped)",
            report.processed,
            report.completed,
            report.failed,
            report.skipped
        );
    }
    Ok(report)
}

pub fn list_workflows<R>(repo: &R, tenant_id: TenantId) -> ServiceResult<Vec<Workflow>>
where
    R: WorkflowReader + ?Sized,
{
    Ok(repo.list_workflows(tenant_id)?)
}

pub fn get_workflow<R>(
    repo: &R,
    tenant_id: TenantId,
    id: WorkflowId,
) -> ServiceResult<WorkflowDetail>
where
    R: WorkflowReader + ?Sized,
{
    let workflow = repo
        .get_workflow_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Workflow"))?;
    let recent_runs = repo.list_workflow_runs(workflow.id, RECENT_RUNS)?;
    Ok(WorkflowDetail {
        workflow,
        recent_runs,
    })
}

fn validated<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: WorkflowPayload,
) -> ServiceResult<NewWorkflow>
where
    R: TagReader + EmailTemplateReader + ?Sized,
{
    let workflow = payload.into_domain(tenant_id)?;
    if let Some(tag_id) = workflow.trigger_tag_id
        && repo.get_tag_by_id(tag_id, tenant_id)?.is_none()
    {
        return Err(ServiceError::Validation("Invalid tag selected".to_string()));
    }
    for action in &workflow.actions {
        match action {
            WorkflowAction::AddTag { tag_id: Some(id) }
            | WorkflowAction::RemoveTag { tag_id: Some(id) } => {
                if repo.get_tag_by_id(*id, tenant_id)?.is_none() {
                    return Err(ServiceError::Validation(format!(
                        "Tag {id} used by {} does not exist",
                        action.kind()
                    )));
                }
            }
            WorkflowAction::SendEmail {
                template_id: Some(id),
            } => {
                if repo.get_email_template_by_id(*id, tenant_id)?.is_none() {
                    return Err(ServiceError::Validation(format!(
                        "Email template {id} does not exist"
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(workflow)
}

pub fn create_workflow<R>(
    repo: &R,
    tenant_id: TenantId,
    payload: WorkflowPayload,
) -> ServiceResult<Workflow>
where
    R: WorkflowWriter + TagReader + EmailTemplateReader + ?Sized,
{
    let workflow = validated(repo, tenant_id, payload)?;
    repo.create_workflow(&workflow).map_err(|err| {
        log::error!("Failed to create workflow: {err}");
        err.into()
    })
}

pub fn update_workflow<R>(
    repo: &R,
    tenant_id: TenantId,
    id: WorkflowId,
    payload: WorkflowPayload,
) -> ServiceResult<Workflow>
where
    R: WorkflowReader + WorkflowWriter + TagReader + EmailTemplateReader + ?Sized,
{
    repo.get_workflow_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Workflow"))?;
    let updates = validated(repo, tenant_id, payload)?;
    Ok(repo.update_workflow(id, tenant_id, &updates)?)
}

pub fn delete_workflow<R>(repo: &R, tenant_id: TenantId, id: WorkflowId) -> ServiceResult<()>
where
    R: WorkflowReader + WorkflowWriter + ?Sized,
{
    repo.get_workflow_by_id(id, tenant_id)?
        .ok_or_else(|| ServiceError::not_found("Workflow"))?;
    Ok(repo.delete_workflow(id, tenant_id)?)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::booking::BookingStatus;
    use crate::domain::email_template::EmailTemplate;
    use crate::domain::types::{
        BookingId, ContactId, EmailTemplateId, TagId, TemplateText, WorkflowRunId,
    };
    use crate::domain::workflow::WorkflowRun;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::fixtures::{self, clock, now};

    fn workflow(trigger: WorkflowTrigger, delay: i32, actions: Vec<WorkflowAction>) -> Workflow {
        Workflow {
            id: WorkflowId::new(1).unwrap(),
            tenant_id: fixtures::tenant_id(),
            name: "Welcome".to_string(),
            description: None,
            trigger_type: trigger,
            trigger_tag_id: None,
            delay_minutes: delay,
            actions,
            active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn run(id: i32, subject: WorkflowSubject) -> WorkflowRun {
        WorkflowRun {
            id: WorkflowRunId::new(id).unwrap(),
            workflow_id: WorkflowId::new(1).unwrap(),
            tenant_id: fixtures::tenant_id(),
            subject,
            status: WorkflowRunStatus::Pending,
            run_at: now(),
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now(),
        }
    }

    fn context(contact: bool, booking: Option<Booking>) -> RunContext {
        RunContext {
            tenant: fixtures::tenant(),
            contact: contact.then(|| fixtures::contact(1)),
            booking,
            invoice: None,
        }
    }

    fn contact_subject() -> WorkflowSubject {
        WorkflowSubject {
            contact_id: Some(ContactId::new(1).unwrap()),
            ..WorkflowSubject::default()
        }
    }

    #[test]
    fn add_tag_is_idempotent() {
        let mut repo = MockRepository::new();
        repo.expect_get_tag_by_id()
            .returning(|_, _| Ok(Some(fixtures::tag(7, "VIP"))));
        repo.expect_add_contact_tag().returning(|_, _| Ok(false));
        let test = fixtures::notifier();
        let action = WorkflowAction::AddTag {
            tag_id: Some(TagId::new(7).unwrap()),
        };

        let result = execute_action(
            &repo,
            &test.notifier,
            &workflow(WorkflowTrigger::LeadCreated, 0, vec![]),
            &mut context(true, None),
            &action,
        )
        .unwrap();

        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Tag already exists on contact"));
    }

    #[test]
    fn missing_inputs_fail_the_action_not_the_run() {
        let repo = MockRepository::new();
        let test = fixtures::notifier();
        let wf = workflow(WorkflowTrigger::LeadCreated, 0, vec![]);

        for action in [
            WorkflowAction::SendEmail { template_id: None },
            WorkflowAction::AddTag {
                tag_id: Some(TagId::new(1).unwrap()),
            },
            WorkflowAction::UpdateStatus {
                status: Some(BookingStatus::Confirmed),
            },
        ] {
            let result =
                execute_action(&repo, &test.notifier, &wf, &mut context(false, None), &action)
                    .unwrap();
            assert!(!result.success, "{} should fail", action.kind());
        }
    }

    #[test]
    fn update_status_respects_transitions() {
        let mut repo = MockRepository::new();
        repo.expect_update_booking_status().times(0);
        let test = fixtures::notifier();
        let booking = fixtures::booking(1, fixtures::at(5, 9, 0), BookingStatus::Completed);

        let result = execute_action(
            &repo,
            &test.notifier,
            &workflow(WorkflowTrigger::BookingCompleted, 0, vec![]),
            &mut context(true, Some(booking)),
            &WorkflowAction::UpdateStatus {
                status: Some(BookingStatus::Confirmed),
            },
        )
        .unwrap();
        assert!(!result.success);
    }

    #[test]
    fn send_email_renders_the_tenant_template() {
        let mut repo = MockRepository::new();
        repo.expect_get_email_template_by_id().returning(|id, tenant_id| {
            Ok(Some(EmailTemplate {
                id,
                tenant_id,
                name: TemplateText::new("Welcome").unwrap(),
                subject: TemplateText::new("Hi {{ client.first_name }}").unwrap(),
                body: TemplateText::new("<p>Welcome to {{ business.name }}</p>").unwrap(),
                created_at: now(),
                updated_at: now(),
            }))
        });
        let test = fixtures::notifier();

        let result = execute_action(
            &repo,
            &test.notifier,
            &workflow(WorkflowTrigger::LeadCreated, 0, vec![]),
            &mut context(true, None),
            &WorkflowAction::SendEmail {
                template_id: Some(EmailTemplateId::new(3).unwrap()),
            },
        )
        .unwrap();

        assert!(result.success);
        let sent = test.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada1@example.com");
        assert_eq!(sent[0].subject, "Hi Ada");
        assert_eq!(sent[0].html, "<p>Welcome to Bright Smile</p>");
    }

    #[test]
    fn delayed_workflows_are_scheduled_and_immediate_ones_run() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_workflows().returning(|_, trigger| {
            let mut delayed = workflow(trigger, 60, vec![WorkflowAction::Wait]);
            delayed.id = WorkflowId::new(2).unwrap();
            Ok(vec![workflow(trigger, 0, vec![WorkflowAction::Wait]), delayed])
        });
        repo.expect_create_workflow_run()
            .withf(|r| {
                (r.status == WorkflowRunStatus::Running && r.run_at == now())
                    || (r.status == WorkflowRunStatus::Pending
                        && r.run_at == now() + Duration::minutes(60)
                        && r.started_at.is_none())
            })
            .times(2)
            .returning(|r| Ok(run(1, r.subject)));
        repo.expect_get_tenant_by_id()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_contact_by_id()
            .returning(|_, _| Ok(Some(fixtures::contact(1))));
        repo.expect_finish_workflow_run()
            .withf(|_, status, result, error, _| {
                *status == WorkflowRunStatus::Completed && result.is_some() && error.is_none()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        let test = fixtures::notifier();

        let outcome = trigger_workflows(
            &repo,
            &test.notifier,
            fixtures::tenant_id(),
            WorkflowTrigger::LeadCreated,
            contact_subject(),
            now(),
        );

        assert_eq!(outcome, TriggerOutcome { executed: 1, scheduled: 1 });
    }

    #[test]
    fn tag_triggers_only_start_matching_workflows() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_workflows().returning(|_, trigger| {
            let mut other = workflow(trigger, 5, vec![WorkflowAction::Wait]);
            other.trigger_tag_id = Some(TagId::new(99).unwrap());
            let mut matching = workflow(trigger, 5, vec![WorkflowAction::Wait]);
            matching.trigger_tag_id = Some(TagId::new(7).unwrap());
            Ok(vec![other, matching])
        });
        repo.expect_create_workflow_run()
            .times(1)
            .returning(|r| Ok(run(1, r.subject)));
        let test = fixtures::notifier();

        let outcome = trigger_workflows(
            &repo,
            &test.notifier,
            fixtures::tenant_id(),
            WorkflowTrigger::TagAdded,
            WorkflowSubject {
                tag_id: Some(TagId::new(7).unwrap()),
                ..contact_subject()
            },
            now(),
        );
        assert_eq!(outcome.scheduled, 1);
    }

    #[test]
    fn claimed_runs_are_skipped_and_storage_errors_fail_runs() {
        let mut repo = MockRepository::new();
        repo.expect_list_due_workflow_runs().returning(|_, _| {
            let subject = WorkflowSubject {
                booking_id: Some(BookingId::new(4).unwrap()),
                ..WorkflowSubject::default()
            };
            Ok(vec![run(1, subject), run(2, subject)])
        });
        repo.expect_claim_workflow_run()
            .returning(|id, _| Ok(id.get() == 2));
        repo.expect_get_workflow_by_id().returning(|_, _| {
            Ok(Some(workflow(
                WorkflowTrigger::BookingCreated,
                10,
                vec![WorkflowAction::Wait],
            )))
        });
        repo.expect_get_tenant_by_id()
            .returning(|_| Ok(Some(fixtures::tenant())));
        repo.expect_get_booking_by_id()
            .returning(|_, _| Err(RepositoryError::ConnectionError("down".to_string())));
        repo.expect_finish_workflow_run()
            .withf(|id, status, _, error, _| {
                id.get() == 2 && *status == WorkflowRunStatus::Failed && error.is_some()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        let test = fixtures::notifier();

        let report = process_pending_runs(&repo, &test.notifier, clock()).unwrap();
        assert_eq!(
            report,
            WorkflowJobReport {
                processed: 1,
                completed: 0,
                failed: 1,
                skipped: 1,
            }
        );
    }

    #[test]
    fn inactive_workflows_fail_their_pending_runs() {
        let mut repo = MockRepository::new();
        repo.expect_list_due_workflow_runs()
            .returning(|_, _| Ok(vec![run(1, contact_subject())]));
        repo.expect_claim_workflow_run().returning(|_, _| Ok(true));
        repo.expect_get_workflow_by_id().returning(|_, _| {
            let mut wf = workflow(WorkflowTrigger::LeadCreated, 10, vec![]);
            wf.active = false;
            Ok(Some(wf))
        });
        repo.expect_finish_workflow_run()
            .withf(|_, status, _, error, _| {
                *status == WorkflowRunStatus::Failed
                    && error.as_deref() == Some("Workflow is inactive")
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        let test = fixtures::notifier();

        let report = process_pending_runs(&repo, &test.notifier, clock()).unwrap();
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn workflow_lookup_failure_fails_the_run_and_keeps_going() {
        let mut repo = MockRepository::new();
        repo.expect_list_due_workflow_runs()
            .returning(|_, _| Ok(vec![run(1, contact_subject()), run(2, contact_subject())]));
        repo.expect_claim_workflow_run().returning(|_, _| Ok(true));
        repo.expect_get_workflow_by_id().returning(|_, _| {
            Err(RepositoryError::ConnectionError("pool timed out".to_string()))
        });
        repo.expect_finish_workflow_run()
            .withf(|_, status, _, error, _| {
                *status == WorkflowRunStatus::Failed
                    && error
                        .as_deref()
                        .is_some_and(|e| e.starts_with("Failed to load workflow"))
            })
            .times(2)
            .returning(|_, _, _, _, _| Ok(()));
        let test = fixtures::notifier();

        let report = process_pending_runs(&repo, &test.notifier, clock()).unwrap();
        assert_eq!(
            report,
            WorkflowJobReport {
                processed: 2,
                completed: 0,
                failed: 2,
                skipped: 0,
            }
        );
    }

    #[test]
    fn creating_with_unknown_trigger_tag_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_tag_by_id().returning(|_, _| Ok(None));
        repo.expect_create_workflow().times(0);
        let payload: WorkflowPayload = serde_json::from_value(json!({
            "name": "Tagged",
            "trigger_type": "tag_added",
            "trigger_tag_id": 5,
            "actions": [{"type": "wait"}]
        }))
        .unwrap();

        let result = create_workflow(&repo, fixtures::tenant_id(), payload);
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
