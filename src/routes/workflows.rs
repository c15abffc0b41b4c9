use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::auth::TenantContext;
use crate::domain::types::WorkflowId;
use crate::dto::Success;
use crate::forms::workflow::WorkflowPayload;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, workflows};

#[get("/workflows")]
pub async fn list_workflows(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let workflows = workflows::list_workflows(repo.get_ref(), ctx.tenant.id)?;
    Ok(HttpResponse::Ok().json(workflows))
}

#[post("/workflows")]
pub async fn create_workflow(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<WorkflowPayload>,
) -> Result<HttpResponse, ServiceError> {
    let workflow = workflows::create_workflow(repo.get_ref(), ctx.tenant.id, payload)?;
    Ok(HttpResponse::Created().json(workflow))
}

#[get("/workflows/{id}")]
pub async fn show_workflow(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = WorkflowId::new(id.into_inner())?;
    let workflow = workflows::get_workflow(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(workflow))
}

#[put("/workflows/{id}")]
pub async fn update_workflow(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    web::Json(payload): web::Json<WorkflowPayload>,
) -> Result<HttpResponse, ServiceError> {
    let id = WorkflowId::new(id.into_inner())?;
    let workflow = workflows::update_workflow(repo.get_ref(), ctx.tenant.id, id, payload)?;
    Ok(HttpResponse::Ok().json(workflow))
}

#[delete("/workflows/{id}")]
pub async fn delete_workflow(
    ctx: TenantContext,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let id = WorkflowId::new(id.into_inner())?;
    workflows::delete_workflow(repo.get_ref(), ctx.tenant.id, id)?;
    Ok(HttpResponse::Ok().json(Success::OK))
}
