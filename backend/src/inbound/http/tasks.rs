//! Task HTTP handlers.
//!
//! ```text
//! POST   /api/v1/tasks
//! GET    /api/v1/tasks?project=&status=
//! GET    /api/v1/tasks/workload?project=
//! GET    /api/v1/tasks/{id}
//! PUT    /api/v1/tasks/{id}
//! DELETE /api/v1/tasks/{id}
//! POST   /api/v1/tasks/{id}/watch
//! GET    /api/v1/tasks/{id}/history
//! ```
//!
//! `/tasks/workload` must be registered before `/tasks/{id}` so the literal
//! segment wins the route match.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{NewTask, ProjectId, TaskChanges, TaskId, TaskPriority, TaskStatus, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{double_option, missing_query_error};

/// Request payload for creating a task.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub project: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub order: Option<f64>,
}

/// Request payload for updating a task. Absent fields stay untouched; the
/// nullable fields accept an explicit `null` to clear the value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee: Option<Option<UserId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub order: Option<f64>,
}

/// Query parameters for task listings.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
}

/// Query parameters for the workload summary.
#[derive(Debug, Deserialize)]
pub struct WorkloadQuery {
    pub project: Option<ProjectId>,
}

#[post("/tasks")]
pub async fn create(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<CreateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let task = state
        .tasks
        .create(
            identity.user(),
            NewTask {
                project: payload.project,
                title: payload.title,
                description: payload.description,
                status: payload.status,
                priority: payload.priority,
                assignee: payload.assignee,
                due_date: payload.due_date,
                order: payload.order,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/tasks")]
pub async fn list(
    state: web::Data<HttpState>,
    identity: Identity,
    query: web::Query<TaskListQuery>,
) -> ApiResult<HttpResponse> {
    let tasks = state
        .tasks
        .list(identity.user(), query.project, query.status)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/tasks/workload")]
pub async fn workload(
    state: web::Data<HttpState>,
    identity: Identity,
    query: web::Query<WorkloadQuery>,
) -> ApiResult<HttpResponse> {
    let project = query.project.ok_or_else(|| missing_query_error("project"))?;
    let entries = state.tasks.workload(identity.user(), project).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/tasks/{id}")]
pub async fn get_one(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let task = state
        .tasks
        .get(identity.user(), TaskId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[put("/tasks/{id}")]
pub async fn update(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let changes = TaskChanges {
        title: payload.title,
        description: payload.description,
        status: payload.status,
        priority: payload.priority,
        assignee: payload.assignee,
        due_date: payload.due_date,
        order: payload.order,
    };
    let task = state
        .tasks
        .update(identity.user(), TaskId::from_uuid(path.into_inner()), changes)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/tasks/{id}")]
pub async fn remove(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .tasks
        .delete(identity.user(), TaskId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[post("/tasks/{id}/watch")]
pub async fn watch(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .tasks
        .watch(identity.user(), TaskId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[get("/tasks/{id}/history")]
pub async fn history(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let history = state
        .tasks
        .status_history(identity.user(), TaskId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(history))
}
