//! Project HTTP handlers.
//!
//! ```text
//! POST   /api/v1/projects
//! GET    /api/v1/projects
//! GET    /api/v1/projects/{id}
//! PUT    /api/v1/projects/{id}
//! DELETE /api/v1/projects/{id}
//! POST   /api/v1/projects/{id}/add-member
//! GET    /api/v1/projects/{id}/members
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{MemberRole, ProjectChanges, ProjectId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;

/// Request payload for creating a project.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Request payload for updating a project. Absent fields stay untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_archived: Option<bool>,
}

/// Request payload for adding a member; defaults to the member role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: UserId,
    pub role: Option<MemberRole>,
}

#[post("/projects")]
pub async fn create(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let project = state
        .projects
        .create(identity.user(), &payload.name, &payload.description)
        .await?;
    Ok(HttpResponse::Created().json(project))
}

#[get("/projects")]
pub async fn list(state: web::Data<HttpState>, identity: Identity) -> ApiResult<HttpResponse> {
    let projects = state.projects.list(identity.user()).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[get("/projects/{id}")]
pub async fn get_one(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let project = state
        .projects
        .get(identity.user(), ProjectId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[put("/projects/{id}")]
pub async fn update(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let changes = ProjectChanges {
        name: payload.name,
        description: payload.description,
        is_archived: payload.is_archived,
    };
    let project = state
        .projects
        .update(
            identity.user(),
            ProjectId::from_uuid(path.into_inner()),
            changes,
        )
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[delete("/projects/{id}")]
pub async fn remove(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .projects
        .delete(identity.user(), ProjectId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[post("/projects/{id}/add-member")]
pub async fn add_member(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
    payload: web::Json<AddMemberRequest>,
) -> ApiResult<HttpResponse> {
    let membership = state
        .projects
        .add_member(
            identity.user(),
            ProjectId::from_uuid(path.into_inner()),
            payload.user_id,
            payload.role.unwrap_or(MemberRole::Member),
        )
        .await?;
    Ok(HttpResponse::Ok().json(membership))
}

#[get("/projects/{id}/members")]
pub async fn members(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let members = state
        .projects
        .members(identity.user(), ProjectId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(members))
}
