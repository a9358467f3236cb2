//! Comment HTTP handlers.
//!
//! ```text
//! POST   /api/v1/comments
//! GET    /api/v1/comments?project=&task=
//! GET    /api/v1/comments/{id}
//! DELETE /api/v1/comments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{CommentId, NewComment, ProjectId, TaskId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;

/// Request payload for posting a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub project: ProjectId,
    pub task: Option<TaskId>,
    pub parent: Option<CommentId>,
    pub body: String,
}

/// Query parameters for comment listings.
#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub project: Option<ProjectId>,
    pub task: Option<TaskId>,
}

#[post("/comments")]
pub async fn create(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let comment = state
        .comments
        .create(
            identity.user(),
            NewComment {
                project: payload.project,
                task: payload.task,
                parent: payload.parent,
                body: payload.body,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[get("/comments")]
pub async fn list(
    state: web::Data<HttpState>,
    identity: Identity,
    query: web::Query<CommentListQuery>,
) -> ApiResult<HttpResponse> {
    let comments = state
        .comments
        .list(identity.user(), query.project, query.task)
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[get("/comments/{id}")]
pub async fn get_one(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let comment = state
        .comments
        .get(identity.user(), CommentId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[delete("/comments/{id}")]
pub async fn remove(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .comments
        .delete(identity.user(), CommentId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
