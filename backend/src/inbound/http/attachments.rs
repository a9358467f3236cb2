//! Attachment metadata HTTP handlers.
//!
//! ```text
//! POST /api/v1/attachments
//! GET  /api/v1/attachments?type=&id=
//! ```
//!
//! Only the path reference and owning entity are persisted; the binary
//! payload lives in the external file store.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{AttachmentOwner, CommentId, Error, ProjectId, TaskId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::missing_query_error;

/// Request payload for recording an attachment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentRequest {
    pub owner: AttachmentOwner,
    pub file_path: String,
}

/// Query parameters selecting the owning entity of a listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentListQuery {
    #[serde(rename = "type")]
    pub owner_type: Option<String>,
    pub id: Option<Uuid>,
}

fn owner_from_query(query: &AttachmentListQuery) -> Result<AttachmentOwner, Error> {
    let owner_type = query
        .owner_type
        .as_deref()
        .ok_or_else(|| missing_query_error("type"))?;
    let id = query.id.ok_or_else(|| missing_query_error("id"))?;
    match owner_type {
        "project" => Ok(AttachmentOwner::Project(ProjectId::from_uuid(id))),
        "task" => Ok(AttachmentOwner::Task(TaskId::from_uuid(id))),
        "comment" => Ok(AttachmentOwner::Comment(CommentId::from_uuid(id))),
        other => Err(Error::invalid_request(format!(
            "unknown attachment owner type: {other}"
        ))),
    }
}

#[post("/attachments")]
pub async fn create(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<CreateAttachmentRequest>,
) -> ApiResult<HttpResponse> {
    let attachment = state
        .attachments
        .create(identity.user(), payload.owner, &payload.file_path)
        .await?;
    Ok(HttpResponse::Created().json(attachment))
}

#[get("/attachments")]
pub async fn list(
    state: web::Data<HttpState>,
    identity: Identity,
    query: web::Query<AttachmentListQuery>,
) -> ApiResult<HttpResponse> {
    let owner = owner_from_query(&query)?;
    let attachments = state.attachments.list(identity.user(), owner).await?;
    Ok(HttpResponse::Ok().json(attachments))
}
