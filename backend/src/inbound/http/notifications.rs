//! Notification inbox HTTP handlers.
//!
//! ```text
//! GET  /api/v1/notifications
//! POST /api/v1/notifications/mark-all-read
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;

#[get("/notifications")]
pub async fn list(state: web::Data<HttpState>, identity: Identity) -> ApiResult<HttpResponse> {
    let notifications = state.inbox.notifications(identity.user()).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

#[post("/notifications/mark-all-read")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    identity: Identity,
) -> ApiResult<HttpResponse> {
    let updated = state.inbox.mark_all_read(identity.user()).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}
