//! Activity feed HTTP handler.
//!
//! ```text
//! GET /api/v1/activity?project=
//! ```

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use crate::domain::ProjectId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Identity;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::missing_query_error;

/// Query parameters for the activity feed.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub project: Option<ProjectId>,
}

#[get("/activity")]
pub async fn list(
    state: web::Data<HttpState>,
    identity: Identity,
    query: web::Query<ActivityQuery>,
) -> ApiResult<HttpResponse> {
    let project = query.project.ok_or_else(|| missing_query_error("project"))?;
    let entries = state.inbox.activity(identity.user(), project).await?;
    Ok(HttpResponse::Ok().json(entries))
}
