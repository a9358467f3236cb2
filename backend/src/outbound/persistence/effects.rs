//! Persists derived side-effect rows inside a repository transaction.
//!
//! Composite writes call [`insert_side_effects`] with the transaction
//! connection so notifications, activity entries, and status history commit
//! or roll back together with the primary row.

use chrono::Utc;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::side_effects::SideEffects;

use super::models::{ActivityRow, NotificationRow, StatusChangeRow};
use super::schema::{activity_log, notifications, task_status_history};

/// Insert every derived row carried by the side-effect batch. Ids and
/// timestamps are assigned here, at the moment of persistence.
pub(crate) async fn insert_side_effects<C>(
    conn: &mut C,
    effects: &SideEffects,
) -> Result<(), diesel::result::Error>
where
    C: AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    if effects.is_empty() {
        return Ok(());
    }

    let now = Utc::now();

    let notification_rows: Vec<NotificationRow> = effects
        .notifications
        .iter()
        .map(|n| NotificationRow {
            id: Uuid::new_v4(),
            user_id: *n.user.as_uuid(),
            kind: n.kind.as_str().to_owned(),
            project_id: n.project.map(|id| *id.as_uuid()),
            task_id: n.task.map(|id| *id.as_uuid()),
            comment_id: n.comment.map(|id| *id.as_uuid()),
            message: n.message.clone(),
            is_read: false,
            created_at: now,
        })
        .collect();

    if !notification_rows.is_empty() {
        diesel::insert_into(notifications::table)
            .values(&notification_rows)
            .execute(conn)
            .await?;
    }

    let activity_rows: Vec<ActivityRow> = effects
        .activities
        .iter()
        .map(|a| ActivityRow {
            id: Uuid::new_v4(),
            project_id: *a.project.as_uuid(),
            actor_id: Some(*a.actor.as_uuid()),
            verb: a.verb.clone(),
            target_type: a.target.as_str().to_owned(),
            target_id: a.target_id,
            meta: a.meta.clone(),
            created_at: now,
        })
        .collect();

    if !activity_rows.is_empty() {
        diesel::insert_into(activity_log::table)
            .values(&activity_rows)
            .execute(conn)
            .await?;
    }

    let history_rows: Vec<StatusChangeRow> = effects
        .status_changes
        .iter()
        .map(|change| StatusChangeRow {
            id: Uuid::new_v4(),
            task_id: *change.task.as_uuid(),
            old_status: change.old_status.as_str().to_owned(),
            new_status: change.new_status.as_str().to_owned(),
            changed_by: *change.changed_by.as_uuid(),
            changed_at: now,
        })
        .collect();

    if !history_rows.is_empty() {
        diesel::insert_into(task_status_history::table)
            .values(&history_rows)
            .execute(conn)
            .await?;
    }

    Ok(())
}
