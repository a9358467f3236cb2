//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.
//! Regenerate with `diesel print-schema` after changing migrations.

diesel::table! {
    /// Registered users. Identity (credentials, registration) lives in the
    /// external identity service; this table mirrors the profile fields the
    /// collaboration domain needs.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        full_name -> Varchar,
        avatar_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Collaboration projects.
    projects (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        owner_id -> Uuid,
        is_archived -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership roll: one row per (project, user) pair.
    project_memberships (project_id, user_id) {
        project_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks. `ordering` carries the manual kanban rank; `order` is a
    /// reserved word in SQL.
    tasks (id) {
        id -> Uuid,
        project_id -> Uuid,
        title -> Varchar,
        description -> Text,
        status -> Varchar,
        priority -> Varchar,
        assignee_id -> Nullable<Uuid>,
        reporter_id -> Uuid,
        due_date -> Nullable<Date>,
        ordering -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Watch subscriptions: one row per (task, user) pair.
    task_watchers (task_id, user_id) {
        task_id -> Uuid,
        user_id -> Uuid,
    }
}

diesel::table! {
    /// Append-only status transition log.
    task_status_history (id) {
        id -> Uuid,
        task_id -> Uuid,
        old_status -> Varchar,
        new_status -> Varchar,
        changed_by -> Uuid,
        changed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Threaded comments on projects and tasks.
    comments (id) {
        id -> Uuid,
        project_id -> Uuid,
        task_id -> Nullable<Uuid>,
        author_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        body -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user notification inbox.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        project_id -> Nullable<Uuid>,
        task_id -> Nullable<Uuid>,
        comment_id -> Nullable<Uuid>,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only per-project audit feed.
    activity_log (id) {
        id -> Uuid,
        project_id -> Uuid,
        actor_id -> Nullable<Uuid>,
        verb -> Varchar,
        target_type -> Varchar,
        target_id -> Uuid,
        meta -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Attachment metadata; binary payloads live in the external file store.
    attachments (id) {
        id -> Uuid,
        file_path -> Varchar,
        uploaded_by -> Uuid,
        owner_type -> Varchar,
        owner_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (owner_id));
diesel::joinable!(project_memberships -> projects (project_id));
diesel::joinable!(project_memberships -> users (user_id));
diesel::joinable!(tasks -> projects (project_id));
diesel::joinable!(task_watchers -> tasks (task_id));
diesel::joinable!(task_watchers -> users (user_id));
diesel::joinable!(task_status_history -> tasks (task_id));
diesel::joinable!(comments -> projects (project_id));
diesel::joinable!(comments -> tasks (task_id));
diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(activity_log -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    project_memberships,
    tasks,
    task_watchers,
    task_status_history,
    comments,
    notifications,
    activity_log,
    attachments,
);
