//! Strongly typed entity identifiers.
//!
//! Every entity is referenced by a UUID v4 wrapped in its own newtype so a
//! task id can never be passed where a project id is expected. The wrappers
//! serialise as plain UUID strings.

use std::fmt;

use uuid::Uuid;

macro_rules! define_entity_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_entity_id! {
    /// Stable user identifier.
    UserId
}

define_entity_id! {
    /// Stable project identifier.
    ProjectId
}

define_entity_id! {
    /// Stable task identifier.
    TaskId
}

define_entity_id! {
    /// Stable comment identifier.
    CommentId
}

define_entity_id! {
    /// Stable notification identifier.
    NotificationId
}

define_entity_id! {
    /// Stable activity log identifier.
    ActivityId
}

define_entity_id! {
    /// Stable attachment identifier.
    AttachmentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialise_as_plain_uuid_strings() {
        let id = ProjectId::random();
        let value = serde_json::to_value(id).expect("serialise");
        assert_eq!(value, serde_json::json!(id.to_string()));
    }

    #[test]
    fn ids_parse_from_canonical_form() {
        let id = TaskId::random();
        let parsed: TaskId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }
}
