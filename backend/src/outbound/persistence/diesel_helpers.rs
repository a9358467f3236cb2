//! Shared helpers for the Diesel repository adapters.
//!
//! Every adapter maps pool and Diesel failures onto its own port error type.
//! The mapping logic is identical across ports, so it is stamped out once
//! here with a declarative macro.

use tracing::debug;

/// Log a failed Diesel operation with enough context to debug it without
/// leaking SQL details into the domain error.
pub(crate) fn log_diesel_error(error: &diesel::result::Error) {
    use diesel::result::Error as DieselError;

    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(
            error_type = %std::any::type_name_of_val(other),
            "diesel operation failed"
        ),
    }
}

/// Generate `map_pool_error` and `map_diesel_error` functions for a port
/// error type that exposes `connection` and `query` constructors.
macro_rules! define_error_mapping {
    ($error:ty) => {
        /// Map pool errors to the port's error type.
        fn map_pool_error(error: $crate::outbound::persistence::pool::PoolError) -> $error {
            use $crate::outbound::persistence::pool::PoolError;

            match error {
                PoolError::Checkout { message } | PoolError::Build { message } => {
                    <$error>::connection(message)
                }
            }
        }

        /// Map Diesel errors to the port's error type.
        fn map_diesel_error(error: diesel::result::Error) -> $error {
            use diesel::result::{DatabaseErrorKind, Error as DieselError};

            $crate::outbound::persistence::diesel_helpers::log_diesel_error(&error);

            match error {
                DieselError::NotFound => <$error>::query("record not found"),
                DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                    <$error>::connection("database connection error")
                }
                DieselError::DatabaseError(_, _) => <$error>::query("database error"),
                _ => <$error>::query("database error"),
            }
        }
    };
}

pub(crate) use define_error_mapping;
