//! Small helpers shared by the HTTP request DTOs.

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::Error;

/// Distinguish an absent field from an explicit `null` in PATCH-style
/// bodies: the outer `Option` is `None` when the field is missing and
/// `Some(None)` when the client sent `null` to clear the value.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Error for a mandatory query parameter the client did not supply.
pub fn missing_query_error(name: &str) -> Error {
    Error::invalid_request(format!("query parameter '{name}' is required"))
        .with_details(json!({ "param": name }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "double_option")]
        value: Option<Option<u32>>,
    }

    #[test]
    fn absent_field_stays_untouched() {
        let body: Body = serde_json::from_str("{}").expect("parse");
        assert_eq!(body.value, None);
    }

    #[test]
    fn explicit_null_clears_the_value() {
        let body: Body = serde_json::from_str(r#"{"value":null}"#).expect("parse");
        assert_eq!(body.value, Some(None));
    }

    #[test]
    fn present_field_sets_the_value() {
        let body: Body = serde_json::from_str(r#"{"value":7}"#).expect("parse");
        assert_eq!(body.value, Some(Some(7)));
    }
}
