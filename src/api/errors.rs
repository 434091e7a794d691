//! Backend error types

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in. Run 'posadmin login' first")]
    MissingCredential,

    #[error("Backend error (status {status_code}): {message}")]
    Status {
        status_code: u16,
        message: String,
    },

    #[error("Validation failed (status {status_code}): {message}")]
    Validation {
        status_code: u16,
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Failed to parse backend response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record without an id in response from {0}")]
    MissingId(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Build an error from a non-success response body.
    ///
    /// Laravel answers validation failures either with top-level field arrays
    /// (`{"name": ["..."]}`) or nested under `errors`; both are collected.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Map<String, Value>> = serde_json::from_str(body).ok();

        let Some(object) = parsed else {
            let message = if body.trim().is_empty() {
                format!("HTTP {}", status_code)
            } else {
                body.trim().to_string()
            };
            return ApiError::Status { status_code, message };
        };

        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status_code));

        let mut fields = BTreeMap::new();
        collect_field_errors(&object, &mut fields);
        if let Some(Value::Object(nested)) = object.get("errors") {
            collect_field_errors(nested, &mut fields);
        }

        if status_code == 422 || !fields.is_empty() {
            ApiError::Validation {
                status_code,
                message,
                fields,
            }
        } else {
            ApiError::Status { status_code, message }
        }
    }

    /// First validation message reported for a field.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        match self {
            ApiError::Validation { fields, .. } => fields
                .get(field)
                .and_then(|messages| messages.first())
                .map(String::as_str),
            _ => None,
        }
    }

    /// Message suitable for an inline alert.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } | ApiError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status_code, .. } | ApiError::Validation { status_code, .. } => {
                Some(*status_code)
            }
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn collect_field_errors(
    object: &serde_json::Map<String, Value>,
    fields: &mut BTreeMap<String, Vec<String>>,
) {
    for (key, value) in object {
        if let Value::Array(items) = value {
            let messages: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if !messages.is_empty() {
                fields.insert(key.clone(), messages);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body() {
        let body = r#"{"message":"The given data was invalid.","errors":{"nama_kategori":["The nama kategori field is required."]}}"#;
        let err = ApiError::from_response(422, body);

        assert_eq!(err.user_message(), "The given data was invalid.");
        assert_eq!(
            err.field_error("nama_kategori"),
            Some("The nama kategori field is required.")
        );
        assert_eq!(err.status_code(), Some(422));
    }

    #[test]
    fn test_login_style_body() {
        let body = r#"{"name":["The name field is required."],"password":["The password field is required."]}"#;
        let err = ApiError::from_response(400, body);

        assert_eq!(err.field_error("name"), Some("The name field is required."));
        assert_eq!(err.field_error("password"), Some("The password field is required."));
    }

    #[test]
    fn test_plain_status() {
        let err = ApiError::from_response(500, "");
        assert!(matches!(err, ApiError::Status { status_code: 500, .. }));
        assert_eq!(err.user_message(), "HTTP 500");

        let err = ApiError::from_response(401, r#"{"message":"Unauthenticated."}"#);
        assert_eq!(err.user_message(), "Unauthenticated.");
        assert!(err.field_error("name").is_none());
    }
}
